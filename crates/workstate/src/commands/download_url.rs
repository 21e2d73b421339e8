//! Download-url command

use anyhow::{Context as _, Result};
use std::path::Path;
use workstate_core::{Extractor, ARCHIVE_EXTENSION};
use workstate_remote::{download_shared, file_name_from_url, parse_shared_url};

use crate::cli::DownloadUrlArgs;
use crate::context::Context;
use crate::output;

pub async fn run(args: DownloadUrlArgs, ctx: &Context) -> Result<()> {
    let url = parse_shared_url(&args.url)?;
    let dest = match &args.output {
        Some(path) => path.clone().into_std_path_buf(),
        None => ctx.root().join(file_name_from_url(&url)),
    };

    let client = reqwest::Client::builder()
        .user_agent(concat!("workstate/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    output::info("Downloading from shared link...");
    let archive = download_shared(&client, &url, &dest, ctx.show_progress()).await?;
    output::success(&format!("Downloaded {}", archive.display()));

    if args.no_extract || !is_zip(&archive) {
        output::info(&format!("File saved as {}", archive.display()));
        return Ok(());
    }

    let target = archive
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let extractor = Extractor::new().with_progress(ctx.show_progress());
    let archive_path = archive.clone();
    let extract_target = target.clone();
    let report = tokio::task::spawn_blocking(move || {
        extractor.extract(&archive_path, &extract_target)
    })
    .await
    .context("Extraction task failed")??;

    for renamed in &report.renamed {
        output::warning(&format!(
            "{} already existed, extracted as {}",
            renamed.entry.display(),
            renamed.written_to.display()
        ));
    }
    output::success(&format!(
        "Extracted {} files into {}",
        report.file_count(),
        target.display()
    ));

    if args.keep {
        output::info(&format!("Archive kept at {}", archive.display()));
    } else {
        std::fs::remove_file(&archive)
            .with_context(|| format!("Failed to remove {}", archive.display()))?;
        output::dim("Archive removed");
    }

    Ok(())
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            ext.to_string_lossy()
                .eq_ignore_ascii_case(ARCHIVE_EXTENSION.trim_start_matches('.'))
        })
        .unwrap_or(false)
}
