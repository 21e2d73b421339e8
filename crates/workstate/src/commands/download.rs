//! Download command

use anyhow::Result;
use workstate_remote::DOWNLOADS_DIR;

use super::choose_snapshot;
use crate::cli::DownloadArgs;
use crate::context::Context;
use crate::output;

pub async fn run(args: DownloadArgs, ctx: &Context) -> Result<()> {
    let service = ctx.snapshot_service().await?;

    let Some(key) = choose_snapshot(&service, args.key, "Select a snapshot to download").await?
    else {
        return Ok(());
    };

    if args.only_download {
        let spinner = output::spinner(&format!("Downloading {}...", key), ctx.show_progress());
        let path = service
            .download(&key, &ctx.root().join(DOWNLOADS_DIR))
            .await;
        spinner.finish_and_clear();

        output::success(&format!("Downloaded {} to {}", key, path?.display()));
        return Ok(());
    }

    let report = service.restore(&key, ctx.root()).await?;

    for renamed in &report.renamed {
        output::warning(&format!(
            "{} already existed, restored as {}",
            renamed.entry.display(),
            renamed.written_to.display()
        ));
    }
    for entry in &report.unsafe_entries {
        output::warning(&format!("Skipped unsafe entry {}", entry));
    }

    output::success(&format!(
        "Restored {} files from {} into {}",
        report.file_count(),
        key,
        ctx.root().display()
    ));
    Ok(())
}
