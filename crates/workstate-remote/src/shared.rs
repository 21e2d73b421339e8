//! Downloads of snapshots shared through presigned URLs.

use anyhow::{anyhow, bail, Context, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;
use workstate_core::resolve_conflict;

/// File name used when the URL path does not carry one.
pub const SHARED_FALLBACK_NAME: &str = "workstate-shared.zip";

/// Parses a shared link, accepting only `http`/`https` URLs with a host.
pub fn parse_shared_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| anyhow!("Invalid URL '{}': {}", raw, e))?;

    if !matches!(url.scheme(), "http" | "https") {
        bail!("Invalid URL '{}': only http and https links are supported", raw);
    }
    if url.host_str().map_or(true, str::is_empty) {
        bail!("Invalid URL '{}': missing host", raw);
    }

    Ok(url)
}

/// Local file name for a shared link: the last path segment when it looks like
/// a file name, otherwise [`SHARED_FALLBACK_NAME`].
pub fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| {
            url::form_urlencoded::parse(format!("n={}", segment).as_bytes())
                .next()
                .map(|(_, v)| v.into_owned())
                .unwrap_or_else(|| segment.to_string())
        })
        .filter(|name| name.contains('.') && !name.contains(['/', '\\']) && name != "..")
        .unwrap_or_else(|| SHARED_FALLBACK_NAME.to_string())
}

/// Streams `url` into `dest` and returns the path written.
///
/// An existing file at `dest` is never replaced: the download lands next to
/// it as `name (1).ext`. Partial downloads are removed on failure.
pub async fn download_shared(
    client: &reqwest::Client,
    url: &Url,
    dest: &Path,
    show_progress: bool,
) -> Result<PathBuf> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    debug!("Downloading {}", url.as_str());
    let response = client
        .get(url.clone())
        .send()
        .await
        .context("Failed to send download request")?;

    if !response.status().is_success() {
        bail!("Download failed with status: {}", response.status());
    }

    let total_size = response.content_length();
    let progress = if show_progress {
        let pb = match total_size {
            Some(total) => ProgressBar::new(total),
            None => ProgressBar::new_spinner(),
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(format!("Downloading {}", file_label(dest)));
        Some(pb)
    } else {
        None
    };

    let temp = tempfile::Builder::new()
        .prefix(".workstate-download-")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?
        .into_temp_path();

    let mut file = tokio::fs::File::create(&temp)
        .await
        .context("Failed to open temporary file")?;

    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.context("Failed to read download chunk")?;
        file.write_all(&chunk)
            .await
            .context("Failed to write to temporary file")?;
        downloaded += chunk.len() as u64;

        if let Some(pb) = &progress {
            pb.set_position(downloaded);
        }
    }
    file.flush().await.context("Failed to write to temporary file")?;
    drop(file);

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let final_path = resolve_conflict(dest);
    temp.persist_noclobber(&final_path)
        .map_err(|e| anyhow!("Failed to save {}: {}", final_path.display(), e.error))?;

    info!("Downloaded {} bytes to {}", downloaded, final_path.display());
    Ok(final_path)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
