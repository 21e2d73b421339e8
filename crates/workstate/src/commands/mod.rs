//! CLI command implementations

pub mod config;
pub mod configure;
pub mod delete;
pub mod download;
pub mod download_url;
pub mod init;
pub mod list;
pub mod save;
pub mod share;
pub mod status;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use dialoguer::Select;
use workstate_core::format_size;
use workstate_remote::{BlobStore, ObjectInfo, SnapshotService};

use crate::output;

/// `%Y-%m-%d %H:%M` in local time, `-` when unknown.
pub(crate) fn format_modified(modified: Option<DateTime<Utc>>) -> String {
    modified
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// One picker line per snapshot, keys padded to a common width.
pub(crate) fn picker_items(snapshots: &[ObjectInfo]) -> Vec<String> {
    let width = snapshots.iter().map(|s| s.key.len()).max().unwrap_or(0);
    snapshots
        .iter()
        .map(|s| {
            format!(
                "{:<width$} | Size: {:<10} | Last Modified: {}",
                s.key,
                format_size(s.size),
                format_modified(s.last_modified),
                width = width
            )
        })
        .collect()
}

/// Returns `key` when given, otherwise lets the user pick a snapshot.
///
/// `None` means there was nothing to pick or the user backed out.
pub(crate) async fn choose_snapshot<S: BlobStore>(
    service: &SnapshotService<S>,
    key: Option<String>,
    prompt: &str,
) -> Result<Option<String>> {
    if let Some(key) = key {
        return Ok(Some(key));
    }

    let snapshots = service.list(None).await?;
    if snapshots.is_empty() {
        output::warning(&format!(
            "No snapshots found in {}",
            service.store().location()
        ));
        return Ok(None);
    }

    let items = picker_items(&snapshots);
    let choice = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact_opt()?;

    Ok(choice.map(|idx| snapshots[idx].key.clone()))
}
