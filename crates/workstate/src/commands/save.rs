//! Save command

use anyhow::Result;
use workstate_core::{format_size, ArchiveConfig, SnapshotName, IGNORE_FILE};
use workstate_remote::BlobStore;

use crate::cli::SaveArgs;
use crate::context::Context;
use crate::output;

pub async fn run(args: SaveArgs, ctx: &Context) -> Result<()> {
    let label = if args.timestamp {
        SnapshotName::timestamped_label(&args.label)
    } else {
        args.label.clone()
    };
    // Reject blank labels before touching credentials or the network
    SnapshotName::for_label(&label)?;

    let service = ctx
        .snapshot_service()
        .await?
        .with_archive_config(ArchiveConfig::new().with_compression_level(args.compression));

    output::info(&format!(
        "Saving {} to {}",
        ctx.root().display(),
        service.store().location()
    ));

    let saved = service.save(ctx.root(), &label).await?;
    let summary = &saved.summary;

    if !saved.ignore_file_found {
        output::warning(&format!(
            "No {} found, every file was included (run `workstate init`)",
            IGNORE_FILE
        ));
    }
    if saved.skipped > 0 {
        output::warning(&format!(
            "{} unreadable entries were skipped (see `workstate status`)",
            saved.skipped
        ));
    }

    output::success(&format!("Snapshot '{}' saved as {}", label, saved.key));
    output::kv("Files", &summary.file_count.to_string());
    output::kv("Project size", &format_size(summary.source_bytes));
    output::kv(
        "Archive size",
        &format!(
            "{} ({}% smaller)",
            format_size(summary.archive_bytes),
            summary.compression_percentage()
        ),
    );
    output::kv("SHA-256", &summary.checksum);

    Ok(())
}
