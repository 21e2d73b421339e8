//! List command

use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};
use workstate_core::format_size;
use workstate_remote::{BlobStore, ObjectInfo};

use super::format_modified;
use crate::cli::ListArgs;
use crate::context::Context;
use crate::output;

#[derive(Tabled)]
struct SnapshotRow {
    #[tabled(rename = "Snapshot")]
    key: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Last Modified")]
    modified: String,
}

pub async fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let service = ctx.snapshot_service().await?;

    let spinner = output::spinner("Fetching snapshots...", ctx.show_progress());
    let snapshots = service.list(args.filter.as_deref()).await;
    spinner.finish_and_clear();
    let snapshots = snapshots?;

    if snapshots.is_empty() {
        output::info(&format!(
            "No snapshots found in {}",
            service.store().location()
        ));
        return Ok(());
    }

    output::header(&format!("Snapshots in {}", service.store().location()));
    println!("{}", snapshot_table(&snapshots));

    Ok(())
}

fn snapshot_table(snapshots: &[ObjectInfo]) -> Table {
    let rows: Vec<SnapshotRow> = snapshots
        .iter()
        .map(|s| SnapshotRow {
            key: s.key.clone(),
            size: format_size(s.size),
            modified: format_modified(s.last_modified),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_table_rows() {
        let snapshots = vec![
            ObjectInfo::new("alpha.zip", 1536, None),
            ObjectInfo::new("beta.zip", 0, None),
        ];

        let rendered = snapshot_table(&snapshots).to_string();
        assert!(rendered.contains("Snapshot"));
        assert!(rendered.contains("Last Modified"));
        assert!(rendered.contains("alpha.zip"));
        assert!(rendered.contains("1.5 KB"));
        assert!(rendered.contains("0.0 B"));
    }
}
