//! Status command

use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};
use workstate_core::{format_size, FileSelector, IGNORE_FILE};

use crate::cli::StatusArgs;
use crate::context::Context;
use crate::output;

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "File")]
    path: String,
    #[tabled(rename = "Size")]
    size: String,
}

pub fn run(args: StatusArgs, ctx: &Context) -> Result<()> {
    let selection = FileSelector::new(ctx.root()).select()?;

    if !args.summary && !selection.is_empty() {
        let rows: Vec<FileRow> = selection
            .iter()
            .map(|file| FileRow {
                path: file.entry_name(),
                size: format_size(file.size),
            })
            .collect();

        output::header("Files to save");
        let mut table = Table::new(rows);
        table.with(Style::sharp());
        println!("{}", table);
    }

    output::header("Summary");
    output::kv("Project", &ctx.root().display().to_string());
    output::kv(
        "Ignore file",
        if selection.ignore_file_found() {
            IGNORE_FILE
        } else {
            "none (all files selected)"
        },
    );
    output::kv("Files", &selection.len().to_string());
    output::kv("Total size", &format_size(selection.total_bytes()));

    if !selection.skipped().is_empty() {
        println!();
        for skipped in selection.skipped() {
            output::warning(&format!(
                "Skipped {}: {}",
                skipped.path.display(),
                skipped.reason
            ));
        }
    }

    if selection.is_empty() {
        output::info("Nothing to save");
    }

    Ok(())
}
