//! Config command

use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};
use workstate_remote::{CredentialStore, CredentialsError};

use crate::context::Context;
use crate::output;

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    setting: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

const FIELDS: [(&str, &str); 4] = [
    ("access_key_id", "Access Key ID"),
    ("secret_access_key", "Secret Access Key"),
    ("region", "Region"),
    ("bucket_name", "Bucket Name"),
];

pub fn run(ctx: &Context) -> Result<()> {
    let store = ctx.credential_store();

    let Some(credentials) = store.load()? else {
        output::warning(&format!("No configuration found at {}", store.location()));
        print_help();
        return Ok(());
    };

    let problems = credentials.problems();
    let missing: Vec<&str> = problems
        .iter()
        .flat_map(|p| match p {
            CredentialsError::MissingFields { fields } => fields.clone(),
            CredentialsError::InvalidRegion { .. } => Vec::new(),
        })
        .collect();
    let bad_region = problems
        .iter()
        .any(|p| matches!(p, CredentialsError::InvalidRegion { .. }));

    let rows: Vec<SettingRow> = FIELDS
        .iter()
        .map(|(field, label)| {
            let value = match *field {
                "access_key_id" => credentials.masked_access_key(),
                "secret_access_key" => credentials.masked_secret_key(),
                "region" => credentials.region.clone(),
                _ => credentials.bucket_name.clone(),
            };
            let status = if missing.contains(field) {
                "✗ Not configured"
            } else if *field == "region" && bad_region {
                "✗ Invalid region"
            } else {
                "✓"
            };
            SettingRow {
                setting: *label,
                value: if missing.contains(field) {
                    String::new()
                } else {
                    value
                },
                status,
            }
        })
        .collect();

    output::header("Storage Configuration");
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);

    if let Some(endpoint) = &credentials.endpoint {
        output::kv("Endpoint", endpoint);
    }
    output::kv("Configuration file", &store.location());
    output::kv(
        "Last modified",
        &store
            .modified()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
    );
    println!();

    if problems.is_empty() {
        output::success("All credentials are properly configured");
    } else {
        for problem in &problems {
            output::warning(&problem.to_string());
        }
        print_help();
    }

    Ok(())
}

fn print_help() {
    output::header("Getting Started");
    output::dim("  1. Run `workstate configure` to set up your credentials");
    output::dim("  2. Make sure the access key can read and write the bucket");
    output::dim("  3. Choose a bucket dedicated to project snapshots");
}
