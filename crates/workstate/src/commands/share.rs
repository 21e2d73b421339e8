//! Share command

use anyhow::Result;
use chrono::Local;

use super::choose_snapshot;
use crate::cli::ShareArgs;
use crate::context::Context;
use crate::output;

pub async fn run(args: ShareArgs, ctx: &Context) -> Result<()> {
    let service = ctx.snapshot_service().await?;

    let Some(key) = choose_snapshot(&service, args.key, "Select a snapshot to share").await?
    else {
        return Ok(());
    };

    let spinner = output::spinner("Generating link...", ctx.show_progress());
    let link = service.share(&key, args.hours).await;
    spinner.finish_and_clear();
    let link = link?;

    output::success("Share link generated");
    output::kv("Snapshot", &link.key);
    output::kv(
        "Expires",
        &format!(
            "{} ({} UTC)",
            link.expires_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S"),
            link.expires_at.format("%Y-%m-%d %H:%M:%S")
        ),
    );
    println!("\n{}\n", link.url);

    output::header("Usage");
    output::dim("  Open the link in a browser, or download it with curl:");
    output::dim(&format!("    curl -o {} \"{}\"", link.key, link.url));
    output::dim("  Or restore it with workstate:");
    output::dim(&format!("    workstate download-url \"{}\"", link.url));
    println!();
    output::warning(&format!(
        "Anyone with this link can download the snapshot for the next {} hours",
        args.hours
    ));

    Ok(())
}
