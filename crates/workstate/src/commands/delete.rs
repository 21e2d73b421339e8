//! Delete command

use anyhow::Result;
use dialoguer::Confirm;

use super::choose_snapshot;
use crate::cli::DeleteArgs;
use crate::context::Context;
use crate::output;

pub async fn run(args: DeleteArgs, ctx: &Context) -> Result<()> {
    let service = ctx.snapshot_service().await?;

    let Some(key) = choose_snapshot(&service, args.key, "Select a snapshot to delete").await?
    else {
        return Ok(());
    };

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {}? This cannot be undone", key))
            .default(false)
            .interact()?;

        if !confirmed {
            output::info("Delete cancelled");
            return Ok(());
        }
    }

    service.delete(&key).await?;
    output::success(&format!("Deleted {}", key));
    Ok(())
}
