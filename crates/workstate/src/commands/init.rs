//! Init command

use anyhow::Result;
use dialoguer::Select;
use workstate_core::{write_ignore_file, CodeTool, IGNORE_FILE};

use crate::cli::InitArgs;
use crate::context::Context;
use crate::output;

pub fn run(args: InitArgs, ctx: &Context) -> Result<()> {
    let tool = match args.tool {
        Some(tool) => tool.to_lib_tool(),
        None => {
            let names: Vec<&str> = CodeTool::ALL.iter().map(CodeTool::as_str).collect();
            let Some(idx) = Select::new()
                .with_prompt("Select your development tool")
                .items(&names)
                .default(0)
                .interact_opt()?
            else {
                output::info("Init cancelled");
                return Ok(());
            };
            CodeTool::ALL[idx]
        }
    };

    if write_ignore_file(ctx.root(), tool, args.force)? {
        output::success(&format!("Created {} for {}", IGNORE_FILE, tool));
    } else {
        output::warning(&format!(
            "{} already exists in {}; use --force to replace it",
            IGNORE_FILE,
            ctx.root().display()
        ));
    }

    Ok(())
}
