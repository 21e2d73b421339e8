//! Configure command

use anyhow::{anyhow, Result};
use dialoguer::{Input, Password};
use workstate_remote::{CredentialStore, Credentials};

use crate::cli::ConfigureArgs;
use crate::context::Context;
use crate::output;

pub fn run(args: ConfigureArgs, ctx: &Context) -> Result<()> {
    output::header("Workstate storage configuration");

    let store = ctx.credential_store();
    let existing = store.load()?.unwrap_or_default();
    let interactive = !args.no_input;

    let access_key_id = value(
        args.access_key_id,
        "Access Key ID",
        &existing.access_key_id,
        interactive,
    )?;
    let secret_access_key = match args.secret_access_key {
        Some(secret) => secret,
        None if interactive => {
            let prompt = if existing.secret_access_key.is_empty() {
                "Secret Access Key".to_string()
            } else {
                format!(
                    "Secret Access Key [{}] (empty keeps it)",
                    existing.masked_secret_key()
                )
            };
            let entered = Password::new()
                .with_prompt(prompt)
                .allow_empty_password(true)
                .interact()?;
            if entered.trim().is_empty() {
                existing.secret_access_key.clone()
            } else {
                entered
            }
        }
        None => existing.secret_access_key.clone(),
    };
    let region = value(args.region, "Region", &existing.region, interactive)?;
    let bucket_name = value(args.bucket, "Bucket name", &existing.bucket_name, interactive)?;
    let endpoint = match args.endpoint {
        Some(endpoint) => Some(endpoint),
        None => existing.endpoint.clone(),
    };

    let credentials = Credentials::new(access_key_id, secret_access_key, region, bucket_name)
        .with_endpoint(endpoint);

    let problems = credentials.problems();
    if !problems.is_empty() {
        for problem in &problems {
            output::error(&problem.to_string());
        }
        return Err(anyhow!(
            "Credentials validation failed with {} error(s)",
            problems.len()
        ));
    }

    store.save(&credentials)?;
    output::kv("Saved to", &store.location());
    output::success("Credentials configured successfully");
    Ok(())
}

/// Flag value, else a prompt defaulting to the stored value.
fn value(flag: Option<String>, prompt: &str, current: &str, interactive: bool) -> Result<String> {
    if let Some(v) = flag {
        return Ok(v);
    }
    if !interactive {
        return Ok(current.to_string());
    }

    let mut input = Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true);
    if !current.is_empty() {
        input = input.default(current.to_string());
    }
    Ok(input.interact_text()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> Context {
        let config = dir.path().join("config.json");
        let cli = Cli::try_parse_from([
            "workstate",
            "--config",
            config.to_str().unwrap(),
            "config",
        ])
        .unwrap();
        Context::from_cli(&cli).unwrap()
    }

    fn flags(region: &str) -> ConfigureArgs {
        ConfigureArgs {
            access_key_id: Some("AKIAEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            region: Some(region.to_string()),
            bucket: Some("snapshots".to_string()),
            endpoint: None,
            no_input: true,
        }
    }

    #[test]
    fn test_configure_from_flags() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        run(flags("eu-west-1"), &ctx).unwrap();

        let saved = ctx.credential_store().load().unwrap().unwrap();
        assert_eq!(saved.region, "eu-west-1");
        assert_eq!(saved.bucket_name, "snapshots");
    }

    #[test]
    fn test_partial_update_keeps_stored_values() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        run(flags("eu-west-1"), &ctx).unwrap();

        let update = ConfigureArgs {
            bucket: Some("other-bucket".to_string()),
            no_input: true,
            ..ConfigureArgs::default()
        };
        run(update, &ctx).unwrap();

        let saved = ctx.credential_store().load().unwrap().unwrap();
        assert_eq!(saved.bucket_name, "other-bucket");
        assert_eq!(saved.secret_access_key, "secret");
    }

    #[test]
    fn test_invalid_region_is_not_saved() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        assert!(run(flags("mars"), &ctx).is_err());
        assert!(ctx.credential_store().load().unwrap().is_none());
    }
}
