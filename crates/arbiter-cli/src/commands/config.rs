//! Configuration commands.

use anyhow::{Result, bail};
use arbiter_config::ArbiterConfig;

use crate::style::{print_hint, print_info_table};

const MASKED: &str = "********";

/// Show the effective configuration after all layers are merged.
pub fn show(config: &ArbiterConfig, format: &str) -> Result<()> {
    let mut config = config.clone();
    if config.client.api_key.is_some() {
        config.client.api_key = Some(MASKED.to_string());
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&config)?),
        "toml" => println!("{}", config.to_toml()?),
        "text" => {
            let files = if config.policies.files.is_empty() {
                "(none)".to_string()
            } else {
                config
                    .policies
                    .files
                    .iter()
                    .map(|f| f.display().to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            print_info_table(&[
                ("client.endpoint", config.client.endpoint.clone()),
                (
                    "client.api_key",
                    config.client.api_key.clone().unwrap_or_else(|| "(unset)".to_string()),
                ),
                ("client.timeout_secs", config.client.timeout_secs.to_string()),
                ("client.admin_prefix", config.client.admin_prefix.clone()),
                ("client.entities_path", config.client.entities_path.clone()),
                ("engine.default_action", config.engine.default_action.clone()),
                (
                    "engine.bulk_check_max_requests",
                    config.engine.bulk_check_max_requests.to_string(),
                ),
                (
                    "engine.bulk_check_batch_size",
                    config.engine.bulk_check_batch_size.to_string(),
                ),
                ("policies.files", files),
            ]);
            print_hint("Override any key with ARBITER_<SECTION>__<KEY>");
        }
        other => bail!("Unknown format '{other}' (expected text, toml or json)"),
    }
    Ok(())
}
