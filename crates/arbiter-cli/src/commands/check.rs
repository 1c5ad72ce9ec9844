//! Check command: ask the remote service for a decision.

use anyhow::{Context, Result};
use arbiter_config::ArbiterConfig;

use super::{RequestArgs, block_on, client};
use crate::style::print_verdict;

pub fn run(config: &ArbiterConfig, args: &RequestArgs, json: bool) -> Result<()> {
    let client = client(config)?;
    let request = args.to_request(&config.engine.default_action);

    let response = block_on(client.check(&request))?
        .with_context(|| format!("Check failed against {}", config.client.endpoint))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_verdict(&response);
    }
    Ok(())
}
