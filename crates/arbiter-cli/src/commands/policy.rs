//! Policy administration commands against the remote service.

use std::path::Path;

use anyhow::{Context, Result};
use arbiter_abac::{Policy, parse_policy_document};
use arbiter_config::ArbiterConfig;

use super::{RequestArgs, block_on, client};
use crate::style::{SemanticStyle, print_list, print_success, print_warn};

pub fn list(config: &ArbiterConfig, json: bool) -> Result<()> {
    let client = client(config)?;
    let policies = block_on(client.get_policies())?.context("Failed to list policies")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&policies)?);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = policies
        .iter()
        .map(|policy| {
            vec![
                policy.name.clone(),
                policy.version.clone(),
                policy.rules.len().to_string(),
                policy.default_effect.to_string(),
                policy.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_list(
        &["Name", "Version", "Rules", "Default", "Description"],
        &rows,
        "policy",
        "No policies defined.",
    );
    Ok(())
}

/// Uploads every policy in a JSON document (one policy or an array).
pub fn create(config: &ArbiterConfig, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let policies = parse_policy_document(&text)
        .with_context(|| format!("Invalid policy document {}", file.display()))?;

    let client = client(config)?;
    for policy in &policies {
        let created = block_on(client.create_policy(policy))?
            .with_context(|| format!("Failed to create policy '{}'", policy.name))?;
        print_success(&format!(
            "Created policy {} ({} rules)",
            created.name.code(),
            created.rules.len()
        ));
    }
    Ok(())
}

pub fn simple(config: &ArbiterConfig, name: &str, args: &RequestArgs) -> Result<()> {
    let client = client(config)?;
    let request = args.to_request(&config.engine.default_action);
    let policy: Policy = block_on(client.create_simple_policy(name, &request))?
        .with_context(|| format!("Failed to create policy '{name}'"))?;
    print_success(&format!(
        "Created policy {} allowing '{}'",
        policy.name.code(),
        request.action
    ));
    Ok(())
}

pub fn delete(config: &ArbiterConfig, name: &str) -> Result<()> {
    let client = client(config)?;
    let deleted = block_on(client.delete_policy(name))?
        .with_context(|| format!("Failed to delete policy '{name}'"))?;
    if deleted {
        print_success(&format!("Deleted policy {}", name.code()));
    } else {
        print_warn(&format!("Policy {name} was not deleted"));
    }
    Ok(())
}
