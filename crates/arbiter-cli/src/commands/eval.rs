//! Eval command: decide a request locally against policy files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use arbiter::{Arbiter, Decision, EngineOptions, EntityCreate};
use arbiter_config::ArbiterConfig;

use super::RequestArgs;
use crate::style::{print_list, print_verdict, print_warn};

pub fn run(
    config: &ArbiterConfig,
    policy_files: &[PathBuf],
    entity_files: &[PathBuf],
    args: &RequestArgs,
    json: bool,
) -> Result<()> {
    let engine = Arbiter::new(
        EngineOptions::default()
            .with_default_action(&config.engine.default_action)
            .with_bulk_limits(
                config.engine.bulk_check_max_requests,
                config.engine.bulk_check_batch_size,
            ),
    );

    let files = if policy_files.is_empty() {
        &config.policies.files
    } else {
        policy_files
    };
    for file in files {
        engine
            .load_policy_file(file)
            .with_context(|| format!("Failed to load policies from {}", file.display()))?;
    }

    for file in entity_files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let entities: Vec<EntityCreate> = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse entities in {}", file.display()))?;
        for entity in entities {
            engine.register_entity(entity)?;
        }
    }

    let request = args.to_request(&config.engine.default_action);
    let decision = engine.explain(&request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    if files.is_empty() {
        print_warn("No policy files given; every request is denied");
    }
    print_explanation(&decision);
    println!();
    print_verdict(&decision.to_response());
    Ok(())
}

fn print_explanation(decision: &Decision) {
    let rows: Vec<Vec<String>> = decision
        .results
        .iter()
        .map(|result| {
            vec![
                result.policy_name.clone(),
                result.effect.to_string(),
                result
                    .matched_rule
                    .clone()
                    .unwrap_or_else(|| "(default)".to_string()),
            ]
        })
        .collect();
    print_list(
        &["Policy", "Effect", "Matched rule"],
        &rows,
        "policy",
        "No policies evaluated.",
    );
}
