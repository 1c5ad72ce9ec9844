//! Entity registry commands against the remote service.

use anyhow::{Context, Result};
use arbiter_config::ArbiterConfig;
use arbiter_types::{AttributeValue, Entity, EntityCreate, EntityType, EntityUpdate};

use super::{block_on, client, collect_attributes};
use crate::style::{SemanticStyle, print_info_table, print_list, print_success, print_warn};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn register(
    config: &ArbiterConfig,
    entity_type: EntityType,
    uri: Option<String>,
    attributes: &[(String, AttributeValue)],
) -> Result<()> {
    let client = client(config)?;
    let mut create = EntityCreate::new(entity_type, collect_attributes(attributes));
    if let Some(uri) = uri {
        create = create.with_uri(uri);
    }

    let entity = block_on(client.register_entity(&create))?.context("Failed to register entity")?;
    print_success(&format!("Registered {} {}", entity.entity_type, entity.uri.code()));
    print_entity(&entity);
    Ok(())
}

pub fn get(config: &ArbiterConfig, uri: &str) -> Result<()> {
    let client = client(config)?;
    let entity = block_on(client.get_entity(uri))?
        .with_context(|| format!("Failed to fetch entity '{uri}'"))?;
    print_entity(&entity);
    Ok(())
}

pub fn update(
    config: &ArbiterConfig,
    uri: &str,
    attributes: &[(String, AttributeValue)],
    override_all: bool,
) -> Result<()> {
    let client = client(config)?;
    let update = EntityUpdate::new(uri, collect_attributes(attributes));

    let entity = block_on(client.update_entity(&update, override_all))?
        .with_context(|| format!("Failed to update entity '{uri}'"))?;
    let mode = if override_all { "replaced" } else { "merged" };
    print_success(&format!("Attributes of {} {mode}", entity.uri.code()));
    print_entity(&entity);
    Ok(())
}

pub fn delete(config: &ArbiterConfig, uri: &str) -> Result<()> {
    let client = client(config)?;
    let deleted = block_on(client.delete_entity(uri))?
        .with_context(|| format!("Failed to delete entity '{uri}'"))?;
    if deleted {
        print_success(&format!("Deleted {}", uri.code()));
    } else {
        print_warn(&format!("Entity {uri} was not deleted"));
    }
    Ok(())
}

pub fn list(config: &ArbiterConfig, offset: usize, limit: usize) -> Result<()> {
    let client = client(config)?;
    let entities = block_on(client.list_entities(offset, limit))?.context("Failed to list entities")?;

    let rows: Vec<Vec<String>> = entities
        .iter()
        .map(|entity| {
            vec![
                entity.uri.clone(),
                entity.entity_type.to_string(),
                entity.attributes.len().to_string(),
                entity.registered_at.format(TIME_FORMAT).to_string(),
            ]
        })
        .collect();
    print_list(
        &["URI", "Type", "Attributes", "Registered"],
        &rows,
        "entity",
        "No entities registered.",
    );
    Ok(())
}

fn print_entity(entity: &Entity) {
    print_info_table(&[
        ("URI", entity.uri.clone()),
        ("Type", entity.entity_type.to_string()),
        ("Registered", entity.registered_at.format(TIME_FORMAT).to_string()),
        (
            "Updated",
            entity
                .updated_at
                .map_or_else(|| "-".to_string(), |at| at.format(TIME_FORMAT).to_string()),
        ),
    ]);

    let rows: Vec<Vec<String>> = entity
        .attributes
        .iter()
        .map(|attribute| {
            vec![
                attribute.key.clone(),
                attribute.value.to_string(),
                attribute.updated_at.format(TIME_FORMAT).to_string(),
            ]
        })
        .collect();
    print_list(&["Key", "Value", "Updated"], &rows, "attribute", "No attributes.");
}
