//! arbiter-registry: Entity attribute store for `Arbiter`
//!
//! The registry holds the attributes of known principals and resources so that
//! check requests can name an entity by URI instead of carrying its attributes
//! inline. It is an in-memory store: nothing survives a restart.
//!
//! # Update Semantics
//!
//! - **Merge**: incoming keys are inserted or replaced; other keys are kept.
//!   Replaced keys keep their `registered_at`.
//! - **Override**: the stored attributes become exactly the incoming ones,
//!   all freshly registered.
//!
//! Both modes bump the entity's `updated_at`. An entity's type and
//! `registered_at` never change after registration.
//!
//! # Example
//!
//! ```
//! use arbiter_registry::{Registry, UpdateMode};
//! use arbiter_types::{EntityCreate, EntityType, EntityUpdate, attributes};
//!
//! let registry = Registry::new();
//! registry
//!     .register(EntityCreate::new(EntityType::Principal, attributes([("role", "user")])).with_uri("ada"))
//!     .unwrap();
//!
//! let updated = registry
//!     .update(EntityUpdate::new("ada", attributes([("team", "eng")])), UpdateMode::Merge)
//!     .unwrap();
//! assert_eq!(updated.attributes.len(), 2);
//! ```

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::RwLock;

use arbiter_types::{
    AttributeInDb, Attributes, Entity, EntityCreate, EntityType, EntityUpdate, Timestamp,
    ValidationError, generate_uri, now_monotonic,
};


/// How an update combines incoming attributes with stored ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Insert or replace incoming keys, keep the rest.
    #[default]
    Merge,
    /// Replace the whole attribute set.
    Override,
}

impl UpdateMode {
    /// Maps the wire-level `override` flag to a mode.
    pub fn from_override(override_all: bool) -> Self {
        if override_all { Self::Override } else { Self::Merge }
    }
}

impl Display for UpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge => f.write_str("merge"),
            Self::Override => f.write_str("override"),
        }
    }
}

/// Errors returned by registry operations.
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    /// No entity is registered under this URI.
    #[error("entity '{0}' is not registered")]
    NotFound(String),

    /// An entity is already registered under this URI.
    #[error("entity '{0}' is already registered")]
    AlreadyRegistered(String),

    /// The request shape is invalid.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// An update named a type other than the stored one.
    #[error("entity '{uri}' has type {stored}, not {requested}")]
    TypeMismatch {
        uri: String,
        stored: EntityType,
        requested: EntityType,
    },

    #[error("registry lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Thread-safe in-memory entity store keyed by URI.
#[derive(Debug, Default)]
pub struct Registry {
    entities: RwLock<HashMap<String, Entity>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new entity, generating a URI if none was given.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] if the URI is taken.
    pub fn register(&self, create: EntityCreate) -> Result<Entity> {
        create.validate()?;
        let uri = create.uri.unwrap_or_else(generate_uri);

        let mut entities = self
            .entities
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;
        if entities.contains_key(&uri) {
            return Err(RegistryError::AlreadyRegistered(uri));
        }

        let now = now_monotonic(None);
        let entity = Entity {
            uri: uri.clone(),
            entity_type: create.entity_type,
            attributes: fresh_attributes(create.attributes, now),
            registered_at: now,
            updated_at: Some(now),
        };
        entities.insert(uri, entity.clone());

        tracing::info!(uri = %entity.uri, entity_type = %entity.entity_type, "entity registered");
        Ok(entity)
    }

    /// Returns a registered entity.
    pub fn get(&self, uri: &str) -> Result<Entity> {
        self.find(uri)?
            .ok_or_else(|| RegistryError::NotFound(uri.to_string()))
    }

    /// Returns a registered entity, or `None` if the URI is unknown.
    pub fn find(&self, uri: &str) -> Result<Option<Entity>> {
        let entities = self
            .entities
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?;
        Ok(entities.get(uri).cloned())
    }

    /// Returns the stored attributes of an entity as a plain map.
    pub fn attributes(&self, uri: &str) -> Result<Attributes> {
        Ok(self.get(uri)?.attributes_map())
    }

    /// Lists entities in registration order.
    pub fn list(&self, offset: usize, limit: usize) -> Result<Vec<Entity>> {
        let entities = self
            .entities
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?;
        let mut all: Vec<&Entity> = entities.values().collect();
        all.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.uri.cmp(&b.uri))
        });
        Ok(all.into_iter().skip(offset).take(limit).cloned().collect())
    }

    /// Returns the number of registered entities.
    pub fn count(&self) -> Result<usize> {
        let entities = self
            .entities
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?;
        Ok(entities.len())
    }

    /// Updates an entity's attributes. The whole update is applied atomically.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if the URI is unknown
    /// - [`RegistryError::TypeMismatch`] if the update names a different type
    pub fn update(&self, update: EntityUpdate, mode: UpdateMode) -> Result<Entity> {
        update.validate()?;

        let mut entities = self
            .entities
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;
        let entity = entities
            .get_mut(&update.uri)
            .ok_or_else(|| RegistryError::NotFound(update.uri.clone()))?;

        if let Some(requested) = update.entity_type {
            if requested != entity.entity_type {
                return Err(RegistryError::TypeMismatch {
                    uri: update.uri,
                    stored: entity.entity_type,
                    requested,
                });
            }
        }

        let now = now_monotonic(entity.updated_at.or(Some(entity.registered_at)));
        let incoming = update.attributes.len();
        match mode {
            UpdateMode::Override => {
                entity.attributes = fresh_attributes(update.attributes, now);
            }
            UpdateMode::Merge => merge_attributes(&mut entity.attributes, update.attributes, now),
        }
        entity.updated_at = Some(now);

        tracing::info!(uri = %entity.uri, %mode, incoming, total = entity.attributes.len(), "entity updated");
        Ok(entity.clone())
    }

    /// Removes an entity.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the URI is unknown.
    pub fn delete(&self, uri: &str) -> Result<()> {
        let mut entities = self
            .entities
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;
        if entities.remove(uri).is_none() {
            return Err(RegistryError::NotFound(uri.to_string()));
        }
        tracing::info!(uri, "entity deleted");
        Ok(())
    }
}

/// Builds stored attributes (sorted by key) all registered at `now`.
fn fresh_attributes(attributes: Attributes, now: Timestamp) -> Vec<AttributeInDb> {
    attributes
        .into_iter()
        .map(|(key, value)| AttributeInDb {
            key,
            value,
            updated_at: now,
            registered_at: now,
        })
        .collect()
}

fn merge_attributes(stored: &mut Vec<AttributeInDb>, incoming: Attributes, now: Timestamp) {
    for (key, value) in incoming {
        match stored.iter_mut().find(|a| a.key == key) {
            Some(existing) => {
                existing.value = value;
                existing.updated_at = now;
            }
            None => stored.push(AttributeInDb {
                key,
                value,
                updated_at: now,
                registered_at: now,
            }),
        }
    }
    stored.sort_by(|a, b| a.key.cmp(&b.key));
}
