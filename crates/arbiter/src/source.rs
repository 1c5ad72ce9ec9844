//! Attribute sources consulted when a check names an entity by URI.

use std::fmt::Debug;

use arbiter_registry::Registry;
use arbiter_types::{Attributes, EntityType};

use crate::error::Result;

/// A store the engine can ask for an entity's attributes.
///
/// The engine queries every source for each URI in a check and merges the
/// answers. A source that does not know the URI returns `Ok(None)`.
pub trait AttributeSource: Send + Sync + Debug {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Returns the entity type and attributes stored for `uri`.
    fn fetch_attributes(&self, uri: &str) -> Result<Option<(EntityType, Attributes)>>;
}

impl AttributeSource for Registry {
    fn name(&self) -> &str {
        "registry"
    }

    fn fetch_attributes(&self, uri: &str) -> Result<Option<(EntityType, Attributes)>> {
        Ok(self
            .find(uri)?
            .map(|entity| (entity.entity_type, entity.attributes_map())))
    }
}
