//! The decision engine: policy store, attribute resolution, and checks.

use std::path::Path;
use std::sync::{Arc, RwLock};

use arbiter_abac::{Decision, Policy, decide, parse_policy_document};
use arbiter_registry::{Registry, UpdateMode};
use arbiter_types::{
    Attributes, CheckRequest, CheckResponse, DEFAULT_ACTION, Entity, EntityCheck, EntityCreate,
    EntityType, EntityUpdate,
};
use rayon::prelude::*;

use crate::error::{ArbiterError, Result};
use crate::source::AttributeSource;

/// Tuning knobs for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Action used when a request leaves it empty.
    pub default_action: String,
    /// Largest accepted bulk check.
    pub bulk_check_max_requests: usize,
    /// Minimum number of requests handed to one rayon task.
    pub bulk_check_batch_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_action: DEFAULT_ACTION.to_string(),
            bulk_check_max_requests: 100,
            bulk_check_batch_size: 10,
        }
    }
}

impl EngineOptions {
    pub fn with_default_action(mut self, action: impl Into<String>) -> Self {
        self.default_action = action.into();
        self
    }

    pub fn with_bulk_limits(mut self, max_requests: usize, batch_size: usize) -> Self {
        self.bulk_check_max_requests = max_requests;
        self.bulk_check_batch_size = batch_size.max(1);
        self
    }
}

/// In-process access decision engine.
///
/// Holds an ordered policy set, an entity registry, and the attribute
/// sources consulted for URIs named in a check. The registry is always the
/// first source. All methods take `&self`; the engine can be shared across
/// threads behind an `Arc`.
///
/// # Example
///
/// ```
/// use arbiter::{Arbiter, Condition, EntityCheck, CheckRequest, Policy, Rule};
///
/// let engine = Arbiter::default();
/// engine
///     .add_policy(Policy::new("docs").with_rule(
///         Rule::allow("admins").when_principal(Condition::equals("role", "admin")),
///     ))
///     .unwrap();
///
/// let request = CheckRequest::new(
///     EntityCheck::principal().with_attribute("role", "admin"),
///     EntityCheck::resource().with_attribute("kind", "report"),
/// );
/// assert!(engine.check(&request).unwrap().allowed);
/// ```
#[derive(Debug)]
pub struct Arbiter {
    policies: RwLock<Vec<Policy>>,
    registry: Arc<Registry>,
    sources: Vec<Arc<dyn AttributeSource>>,
    options: EngineOptions,
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl Arbiter {
    /// Creates an engine with no policies and an empty registry.
    pub fn new(options: EngineOptions) -> Self {
        Self::with_registry(options, Arc::new(Registry::new()))
    }

    /// Creates an engine backed by an existing registry.
    pub fn with_registry(options: EngineOptions, registry: Arc<Registry>) -> Self {
        Self {
            policies: RwLock::new(Vec::new()),
            sources: vec![registry.clone() as Arc<dyn AttributeSource>],
            registry,
            options,
        }
    }

    /// Adds a source consulted after the registry and any earlier sources.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn AttributeSource>) -> Self {
        tracing::debug!(source = source.name(), "attribute source added");
        self.sources.push(source);
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    // ========================================================================
    // Policies
    // ========================================================================

    /// Stores a policy, replacing any policy with the same name in place.
    pub fn add_policy(&self, policy: Policy) -> Result<Policy> {
        policy.validate()?;
        let mut policies = self
            .policies
            .write()
            .map_err(|_| ArbiterError::internal("lock poisoned"))?;

        match policies.iter_mut().find(|p| p.name == policy.name) {
            Some(existing) => {
                *existing = policy.clone();
                tracing::info!(policy = %policy.name, rules = policy.rules.len(), "policy replaced");
            }
            None => {
                policies.push(policy.clone());
                tracing::info!(policy = %policy.name, rules = policy.rules.len(), "policy created");
            }
        }
        Ok(policy)
    }

    /// Builds and stores a single-rule policy from a request's inline attributes.
    pub fn add_simple_policy(&self, name: &str, request: &CheckRequest) -> Result<Policy> {
        request.validate()?;
        self.add_policy(Policy::simple_from_request(name, request))
    }

    /// Removes a policy by name. Returns false if no such policy exists.
    pub fn remove_policy(&self, name: &str) -> Result<bool> {
        let mut policies = self
            .policies
            .write()
            .map_err(|_| ArbiterError::internal("lock poisoned"))?;
        let before = policies.len();
        policies.retain(|p| p.name != name);
        let removed = policies.len() != before;
        if removed {
            tracing::info!(policy = name, "policy removed");
        }
        Ok(removed)
    }

    /// Returns all policies in evaluation order.
    pub fn policies(&self) -> Result<Vec<Policy>> {
        let policies = self
            .policies
            .read()
            .map_err(|_| ArbiterError::internal("lock poisoned"))?;
        Ok(policies.clone())
    }

    pub fn policy(&self, name: &str) -> Result<Option<Policy>> {
        let policies = self
            .policies
            .read()
            .map_err(|_| ArbiterError::internal("lock poisoned"))?;
        Ok(policies.iter().find(|p| p.name == name).cloned())
    }

    /// Loads every policy in a JSON policy document (one policy or an array).
    ///
    /// Returns the number of policies stored.
    pub fn load_policy_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ArbiterError::PolicyFile {
            path: path.to_path_buf(),
            source,
        })?;
        let policies =
            parse_policy_document(&text).map_err(|source| ArbiterError::PolicyDocument {
                path: path.to_path_buf(),
                source,
            })?;

        let count = policies.len();
        for policy in policies {
            self.add_policy(policy)?;
        }
        tracing::debug!(path = %path.display(), count, "policy file loaded");
        Ok(count)
    }

    // ========================================================================
    // Entities
    // ========================================================================

    pub fn register_entity(&self, create: EntityCreate) -> Result<Entity> {
        Ok(self.registry.register(create)?)
    }

    pub fn entity(&self, uri: &str) -> Result<Entity> {
        Ok(self.registry.get(uri)?)
    }

    /// Updates a registered entity. `uri` must match the URI in the body.
    pub fn update_entity(&self, uri: &str, update: EntityUpdate, mode: UpdateMode) -> Result<Entity> {
        if update.uri != uri {
            return Err(ArbiterError::UriMismatch {
                path: uri.to_string(),
                body: update.uri,
            });
        }
        Ok(self.registry.update(update, mode)?)
    }

    pub fn delete_entity(&self, uri: &str) -> Result<()> {
        Ok(self.registry.delete(uri)?)
    }

    pub fn entities(&self, offset: usize, limit: usize) -> Result<Vec<Entity>> {
        Ok(self.registry.list(offset, limit)?)
    }

    pub fn entity_count(&self) -> Result<usize> {
        Ok(self.registry.count()?)
    }

    // ========================================================================
    // Decisions
    // ========================================================================

    /// Decides a single request.
    pub fn check(&self, request: &CheckRequest) -> Result<CheckResponse> {
        Ok(self.explain(request)?.into())
    }

    /// Decides a single request and returns the per-policy results as well.
    pub fn explain(&self, request: &CheckRequest) -> Result<Decision> {
        let defaulted;
        let request = if request.action.trim().is_empty() {
            defaulted = request
                .clone()
                .with_action(self.options.default_action.clone());
            &defaulted
        } else {
            request
        };
        request.validate()?;

        let principal = self.resolve(&request.principal, EntityType::Principal)?;
        let resource = self.resolve(&request.resource, EntityType::Resource)?;

        let policies = self
            .policies
            .read()
            .map_err(|_| ArbiterError::internal("lock poisoned"))?;
        Ok(decide(&policies, &principal, &resource, &request.action))
    }

    /// Decides many requests. The output has the same length and order as the
    /// input; a request that fails is denied with the error as its reason.
    ///
    /// # Errors
    ///
    /// Returns [`ArbiterError::TooManyRequests`] if the batch exceeds the
    /// configured limit.
    pub fn bulk_check(&self, requests: &[CheckRequest]) -> Result<Vec<CheckResponse>> {
        let max = self.options.bulk_check_max_requests;
        if requests.len() > max {
            return Err(ArbiterError::TooManyRequests {
                count: requests.len(),
                max,
            });
        }

        Ok(requests
            .par_iter()
            .with_min_len(self.options.bulk_check_batch_size.max(1))
            .enumerate()
            .map(|(index, request)| {
                self.check(request).unwrap_or_else(|e| {
                    tracing::warn!(index, error = %e, "bulk check element failed; denying");
                    CheckResponse::deny(e.to_string())
                })
            })
            .collect())
    }

    /// Combines a check entity's inline attributes with those of every
    /// source that knows its URI.
    ///
    /// An unknown URI contributes no attributes. Two values for one key,
    /// from the request or from different sources, are a conflict.
    fn resolve(&self, check: &EntityCheck, slot: EntityType) -> Result<Attributes> {
        let mut attributes = check.attributes.clone();
        let Some(uri) = check.registered_uri() else {
            return Ok(attributes);
        };

        let mut found = false;
        for source in &self.sources {
            let Some((entity_type, fetched)) = source.fetch_attributes(uri)? else {
                continue;
            };
            found = true;

            if !entity_type.fits(slot) {
                return Err(ArbiterError::EntityTypeMismatch {
                    uri: uri.to_string(),
                    expected: slot,
                    actual: entity_type,
                });
            }

            for (key, value) in fetched {
                match attributes.get(&key) {
                    Some(existing) if *existing != value => {
                        tracing::warn!(uri, key = %key, source = source.name(), "attribute conflict");
                        return Err(ArbiterError::AttributeConflict {
                            uri: uri.to_string(),
                            key,
                        });
                    }
                    Some(_) => {}
                    None => {
                        attributes.insert(key, value);
                    }
                }
            }
        }

        if !found {
            tracing::debug!(uri, %slot, "entity not registered; using inline attributes only");
        }
        Ok(attributes)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_abac::{Condition, Rule};
    use arbiter_types::{AttributeValue, attributes};
    use std::collections::HashMap;
    use std::io::Write;
    use test_case::test_case;

    /// Fixed attribute source keyed by URI.
    #[derive(Debug, Default)]
    struct MapSource {
        entities: HashMap<String, (EntityType, Attributes)>,
    }

    impl MapSource {
        fn with(mut self, uri: &str, entity_type: EntityType, attrs: Attributes) -> Self {
            self.entities.insert(uri.to_string(), (entity_type, attrs));
            self
        }
    }

    impl AttributeSource for MapSource {
        fn name(&self) -> &str {
            "map"
        }

        fn fetch_attributes(&self, uri: &str) -> Result<Option<(EntityType, Attributes)>> {
            Ok(self.entities.get(uri).cloned())
        }
    }

    fn documents_policy() -> Policy {
        Policy::new("documents").with_rule(
            Rule::allow("admins-access-confidential")
                .for_action("access")
                .when_principal(Condition::equals("role", "admin"))
                .when_resource(Condition::equals("classification", "confidential")),
        )
    }

    fn engine() -> Arbiter {
        let engine = Arbiter::default();
        engine.add_policy(documents_policy()).unwrap();
        engine
    }

    fn admin_request(action: &str) -> CheckRequest {
        CheckRequest::new(
            EntityCheck::principal().with_attribute("role", "admin"),
            EntityCheck::resource().with_attribute("classification", "confidential"),
        )
        .with_action(action)
    }

    #[test_case("access", true; "allowed action")]
    #[test_case("delete", false; "other action")]
    fn test_admin_scenario(action: &str, allowed: bool) {
        let response = engine().check(&admin_request(action)).unwrap();
        assert_eq!(response.allowed, allowed);
        assert!(response.reason.is_some());
    }

    #[test]
    fn test_empty_action_uses_default() {
        let response = engine().check(&admin_request("")).unwrap();
        assert!(response.allowed);
    }

    #[test]
    fn test_no_policies_denies() {
        let response = Arbiter::default().check(&admin_request("access")).unwrap();
        assert!(!response.allowed);
        assert_eq!(
            response.reason.as_deref(),
            Some("Action denied by default because there are no policies")
        );
    }

    #[test]
    fn test_add_policy_overwrites_in_place() {
        let engine = engine();
        engine.add_policy(Policy::new("second")).unwrap();
        engine
            .add_policy(documents_policy().with_description("updated"))
            .unwrap();

        let names: Vec<String> = engine
            .policies()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["documents".to_string(), "second".to_string()]);
        assert_eq!(
            engine.policy("documents").unwrap().unwrap().description.as_deref(),
            Some("updated")
        );
    }

    #[test]
    fn test_remove_policy() {
        let engine = engine();
        assert!(engine.remove_policy("documents").unwrap());
        assert!(!engine.remove_policy("documents").unwrap());
        assert!(engine.policies().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let engine = Arbiter::default();
        let result = engine.add_policy(Policy::new(""));
        assert!(matches!(result, Err(ArbiterError::Policy(_))));
    }

    #[test]
    fn test_registered_attributes_join_the_check() {
        let engine = engine();
        engine
            .register_entity(
                EntityCreate::new(EntityType::Principal, attributes([("role", "admin")]))
                    .with_uri("ada"),
            )
            .unwrap();

        let request = CheckRequest::new(
            EntityCheck::principal().with_uri("ada"),
            EntityCheck::resource().with_attribute("classification", "confidential"),
        );
        assert!(engine.check(&request).unwrap().allowed);
    }

    #[test]
    fn test_unknown_uri_contributes_nothing() {
        let request = CheckRequest::new(
            EntityCheck::principal().with_uri("ghost"),
            EntityCheck::resource().with_attribute("classification", "confidential"),
        );
        assert!(!engine().check(&request).unwrap().allowed);
    }

    #[test]
    fn test_conflicting_attributes_are_rejected() {
        let engine = engine();
        engine
            .register_entity(
                EntityCreate::new(EntityType::Principal, attributes([("role", "user")]))
                    .with_uri("bob"),
            )
            .unwrap();

        let request = CheckRequest::new(
            EntityCheck::principal()
                .with_uri("bob")
                .with_attribute("role", "admin"),
            EntityCheck::resource().with_attribute("classification", "confidential"),
        );
        let err = engine.check(&request).unwrap_err();
        assert!(matches!(err, ArbiterError::AttributeConflict { ref key, .. } if key == "role"));
    }

    #[test]
    fn test_attributes_merge_across_sources() {
        let directory = MapSource::default().with(
            "ada",
            EntityType::Principal,
            attributes([("department", "legal")]),
        );
        let engine = engine().with_source(Arc::new(directory));
        engine
            .register_entity(
                EntityCreate::new(EntityType::Principal, attributes([("role", "admin")]))
                    .with_uri("ada"),
            )
            .unwrap();

        let request = CheckRequest::new(
            EntityCheck::principal().with_uri("ada"),
            EntityCheck::resource().with_attribute("classification", "confidential"),
        );
        let principal = engine.resolve(&request.principal, EntityType::Principal).unwrap();
        assert_eq!(
            principal,
            attributes([("department", "legal"), ("role", "admin")])
        );
        assert!(engine.check(&request).unwrap().allowed);
    }

    #[test]
    fn test_sources_disagreeing_is_a_conflict() {
        let directory =
            MapSource::default().with("ada", EntityType::Principal, attributes([("role", "user")]));
        let engine = engine().with_source(Arc::new(directory));
        engine
            .register_entity(
                EntityCreate::new(EntityType::Principal, attributes([("role", "admin")]))
                    .with_uri("ada"),
            )
            .unwrap();

        let request = CheckRequest::new(
            EntityCheck::principal().with_uri("ada"),
            EntityCheck::resource().with_attribute("classification", "confidential"),
        );
        let err = engine.check(&request).unwrap_err();
        assert!(matches!(
            err,
            ArbiterError::AttributeConflict { ref uri, ref key } if uri == "ada" && key == "role"
        ));

        let responses = engine.bulk_check(&[request]).unwrap();
        assert!(!responses[0].allowed);
    }

    #[test]
    fn test_extra_source_type_is_checked() {
        let catalog =
            MapSource::default().with("doc", EntityType::Resource, attributes([("kind", "report")]));
        let engine = engine().with_source(Arc::new(catalog));

        let request = CheckRequest::new(
            EntityCheck::principal().with_uri("doc"),
            EntityCheck::resource().with_attribute("classification", "confidential"),
        );
        assert!(matches!(
            engine.check(&request),
            Err(ArbiterError::EntityTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_resource_entity_cannot_be_principal() {
        let engine = engine();
        engine
            .register_entity(
                EntityCreate::new(EntityType::Resource, attributes([("role", "admin")]))
                    .with_uri("doc"),
            )
            .unwrap();

        let request = CheckRequest::new(
            EntityCheck::principal().with_uri("doc"),
            EntityCheck::resource().with_attribute("classification", "confidential"),
        );
        assert!(matches!(
            engine.check(&request),
            Err(ArbiterError::EntityTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_update_entity_requires_matching_uri() {
        let engine = engine();
        engine
            .register_entity(
                EntityCreate::new(EntityType::Principal, attributes([("role", "user")]))
                    .with_uri("ada"),
            )
            .unwrap();

        let update = EntityUpdate::new("ada", attributes([("role", "admin")]));
        assert!(matches!(
            engine.update_entity("bob", update.clone(), UpdateMode::Merge),
            Err(ArbiterError::UriMismatch { .. })
        ));

        let entity = engine.update_entity("ada", update, UpdateMode::Merge).unwrap();
        assert_eq!(
            entity.attributes_map().get("role"),
            Some(&AttributeValue::from("admin"))
        );
    }

    #[test]
    fn test_bulk_check_preserves_order_and_fails_closed() {
        let engine = engine();
        let invalid = CheckRequest::new(
            EntityCheck::principal(),
            EntityCheck::resource().with_attribute("classification", "confidential"),
        );
        let requests: Vec<CheckRequest> = (0..25)
            .map(|i| match i % 3 {
                0 => admin_request("access"),
                1 => admin_request("delete"),
                _ => invalid.clone(),
            })
            .collect();

        let responses = engine.bulk_check(&requests).unwrap();
        assert_eq!(responses.len(), requests.len());
        for (i, response) in responses.iter().enumerate() {
            assert_eq!(response.allowed, i % 3 == 0, "element {i}");
            if i % 3 == 2 {
                assert!(response.reason.as_deref().unwrap().contains("principal"));
            }
        }
    }

    #[test]
    fn test_bulk_check_limit() {
        let engine = Arbiter::new(EngineOptions::default().with_bulk_limits(2, 1));
        let requests = vec![admin_request("access"); 3];
        assert!(matches!(
            engine.bulk_check(&requests),
            Err(ArbiterError::TooManyRequests { count: 3, max: 2 })
        ));
        assert_eq!(engine.bulk_check(&requests[..2]).unwrap().len(), 2);
    }

    #[test]
    fn test_simple_policy() {
        let engine = Arbiter::default();
        let policy = engine
            .add_simple_policy("admin-access", &admin_request("access"))
            .unwrap();
        assert_eq!(policy.rules.len(), 1);
        assert!(engine.check(&admin_request("access")).unwrap().allowed);
        assert!(!engine.check(&admin_request("delete")).unwrap().allowed);
    }

    #[test]
    fn test_load_policy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"[{{"name": "a", "default_effect": "allow"}}, {{"name": "b", "rules": []}}]"#
        )
        .unwrap();

        let engine = Arbiter::default();
        assert_eq!(engine.load_policy_file(&path).unwrap(), 2);
        assert_eq!(engine.policies().unwrap().len(), 2);
    }

    #[test]
    fn test_load_missing_policy_file() {
        let engine = Arbiter::default();
        let result = engine.load_policy_file("/nonexistent/policies.json");
        assert!(matches!(result, Err(ArbiterError::PolicyFile { .. })));
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Arbiter>();
    }
}
