//! Async HTTP client for a remote Arbiter decision service.

use std::time::Duration;

use arbiter_abac::Policy;
use arbiter_types::{CheckRequest, CheckResponse, Entity, EntityCreate, EntityUpdate};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "WAY-API-KEY";

/// Environment variable read by [`ClientConfig::with_api_key_from_env`].
pub const API_KEY_ENV_VAR: &str = "WAY_API_KEY";

const USER_AGENT: &str = concat!("arbiter/", env!("CARGO_PKG_VERSION"));

/// Check answers arrive either as a bare boolean or as a full response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CheckOutcome {
    Bool(bool),
    Response(CheckResponse),
}

impl From<CheckOutcome> for CheckResponse {
    fn from(outcome: CheckOutcome) -> Self {
        match outcome {
            CheckOutcome::Bool(allowed) => CheckResponse {
                allowed,
                reason: None,
            },
            CheckOutcome::Response(response) => response,
        }
    }
}

/// Connection settings for [`Client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub admin_prefix: String,
    pub entities_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
            admin_prefix: "/admin".to_string(),
            entities_path: "/admin/fetchers/registry/entities".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Use `WAY_API_KEY` when no key has been set explicitly.
    pub fn with_api_key_from_env(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var(API_KEY_ENV_VAR)
                .ok()
                .filter(|key| !key.is_empty());
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_admin_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.admin_prefix = prefix.into();
        self
    }

    pub fn with_entities_path(mut self, path: impl Into<String>) -> Self {
        self.entities_path = path.into();
        self
    }
}

/// Client for the check, entity and policy endpoints.
///
/// Requests are never retried. Non-2xx responses surface as
/// [`ClientError::Protocol`] with the status and response body.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
}

impl Client {
    /// Builds the underlying HTTP client. Fails if the API key is not a
    /// valid header value or TLS initialisation fails.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(key)
                .map_err(|_| ClientError::Validation("API key is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static("way-api-key"), value);
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ========================================================================
    // Checks
    // ========================================================================

    /// Evaluates one request on the server.
    pub async fn check(&self, request: &CheckRequest) -> Result<CheckResponse> {
        request.validate()?;
        let url = self.url("/check", None)?;
        let outcome: CheckOutcome = self.send(self.http.post(url).json(request)).await?;
        Ok(outcome.into())
    }

    /// Evaluates several requests; the response keeps the input order.
    ///
    /// Requests that fail local validation are not sent and answer with a
    /// deny carrying the validation message. The rest go out in one call.
    pub async fn bulk_check(&self, requests: &[CheckRequest]) -> Result<Vec<CheckResponse>> {
        let mut slots: Vec<Option<CheckResponse>> = Vec::with_capacity(requests.len());
        let mut valid = Vec::with_capacity(requests.len());
        for (index, request) in requests.iter().enumerate() {
            match request.validate() {
                Ok(()) => {
                    slots.push(None);
                    valid.push(request);
                }
                Err(e) => {
                    warn!(index, error = %e, "bulk check request invalid, denying");
                    slots.push(Some(CheckResponse::deny(e.to_string())));
                }
            }
        }
        if valid.is_empty() {
            return Ok(slots.into_iter().flatten().collect());
        }

        let url = self.url("/check/bulk", None)?;
        let outcomes: Vec<CheckOutcome> = self.send(self.http.post(url).json(&valid)).await?;
        if outcomes.len() != valid.len() {
            return Err(ClientError::Validation(format!(
                "bulk check returned {} responses for {} requests",
                outcomes.len(),
                valid.len()
            )));
        }

        let mut answers = outcomes.into_iter().map(CheckResponse::from);
        Ok(slots
            .into_iter()
            .map(|slot| {
                slot.or_else(|| answers.next())
                    .unwrap_or_else(|| CheckResponse::deny("missing bulk check answer"))
            })
            .collect())
    }

    /// Fail-closed convenience over [`Client::check`]: any error is a deny.
    pub async fn is_allowed(&self, request: &CheckRequest) -> bool {
        match self.check(request).await {
            Ok(response) => response.allowed,
            Err(e) => {
                warn!(error = %e, "check failed, denying");
                false
            }
        }
    }

    // ========================================================================
    // Entities
    // ========================================================================

    pub async fn register_entity(&self, entity: &EntityCreate) -> Result<Entity> {
        entity.validate()?;
        let url = self.url(&self.config.entities_path, None)?;
        self.send(self.http.post(url).json(entity)).await
    }

    pub async fn get_entity(&self, uri: &str) -> Result<Entity> {
        let url = self.url(&self.config.entities_path, Some(uri))?;
        self.send(self.http.get(url)).await
    }

    /// Updates attributes of `update.uri`. With `override_all` the stored
    /// attributes are replaced; otherwise they are merged.
    pub async fn update_entity(&self, update: &EntityUpdate, override_all: bool) -> Result<Entity> {
        update.validate()?;
        let url = self.url(&self.config.entities_path, Some(&update.uri))?;
        let request = self
            .http
            .put(url)
            .query(&[("override", override_all)])
            .json(update);
        self.send(request).await
    }

    pub async fn delete_entity(&self, uri: &str) -> Result<bool> {
        let url = self.url(&self.config.entities_path, Some(uri))?;
        self.send(self.http.delete(url)).await
    }

    pub async fn list_entities(&self, offset: usize, limit: usize) -> Result<Vec<Entity>> {
        let url = self.url(&self.config.entities_path, None)?;
        let request = self
            .http
            .get(url)
            .query(&[("offset", offset), ("limit", limit)]);
        self.send(request).await
    }

    pub async fn count_entities(&self) -> Result<usize> {
        let path = format!("{}/$count", self.config.entities_path.trim_end_matches('/'));
        let url = self.url(&path, None)?;
        self.send(self.http.get(url)).await
    }

    // ========================================================================
    // Policies
    // ========================================================================

    pub async fn create_policy(&self, policy: &Policy) -> Result<Policy> {
        policy
            .validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        let url = self.url(&self.policies_path(), None)?;
        self.send(self.http.post(url).json(policy)).await
    }

    /// Asks the server to build a single-rule allow policy from `request`.
    pub async fn create_simple_policy(&self, name: &str, request: &CheckRequest) -> Result<Policy> {
        if name.trim().is_empty() {
            return Err(ClientError::Validation("policy name must not be empty".into()));
        }
        request.validate()?;
        let url = self.url(&format!("{}/simple", self.policies_path()), None)?;
        let request = self.http.post(url).query(&[("name", name)]).json(request);
        self.send(request).await
    }

    pub async fn get_policies(&self) -> Result<Vec<Policy>> {
        let url = self.url(&self.policies_path(), None)?;
        self.send(self.http.get(url)).await
    }

    pub async fn get_policy(&self, name: &str) -> Result<Policy> {
        let url = self.url(&self.policies_path(), Some(name))?;
        self.send(self.http.get(url)).await
    }

    pub async fn delete_policy(&self, name: &str) -> Result<bool> {
        let url = self.url(&self.policies_path(), Some(name))?;
        self.send(self.http.delete(url)).await
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    fn policies_path(&self) -> String {
        format!("{}/policies", self.config.admin_prefix.trim_end_matches('/'))
    }

    /// Joins `path` onto the endpoint and appends `segment` percent-encoded.
    fn url(&self, path: &str, segment: Option<&str>) -> Result<Url> {
        let base = self.config.endpoint.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{path}"))
            .map_err(|e| ClientError::Validation(format!("invalid endpoint URL: {e}")))?;
        if let Some(segment) = segment {
            url.path_segments_mut()
                .map_err(|()| ClientError::Validation("endpoint URL cannot have a path".into()))?
                .pop_if_empty()
                .push(segment);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;
        debug!(%url, status = status.as_u16(), "response received");

        if !status.is_success() {
            return Err(ClientError::Protocol {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|source| ClientError::Decode { source, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_abac::Rule;
    use arbiter_types::{EntityCheck, EntityType, attributes};
    use serde_json::json;
    use test_case::test_case;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> Client {
        Client::new(ClientConfig::new(server.uri())).unwrap()
    }

    fn admin_request(action: &str) -> CheckRequest {
        CheckRequest::new(
            EntityCheck::principal().with_attribute("role", "admin"),
            EntityCheck::resource().with_uri("doc-1"),
        )
        .with_action(action)
    }

    fn entity_json(uri: &str) -> serde_json::Value {
        json!({
            "uri": uri,
            "type": "resource",
            "attributes": [{
                "key": "classification",
                "value": "confidential",
                "updated_at": "2026-01-01T00:00:00Z",
                "registered_at": "2026-01-01T00:00:00Z"
            }],
            "registered_at": "2026-01-01T00:00:00Z"
        })
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, "http://localhost:8000");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.entities_path, "/admin/fetchers/registry/entities");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_explicit_api_key_wins_over_env() {
        let config = ClientConfig::default()
            .with_api_key("explicit")
            .with_api_key_from_env();
        assert_eq!(config.api_key.as_deref(), Some("explicit"));
    }

    #[test]
    fn test_invalid_api_key_is_rejected() {
        let result = Client::new(ClientConfig::default().with_api_key("bad\nkey"));
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_check_posts_request_and_sends_api_key() {
        let server = MockServer::start().await;
        let request = admin_request("access");
        Mock::given(method("POST"))
            .and(path("/check"))
            .and(header(API_KEY_HEADER, "secret"))
            .and(body_json(&request))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "allowed": true,
                "reason": "Rule 'admin-rule' allowed the action in policy 'admin'"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = Client::new(ClientConfig::new(server.uri()).with_api_key("secret")).unwrap();
        let response = client.check(&request).await.unwrap();
        assert!(response.allowed);
        assert!(response.reason.unwrap().contains("admin-rule"));
    }

    #[tokio::test]
    async fn test_check_accepts_bare_boolean() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let response = client.check(&admin_request("access")).await.unwrap();
        assert!(response.allowed);
        assert_eq!(response.reason, None);
        assert!(client.is_allowed(&admin_request("access")).await);
    }

    #[tokio::test]
    async fn test_check_rejects_invalid_request_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let request = CheckRequest::new(EntityCheck::principal(), EntityCheck::resource().with_uri("doc-1"));
        let err = client_for(&server).check(&request).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test_case(400, "Bad Request" ; "bad request")]
    #[test_case(401, "Unauthorized" ; "unauthorized")]
    #[test_case(500, "Internal Server Error" ; "server error")]
    #[tokio::test]
    async fn test_non_success_is_protocol_error(status: u16, body: &str) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .check(&admin_request("access"))
            .await
            .unwrap_err();
        match err {
            ClientError::Protocol { status: s, body: b } => {
                assert_eq!(s, status);
                assert_eq!(b, body);
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .check(&admin_request("access"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode { ref body, .. } if body == "not json"));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"allowed": true}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = Client::new(
            ClientConfig::new(server.uri()).with_timeout(Duration::from_millis(50)),
        )
        .unwrap();
        let err = client.check(&admin_request("access")).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn test_is_allowed_fails_closed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(!client_for(&server).is_allowed(&admin_request("access")).await);
    }

    #[tokio::test]
    async fn test_bulk_check_preserves_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/check/bulk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"allowed": true, "reason": "first"},
                {"allowed": false, "reason": "second"}
            ])))
            .mount(&server)
            .await;

        let responses = client_for(&server)
            .bulk_check(&[admin_request("access"), admin_request("delete")])
            .await
            .unwrap();
        assert_eq!(responses.len(), 2);
        assert!(responses[0].allowed);
        assert!(!responses[1].allowed);
        assert_eq!(responses[1].reason.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_bulk_check_denies_invalid_requests_in_place() {
        let server = MockServer::start().await;
        let first = admin_request("access");
        let invalid = CheckRequest::new(
            EntityCheck::principal(),
            EntityCheck::resource().with_uri("doc-1"),
        );
        let third = admin_request("delete");
        Mock::given(method("POST"))
            .and(path("/check/bulk"))
            .and(body_json(json!([&first, &third])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                true,
                {"allowed": false, "reason": "third"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let responses = client_for(&server)
            .bulk_check(&[first, invalid, third])
            .await
            .unwrap();
        assert_eq!(responses.len(), 3);
        assert!(responses[0].allowed);
        assert!(!responses[1].allowed);
        assert!(responses[1].reason.as_deref().unwrap().starts_with("principal:"));
        assert!(!responses[2].allowed);
        assert_eq!(responses[2].reason.as_deref(), Some("third"));
    }

    #[tokio::test]
    async fn test_bulk_check_all_invalid_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let invalid = CheckRequest::new(
            EntityCheck::principal().with_uri("user-1"),
            EntityCheck::resource(),
        );
        let responses = client_for(&server).bulk_check(&[invalid]).await.unwrap();
        assert_eq!(responses.len(), 1);
        assert!(!responses[0].allowed);
    }

    #[tokio::test]
    async fn test_bulk_check_length_mismatch_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/check/bulk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"allowed": true}])))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .bulk_check(&[admin_request("access"), admin_request("delete")])
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_and_get_entity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/fetchers/registry/entities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(entity_json("doc-1")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/fetchers/registry/entities/doc-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(entity_json("doc-1")))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let create = EntityCreate::new(
            EntityType::Resource,
            attributes([("classification", "confidential")]),
        )
        .with_uri("doc-1");
        let registered = client.register_entity(&create).await.unwrap();
        assert_eq!(registered.uri, "doc-1");

        let fetched = client.get_entity("doc-1").await.unwrap();
        assert_eq!(fetched.entity_type, EntityType::Resource);
        assert_eq!(fetched.updated_at, None);
        assert_eq!(
            fetched.attribute("classification").map(|a| a.value.to_string()),
            Some("confidential".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_missing_entity_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/fetchers/registry/entities/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Entity not found"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_entity("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test_case(true, "true" ; "override")]
    #[test_case(false, "false" ; "merge")]
    #[tokio::test]
    async fn test_update_entity_sends_override_flag(override_all: bool, expected: &str) {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/admin/fetchers/registry/entities/doc-1"))
            .and(query_param("override", expected))
            .respond_with(ResponseTemplate::new(200).set_body_json(entity_json("doc-1")))
            .expect(1)
            .mount(&server)
            .await;

        let update = EntityUpdate::new("doc-1", attributes([("owner", "alice")]));
        let entity = client_for(&server)
            .update_entity(&update, override_all)
            .await
            .unwrap();
        assert_eq!(entity.uri, "doc-1");
    }

    #[tokio::test]
    async fn test_entity_uri_is_percent_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/admin/fetchers/registry/entities/a%20b"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client_for(&server).delete_entity("a b").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_and_count_entities() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/fetchers/registry/entities"))
            .and(query_param("offset", "0"))
            .and(query_param("limit", "10"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([entity_json("doc-1"), entity_json("doc-2")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/admin/fetchers/registry/entities/$count"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(2)))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let entities = client.list_entities(0, 10).await.unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(client.count_entities().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_policy_endpoints_use_admin_prefix() {
        let server = MockServer::start().await;
        let policy = Policy::new("admin").with_rule(
            Rule::allow("admin-rule")
                .for_action("access")
                .when_principal(arbiter_abac::Condition::equals("attributes.role", "admin")),
        );

        Mock::given(method("POST"))
            .and(path("/control/policies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&policy))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/control/policies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![&policy]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/control/policies/admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&policy))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/control/policies/admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .mount(&server)
            .await;

        let client =
            Client::new(ClientConfig::new(server.uri()).with_admin_prefix("/control")).unwrap();
        assert_eq!(client.create_policy(&policy).await.unwrap(), policy);
        assert_eq!(client.get_policies().await.unwrap(), vec![policy.clone()]);
        assert_eq!(client.get_policy("admin").await.unwrap(), policy);
        assert!(client.delete_policy("admin").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_simple_policy_passes_name() {
        let server = MockServer::start().await;
        let request = admin_request("access");
        let policy = Policy::simple_from_request("doc-access", &request);
        Mock::given(method("POST"))
            .and(path("/admin/policies/simple"))
            .and(query_param("name", "doc-access"))
            .and(body_json(&request))
            .respond_with(ResponseTemplate::new(200).set_body_json(&policy))
            .expect(1)
            .mount(&server)
            .await;

        let created = client_for(&server)
            .create_simple_policy("doc-access", &request)
            .await
            .unwrap();
        assert_eq!(created.name, "doc-access");

        let err = client_for(&server)
            .create_simple_policy(" ", &request)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
