//! # arbiter-client: HTTP client for a remote Arbiter service
//!
//! Wraps the check, entity registry and policy administration endpoints.
//! The client is always built from an explicit [`ClientConfig`]; there is
//! no process-wide instance.
//!
//! ```ignore
//! use arbiter_client::{Client, ClientConfig};
//! use arbiter_types::{CheckRequest, EntityCheck};
//!
//! let client = Client::new(ClientConfig::new("http://localhost:8000").with_api_key_from_env())?;
//! let request = CheckRequest::new(
//!     EntityCheck::principal().with_uri("user-1"),
//!     EntityCheck::resource().with_uri("doc-1"),
//! );
//! if client.is_allowed(&request).await {
//!     // ...
//! }
//! ```

mod client;
mod error;

pub use client::{API_KEY_ENV_VAR, API_KEY_HEADER, Client, ClientConfig};
pub use error::{ClientError, Result};
