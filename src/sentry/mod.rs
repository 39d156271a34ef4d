//! Sentry API interaction module
//!
//! Typed records and endpoint functions for the parts of the Sentry REST API
//! the provider manages, on top of a small HTTP wrapper.
//!
//! # Module Structure
//!
//! - [`client`] - Client context passed to every operation (base URL, token)
//! - [`http`] - HTTP wrapper that classifies responses into errors
//! - [`organizations`], [`projects`], [`keys`], [`rules`], [`metric_alerts`],
//!   [`filters`] - Records and endpoints per resource
//!
//! # Example
//!
//! ```ignore
//! use sentry_provider::sentry::{client::SentryClient, projects};
//!
//! async fn example() -> sentry_provider::Result<()> {
//!     let client = SentryClient::new("https://sentry.io/api/", Some("token".into()))?;
//!     let project = projects::get_project(&client, "acme", "web").await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod filters;
pub mod http;
pub mod keys;
pub mod metric_alerts;
pub mod organizations;
pub mod projects;
pub mod rules;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept ids the API returns either as strings or as bare numbers.
pub(crate) fn opt_string_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
