//! Sentry Client
//!
//! The client context every resource operation receives explicitly. It owns
//! the HTTP wrapper, the auth token and the API base URL, and offers typed
//! JSON helpers on top of [`SentryHttpClient::send`].

use super::http::SentryHttpClient;
use crate::error::{ProviderError, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Default API base URL (sentry.io SaaS)
pub const DEFAULT_BASE_URL: &str = "https://sentry.io/api/";

/// API version prefix under the base URL
const API_VERSION: &str = "0/";

/// Main Sentry client
#[derive(Clone)]
pub struct SentryClient {
    pub http: SentryHttpClient,
    token: Option<String>,
    api_root: Url,
}

impl std::fmt::Debug for SentryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryClient")
            .field("api_root", &self.api_root.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SentryClient {
    /// Create a new Sentry client for `base_url` (e.g. `https://sentry.io/api/`)
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| ProviderError::Config(format!("invalid base URL {base_url:?}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let api_root = base
            .join(API_VERSION)
            .map_err(|e| ProviderError::Config(format!("invalid base URL {base_url:?}: {e}")))?;

        tracing::info!("Instantiating Sentry client for {}", api_root);

        Ok(Self {
            http: SentryHttpClient::new()?,
            token: token.filter(|t| !t.is_empty()),
            api_root,
        })
    }

    /// Build the absolute URL of an API path such as `projects/acme/web/`
    pub fn api_url(&self, path: &str) -> Result<String> {
        self.api_root
            .join(path)
            .map(String::from)
            .map_err(|e| ProviderError::Config(format!("invalid API path {path:?}: {e}")))
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.api_url(path)?;
        self.http
            .send(method, &url, self.token.as_deref(), body)
            .await
    }

    /// Make a GET request and decode the response
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.send(Method::GET, path, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Make a POST request with a JSON body and decode the response
    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let value = self.send(Method::POST, path, Some(&body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Make a PUT request with a JSON body and decode the response
    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let value = self.send(Method::PUT, path, Some(&body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Make a DELETE request, ignoring any response body
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }
}

/// Build an API path from literal parts and slugs, escaping every part.
///
/// `api_path(&["projects", "acme", "web", "rules"])` is `projects/acme/web/rules/`.
/// The trailing slash is required by the Sentry API.
pub fn api_path(parts: &[&str]) -> String {
    let mut path = String::new();
    for part in parts {
        path.push_str(&urlencoding::encode(part));
        path.push('/');
    }
    path
}
