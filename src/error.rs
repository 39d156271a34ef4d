//! Provider errors
//!
//! Every operation returns [`ProviderError`] to its immediate caller. The only
//! variant that is ever absorbed internally is [`ProviderError::NotFound`],
//! which Read turns into "absent" and Delete turns into success.

use serde_json::Value;
use thiserror::Error;

use crate::resource::validate::ValidationError;

pub type Result<T, E = ProviderError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// A field failed a static constraint. Raised before any request is sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A segment cannot be embedded in a composite identifier.
    #[error("cannot encode identifier segment {segment:?}: {reason}")]
    Encoding { segment: String, reason: &'static str },

    /// A composite identifier did not have the shape its resource kind needs.
    #[error("malformed identifier {id:?}: expected {expected_parts} segment(s) shaped like `{shape}`, got {actual_parts}")]
    MalformedIdentifier {
        id: String,
        shape: &'static str,
        expected_parts: usize,
        actual_parts: usize,
    },

    /// The API answered 404.
    #[error("resource not found: {path}")]
    NotFound { path: String },

    /// Any other non-2xx answer, with the decoded API payload kept verbatim.
    #[error("Sentry API request failed with status {status}: {payload}")]
    RemoteApi { status: u16, payload: Value },

    /// The second of two dependent sub-updates failed after the first was applied.
    /// `state` is the remote state read back after the failure, if it could be read.
    #[error("partial update of {resource}: `{completed}` was applied but `{failed}` failed, remote state now mixes old and new settings: {source}")]
    PartialUpdate {
        resource: String,
        completed: &'static str,
        failed: &'static str,
        #[source]
        source: Box<ProviderError>,
        state: Option<Value>,
    },

    /// The resource exists remotely but a follow-up step of its creation
    /// failed. `id` must be tracked so the next pass updates instead of
    /// creating it again.
    #[error("{resource} was created as {id} but `{failed}` failed: {source}")]
    PartialCreate {
        resource: String,
        id: String,
        failed: &'static str,
        #[source]
        source: Box<ProviderError>,
        state: Option<Value>,
    },

    /// A 2xx answer that lacks something the operation needs (e.g. the new id).
    #[error("unexpected response from Sentry: {0}")]
    UnexpectedResponse(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid provider configuration: {0}")]
    Config(String),
}

impl ProviderError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Identifier of a resource that was created despite the error.
    pub fn created_id(&self) -> Option<&str> {
        match self {
            Self::PartialCreate { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Remote state carried by a partial failure, if it could be read.
    pub fn partial_state(&self) -> Option<&Value> {
        match self {
            Self::PartialUpdate { state, .. } | Self::PartialCreate { state, .. } => state.as_ref(),
            _ => None,
        }
    }

    /// True for the 404 case the synchronizer absorbs.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
