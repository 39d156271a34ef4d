//! Declarative resource layer
//!
//! Each managed Sentry resource kind implements [`Resource`]: a typed
//! declarative model plus Create/Read/Update/Delete/Import against the API.
//! The model type is both the config the host declares and the state handed
//! back after every operation.
//!
//! # Architecture
//!
//! - [`id`] - Composite identifier codec (`org/project/id`)
//! - [`validate`] - Static field constraints run before Create/Update
//! - [`registry`] - Schema declarations per kind, embedded from JSON
//! - [`sync`] - Lifecycle orchestration for one resource instance
//! - [`dispatch`] - Kind name + operation name to typed call, JSON in/out
//! - one module per kind holding its `expand_*`/`flatten_*` translators
//!
//! # Example
//!
//! ```ignore
//! use sentry_provider::resource::{metric_alert::MetricAlertResource, Resource};
//!
//! async fn refresh(client: &SentryClient) -> sentry_provider::Result<()> {
//!     match MetricAlertResource::read(client, "acme/web/123").await? {
//!         Some(state) => println!("{}", state.name),
//!         None => println!("gone, untrack it"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod filter;
pub mod id;
pub mod key;
pub mod metric_alert;
pub mod organization;
pub mod project;
mod registry;
pub mod rule;
pub mod sync;
pub mod validate;

use crate::error::{ProviderError, Result};
use crate::sentry::client::SentryClient;
use async_trait::async_trait;
use id::IdShape;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validate::ValidationError;

pub use dispatch::{execute, read_data_source, Operation};
pub use registry::*;

/// Managed resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Organization,
    Project,
    Key,
    Rule,
    MetricAlert,
    Filter,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Organization,
        ResourceKind::Project,
        ResourceKind::Key,
        ResourceKind::Rule,
        ResourceKind::MetricAlert,
        ResourceKind::Filter,
    ];

    /// Registry key, e.g. `metric_alert`
    pub const fn key(self) -> &'static str {
        match self {
            ResourceKind::Organization => "organization",
            ResourceKind::Project => "project",
            ResourceKind::Key => "key",
            ResourceKind::Rule => "rule",
            ResourceKind::MetricAlert => "metric_alert",
            ResourceKind::Filter => "filter",
        }
    }

    pub const fn id_shape(self) -> IdShape {
        match self {
            ResourceKind::Organization => IdShape::Org,
            ResourceKind::Project | ResourceKind::Filter => IdShape::OrgProject,
            ResourceKind::Key | ResourceKind::Rule | ResourceKind::MetricAlert => IdShape::OrgProjectId,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sentry_{}", self.key())
    }
}

impl FromStr for ResourceKind {
    type Err = ProviderError;

    /// Accepts both `metric_alert` and `sentry_metric_alert`
    fn from_str(s: &str) -> Result<Self> {
        let key = s.strip_prefix("sentry_").unwrap_or(s);
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| ProviderError::Config(format!("unknown resource kind: {s}")))
    }
}

/// Lifecycle of one resource instance as seen by the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Absent,
    Creating,
    Present,
    Updating,
    Deleting,
}

pub(crate) fn transition(kind: ResourceKind, id: &str, from: Lifecycle, to: Lifecycle) {
    tracing::info!(kind = %kind, id, ?from, ?to, "lifecycle transition");
}

/// Identifier and refreshed state returned by Create/Update/Import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied<M> {
    pub id: String,
    pub state: M,
}

/// One managed resource kind
///
/// Implementors provide the remote calls; validation, the post-write refresh
/// and lifecycle logging are shared through the provided methods.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Model: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync;

    const KIND: ResourceKind;

    fn validate(model: &Self::Model) -> Result<(), ValidationError>;

    /// Issue the create request. The returned state is flattened from the
    /// create response and only used if the follow-up Read cannot see the
    /// resource yet.
    async fn create_remote(client: &SentryClient, model: &Self::Model) -> Result<Applied<Self::Model>>;

    /// Authoritative snapshot. `Ok(None)` means the resource is gone remotely.
    async fn read(client: &SentryClient, id: &str) -> Result<Option<Self::Model>>;

    async fn update_remote(
        client: &SentryClient,
        id: &str,
        model: &Self::Model,
    ) -> Result<Applied<Self::Model>>;

    async fn delete_remote(client: &SentryClient, id: &str) -> Result<()>;

    /// Copy fields the API never returns from the declared model into the
    /// refreshed state.
    fn keep_write_only(_declared: &Self::Model, _state: &mut Self::Model) {}

    /// Copy server-assigned ids of nested blocks from the current remote
    /// state into the declared model, so an update edits them in place.
    fn carry_ids(_current: &Self::Model, _declared: &mut Self::Model) {}

    async fn create(client: &SentryClient, model: &Self::Model) -> Result<Applied<Self::Model>> {
        Self::validate(model)?;
        transition(Self::KIND, "", Lifecycle::Absent, Lifecycle::Creating);
        let created = Self::create_remote(client, model).await?;
        let mut applied = refresh::<Self>(client, created).await?;
        Self::keep_write_only(model, &mut applied.state);
        transition(Self::KIND, &applied.id, Lifecycle::Creating, Lifecycle::Present);
        Ok(applied)
    }

    async fn update(client: &SentryClient, id: &str, model: &Self::Model) -> Result<Applied<Self::Model>> {
        Self::validate(model)?;
        id::decode_for(Self::KIND, id)?;
        transition(Self::KIND, id, Lifecycle::Present, Lifecycle::Updating);
        let updated = Self::update_remote(client, id, model).await?;
        let mut applied = refresh::<Self>(client, updated).await?;
        Self::keep_write_only(model, &mut applied.state);
        transition(Self::KIND, &applied.id, Lifecycle::Updating, Lifecycle::Present);
        Ok(applied)
    }

    /// Delete; a resource that is already gone counts as deleted.
    async fn delete(client: &SentryClient, id: &str) -> Result<()> {
        id::decode_for(Self::KIND, id)?;
        transition(Self::KIND, id, Lifecycle::Present, Lifecycle::Deleting);
        match Self::delete_remote(client, id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::info!(kind = %Self::KIND, id, "already deleted remotely");
            }
            Err(e) => return Err(e),
        }
        transition(Self::KIND, id, Lifecycle::Deleting, Lifecycle::Absent);
        Ok(())
    }

    /// Adopt an existing remote resource from a human-supplied key.
    ///
    /// The key shape is checked before any request is sent.
    async fn import(client: &SentryClient, raw: &str) -> Result<Applied<Self::Model>> {
        let raw = raw.trim();
        id::decode_for(Self::KIND, raw)?;
        tracing::debug!(kind = %Self::KIND, id = raw, "importing");
        match Self::read(client, raw).await? {
            Some(state) => Ok(Applied {
                id: raw.to_string(),
                state,
            }),
            None => Err(ProviderError::not_found(raw)),
        }
    }
}

/// Re-read after a write so the state carries server-applied defaults
async fn refresh<R: Resource + ?Sized>(
    client: &SentryClient,
    written: Applied<R::Model>,
) -> Result<Applied<R::Model>> {
    match R::read(client, &written.id).await? {
        Some(state) => Ok(Applied {
            id: written.id,
            state,
        }),
        None => {
            tracing::warn!(kind = %R::KIND, id = %written.id, "not readable right after write, using write response");
            Ok(written)
        }
    }
}

/// Map a 404 on read to "absent"
pub(crate) fn absent_on_not_found<T>(kind: ResourceKind, id: &str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => {
            tracing::warn!(kind = %kind, id, "removing from state because it no longer exists in Sentry");
            transition(kind, id, Lifecycle::Present, Lifecycle::Absent);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_with_and_without_prefix() {
        assert_eq!("metric_alert".parse::<ResourceKind>().unwrap(), ResourceKind::MetricAlert);
        assert_eq!("sentry_filter".parse::<ResourceKind>().unwrap(), ResourceKind::Filter);
        assert!("sentry_team".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ResourceKind::MetricAlert.to_string(), "sentry_metric_alert");
    }

    #[test]
    fn test_id_shapes() {
        assert_eq!(ResourceKind::Organization.id_shape().parts(), 1);
        assert_eq!(ResourceKind::Filter.id_shape().parts(), 2);
        assert_eq!(ResourceKind::Rule.id_shape().parts(), 3);
        assert_eq!(ResourceKind::MetricAlert.id_shape().pattern(), "org/project/id");
    }
}
