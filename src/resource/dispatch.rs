//! Dispatch
//!
//! Maps a resource kind and an operation name to the typed implementation,
//! with JSON in and JSON out. This is the seam a host plugs into.

use super::filter::FilterResource;
use super::key::KeyResource;
use super::metric_alert::{self, MetricAlertResource};
use super::organization::{self, OrganizationResource};
use super::project::ProjectResource;
use super::rule::RuleResource;
use super::{id, sync, Resource, ResourceKind};
use crate::error::{ProviderError, Result};
use crate::sentry::client::SentryClient;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
        Operation::Import,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Import => "import",
        }
    }

    fn needs_id(self) -> bool {
        !matches!(self, Operation::Create)
    }

    fn needs_input(self) -> bool {
        matches!(self, Operation::Create | Operation::Update)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| ProviderError::Config(format!("unknown operation: {s}")))
    }
}

/// Run one operation on one resource instance.
///
/// Output shapes:
/// - create/update/import: `{"id": .., "state": {..}}`
/// - read: a [`sync::SyncOutcome`], `state` is null when the resource is gone
/// - delete: `{"id": .., "lifecycle": "absent"}`
pub async fn execute(
    client: &SentryClient,
    kind: ResourceKind,
    op: Operation,
    id: Option<&str>,
    input: Option<Value>,
) -> Result<Value> {
    tracing::debug!(%kind, %op, ?id, "execute");

    match kind {
        ResourceKind::Organization => run::<OrganizationResource>(client, op, id, input).await,
        ResourceKind::Project => run::<ProjectResource>(client, op, id, input).await,
        ResourceKind::Key => run::<KeyResource>(client, op, id, input).await,
        ResourceKind::Rule => run::<RuleResource>(client, op, id, input).await,
        ResourceKind::MetricAlert => run::<MetricAlertResource>(client, op, id, input).await,
        ResourceKind::Filter => run::<FilterResource>(client, op, id, input).await,
    }
}

/// One reconciliation step, see [`sync::apply`].
pub async fn apply(
    client: &SentryClient,
    kind: ResourceKind,
    tracked: Option<&str>,
    declared: Option<Value>,
) -> Result<Value> {
    tracing::debug!(%kind, ?tracked, declared = declared.is_some(), "apply");

    match kind {
        ResourceKind::Organization => apply_typed::<OrganizationResource>(client, tracked, declared).await,
        ResourceKind::Project => apply_typed::<ProjectResource>(client, tracked, declared).await,
        ResourceKind::Key => apply_typed::<KeyResource>(client, tracked, declared).await,
        ResourceKind::Rule => apply_typed::<RuleResource>(client, tracked, declared).await,
        ResourceKind::MetricAlert => apply_typed::<MetricAlertResource>(client, tracked, declared).await,
        ResourceKind::Filter => apply_typed::<FilterResource>(client, tracked, declared).await,
    }
}

/// Read-only lookup of an existing object.
///
/// `organization` takes a slug, `metric_alert` takes `org/project/internal_id`.
pub async fn read_data_source(client: &SentryClient, kind: ResourceKind, key: &str) -> Result<Value> {
    tracing::debug!(%kind, key, "read_data_source");

    let key = key.trim();
    match kind {
        ResourceKind::Organization => {
            let slug = id::decode(key, 1)?.remove(0);
            Ok(serde_json::to_value(organization::lookup(client, &slug).await?)?)
        }
        ResourceKind::MetricAlert => {
            let (org, project, internal_id) = id::decode_triple(key)?;
            Ok(serde_json::to_value(
                metric_alert::lookup(client, &org, &project, &internal_id).await?,
            )?)
        }
        other => Err(ProviderError::Config(format!("{other} has no data source"))),
    }
}

async fn run<R: Resource>(
    client: &SentryClient,
    op: Operation,
    id: Option<&str>,
    input: Option<Value>,
) -> Result<Value> {
    let id = match (op.needs_id(), id) {
        (true, None) => return Err(ProviderError::Config(format!("`{op}` needs an identifier"))),
        (_, id) => id.unwrap_or_default(),
    };
    let model = match (op.needs_input(), input) {
        (true, None) => return Err(ProviderError::Config(format!("`{op}` needs a resource config"))),
        (true, Some(input)) => Some(parse_model::<R>(input)?),
        (false, _) => None,
    };

    match (op, model) {
        (Operation::Create, Some(model)) => Ok(serde_json::to_value(R::create(client, &model).await?)?),
        (Operation::Update, Some(model)) => Ok(serde_json::to_value(R::update(client, id, &model).await?)?),
        (Operation::Read, _) => Ok(serde_json::to_value(sync::refresh::<R>(client, id).await?)?),
        (Operation::Delete, _) => {
            R::delete(client, id).await?;
            Ok(json!({ "id": id, "lifecycle": super::Lifecycle::Absent }))
        }
        (Operation::Import, _) => Ok(serde_json::to_value(R::import(client, id).await?)?),
        (Operation::Create | Operation::Update, None) => {
            Err(ProviderError::Config(format!("`{op}` needs a resource config")))
        }
    }
}

async fn apply_typed<R: Resource>(
    client: &SentryClient,
    tracked: Option<&str>,
    declared: Option<Value>,
) -> Result<Value> {
    let declared = declared.map(parse_model::<R>).transpose()?;
    let outcome = sync::apply::<R>(client, tracked, declared.as_ref()).await?;
    Ok(serde_json::to_value(outcome)?)
}

fn parse_model<R: Resource>(input: Value) -> Result<R::Model> {
    serde_json::from_value(input).map_err(|e| {
        tracing::warn!(kind = %R::KIND, error = %e, "invalid resource config");
        ProviderError::Json(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SentryClient {
        SentryClient::new("http://127.0.0.1:9/api/", Some("token".into())).unwrap()
    }

    #[test]
    fn test_operation_parses() {
        assert_eq!("import".parse::<Operation>().unwrap(), Operation::Import);
        assert!("upsert".parse::<Operation>().is_err());
    }

    #[tokio::test]
    async fn test_missing_id_fails_before_network() {
        let err = execute(&client(), ResourceKind::Rule, Operation::Read, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_input_fails_before_network() {
        let err = execute(&client(), ResourceKind::Key, Operation::Create, None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("needs a resource config"));
    }

    #[tokio::test]
    async fn test_unknown_field_is_rejected() {
        let input = json!({"organization": "acme", "project": "web", "colour": "red"});
        let err = execute(&client(), ResourceKind::Filter, Operation::Create, None, Some(input))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Json(_)));
    }

    #[tokio::test]
    async fn test_validation_runs_before_network() {
        let input = json!({
            "organization": "acme", "project": "web", "name": "x",
            "query": "", "aggregate": "count()", "time_window": 1.0,
            "threshold_type": 0, "comparison_delta": 100.0, "trigger": []
        });
        let err = execute(&client(), ResourceKind::MetricAlert, Operation::Create, None, Some(input))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[tokio::test]
    async fn test_import_shape_checked_before_network() {
        let err = execute(&client(), ResourceKind::MetricAlert, Operation::Import, Some("acme/web"), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("org/project/id"));
    }

    #[tokio::test]
    async fn test_data_source_only_for_some_kinds() {
        let err = read_data_source(&client(), ResourceKind::Filter, "acme/web")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no data source"));
    }
}
