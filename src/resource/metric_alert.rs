//! `sentry_metric_alert`
//!
//! A metric alert rule owns an ordered list of triggers, each owning an
//! ordered list of actions. Trigger and action ids are assigned by Sentry;
//! they are sent back on update so the server edits them in place instead of
//! re-creating them.

use super::id::{self, decode_triple};
use super::validate::{
    validate, validate_opt, Constraint, ValidationError, COMPARISON_DELTAS, THRESHOLD_TYPES,
    TRIGGER_LABELS,
};
use super::{absent_on_not_found, Applied, Resource, ResourceKind};
use crate::error::{ProviderError, Result};
use crate::sentry::client::SentryClient;
use crate::sentry::metric_alerts as api;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Declarative metric alert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricAlert {
    pub organization: String,
    pub project: String,
    pub name: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub dataset: Option<String>,
    pub query: String,
    pub aggregate: String,
    /// Minutes
    pub time_window: f64,
    pub threshold_type: i64,
    #[serde(default)]
    pub resolve_threshold: Option<f64>,
    /// Minutes; one of [`COMPARISON_DELTAS`] when set
    #[serde(default)]
    pub comparison_delta: Option<f64>,
    #[serde(default)]
    pub owner: Option<String>,
    pub trigger: Vec<Trigger>,
    /// Server-assigned alert id
    #[serde(default)]
    pub internal_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Trigger {
    #[serde(default)]
    pub id: Option<String>,
    pub label: String,
    pub threshold_type: i64,
    pub alert_threshold: f64,
    #[serde(default)]
    pub resolve_threshold: Option<f64>,
    #[serde(default)]
    pub action: Vec<TriggerAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerAction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub target_type: String,
    pub target_identifier: String,
    #[serde(default)]
    pub integration_id: Option<i64>,
}

pub fn expand_metric_alert(alert: &MetricAlert) -> api::MetricAlert {
    api::MetricAlert {
        id: alert.internal_id.clone(),
        name: Some(alert.name.clone()),
        environment: alert.environment.clone(),
        data_set: alert.dataset.clone(),
        query: Some(alert.query.clone()),
        aggregate: Some(alert.aggregate.clone()),
        time_window: Some(alert.time_window),
        threshold_type: Some(alert.threshold_type),
        resolve_threshold: alert.resolve_threshold,
        comparison_delta: alert.comparison_delta,
        owner: alert.owner.clone(),
        projects: vec![alert.project.clone()],
        triggers: Some(alert.trigger.iter().map(expand_trigger).collect()),
        date_created: None,
    }
}

fn expand_trigger(trigger: &Trigger) -> api::MetricAlertTrigger {
    api::MetricAlertTrigger {
        id: trigger.id.clone(),
        label: Some(trigger.label.clone()),
        threshold_type: Some(trigger.threshold_type),
        alert_threshold: Some(trigger.alert_threshold),
        resolve_threshold: trigger.resolve_threshold,
        actions: Some(trigger.action.iter().map(expand_action).collect()),
    }
}

fn expand_action(action: &TriggerAction) -> api::MetricAlertTriggerAction {
    api::MetricAlertTriggerAction {
        id: action.id.clone(),
        type_: Some(action.type_.clone()),
        target_type: Some(action.target_type.clone()),
        target_identifier: Some(action.target_identifier.clone()),
        integration_id: action.integration_id,
    }
}

/// Flatten a record read from `org`/`project`.
///
/// The project reported by the alert wins when it names exactly one.
pub fn flatten_metric_alert(org: &str, project: &str, alert: &api::MetricAlert) -> MetricAlert {
    let project = match alert.projects.as_slice() {
        [only] => only.clone(),
        _ => project.to_string(),
    };

    MetricAlert {
        organization: org.to_string(),
        project,
        name: alert.name.clone().unwrap_or_default(),
        environment: alert.environment.clone(),
        dataset: alert.data_set.clone(),
        query: alert.query.clone().unwrap_or_default(),
        aggregate: alert.aggregate.clone().unwrap_or_default(),
        time_window: alert.time_window.unwrap_or_default(),
        threshold_type: alert.threshold_type.unwrap_or_default(),
        resolve_threshold: alert.resolve_threshold,
        comparison_delta: alert.comparison_delta,
        owner: alert.owner.clone(),
        trigger: alert
            .triggers
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(flatten_trigger)
            .collect(),
        internal_id: alert.id.clone(),
    }
}

fn flatten_trigger(trigger: &api::MetricAlertTrigger) -> Trigger {
    Trigger {
        id: trigger.id.clone(),
        label: trigger.label.clone().unwrap_or_default(),
        threshold_type: trigger.threshold_type.unwrap_or_default(),
        alert_threshold: trigger.alert_threshold.unwrap_or_default(),
        resolve_threshold: trigger.resolve_threshold,
        action: trigger
            .actions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(flatten_action)
            .collect(),
    }
}

fn flatten_action(action: &api::MetricAlertTriggerAction) -> TriggerAction {
    TriggerAction {
        id: action.id.clone(),
        type_: action.type_.clone().unwrap_or_default(),
        target_type: action.target_type.clone().unwrap_or_default(),
        target_identifier: action.target_identifier.clone().unwrap_or_default(),
        integration_id: action.integration_id,
    }
}

fn alert_id(org: &str, project: &str, alert: &api::MetricAlert) -> Result<String> {
    let alert_id = alert
        .id
        .as_deref()
        .ok_or_else(|| ProviderError::UnexpectedResponse("metric alert response has no id".into()))?;
    id::encode(&[org, project, alert_id])
}

pub struct MetricAlertResource;

#[async_trait]
impl Resource for MetricAlertResource {
    type Model = MetricAlert;

    const KIND: ResourceKind = ResourceKind::MetricAlert;

    fn validate(alert: &MetricAlert) -> Result<(), ValidationError> {
        validate_opt(
            "comparison_delta",
            alert.comparison_delta,
            &Constraint::OneOf(COMPARISON_DELTAS),
        )?;
        validate("threshold_type", alert.threshold_type, &Constraint::OneOf(THRESHOLD_TYPES))?;
        for trigger in &alert.trigger {
            validate("trigger.label", trigger.label.as_str(), &Constraint::OneOfStr(TRIGGER_LABELS))?;
            validate(
                "trigger.threshold_type",
                trigger.threshold_type,
                &Constraint::OneOf(THRESHOLD_TYPES),
            )?;
        }
        Ok(())
    }

    async fn create_remote(client: &SentryClient, alert: &MetricAlert) -> Result<Applied<MetricAlert>> {
        let request = expand_metric_alert(alert);
        tracing::info!(
            org = %alert.organization,
            project = %alert.project,
            name = %alert.name,
            "Creating metric alert"
        );
        let created =
            api::create_metric_alert(client, &alert.organization, &alert.project, &request).await?;

        Ok(Applied {
            id: alert_id(&alert.organization, &alert.project, &created)?,
            state: flatten_metric_alert(&alert.organization, &alert.project, &created),
        })
    }

    async fn read(client: &SentryClient, id: &str) -> Result<Option<MetricAlert>> {
        let (org, project, alert_id) = decode_triple(id)?;
        tracing::debug!(%org, %project, %alert_id, "Reading metric alert");
        let alert = absent_on_not_found(
            Self::KIND,
            id,
            api::get_metric_alert(client, &org, &project, &alert_id).await,
        )?;
        Ok(alert.map(|alert| flatten_metric_alert(&org, &project, &alert)))
    }

    async fn update_remote(
        client: &SentryClient,
        id: &str,
        alert: &MetricAlert,
    ) -> Result<Applied<MetricAlert>> {
        let (org, project, alert_id) = decode_triple(id)?;
        let mut request = expand_metric_alert(alert);
        request.id.get_or_insert_with(|| alert_id.clone());

        tracing::debug!(%org, %project, %alert_id, "Updating metric alert");
        let updated = api::update_metric_alert(client, &org, &project, &alert_id, &request).await?;

        Ok(Applied {
            id: alert_id_or(&org, &project, &updated, id)?,
            state: flatten_metric_alert(&org, &project, &updated),
        })
    }

    /// Triggers and their actions are matched by position.
    fn carry_ids(current: &MetricAlert, declared: &mut MetricAlert) {
        if declared.internal_id.is_none() {
            declared.internal_id = current.internal_id.clone();
        }
        for (trigger, known) in declared.trigger.iter_mut().zip(&current.trigger) {
            if trigger.id.is_none() {
                trigger.id = known.id.clone();
            }
            for (action, known) in trigger.action.iter_mut().zip(&known.action) {
                if action.id.is_none() {
                    action.id = known.id.clone();
                }
            }
        }
    }

    async fn delete_remote(client: &SentryClient, id: &str) -> Result<()> {
        let (org, project, alert_id) = decode_triple(id)?;
        tracing::debug!(%org, %project, %alert_id, "Deleting metric alert");
        api::delete_metric_alert(client, &org, &project, &alert_id).await
    }
}

/// Update responses may omit the id; keep the one we already have.
fn alert_id_or(org: &str, project: &str, alert: &api::MetricAlert, current: &str) -> Result<String> {
    match alert.id {
        Some(_) => alert_id(org, project, alert),
        None => Ok(current.to_string()),
    }
}

/// Data source: look up an existing alert by its internal id. A missing alert
/// is an error here, unlike a managed resource read.
pub async fn lookup(
    client: &SentryClient,
    org: &str,
    project: &str,
    internal_id: &str,
) -> Result<Applied<MetricAlert>> {
    tracing::debug!(%org, %project, %internal_id, "Reading metric alert data source");
    let alert = api::get_metric_alert(client, org, project, internal_id).await?;
    Ok(Applied {
        id: alert_id_or(org, project, &alert, &id::encode(&[org, project, internal_id])?)?,
        state: flatten_metric_alert(org, project, &alert),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::test_support::assert_restricted_eq;
    use serde_json::json;

    fn sample() -> MetricAlert {
        serde_json::from_value(json!({
            "organization": "acme",
            "project": "web",
            "name": "High error rate",
            "dataset": "events",
            "query": "level:error",
            "aggregate": "count()",
            "time_window": 10.0,
            "threshold_type": 0,
            "trigger": [{
                "label": "critical",
                "threshold_type": 0,
                "alert_threshold": 100.0,
                "action": [{
                    "type": "email",
                    "target_type": "user",
                    "target_identifier": "42"
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_expand_omits_unset_optional_fields() {
        let body = serde_json::to_value(expand_metric_alert(&sample())).unwrap();
        assert!(body.get("environment").is_none());
        assert!(body.get("comparisonDelta").is_none());
        assert!(body.get("resolveThreshold").is_none());
        assert!(body.get("id").is_none());
        assert_eq!(body["projects"], json!(["web"]));
        assert_eq!(body["triggers"][0]["actions"][0]["targetIdentifier"], "42");
        assert!(body["triggers"][0]["actions"][0].get("integrationId").is_none());
    }

    #[test]
    fn test_expand_carries_server_ids() {
        let mut alert = sample();
        alert.internal_id = Some("123".into());
        alert.trigger[0].id = Some("7".into());
        alert.trigger[0].action[0].id = Some("8".into());
        let body = serde_json::to_value(expand_metric_alert(&alert)).unwrap();
        assert_eq!(body["id"], "123");
        assert_eq!(body["triggers"][0]["id"], "7");
        assert_eq!(body["triggers"][0]["actions"][0]["id"], "8");
    }

    #[test]
    fn test_explicit_zero_is_sent() {
        let mut alert = sample();
        alert.resolve_threshold = Some(0.0);
        let body = serde_json::to_value(expand_metric_alert(&alert)).unwrap();
        assert_eq!(body["resolveThreshold"], json!(0.0));
    }

    #[test]
    fn test_round_trip_restricted_to_declared_fields() {
        let mut alert = sample();
        alert.environment = Some("prod".into());
        alert.comparison_delta = Some(10080.0);
        alert.trigger[0].action[0].integration_id = Some(5);
        let state = flatten_metric_alert("acme", "web", &expand_metric_alert(&alert));
        assert_restricted_eq(
            &serde_json::to_value(&alert).unwrap(),
            &serde_json::to_value(&state).unwrap(),
            "metric_alert",
        );
    }

    #[test]
    fn test_flatten_empty_triggers_is_explicit() {
        let record: api::MetricAlert =
            serde_json::from_value(json!({"id": "1", "name": "x", "triggers": []})).unwrap();
        let state = flatten_metric_alert("acme", "web", &record);
        assert!(state.trigger.is_empty());
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["trigger"], json!([]));
    }

    #[test]
    fn test_flatten_null_triggers_is_explicit() {
        let record: api::MetricAlert = serde_json::from_value(json!({"id": "1", "triggers": null})).unwrap();
        let value = serde_json::to_value(flatten_metric_alert("acme", "web", &record)).unwrap();
        assert_eq!(value["trigger"], json!([]));
        assert_eq!(value["time_window"], json!(0.0));
        assert!(value["comparison_delta"].is_null());
    }

    #[test]
    fn test_flatten_takes_single_project_from_record() {
        let record: api::MetricAlert =
            serde_json::from_value(json!({"id": "1", "projects": ["api"]})).unwrap();
        assert_eq!(flatten_metric_alert("acme", "web", &record).project, "api");

        let record: api::MetricAlert =
            serde_json::from_value(json!({"id": "1", "projects": ["api", "web"]})).unwrap();
        assert_eq!(flatten_metric_alert("acme", "web", &record).project, "web");
    }

    #[test]
    fn test_validate_rejects_unknown_comparison_delta() {
        let mut alert = sample();
        alert.comparison_delta = Some(100.0);
        let err = MetricAlertResource::validate(&alert).unwrap_err();
        assert_eq!(err.field, "comparison_delta");
        assert!(err.to_string().contains("5, 15, 60, 1440, 10080, 43200"));
    }

    #[test]
    fn test_validate_checks_triggers() {
        let mut alert = sample();
        alert.trigger[0].label = "urgent".into();
        assert_eq!(MetricAlertResource::validate(&alert).unwrap_err().field, "trigger.label");
        assert!(MetricAlertResource::validate(&sample()).is_ok());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: std::result::Result<MetricAlert, _> = serde_json::from_value(json!({
            "organization": "acme", "project": "web", "name": "x", "query": "",
            "aggregate": "count()", "time_window": 1.0, "threshold_type": 0,
            "trigger": [], "colour": "red"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_carry_ids_matches_by_position() {
        let mut current = sample();
        current.internal_id = Some("123".into());
        current.trigger[0].id = Some("7".into());
        current.trigger[0].action[0].id = Some("70".into());

        let mut declared = sample();
        declared.trigger.push(Trigger {
            label: "warning".into(),
            alert_threshold: 50.0,
            ..Trigger::default()
        });
        MetricAlertResource::carry_ids(&current, &mut declared);

        assert_eq!(declared.internal_id.as_deref(), Some("123"));
        assert_eq!(declared.trigger[0].id.as_deref(), Some("7"));
        assert_eq!(declared.trigger[0].action[0].id.as_deref(), Some("70"));
        assert_eq!(declared.trigger[1].id, None);
    }

    #[test]
    fn test_carry_ids_keeps_declared_ids() {
        let mut current = sample();
        current.trigger[0].id = Some("7".into());

        let mut declared = sample();
        declared.trigger[0].id = Some("8".into());
        MetricAlertResource::carry_ids(&current, &mut declared);

        assert_eq!(declared.trigger[0].id.as_deref(), Some("8"));
    }
}
