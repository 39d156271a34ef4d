//! Sentry Metric Alert Rules
//!
//! Alert rule → triggers → actions, nested two levels deep. The same record
//! type is sent on create/update and received on read; unset fields are
//! omitted from request bodies so the server applies its defaults.

use super::client::{api_path, SentryClient};
use super::opt_string_id;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAlert {
    #[serde(default, deserialize_with = "opt_string_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, rename = "dataset", skip_serializing_if = "Option::is_none")]
    pub data_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_delta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<Vec<MetricAlertTrigger>>,
    #[serde(default, skip_serializing)]
    pub date_created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAlertTrigger {
    #[serde(default, deserialize_with = "opt_string_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<MetricAlertTriggerAction>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAlertTriggerAction {
    #[serde(default, deserialize_with = "opt_string_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(default, deserialize_with = "opt_string_id", skip_serializing_if = "Option::is_none")]
    pub target_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_id: Option<i64>,
}

pub async fn get_metric_alert(
    client: &SentryClient,
    org: &str,
    project: &str,
    id: &str,
) -> Result<MetricAlert> {
    client
        .get(&api_path(&["projects", org, project, "alert-rules", id]))
        .await
}

pub async fn create_metric_alert(
    client: &SentryClient,
    org: &str,
    project: &str,
    alert: &MetricAlert,
) -> Result<MetricAlert> {
    client
        .post(&api_path(&["projects", org, project, "alert-rules"]), alert)
        .await
}

pub async fn update_metric_alert(
    client: &SentryClient,
    org: &str,
    project: &str,
    id: &str,
    alert: &MetricAlert,
) -> Result<MetricAlert> {
    client
        .put(&api_path(&["projects", org, project, "alert-rules", id]), alert)
        .await
}

pub async fn delete_metric_alert(client: &SentryClient, org: &str, project: &str, id: &str) -> Result<()> {
    client
        .delete(&api_path(&["projects", org, project, "alert-rules", id]))
        .await
}
