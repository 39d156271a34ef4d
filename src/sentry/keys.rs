//! Sentry Project Keys (client keys / DSNs)

use super::client::{api_path, SentryClient};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name Sentry gives the key it creates with every new project
pub const DEFAULT_KEY_NAME: &str = "Default";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectKeyRateLimit {
    pub window: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectKeyDsn {
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub public: String,
    #[serde(default)]
    pub csp: String,
}

/// Client key as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectKey {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub public: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub project_id: i64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub rate_limit: Option<ProjectKeyRateLimit>,
    #[serde(default)]
    pub dsn: ProjectKeyDsn,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
}

/// Body of `POST`/`PUT` on the keys endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectKeyParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<ProjectKeyRateLimit>,
}

pub async fn list_keys(client: &SentryClient, org: &str, project: &str) -> Result<Vec<ProjectKey>> {
    client.get(&api_path(&["projects", org, project, "keys"])).await
}

pub async fn get_key(client: &SentryClient, org: &str, project: &str, id: &str) -> Result<ProjectKey> {
    client
        .get(&api_path(&["projects", org, project, "keys", id]))
        .await
}

pub async fn create_key(
    client: &SentryClient,
    org: &str,
    project: &str,
    params: &ProjectKeyParams,
) -> Result<ProjectKey> {
    client
        .post(&api_path(&["projects", org, project, "keys"]), params)
        .await
}

pub async fn update_key(
    client: &SentryClient,
    org: &str,
    project: &str,
    id: &str,
    params: &ProjectKeyParams,
) -> Result<ProjectKey> {
    client
        .put(&api_path(&["projects", org, project, "keys", id]), params)
        .await
}

pub async fn delete_key(client: &SentryClient, org: &str, project: &str, id: &str) -> Result<()> {
    client
        .delete(&api_path(&["projects", org, project, "keys", id]))
        .await
}
