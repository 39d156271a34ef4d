//! Sentry Organizations
//!
//! Records and endpoints for `organizations/`.

use super::client::{api_path, SentryClient};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Organization as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
}

/// Body of `POST organizations/`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agree_terms: Option<bool>,
}

/// Body of `PUT organizations/{org}/`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateOrganizationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

pub async fn get_organization(client: &SentryClient, slug: &str) -> Result<Organization> {
    client.get(&api_path(&["organizations", slug])).await
}

pub async fn create_organization(
    client: &SentryClient,
    params: &CreateOrganizationParams,
) -> Result<Organization> {
    client.post(&api_path(&["organizations"]), params).await
}

pub async fn update_organization(
    client: &SentryClient,
    slug: &str,
    params: &UpdateOrganizationParams,
) -> Result<Organization> {
    client.put(&api_path(&["organizations", slug]), params).await
}

pub async fn delete_organization(client: &SentryClient, slug: &str) -> Result<()> {
    client.delete(&api_path(&["organizations", slug])).await
}
