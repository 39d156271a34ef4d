//! Sentry Projects
//!
//! Records and endpoints for `projects/{org}/{project}/` and project creation
//! under a team.

use super::client::{api_path, SentryClient};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Slug reference to an owning organization or team
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlugRef {
    #[serde(default)]
    pub id: Option<String>,
    pub slug: String,
}

/// Project as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub digests_min_delay: Option<i64>,
    #[serde(default)]
    pub digests_max_delay: Option<i64>,
    #[serde(default)]
    pub allowed_domains: Option<Vec<String>>,
    #[serde(default)]
    pub organization: Option<SlugRef>,
    #[serde(default)]
    pub team: Option<SlugRef>,
    #[serde(default)]
    pub teams: Vec<SlugRef>,
    #[serde(default)]
    pub date_created: Option<DateTime<Utc>>,
}

impl Project {
    /// Slug of the owning team. Newer API versions only return `teams`.
    pub fn team_slug(&self) -> Option<&str> {
        self.team
            .as_ref()
            .or_else(|| self.teams.first())
            .map(|t| t.slug.as_str())
    }
}

/// Body of `POST teams/{org}/{team}/projects/`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateProjectParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// Body of `PUT projects/{org}/{project}/`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digests_min_delay: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digests_max_delay: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_domains: Option<Vec<String>>,
}

pub async fn get_project(client: &SentryClient, org: &str, slug: &str) -> Result<Project> {
    client.get(&api_path(&["projects", org, slug])).await
}

pub async fn create_project(
    client: &SentryClient,
    org: &str,
    team: &str,
    params: &CreateProjectParams,
) -> Result<Project> {
    client
        .post(&api_path(&["teams", org, team, "projects"]), params)
        .await
}

pub async fn update_project(
    client: &SentryClient,
    org: &str,
    slug: &str,
    params: &UpdateProjectParams,
) -> Result<Project> {
    client.put(&api_path(&["projects", org, slug]), params).await
}

pub async fn delete_project(client: &SentryClient, org: &str, slug: &str) -> Result<()> {
    client.delete(&api_path(&["projects", org, slug])).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_team_slug_prefers_team_then_teams() {
        let project: Project = serde_json::from_value(json!({
            "id": "1",
            "slug": "web",
            "teams": [{"id": "9", "slug": "backend"}]
        }))
        .unwrap();
        assert_eq!(project.team_slug(), Some("backend"));

        let project: Project = serde_json::from_value(json!({
            "id": "1",
            "slug": "web",
            "team": {"slug": "frontend"},
            "teams": [{"slug": "backend"}]
        }))
        .unwrap();
        assert_eq!(project.team_slug(), Some("frontend"));
    }

    #[test]
    fn test_update_params_skip_unset_fields() {
        let params = UpdateProjectParams {
            name: "Web".into(),
            digests_min_delay: Some(300),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"name": "Web", "digestsMinDelay": 300})
        );
    }
}
