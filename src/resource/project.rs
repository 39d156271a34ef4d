//! `sentry_project`
//!
//! Projects are created under a team but addressed by organization and slug
//! afterwards. Renaming the slug changes the identifier.

use super::id::{self, decode_pair};
use super::validate::{validate_opt, ValidationError, DIGEST_DELAY_RANGE};
use super::{absent_on_not_found, Applied, Resource, ResourceKind};
use crate::error::{ProviderError, Result};
use crate::sentry::client::SentryClient;
use crate::sentry::keys::{self, DEFAULT_KEY_NAME};
use crate::sentry::projects::{self as api, CreateProjectParams, UpdateProjectParams};
use crate::sentry::rules::{self, DEFAULT_RULE_NAME};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub organization: String,
    pub team: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    /// Delete the key Sentry creates with every new project. Create only.
    #[serde(default)]
    pub remove_default_key: Option<bool>,
    /// Delete the alert rule Sentry creates with every new project. Create only.
    #[serde(default)]
    pub remove_default_rule: Option<bool>,
    /// Seconds
    #[serde(default)]
    pub digests_min_delay: Option<i64>,
    /// Seconds
    #[serde(default)]
    pub digests_max_delay: Option<i64>,
    #[serde(default)]
    pub allowed_domains: Option<Vec<String>>,

    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<String>,
}

pub fn expand_create(project: &Project) -> CreateProjectParams {
    CreateProjectParams {
        name: project.name.clone(),
        slug: project.slug.clone(),
        platform: project.platform.clone(),
    }
}

pub fn expand_update(project: &Project) -> UpdateProjectParams {
    UpdateProjectParams {
        name: project.name.clone(),
        slug: project.slug.clone(),
        platform: project.platform.clone(),
        digests_min_delay: project.digests_min_delay,
        digests_max_delay: project.digests_max_delay,
        allowed_domains: project.allowed_domains.clone(),
    }
}

/// `org` and `team` fill in when the record does not name them.
pub fn flatten_project(org: &str, team: &str, project: api::Project) -> Project {
    let team = project.team_slug().unwrap_or(team).to_string();
    let organization = project
        .organization
        .as_ref()
        .map(|o| o.slug.clone())
        .unwrap_or_else(|| org.to_string());

    Project {
        organization,
        team,
        name: project.name,
        slug: Some(project.slug),
        platform: project.platform,
        remove_default_key: None,
        remove_default_rule: None,
        digests_min_delay: project.digests_min_delay,
        digests_max_delay: project.digests_max_delay,
        allowed_domains: project.allowed_domains,
        project_id: Some(project.id),
        is_public: Some(project.is_public),
        color: Some(project.color),
        features: project.features,
        status: Some(project.status),
    }
}

async fn remove_default_key(client: &SentryClient, org: &str, project: &str) -> Result<()> {
    let found = keys::list_keys(client, org, project)
        .await?
        .into_iter()
        .find(|key| key.name == DEFAULT_KEY_NAME);

    match found {
        Some(key) => {
            tracing::info!(%org, %project, key_id = %key.id, "Removing default key");
            keys::delete_key(client, org, project, &key.id).await
        }
        None => {
            tracing::debug!(%org, %project, "No default key to remove");
            Ok(())
        }
    }
}

async fn remove_default_rule(client: &SentryClient, org: &str, project: &str) -> Result<()> {
    let found = rules::list_rules(client, org, project)
        .await?
        .into_iter()
        .find(|rule| rule.name == DEFAULT_RULE_NAME);

    match found {
        Some(rule) => {
            tracing::info!(%org, %project, rule_id = %rule.id, "Removing default rule");
            rules::delete_rule(client, org, project, &rule.id).await
        }
        None => {
            tracing::debug!(%org, %project, "No default rule to remove");
            Ok(())
        }
    }
}

/// Steps that only run once the project exists. Returns the updated record
/// when a follow-up update was needed, or the failing step.
async fn finish_create(
    client: &SentryClient,
    project: &Project,
    slug: &str,
) -> std::result::Result<Option<api::Project>, (&'static str, ProviderError)> {
    let org = &project.organization;

    if project.remove_default_key.unwrap_or(false) {
        remove_default_key(client, org, slug)
            .await
            .map_err(|e| ("remove_default_key", e))?;
    }
    if project.remove_default_rule.unwrap_or(false) {
        remove_default_rule(client, org, slug)
            .await
            .map_err(|e| ("remove_default_rule", e))?;
    }

    // Digest and domain settings are not accepted on create.
    let needs_update = project.digests_min_delay.is_some()
        || project.digests_max_delay.is_some()
        || project.allowed_domains.is_some();
    if !needs_update {
        return Ok(None);
    }
    api::update_project(client, org, slug, &expand_update(project))
        .await
        .map(Some)
        .map_err(|e| ("update", e))
}

pub struct ProjectResource;

#[async_trait]
impl Resource for ProjectResource {
    type Model = Project;

    const KIND: ResourceKind = ResourceKind::Project;

    fn validate(project: &Project) -> Result<(), ValidationError> {
        validate_opt("digests_min_delay", project.digests_min_delay, &DIGEST_DELAY_RANGE)?;
        validate_opt("digests_max_delay", project.digests_max_delay, &DIGEST_DELAY_RANGE)?;
        if let (Some(min), Some(max)) = (project.digests_min_delay, project.digests_max_delay) {
            if min > max {
                return Err(ValidationError {
                    field: "digests_min_delay".into(),
                    value: min.to_string(),
                    allowed: format!("at most `digests_max_delay` ({max})"),
                });
            }
        }
        Ok(())
    }

    async fn create_remote(client: &SentryClient, project: &Project) -> Result<Applied<Project>> {
        let org = &project.organization;
        tracing::info!(%org, team = %project.team, name = %project.name, "Creating project");
        let created = api::create_project(client, org, &project.team, &expand_create(project)).await?;
        let id = id::encode(&[org.as_str(), created.slug.as_str()])?;

        match finish_create(client, project, &created.slug).await {
            Ok(Some(updated)) => Ok(Applied {
                id: id::encode(&[org.as_str(), updated.slug.as_str()])?,
                state: flatten_project(org, &project.team, updated),
            }),
            Ok(None) => Ok(Applied {
                id,
                state: flatten_project(org, &project.team, created),
            }),
            Err((failed, source)) => {
                tracing::error!(%id, step = failed, error = %source, "Project created but a follow-up step failed");
                let mut state = flatten_project(org, &project.team, created);
                Self::keep_write_only(project, &mut state);
                Err(ProviderError::PartialCreate {
                    resource: Self::KIND.to_string(),
                    id,
                    failed,
                    source: Box::new(source),
                    state: serde_json::to_value(state).ok(),
                })
            }
        }
    }

    async fn read(client: &SentryClient, id: &str) -> Result<Option<Project>> {
        let (org, slug) = decode_pair(id)?;
        tracing::debug!(%org, %slug, "Reading project");
        let project = absent_on_not_found(Self::KIND, id, api::get_project(client, &org, &slug).await)?;
        Ok(project.map(|project| flatten_project(&org, "", project)))
    }

    async fn update_remote(client: &SentryClient, id: &str, project: &Project) -> Result<Applied<Project>> {
        let (org, slug) = decode_pair(id)?;
        tracing::debug!(%org, %slug, "Updating project");
        let updated = api::update_project(client, &org, &slug, &expand_update(project)).await?;

        if updated.slug != slug {
            tracing::info!(%org, from = %slug, to = %updated.slug, "Project slug changed");
        }
        Ok(Applied {
            id: id::encode(&[org.as_str(), updated.slug.as_str()])?,
            state: flatten_project(&org, &project.team, updated),
        })
    }

    async fn delete_remote(client: &SentryClient, id: &str) -> Result<()> {
        let (org, slug) = decode_pair(id)?;
        tracing::debug!(%org, %slug, "Deleting project");
        api::delete_project(client, &org, &slug).await
    }

    fn keep_write_only(declared: &Project, state: &mut Project) {
        state.remove_default_key = declared.remove_default_key;
        state.remove_default_rule = declared.remove_default_rule;
        if state.team.is_empty() {
            state.team = declared.team.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::test_support::assert_restricted_eq;
    use serde_json::json;

    fn sample() -> Project {
        Project {
            organization: "acme".into(),
            team: "backend".into(),
            name: "Web".into(),
            slug: Some("web".into()),
            platform: Some("javascript".into()),
            digests_min_delay: Some(300),
            digests_max_delay: Some(1800),
            ..Default::default()
        }
    }

    fn record() -> api::Project {
        serde_json::from_value(json!({
            "id": "7",
            "slug": "web",
            "name": "Web",
            "platform": "javascript",
            "isPublic": false,
            "color": "#bf6e3f",
            "features": ["releases"],
            "status": "active",
            "digestsMinDelay": 300,
            "digestsMaxDelay": 1800,
            "organization": {"id": "1", "slug": "acme"},
            "team": {"id": "2", "slug": "backend"}
        }))
        .unwrap()
    }

    #[test]
    fn test_create_body() {
        let body = serde_json::to_value(expand_create(&sample())).unwrap();
        assert_eq!(body, json!({"name": "Web", "slug": "web", "platform": "javascript"}));
    }

    #[test]
    fn test_update_body_skips_unset() {
        let mut project = sample();
        project.digests_max_delay = None;
        let body = serde_json::to_value(expand_update(&project)).unwrap();
        assert_eq!(body["digestsMinDelay"], 300);
        assert!(body.get("digestsMaxDelay").is_none());
        assert!(body.get("allowedDomains").is_none());
    }

    #[test]
    fn test_flatten_round_trip() {
        let state = flatten_project("acme", "", record());
        assert_eq!(state.project_id.as_deref(), Some("7"));
        assert_eq!(state.status.as_deref(), Some("active"));
        assert_restricted_eq(
            &serde_json::to_value(sample()).unwrap(),
            &serde_json::to_value(&state).unwrap(),
            "project",
        );
    }

    #[test]
    fn test_keep_write_only_flags() {
        let mut declared = sample();
        declared.remove_default_key = Some(true);
        let mut state = flatten_project("acme", "", record());
        ProjectResource::keep_write_only(&declared, &mut state);
        assert_eq!(state.remove_default_key, Some(true));
        assert_eq!(state.remove_default_rule, None);
    }

    #[test]
    fn test_validate_digest_delays() {
        assert!(ProjectResource::validate(&sample()).is_ok());

        let mut project = sample();
        project.digests_min_delay = Some(30);
        assert_eq!(ProjectResource::validate(&project).unwrap_err().field, "digests_min_delay");

        let mut project = sample();
        project.digests_min_delay = Some(3600);
        project.digests_max_delay = Some(600);
        assert!(ProjectResource::validate(&project).is_err());
    }
}
