//! `sentry_filter`
//!
//! Inbound data filters of one project. Two sub-filters are managed and each
//! has its own endpoint, so every write is two PUTs in a fixed order:
//! `browser_extension` first, then `legacy_browsers`. There is no rollback
//! when the second one fails.

use super::id::{self, decode_pair};
use super::validate::{validate, Constraint, ValidationError, LEGACY_BROWSERS};
use super::{absent_on_not_found, Applied, Resource, ResourceKind};
use crate::error::{ProviderError, Result};
use crate::sentry::client::SentryClient;
use crate::sentry::filters::{self as api, FilterConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Filter {
    pub organization: String,
    pub project: String,
    pub browser_extension: bool,
    /// Empty turns the legacy browser filter off
    pub legacy_browsers: Vec<String>,
}

pub fn flatten_filter(org: &str, project: &str, config: FilterConfig) -> Filter {
    Filter {
        organization: org.to_string(),
        project: project.to_string(),
        browser_extension: config.browser_extension,
        legacy_browsers: config.legacy_browsers,
    }
}

/// Apply both sub-filters.
async fn write_filters(
    client: &SentryClient,
    org: &str,
    project: &str,
    browser_extension: bool,
    legacy_browsers: &[String],
) -> Result<()> {
    api::update_browser_extensions(client, org, project, browser_extension).await?;

    if let Err(source) = api::update_legacy_browsers(client, org, project, legacy_browsers).await {
        tracing::error!(%org, %project, error = %source, "legacy browsers update failed after browser extensions was applied");
        let state = match api::get_filter_config(client, org, project).await {
            Ok(config) => serde_json::to_value(flatten_filter(org, project, config)).ok(),
            Err(e) => {
                tracing::warn!(%org, %project, error = %e, "could not read filters back after partial update");
                None
            }
        };
        return Err(ProviderError::PartialUpdate {
            resource: format!("{}:{}/{}", ResourceKind::Filter, org, project),
            completed: "browser_extension",
            failed: "legacy_browsers",
            source: Box::new(source),
            state,
        });
    }
    Ok(())
}

pub struct FilterResource;

#[async_trait]
impl Resource for FilterResource {
    type Model = Filter;

    const KIND: ResourceKind = ResourceKind::Filter;

    fn validate(filter: &Filter) -> Result<(), ValidationError> {
        for browser in &filter.legacy_browsers {
            validate("legacy_browsers", browser.as_str(), &Constraint::OneOfStr(LEGACY_BROWSERS))?;
        }
        Ok(())
    }

    /// Filters always exist; creating one is writing it.
    async fn create_remote(client: &SentryClient, filter: &Filter) -> Result<Applied<Filter>> {
        let id = id::encode(&[&filter.organization, &filter.project])?;
        Self::update_remote(client, &id, filter).await
    }

    async fn read(client: &SentryClient, id: &str) -> Result<Option<Filter>> {
        let (org, project) = decode_pair(id)?;
        tracing::debug!(%org, %project, "Reading filters");
        let config = absent_on_not_found(Self::KIND, id, api::get_filter_config(client, &org, &project).await)?;
        Ok(config.map(|config| flatten_filter(&org, &project, config)))
    }

    async fn update_remote(client: &SentryClient, id: &str, filter: &Filter) -> Result<Applied<Filter>> {
        let (org, project) = decode_pair(id)?;
        tracing::info!(%org, %project, browser_extension = filter.browser_extension, legacy_browsers = ?filter.legacy_browsers, "Updating filters");
        write_filters(client, &org, &project, filter.browser_extension, &filter.legacy_browsers).await?;

        Ok(Applied {
            id: id.to_string(),
            state: Filter {
                organization: org,
                project,
                ..filter.clone()
            },
        })
    }

    /// Deleting resets both sub-filters to off.
    async fn delete_remote(client: &SentryClient, id: &str) -> Result<()> {
        let (org, project) = decode_pair(id)?;
        tracing::info!(%org, %project, "Resetting filters");
        write_filters(client, &org, &project, false, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::test_support::assert_restricted_eq;
    use serde_json::json;

    #[test]
    fn test_validate_legacy_browsers() {
        let mut filter = Filter {
            organization: "acme".into(),
            project: "web".into(),
            browser_extension: true,
            legacy_browsers: vec!["ie9".into(), "safari_pre_6".into()],
        };
        assert!(FilterResource::validate(&filter).is_ok());

        filter.legacy_browsers.push("netscape".into());
        let err = FilterResource::validate(&filter).unwrap_err();
        assert_eq!(err.value, "netscape");
    }

    #[test]
    fn test_flatten_round_trip() {
        let config: Filter = serde_json::from_value(json!({
            "organization": "acme",
            "project": "web",
            "browser_extension": true,
            "legacy_browsers": ["ie10"]
        }))
        .unwrap();
        let state = flatten_filter(
            "acme",
            "web",
            FilterConfig {
                browser_extension: config.browser_extension,
                legacy_browsers: config.legacy_browsers.clone(),
            },
        );
        assert_restricted_eq(
            &serde_json::to_value(&config).unwrap(),
            &serde_json::to_value(&state).unwrap(),
            "filter",
        );
    }

    #[test]
    fn test_sub_filters_must_be_declared() {
        let err = serde_json::from_value::<Filter>(json!({"organization": "acme", "project": "web"}))
            .unwrap_err();
        assert!(err.to_string().contains("browser_extension"));

        let filter: Filter = serde_json::from_value(json!({
            "organization": "acme",
            "project": "web",
            "browser_extension": false,
            "legacy_browsers": []
        }))
        .unwrap();
        assert!(filter.legacy_browsers.is_empty());
    }
}
