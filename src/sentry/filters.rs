//! Sentry Project Inbound Filters
//!
//! Only the two filters this provider manages are modelled: the boolean
//! `browser-extensions` filter and the `legacy-browsers` subfilter list.

use super::client::{api_path, SentryClient};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const BROWSER_EXTENSIONS: &str = "browser-extensions";
pub const LEGACY_BROWSERS: &str = "legacy-browsers";

/// One entry of `GET projects/{org}/{project}/filters/`
///
/// `active` is a bool for most filters and a list of subfilter names for
/// `legacy-browsers`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterConfigItem {
    pub id: String,
    #[serde(default)]
    pub active: Value,
}

/// The filter settings the provider cares about, folded out of the list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterConfig {
    pub browser_extension: bool,
    pub legacy_browsers: Vec<String>,
}

impl FilterConfig {
    pub fn from_items(items: Vec<FilterConfigItem>) -> Self {
        let mut config = Self::default();
        for item in items {
            match item.id.as_str() {
                BROWSER_EXTENSIONS => {
                    config.browser_extension = item.active.as_bool().unwrap_or(false);
                }
                LEGACY_BROWSERS => {
                    config.legacy_browsers = match item.active {
                        Value::Array(values) => values
                            .into_iter()
                            .filter_map(|v| v.as_str().map(String::from))
                            .collect(),
                        Value::Bool(false) | Value::Null => Vec::new(),
                        other => {
                            tracing::warn!("unexpected legacy-browsers state {}, treating as empty", other);
                            Vec::new()
                        }
                    };
                }
                _ => {}
            }
        }
        config
    }
}

#[derive(Debug, Clone, Serialize)]
struct BrowserExtensionParams {
    active: bool,
}

#[derive(Debug, Clone, Serialize)]
struct LegacyBrowserParams<'a> {
    subfilters: &'a [String],
}

pub async fn get_filter_config(client: &SentryClient, org: &str, project: &str) -> Result<FilterConfig> {
    let items: Vec<FilterConfigItem> = client
        .get(&api_path(&["projects", org, project, "filters"]))
        .await?;
    Ok(FilterConfig::from_items(items))
}

pub async fn update_browser_extensions(
    client: &SentryClient,
    org: &str,
    project: &str,
    active: bool,
) -> Result<()> {
    let _: Value = client
        .put(
            &api_path(&["projects", org, project, "filters", BROWSER_EXTENSIONS]),
            &BrowserExtensionParams { active },
        )
        .await?;
    Ok(())
}

pub async fn update_legacy_browsers(
    client: &SentryClient,
    org: &str,
    project: &str,
    browsers: &[String],
) -> Result<()> {
    let _: Value = client
        .put(
            &api_path(&["projects", org, project, "filters", LEGACY_BROWSERS]),
            &LegacyBrowserParams { subfilters: browsers },
        )
        .await?;
    Ok(())
}
