//! `sentry_rule`
//!
//! Issue alert rules. Sentry has no single-rule GET endpoint that works on
//! every server version, so Read lists the project's rules and picks the one
//! with the tracked id.

use super::id::{self, decode_triple};
use super::validate::{validate_opt, Constraint, ValidationError, ACTION_MATCHES, FREQUENCY_RANGE};
use super::{absent_on_not_found, transition, Applied, Lifecycle, Resource, ResourceKind};
use crate::error::{ProviderError, Result};
use crate::sentry::client::SentryClient;
use crate::sentry::rules as api;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use crate::sentry::rules::{ConditionValue, RuleAction, RuleCondition};

pub const DEFAULT_ACTION_MATCH: &str = "any";

/// Minutes
pub const DEFAULT_FREQUENCY: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub organization: String,
    pub project: String,
    pub name: String,
    /// `any`, `all` or `none`; defaults to `any`
    #[serde(default)]
    pub action_match: Option<String>,
    /// Minutes between notifications; defaults to 30
    #[serde(default)]
    pub frequency: Option<i64>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
    #[serde(default)]
    pub actions: Vec<RuleAction>,
    #[serde(default)]
    pub internal_id: Option<String>,
}

impl Rule {
    /// Fill `action_match` and `frequency` when missing.
    ///
    /// An explicit empty string or `0` is treated as missing too, so a
    /// frequency of zero can never be sent.
    pub fn with_defaults(&self) -> Rule {
        let action_match = match self.action_match.as_deref() {
            None | Some("") => DEFAULT_ACTION_MATCH.to_string(),
            Some(value) => value.to_string(),
        };
        let frequency = match self.frequency {
            None | Some(0) => DEFAULT_FREQUENCY,
            Some(value) => value,
        };
        Rule {
            action_match: Some(action_match),
            frequency: Some(frequency),
            ..self.clone()
        }
    }
}

/// Build the request body. Callers apply [`Rule::with_defaults`] first.
pub fn expand_rule(rule: &Rule) -> api::Rule {
    api::Rule {
        id: rule.internal_id.clone().unwrap_or_default(),
        action_match: rule.action_match.clone().unwrap_or_default(),
        environment: rule.environment.clone(),
        frequency: rule.frequency.unwrap_or_default(),
        name: rule.name.clone(),
        conditions: rule.conditions.clone(),
        actions: rule.actions.clone(),
        date_created: None,
    }
}

pub fn flatten_rule(org: &str, project: &str, rule: api::Rule) -> Rule {
    Rule {
        organization: org.to_string(),
        project: project.to_string(),
        name: rule.name,
        action_match: Some(rule.action_match),
        frequency: Some(rule.frequency),
        environment: rule.environment,
        conditions: rule.conditions,
        actions: rule.actions,
        internal_id: (!rule.id.is_empty()).then_some(rule.id),
    }
}

fn rule_id(org: &str, project: &str, rule: &api::Rule) -> Result<String> {
    if rule.id.is_empty() {
        return Err(ProviderError::UnexpectedResponse("rule response has no id".into()));
    }
    id::encode(&[org, project, rule.id.as_str()])
}

pub struct RuleResource;

#[async_trait]
impl Resource for RuleResource {
    type Model = Rule;

    const KIND: ResourceKind = ResourceKind::Rule;

    fn validate(rule: &Rule) -> Result<(), ValidationError> {
        let rule = rule.with_defaults();
        validate_opt(
            "action_match",
            rule.action_match.as_deref(),
            &Constraint::OneOfStr(ACTION_MATCHES),
        )?;
        validate_opt("frequency", rule.frequency, &FREQUENCY_RANGE)?;
        if rule.name.trim().is_empty() {
            return Err(ValidationError {
                field: "name".into(),
                value: rule.name.clone(),
                allowed: "a non-empty name".into(),
            });
        }
        Ok(())
    }

    async fn create_remote(client: &SentryClient, rule: &Rule) -> Result<Applied<Rule>> {
        let mut request = expand_rule(&rule.with_defaults());
        request.id.clear();
        tracing::info!(org = %rule.organization, project = %rule.project, name = %rule.name, "Creating rule");
        let created = api::create_rule(client, &rule.organization, &rule.project, &request).await?;

        Ok(Applied {
            id: rule_id(&rule.organization, &rule.project, &created)?,
            state: flatten_rule(&rule.organization, &rule.project, created),
        })
    }

    async fn read(client: &SentryClient, id: &str) -> Result<Option<Rule>> {
        let (org, project, rule_id) = decode_triple(id)?;
        tracing::debug!(%org, %project, %rule_id, "Reading rule");
        let Some(rules) = absent_on_not_found(Self::KIND, id, api::list_rules(client, &org, &project).await)? else {
            return Ok(None);
        };

        match rules.into_iter().find(|rule| rule.id == rule_id) {
            Some(rule) => Ok(Some(flatten_rule(&org, &project, rule))),
            None => {
                tracing::warn!(%org, %project, %rule_id, "rule not in project rule list, removing from state");
                transition(Self::KIND, id, Lifecycle::Present, Lifecycle::Absent);
                Ok(None)
            }
        }
    }

    async fn update_remote(client: &SentryClient, id: &str, rule: &Rule) -> Result<Applied<Rule>> {
        let (org, project, rule_id) = decode_triple(id)?;
        let mut request = expand_rule(&rule.with_defaults());
        request.id = rule_id.clone();

        tracing::debug!(%org, %project, %rule_id, "Updating rule");
        let updated = api::update_rule(client, &org, &project, &rule_id, &request).await?;
        let state = if updated.id.is_empty() {
            flatten_rule(&org, &project, request)
        } else {
            flatten_rule(&org, &project, updated)
        };

        Ok(Applied {
            id: id.to_string(),
            state,
        })
    }

    async fn delete_remote(client: &SentryClient, id: &str) -> Result<()> {
        let (org, project, rule_id) = decode_triple(id)?;
        tracing::debug!(%org, %project, %rule_id, "Deleting rule");
        api::delete_rule(client, &org, &project, &rule_id).await
    }
}
