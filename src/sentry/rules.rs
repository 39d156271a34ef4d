//! Sentry Issue Alert Rules
//!
//! Project-scoped rules made of conditions and actions.

use super::client::{api_path, SentryClient};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the rule Sentry installs on every new project
pub const DEFAULT_RULE_NAME: &str = "Send a notification for new issues";

/// Rule as returned (and accepted on update) by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub action_match: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default)]
    pub frequency: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
    #[serde(default)]
    pub actions: Vec<RuleAction>,
    #[serde(default, skip_serializing)]
    pub date_created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ConditionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

/// Condition thresholds are numbers for frequency conditions and strings for
/// tag matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

pub async fn list_rules(client: &SentryClient, org: &str, project: &str) -> Result<Vec<Rule>> {
    client
        .get(&api_path(&["projects", org, project, "rules"]))
        .await
}

pub async fn create_rule(client: &SentryClient, org: &str, project: &str, rule: &Rule) -> Result<Rule> {
    client
        .post(&api_path(&["projects", org, project, "rules"]), rule)
        .await
}

pub async fn update_rule(
    client: &SentryClient,
    org: &str,
    project: &str,
    id: &str,
    rule: &Rule,
) -> Result<Rule> {
    client
        .put(&api_path(&["projects", org, project, "rules", id]), rule)
        .await
}

pub async fn delete_rule(client: &SentryClient, org: &str, project: &str, id: &str) -> Result<()> {
    client
        .delete(&api_path(&["projects", org, project, "rules", id]))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_condition_match_is_renamed() {
        let condition = RuleCondition {
            id: "sentry.rules.conditions.tagged_event.TaggedEventCondition".into(),
            key: Some("level".into()),
            match_: Some("eq".into()),
            value: Some(ConditionValue::Text("error".into())),
            ..Default::default()
        };
        let value = serde_json::to_value(&condition).unwrap();
        assert_eq!(value["match"], "eq");
        assert!(value.get("name").is_none());
        assert_eq!(value["value"], json!("error"));
    }

    #[test]
    fn test_condition_value_accepts_numbers_and_strings() {
        let number: ConditionValue = serde_json::from_value(json!(100)).unwrap();
        let text: ConditionValue = serde_json::from_value(json!("fatal")).unwrap();
        assert_eq!(number, ConditionValue::Number(100));
        assert_eq!(text, ConditionValue::Text("fatal".into()));
    }

    #[test]
    fn test_rule_body_omits_empty_id() {
        let rule = Rule {
            name: "Important Issue".into(),
            action_match: "all".into(),
            frequency: 30,
            ..Default::default()
        };
        let value = serde_json::to_value(&rule).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("dateCreated").is_none());
        assert_eq!(value["actionMatch"], "all");
    }
}
