//! Resource Registry - Load schema declarations from JSON
//!
//! The declared fields of every resource kind live in an embedded JSON file
//! so the host can discover them (`schema` subcommand) without reading Rust.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Embedded resource JSON (compiled into the binary)
const RESOURCE_FILE: &str = include_str!("../resources/sentry.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    /// List of scalars, see [`FieldDef::elem`]
    List,
    /// Ordered list of nested blocks, see [`FieldDef::fields`]
    BlockList,
    /// Number or string
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMode {
    Required,
    Optional,
    /// Set by Sentry, never sent
    Computed,
}

/// Field definition from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub mode: FieldMode,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elem: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDef>,
}

/// Resource definition from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    pub description: String,
    /// `org`, `org/project` or `org/project/id`
    pub id_shape: String,
    /// Lookup arguments when the kind is also readable as a data source
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_source: Vec<String>,
    pub fields: Vec<FieldDef>,
}

impl ResourceDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of the fields a config must set
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.mode == FieldMode::Required)
            .map(|f| f.name.as_str())
    }
}

/// Root structure of resources/sentry.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        serde_json::from_str(RESOURCE_FILE)
            .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e))
    })
}

/// Get a resource definition by key, e.g. `metric_alert`
pub fn get_resource_def(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Get all resource keys, sorted
pub fn get_all_resource_keys() -> Vec<&'static str> {
    get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect()
}
