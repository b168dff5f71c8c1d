//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the allocator.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scheduler::{FieldMap, MetaValue, RowId};

/// Root configuration for the allocator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Module group definitions.
    pub groups: Vec<GroupConfig>,

    /// Module rows, each belonging to one group.
    pub rows: Vec<RowConfig>,
}

impl AllocatorConfig {
    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&GroupConfig> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Rows belonging to `group`, in file order.
    pub fn rows_in<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a RowConfig> + 'a {
        self.rows.iter().filter(move |r| r.group == group)
    }
}

/// Module group configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupConfig {
    /// Group identifier.
    pub name: String,

    /// Selection policy ("first" or "roundrobin").
    #[serde(default = "default_policy")]
    pub policy: String,

    /// Exclude rows at or over their limit before the policy runs.
    #[serde(default)]
    pub force_limits: bool,

    /// Meta field holding each row's capacity limit.
    #[serde(default = "default_limit_field")]
    pub limit_field: String,

    /// Meta field holding each row's current usage.
    #[serde(default = "default_total_field")]
    pub total_field: String,
}

impl GroupConfig {
    /// Field-name mapping for this group's rows.
    pub fn fields(&self) -> FieldMap {
        FieldMap {
            limit_field: self.limit_field.clone(),
            total_field: self.total_field.clone(),
        }
    }
}

fn default_policy() -> String {
    "first".to_string()
}

fn default_limit_field() -> String {
    "limit".to_string()
}

fn default_total_field() -> String {
    "total".to_string()
}

/// Module row configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RowConfig {
    /// Row identifier, unique within its group.
    pub id: RowId,

    /// Group this row belongs to.
    pub group: String,

    /// Free-form meta values (limit/total among them).
    #[serde(default)]
    pub meta: BTreeMap<String, MetaValue>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
