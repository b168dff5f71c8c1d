//! Module rows and group settings as held by the inventory.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{GroupConfig, RowConfig};
use crate::scheduler::{Backend, FieldMap, MalformedField, MetaValue, RowId};

/// One backend resource (server, reseller account, API endpoint).
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRow {
    pub id: RowId,
    pub meta: BTreeMap<String, MetaValue>,
}

impl ModuleRow {
    pub fn new(id: u64) -> Self {
        Self {
            id: RowId(id),
            meta: BTreeMap::new(),
        }
    }

    /// Builder-style meta setter.
    pub fn with_meta(mut self, key: &str, value: impl Into<MetaValue>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    /// Snapshot this row for one scheduling decision.
    pub fn to_backend(&self, fields: &FieldMap) -> Result<Backend, MalformedField> {
        Backend::from_meta(self.id, &self.meta, fields)
    }

    /// Overwrite the usage counter.
    pub(crate) fn set_total(&mut self, fields: &FieldMap, total: u64) {
        self.meta
            .insert(fields.total_field.clone(), MetaValue::from(total));
    }
}

impl From<&RowConfig> for ModuleRow {
    fn from(config: &RowConfig) -> Self {
        Self {
            id: config.id,
            meta: config.meta.clone(),
        }
    }
}

/// Per-group scheduling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSettings {
    /// Policy kind as configured; resolved on every selection.
    pub policy: String,
    /// Pre-exclude saturated rows.
    pub force_limits: bool,
    pub fields: FieldMap,
}

impl GroupSettings {
    pub fn new(policy: &str, force_limits: bool) -> Self {
        Self {
            policy: policy.to_string(),
            force_limits,
            fields: FieldMap::default(),
        }
    }

    pub fn with_fields(mut self, limit_field: &str, total_field: &str) -> Self {
        self.fields = FieldMap {
            limit_field: limit_field.to_string(),
            total_field: total_field.to_string(),
        };
        self
    }
}

impl From<&GroupConfig> for GroupSettings {
    fn from(config: &GroupConfig) -> Self {
        Self {
            policy: config.policy.clone(),
            force_limits: config.force_limits,
            fields: config.fields(),
        }
    }
}
