//! Backend snapshot abstraction.
//!
//! # Responsibilities
//! - Represent a single module row as seen by one scheduling decision
//! - Interpret stringly-typed limit/total meta values
//! - Map per-resource meta field names onto limit and total

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scheduler::error::MalformedField;

/// Opaque identifier of a module row, unique within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl From<u64> for RowId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capacity ceiling of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limit {
    /// Absent or blank limit.
    Unlimited,
    /// At most this many units; `AtMost(0)` never has room.
    AtMost(u64),
}

/// A raw meta value as stored for a module row.
///
/// Stores hand out both integers and numeric strings (often padded with
/// whitespace), so both are accepted. Anything else (booleans, floats,
/// tables) is kept as-is; it only matters if it sits in a limit or total
/// field, where it fails to parse and the row becomes ineligible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Int(i64),
    Text(String),
    Other(toml::Value),
}

impl MetaValue {
    /// Render the value as text, the way it is compared after trimming.
    pub fn as_text(&self) -> String {
        match self {
            MetaValue::Int(n) => n.to_string(),
            MetaValue::Text(s) => s.clone(),
            MetaValue::Other(v) => v.to_string(),
        }
    }
}

impl From<u64> for MetaValue {
    fn from(n: u64) -> Self {
        // Counts above i64::MAX are not realistic; keep them as text.
        i64::try_from(n)
            .map(MetaValue::Int)
            .unwrap_or_else(|_| MetaValue::Text(n.to_string()))
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_string())
    }
}

/// Names of the meta fields holding the limit and the running total.
///
/// Different resource kinds store these under different keys
/// (e.g. `max_accounts` / `accounts`), so the mapping is configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    pub limit_field: String,
    pub total_field: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            limit_field: "limit".to_string(),
            total_field: "total".to_string(),
        }
    }
}

/// Read-only snapshot of one candidate backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backend {
    /// Row identifier returned as the scheduling result.
    pub id: RowId,
    /// Capacity ceiling.
    pub limit: Limit,
    /// Units currently assigned.
    pub total: u64,
}

impl Backend {
    /// Create a backend from already-typed values. `None` means unlimited.
    pub fn new(id: u64, limit: Option<u64>, total: u64) -> Self {
        Self::with_id(RowId(id), limit, total)
    }

    fn with_id(id: RowId, limit: Option<u64>, total: u64) -> Self {
        Self {
            id,
            limit: limit.map_or(Limit::Unlimited, Limit::AtMost),
            total,
        }
    }

    /// Create a backend from raw text values.
    ///
    /// Values are trimmed first. A blank or absent limit is unlimited and a
    /// blank or absent total is zero.
    pub fn from_raw(
        id: u64,
        limit: Option<&str>,
        total: Option<&str>,
    ) -> Result<Self, MalformedField> {
        let limit = parse_quantity("limit", limit)?;
        let total = parse_quantity("total", total)?.unwrap_or(0);
        Ok(Self::new(id, limit, total))
    }

    /// Create a backend from a row's meta map using the given field names.
    pub fn from_meta(
        id: RowId,
        meta: &BTreeMap<String, MetaValue>,
        fields: &FieldMap,
    ) -> Result<Self, MalformedField> {
        let limit_raw = meta.get(&fields.limit_field).map(MetaValue::as_text);
        let total_raw = meta.get(&fields.total_field).map(MetaValue::as_text);

        let limit = parse_quantity(&fields.limit_field, limit_raw.as_deref())?;
        let total = parse_quantity(&fields.total_field, total_raw.as_deref())?.unwrap_or(0);
        Ok(Self::with_id(id, limit, total))
    }
}

/// Parse a trimmed non-negative integer; blank and absent both yield `None`.
fn parse_quantity(field: &str, raw: Option<&str>) -> Result<Option<u64>, MalformedField> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<u64>().map(Some).map_err(|_| MalformedField {
        field: field.to_string(),
        value: raw.to_string(),
    })
}
