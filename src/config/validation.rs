//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (rows reference existing groups)
//! - Reject unsupported policy kinds before any selection runs
//! - Detect duplicate group names and row ids
//! - Check the log level and metrics address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AllocatorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Malformed meta values are not rejected here; they make a row ineligible

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::config::schema::AllocatorConfig;
use crate::scheduler::{PolicyKind, RowId};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("group {0:?} is defined more than once")]
    DuplicateGroup(String),

    #[error("group name must not be blank")]
    BlankGroupName,

    #[error("group {group:?} uses unsupported policy {policy:?}")]
    UnsupportedPolicy { group: String, policy: String },

    #[error("group {group:?} has a blank {which} field name")]
    BlankFieldName { group: String, which: &'static str },

    #[error("row {row} references unknown group {group:?}")]
    UnknownGroup { row: RowId, group: String },

    #[error("row {row} appears more than once in group {group:?}")]
    DuplicateRow { row: RowId, group: String },

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("invalid log level {0:?} (expected trace, debug, info, warn, error or off)")]
    LogLevel(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AllocatorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut group_names = HashSet::new();

    for group in &config.groups {
        if group.name.trim().is_empty() {
            errors.push(ValidationError::BlankGroupName);
        } else if !group_names.insert(group.name.as_str()) {
            errors.push(ValidationError::DuplicateGroup(group.name.clone()));
        }

        if group.policy.parse::<PolicyKind>().is_err() {
            errors.push(ValidationError::UnsupportedPolicy {
                group: group.name.clone(),
                policy: group.policy.clone(),
            });
        }

        if group.limit_field.trim().is_empty() {
            errors.push(ValidationError::BlankFieldName {
                group: group.name.clone(),
                which: "limit",
            });
        }
        if group.total_field.trim().is_empty() {
            errors.push(ValidationError::BlankFieldName {
                group: group.name.clone(),
                which: "total",
            });
        }
    }

    let mut seen_rows = HashSet::new();
    for row in &config.rows {
        if !group_names.contains(row.group.as_str()) {
            errors.push(ValidationError::UnknownGroup {
                row: row.id,
                group: row.group.clone(),
            });
            continue;
        }
        if !seen_rows.insert((row.group.as_str(), row.id)) {
            errors.push(ValidationError::DuplicateRow {
                row: row.id,
                group: row.group.clone(),
            });
        }
    }

    let observability = &config.observability;
    if observability.log_level.parse::<LevelFilter>().is_err() {
        errors.push(ValidationError::LogLevel(observability.log_level.clone()));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{GroupConfig, RowConfig};

    fn group(name: &str, policy: &str) -> GroupConfig {
        GroupConfig {
            name: name.into(),
            policy: policy.into(),
            force_limits: false,
            limit_field: "limit".into(),
            total_field: "total".into(),
        }
    }

    fn row(id: u64, group: &str) -> RowConfig {
        RowConfig {
            id: RowId(id),
            group: group.into(),
            meta: Default::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = AllocatorConfig {
            groups: vec![group("a", "first"), group("b", "roundrobin")],
            rows: vec![row(1, "a"), row(1, "b"), row(2, "b")],
            ..Default::default()
        };
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_reports_all_errors() {
        let mut blank_fields = group("c", "first");
        blank_fields.total_field = "  ".into();

        let config = AllocatorConfig {
            groups: vec![group("a", "first"), group("a", "random"), blank_fields],
            rows: vec![row(1, "a"), row(1, "a"), row(2, "missing")],
            ..Default::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateGroup("a".into()),
                ValidationError::UnsupportedPolicy {
                    group: "a".into(),
                    policy: "random".into()
                },
                ValidationError::BlankFieldName {
                    group: "c".into(),
                    which: "total"
                },
                ValidationError::DuplicateRow {
                    row: RowId(1),
                    group: "a".into()
                },
                ValidationError::UnknownGroup {
                    row: RowId(2),
                    group: "missing".into()
                },
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = AllocatorConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MetricsAddress("nope".into())])
        );
    }

    #[test]
    fn test_log_level_must_name_a_level() {
        let mut config = AllocatorConfig::default();
        for level in ["trace", "debug", "WARN", "off"] {
            config.observability.log_level = level.into();
            assert!(validate_config(&config).is_ok(), "{level} should be accepted");
        }

        config.observability.log_level = "verbose".into();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::LogLevel("verbose".into())])
        );
    }
}
