//! Module group inventory.
//!
//! # Responsibilities
//! - Hold module groups and their rows, keyed by group name
//! - Materialize pool snapshots for the scheduler
//! - Commit allocations and releases to the row usage counters

use std::collections::{HashMap, HashSet};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;

use crate::config::AllocatorConfig;
use crate::inventory::row::{GroupSettings, ModuleRow};
use crate::observability::metrics;
use crate::scheduler::{
    AllocationScheduler, Backend, MalformedField, RowId, SchedulerError, Selection,
};

/// Errors returned by inventory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("unknown module group {0:?}")]
    UnknownGroup(String),

    #[error("row {row} not found in group {group:?}")]
    UnknownRow { group: String, row: RowId },

    #[error("row {row} in group {group:?} is malformed: {source}")]
    MalformedRow {
        group: String,
        row: RowId,
        source: MalformedField,
    },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

#[derive(Debug, Clone)]
struct GroupState {
    settings: GroupSettings,
    rows: Vec<ModuleRow>,
}

impl GroupState {
    /// Backends for every well-formed row, in row order.
    fn pool(&self, group: &str) -> (Vec<Backend>, usize) {
        let mut skipped = 0;
        let backends = self
            .rows
            .iter()
            .filter_map(|row| match row.to_backend(&self.settings.fields) {
                Ok(backend) => Some(backend),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(group = %group, row = %row.id, error = %e, "Skipping malformed module row");
                    None
                }
            })
            .collect();
        (backends, skipped)
    }

    fn row_mut(&mut self, group: &str, id: RowId) -> Result<&mut ModuleRow, InventoryError> {
        self.rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| InventoryError::UnknownRow {
                group: group.to_string(),
                row: id,
            })
    }
}

/// Read-only view of a group for display.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub name: String,
    pub settings: GroupSettings,
    pub backends: Vec<Backend>,
    /// Rows left out of the pool because their meta could not be parsed.
    pub malformed_rows: usize,
}

/// Concurrent store of module groups.
///
/// Each group sits behind its own map entry lock, so an `allocate` call
/// selects and commits without another caller observing the pool in between.
#[derive(Debug, Default)]
pub struct Inventory {
    groups: DashMap<String, GroupState>,
    scheduler: AllocationScheduler,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an inventory from configuration.
    pub fn from_config(config: &AllocatorConfig) -> Self {
        let inventory = Self::new();
        for (name, state) in states_from_config(config) {
            inventory.groups.insert(name, state);
        }
        inventory.publish_totals();
        inventory
    }

    /// Add or replace a group (rows are dropped on replace).
    pub fn insert_group(&self, name: &str, settings: GroupSettings) {
        self.groups.insert(
            name.to_string(),
            GroupState {
                settings,
                rows: Vec::new(),
            },
        );
    }

    /// Append a row to an existing group, replacing any row with the same id.
    pub fn upsert_row(&self, group: &str, row: ModuleRow) -> Result<(), InventoryError> {
        let mut state = self
            .groups
            .get_mut(group)
            .ok_or_else(|| InventoryError::UnknownGroup(group.to_string()))?;

        match state.rows.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row,
            None => state.rows.push(row),
        }
        Ok(())
    }

    /// Names of all groups, sorted.
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Materialize the current pool of a group.
    pub fn snapshot(&self, group: &str) -> Result<Vec<Backend>, InventoryError> {
        let state = self
            .groups
            .get(group)
            .ok_or_else(|| InventoryError::UnknownGroup(group.to_string()))?;
        Ok(state.pool(group).0)
    }

    /// Pick a row with the group's own settings without committing anything.
    pub fn select(&self, group: &str) -> Result<Selection, InventoryError> {
        let (policy, strict) = {
            let state = self
                .groups
                .get(group)
                .ok_or_else(|| InventoryError::UnknownGroup(group.to_string()))?;
            (state.settings.policy.clone(), state.settings.force_limits)
        };
        self.select_with(group, &policy, strict)
    }

    /// Pick a row with explicit policy and strictness, without committing.
    pub fn select_with(
        &self,
        group: &str,
        policy: &str,
        strict_limits: bool,
    ) -> Result<Selection, InventoryError> {
        let pool = self.snapshot(group)?;
        let result = self.scheduler.select(&pool, policy, strict_limits);
        metrics::record_selection(group, policy, "select", outcome_label(&result));
        Ok(result?)
    }

    /// Select a row and bump its usage by one, atomically per group.
    pub fn allocate(&self, group: &str) -> Result<Selection, InventoryError> {
        let mut state = self
            .groups
            .get_mut(group)
            .ok_or_else(|| InventoryError::UnknownGroup(group.to_string()))?;

        let (pool, _) = state.pool(group);
        let policy = state.settings.policy.clone();

        let result = self
            .scheduler
            .select(&pool, &policy, state.settings.force_limits);
        metrics::record_selection(group, &policy, "allocate", outcome_label(&result));

        let selection = match result {
            Ok(selection) => selection,
            Err(e) => {
                tracing::error!(group = %group, policy = %policy, error = %e, "Allocation failed");
                return Err(e.into());
            }
        };

        let Selection::Selected(id) = selection else {
            tracing::info!(group = %group, pool_size = pool.len(), "No eligible module row");
            return Ok(selection);
        };

        // The chosen row came from this very pool, so it parsed cleanly.
        let new_total = pool
            .iter()
            .find(|b| b.id == id)
            .map_or(1, |b| b.total.saturating_add(1));
        let fields = state.settings.fields.clone();
        state.row_mut(group, id)?.set_total(&fields, new_total);

        metrics::record_row_total(group, id.0, new_total);
        tracing::info!(group = %group, row = %id, total = new_total, "Module row allocated");

        Ok(selection)
    }

    /// Give back one unit on a row (e.g. a cancelled service). Returns the new total.
    pub fn release(&self, group: &str, id: RowId) -> Result<u64, InventoryError> {
        let mut state = self
            .groups
            .get_mut(group)
            .ok_or_else(|| InventoryError::UnknownGroup(group.to_string()))?;

        let fields = state.settings.fields.clone();
        let row = state.row_mut(group, id)?;
        let backend = row
            .to_backend(&fields)
            .map_err(|source| InventoryError::MalformedRow {
                group: group.to_string(),
                row: id,
                source,
            })?;

        let new_total = backend.total.saturating_sub(1);
        row.set_total(&fields, new_total);

        metrics::record_release(group);
        metrics::record_row_total(group, id.0, new_total);
        tracing::info!(group = %group, row = %id, total = new_total, "Module row released");

        Ok(new_total)
    }

    /// Replace groups and rows from new configuration.
    ///
    /// Rows that survive the reload (same group, same id) keep their live
    /// totals; groups missing from the new configuration are dropped.
    pub fn reload(&self, config: &AllocatorConfig) {
        let mut fresh = states_from_config(config);
        let keep: HashSet<String> = fresh.keys().cloned().collect();

        self.groups.retain(|name, _| keep.contains(name));

        for (name, mut state) in fresh.drain() {
            match self.groups.entry(name) {
                Entry::Occupied(mut entry) => {
                    carry_over_totals(entry.get(), &mut state);
                    entry.insert(state);
                }
                Entry::Vacant(entry) => {
                    entry.insert(state);
                }
            }
        }

        self.publish_totals();
        tracing::info!(groups = self.groups.len(), "Inventory reloaded");
    }

    /// Publish the usage gauge of every well-formed row.
    pub fn publish_totals(&self) {
        for entry in self.groups.iter() {
            for backend in entry.pool(entry.key()).0 {
                metrics::record_row_total(entry.key(), backend.id.0, backend.total);
            }
        }
    }

    /// Per-group view, sorted by name.
    pub fn summaries(&self) -> Vec<GroupSummary> {
        let mut summaries: Vec<GroupSummary> = self
            .groups
            .iter()
            .map(|entry| {
                let (backends, malformed_rows) = entry.pool(entry.key());
                GroupSummary {
                    name: entry.key().clone(),
                    settings: entry.settings.clone(),
                    backends,
                    malformed_rows,
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }
}

fn outcome_label(result: &Result<Selection, SchedulerError>) -> &'static str {
    match result {
        Ok(Selection::Selected(_)) => "selected",
        Ok(Selection::NoEligibleBackend) => "no_eligible_backend",
        Err(SchedulerError::UnsupportedPolicy(_)) => "unsupported_policy",
    }
}

fn states_from_config(config: &AllocatorConfig) -> HashMap<String, GroupState> {
    config
        .groups
        .iter()
        .map(|group| {
            let state = GroupState {
                settings: GroupSettings::from(group),
                rows: config.rows_in(&group.name).map(ModuleRow::from).collect(),
            };
            (group.name.clone(), state)
        })
        .collect()
}

/// Copy live totals from `old` into matching rows of `new`.
fn carry_over_totals(old: &GroupState, new: &mut GroupState) {
    let new_fields = new.settings.fields.clone();
    for row in &mut new.rows {
        let Some(previous) = old.rows.iter().find(|r| r.id == row.id) else {
            continue;
        };
        if let Ok(backend) = previous.to_backend(&old.settings.fields) {
            row.set_total(&new_fields, backend.total);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn inventory(policy: &str, strict: bool, rows: Vec<ModuleRow>) -> Inventory {
        let inventory = Inventory::new();
        inventory.insert_group("web", GroupSettings::new(policy, strict));
        for row in rows {
            inventory.upsert_row("web", row).unwrap();
        }
        inventory
    }

    fn totals(inventory: &Inventory, group: &str) -> Vec<(u64, u64)> {
        inventory
            .snapshot(group)
            .unwrap()
            .iter()
            .map(|b| (b.id.0, b.total))
            .collect()
    }

    #[test]
    fn test_allocate_round_robin_spreads_load() {
        let inv = inventory(
            "roundrobin",
            true,
            vec![
                ModuleRow::new(1).with_meta("limit", "2"),
                ModuleRow::new(2).with_meta("limit", "2"),
            ],
        );

        let picks: Vec<Selection> = (0..5).map(|_| inv.allocate("web").unwrap()).collect();

        assert_eq!(
            picks,
            vec![
                Selection::Selected(RowId(1)),
                Selection::Selected(RowId(2)),
                Selection::Selected(RowId(1)),
                Selection::Selected(RowId(2)),
                Selection::NoEligibleBackend,
            ]
        );
        assert_eq!(totals(&inv, "web"), vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_allocate_first_fills_in_order() {
        let inv = inventory(
            "first",
            false,
            vec![
                ModuleRow::new(1).with_meta("limit", "1"),
                ModuleRow::new(2).with_meta("limit", " "),
            ],
        );

        for _ in 0..3 {
            inv.allocate("web").unwrap();
        }
        assert_eq!(totals(&inv, "web"), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn test_lenient_round_robin_overcommits() {
        let inv = inventory(
            "roundrobin",
            false,
            vec![ModuleRow::new(1).with_meta("limit", "1").with_meta("total", "1")],
        );

        assert_eq!(inv.allocate("web").unwrap(), Selection::Selected(RowId(1)));
        assert_eq!(totals(&inv, "web"), vec![(1, 2)]);
    }

    #[test]
    fn test_select_does_not_commit() {
        let inv = inventory("first", true, vec![ModuleRow::new(8).with_meta("limit", "1")]);

        assert_eq!(inv.select("web").unwrap(), Selection::Selected(RowId(8)));
        assert_eq!(inv.select("web").unwrap(), Selection::Selected(RowId(8)));
        assert_eq!(totals(&inv, "web"), vec![(8, 0)]);
    }

    #[test]
    fn test_malformed_row_is_never_chosen() {
        let inv = inventory(
            "first",
            false,
            vec![
                ModuleRow::new(1).with_meta("limit", "lots"),
                ModuleRow::new(2).with_meta("limit", "5"),
            ],
        );

        assert_eq!(inv.allocate("web").unwrap(), Selection::Selected(RowId(2)));
        assert_eq!(inv.summaries()[0].malformed_rows, 1);
        assert!(matches!(
            inv.release("web", RowId(1)),
            Err(InventoryError::MalformedRow { .. })
        ));
    }

    #[test]
    fn test_release_saturates_at_zero() {
        let inv = inventory(
            "first",
            true,
            vec![ModuleRow::new(1).with_meta("limit", "1").with_meta("total", 1u64)],
        );

        assert_eq!(inv.allocate("web").unwrap(), Selection::NoEligibleBackend);
        assert_eq!(inv.release("web", RowId(1)), Ok(0));
        assert_eq!(inv.release("web", RowId(1)), Ok(0));
        assert_eq!(inv.allocate("web").unwrap(), Selection::Selected(RowId(1)));
    }

    #[test]
    fn test_unknown_group_and_row() {
        let inv = inventory("first", false, vec![]);

        assert_eq!(
            inv.allocate("nope"),
            Err(InventoryError::UnknownGroup("nope".into()))
        );
        assert_eq!(
            inv.release("web", RowId(3)),
            Err(InventoryError::UnknownRow {
                group: "web".into(),
                row: RowId(3)
            })
        );
        assert_eq!(
            inv.upsert_row("nope", ModuleRow::new(1)),
            Err(InventoryError::UnknownGroup("nope".into()))
        );
    }

    #[test]
    fn test_empty_group_has_no_eligible_backend() {
        let inv = inventory("roundrobin", false, vec![]);
        assert_eq!(inv.allocate("web").unwrap(), Selection::NoEligibleBackend);
    }

    #[test]
    fn test_unsupported_policy_is_an_error() {
        let inv = inventory("random", false, vec![ModuleRow::new(1)]);

        assert_eq!(
            inv.allocate("web"),
            Err(InventoryError::Scheduler(SchedulerError::UnsupportedPolicy(
                "random".into()
            )))
        );
        assert_eq!(totals(&inv, "web"), vec![(1, 0)]);
    }

    #[test]
    fn test_metrics_follow_inventory_changes() {
        use metrics_util::debugging::{DebugValue, DebuggingRecorder};

        let config = parse_config(
            r#"
            [[groups]]
            name = "web"
            policy = "roundrobin"

            [[rows]]
            id = 1
            group = "web"
            meta = { total = 4 }

            [[rows]]
            id = 2
            group = "web"
            meta = { total = 1 }
            "#,
        )
        .unwrap();

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        ::metrics::with_local_recorder(&recorder, || {
            let inv = Inventory::from_config(&config);
            assert_eq!(inv.select("web").unwrap(), Selection::Selected(RowId(2)));
            assert_eq!(inv.allocate("web").unwrap(), Selection::Selected(RowId(2)));
            assert!(inv.select_with("web", "random", false).is_err());
        });

        let snapshot = snapshotter.snapshot().into_vec();
        let value = |name: &str, labels: &[(&str, &str)]| {
            snapshot
                .iter()
                .find(|(key, _, _, _)| {
                    key.key().name() == name
                        && labels.iter().all(|(k, v)| {
                            key.key().labels().any(|l| l.key() == *k && l.value() == *v)
                        })
                })
                .map(|(_, _, _, value)| value.clone())
        };

        assert_eq!(
            value("allocator_row_total", &[("group", "web"), ("row", "1")]),
            Some(DebugValue::Gauge(4.0.into())).as_ref()
        );
        assert_eq!(
            value("allocator_row_total", &[("group", "web"), ("row", "2")]),
            Some(DebugValue::Gauge(2.0.into())).as_ref()
        );
        assert_eq!(
            value(
                "allocator_selections_total",
                &[("action", "select"), ("outcome", "selected")]
            ),
            Some(DebugValue::Counter(1)).as_ref()
        );
        assert_eq!(
            value(
                "allocator_selections_total",
                &[("action", "allocate"), ("outcome", "selected")]
            ),
            Some(DebugValue::Counter(1)).as_ref()
        );
        assert_eq!(
            value(
                "allocator_selections_total",
                &[("policy", "random"), ("outcome", "unsupported_policy")]
            ),
            Some(DebugValue::Counter(1)).as_ref()
        );
    }

    #[test]
    fn test_reload_carries_over_live_totals() {
        let config = parse_config(
            r#"
            [[groups]]
            name = "web"
            policy = "roundrobin"

            [[groups]]
            name = "old"

            [[rows]]
            id = 1
            group = "web"

            [[rows]]
            id = 2
            group = "web"
            "#,
        )
        .unwrap();
        let inv = Inventory::from_config(&config);
        inv.allocate("web").unwrap();
        inv.allocate("web").unwrap();
        inv.allocate("web").unwrap();
        assert_eq!(totals(&inv, "web"), vec![(1, 2), (2, 1)]);

        let updated = parse_config(
            r#"
            [[groups]]
            name = "web"
            policy = "first"
            total_field = "accounts"

            [[rows]]
            id = 2
            group = "web"

            [[rows]]
            id = 3
            group = "web"
            meta = { accounts = 7 }
            "#,
        )
        .unwrap();
        inv.reload(&updated);

        assert_eq!(inv.group_names(), vec!["web".to_string()]);
        assert_eq!(totals(&inv, "web"), vec![(2, 1), (3, 7)]);
        assert_eq!(inv.summaries()[0].settings.policy, "first");
    }
}
