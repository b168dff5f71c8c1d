//! Shared utilities for integration tests.

use rand::Rng;

use module_allocator::inventory::{GroupSettings, Inventory, ModuleRow};
use module_allocator::scheduler::Backend;

/// Build a pool from `(id, limit, total)` triples; `None` limit is unlimited.
#[allow(dead_code)]
pub fn pool(rows: &[(u64, Option<u64>, u64)]) -> Vec<Backend> {
    rows.iter()
        .map(|&(id, limit, total)| Backend::new(id, limit, total))
        .collect()
}

/// Random pool with small numbers so ties and saturation happen often.
#[allow(dead_code)]
pub fn random_pool<R: Rng>(rng: &mut R) -> Vec<Backend> {
    let len = rng.gen_range(0..8);
    (0..len)
        .map(|i| {
            let limit = if rng.gen_bool(0.25) {
                None
            } else {
                Some(rng.gen_range(0..6))
            };
            Backend::new(i + 1, limit, rng.gen_range(0..8))
        })
        .collect()
}

/// Inventory with a single group "pool" holding `rows` rows of the given limit.
#[allow(dead_code)]
pub fn single_group(policy: &str, strict: bool, rows: u64, limit: &str) -> Inventory {
    let inventory = Inventory::new();
    inventory.insert_group("pool", GroupSettings::new(policy, strict));
    for id in 1..=rows {
        inventory
            .upsert_row("pool", ModuleRow::new(id).with_meta("limit", limit))
            .unwrap();
    }
    inventory
}
