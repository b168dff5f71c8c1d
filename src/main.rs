//! Module Group Allocator
//!
//! # Architecture Overview
//!
//! ```text
//!   allocator.toml ──▶ config (load + validate) ──▶ inventory (groups, rows, live totals)
//!                            ▲                              │
//!                            │ watch                        ▼
//!                      config watcher               scheduler (capacity rule +
//!                                                   first / roundrobin policy)
//!                                                           │
//!                                                           ▼
//!                                              Selected(row) | NoEligibleBackend
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use module_allocator::config::watcher::{ConfigUpdate, ConfigWatcher};
use module_allocator::config::{load_config, ConfigError};
use module_allocator::inventory::Inventory;
use module_allocator::lifecycle::signals::wait_for_signal;
use module_allocator::observability::{logging, metrics};
use module_allocator::scheduler::Selection;

#[derive(Parser)]
#[command(name = "module-allocator")]
#[command(about = "Capacity-aware module row allocation for module groups", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "allocator.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print a summary
    Check,
    /// Pick a row for one request without committing it
    Select {
        #[arg(short, long)]
        group: String,
        /// Override the group's policy ("first" or "roundrobin")
        #[arg(short, long)]
        policy: Option<String>,
        /// Force strict limits on
        #[arg(long, conflicts_with = "no_strict")]
        strict: bool,
        /// Force strict limits off
        #[arg(long)]
        no_strict: bool,
    },
    /// Run repeated allocations and show how load spreads
    Simulate {
        #[arg(short, long)]
        group: String,
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Hold the inventory and hot-reload it when the config file changes
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init(&config.observability.log_level);
    tracing::debug!(
        path = ?cli.config,
        groups = config.groups.len(),
        rows = config.rows.len(),
        "Configuration loaded"
    );

    let inventory = Inventory::from_config(&config);

    match cli.command {
        Commands::Check => {
            for summary in inventory.summaries() {
                println!(
                    "{}: policy={} force_limits={} rows={} malformed={}",
                    summary.name,
                    summary.settings.policy,
                    summary.settings.force_limits,
                    summary.backends.len(),
                    summary.malformed_rows,
                );
            }
            println!("configuration ok");
        }
        Commands::Select {
            group,
            policy,
            strict,
            no_strict,
        } => {
            let selection = match (policy, strict, no_strict) {
                (None, false, false) => inventory.select(&group)?,
                (policy, strict, no_strict) => {
                    let settings = config
                        .group(&group)
                        .ok_or_else(|| format!("unknown module group {group:?}"))?;
                    let policy = policy.unwrap_or_else(|| settings.policy.clone());
                    let strict = if strict {
                        true
                    } else if no_strict {
                        false
                    } else {
                        settings.force_limits
                    };
                    inventory.select_with(&group, &policy, strict)?
                }
            };
            match selection {
                Selection::Selected(id) => println!("{id}"),
                Selection::NoEligibleBackend => println!("none"),
            }
        }
        Commands::Simulate { group, count, json } => {
            let mut picks = Vec::with_capacity(count);
            for _ in 0..count {
                picks.push(inventory.allocate(&group)?.id());
            }
            let backends = inventory.snapshot(&group)?;

            if json {
                let report = serde_json::json!({
                    "group": group,
                    "picks": picks,
                    "backends": backends,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for (i, pick) in picks.iter().enumerate() {
                    match pick {
                        Some(id) => println!("#{:<4} row {}", i + 1, id),
                        None => println!("#{:<4} none", i + 1),
                    }
                }
                for b in &backends {
                    println!("row {} total={} limit={:?}", b.id, b.total, b.limit);
                }
            }
        }
        Commands::Watch => {
            if config.observability.metrics_enabled {
                match config.observability.metrics_address.parse() {
                    Ok(addr) => metrics::init_metrics(addr),
                    Err(_) => tracing::error!(
                        metrics_address = %config.observability.metrics_address,
                        "Failed to parse metrics address"
                    ),
                }
            }

            log_summaries(&inventory);

            let (watcher, mut updates) = ConfigWatcher::new(&cli.config);
            let _watcher = watcher.run()?;

            let signal = wait_for_signal();
            tokio::pin!(signal);

            loop {
                tokio::select! {
                    Some(update) = updates.recv() => match update {
                        ConfigUpdate::Applied(new_config) => {
                            inventory.reload(&new_config);
                            log_summaries(&inventory);
                        }
                        ConfigUpdate::Rejected(e) => log_rejected(&e),
                    },
                    _ = &mut signal => break,
                }
            }
            tracing::info!("Shutdown complete");
        }
    }

    Ok(())
}

fn log_summaries(inventory: &Inventory) {
    for summary in inventory.summaries() {
        let used: u64 = summary.backends.iter().map(|b| b.total).sum();
        tracing::info!(
            group = %summary.name,
            policy = %summary.settings.policy,
            force_limits = summary.settings.force_limits,
            rows = summary.backends.len(),
            malformed = summary.malformed_rows,
            used,
            "Module group"
        );
    }
}

/// Report why an edited config was not applied.
fn log_rejected(err: &ConfigError) {
    match err {
        ConfigError::Validation(errors) => {
            for error in errors {
                tracing::warn!(error = %error, "Config edit rejected");
            }
        }
        other => tracing::warn!(error = %other, "Config edit rejected"),
    }
    tracing::warn!("Keeping current inventory");
}
