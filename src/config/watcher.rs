//! Configuration file watcher for hot reload.
//!
//! Editors often fire several modify events for one save, and some touch the
//! file without changing it. Reloads only happen when the file content differs
//! from the last content seen, so live totals are not reshuffled by no-op
//! events and a broken edit is reported once rather than on every event.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{parse_config, ConfigError};
use crate::config::schema::AllocatorConfig;

/// Outcome of one changed configuration file.
#[derive(Debug)]
pub enum ConfigUpdate {
    /// The new content parsed and validated.
    Applied(AllocatorConfig),
    /// The new content was rejected; the running inventory is unchanged.
    Rejected(ConfigError),
}

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    last_content: Option<String>,
    update_tx: mpsc::UnboundedSender<ConfigUpdate>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// The current file content is taken as already applied. Returns the
    /// watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ConfigUpdate>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                last_content: fs::read_to_string(path).ok(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut last_content,
            update_tx,
        } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let Some(update) = read_update(&path, &mut last_content) else {
                        tracing::debug!(path = ?path, "Config file content unchanged, skipping reload");
                        return;
                    };
                    tracing::info!(path = ?path, "Config file change detected");
                    let _ = update_tx.send(update);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "Config watcher started");
        Ok(watcher)
    }
}

/// Read `path` and turn it into an update, or `None` if the content matches
/// `last_content`.
///
/// A read failure is reported but does not replace `last_content`, so the
/// same content reappearing after e.g. an atomic rename is still skipped.
pub fn read_update(path: &Path, last_content: &mut Option<String>) -> Option<ConfigUpdate> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return Some(ConfigUpdate::Rejected(ConfigError::Io(e))),
    };

    if last_content.as_deref() == Some(content.as_str()) {
        return None;
    }

    let update = match parse_config(&content) {
        Ok(config) => ConfigUpdate::Applied(config),
        Err(e) => ConfigUpdate::Rejected(e),
    };
    *last_content = Some(content);
    Some(update)
}
