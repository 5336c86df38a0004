//! Configuration file watcher for hot reload.
//!
//! Only the `[forwarding]` section takes effect without a restart; listener,
//! timeout and local endpoint settings are read once at startup. The local
//! endpoints are mounted under `strip_prefix`, so a reload that changes it
//! is rejected.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config_with, ConfigOverrides};
use crate::config::schema::ForwardingConfig;

/// Watches the configuration file and publishes changed forwarding sections.
pub struct ConfigWatcher {
    path: PathBuf,
    current: ForwardingConfig,
    overrides: ConfigOverrides,
    update_tx: mpsc::UnboundedSender<ForwardingConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`, starting from the `current` settings.
    ///
    /// `overrides` are applied to every reloaded file before it is compared
    /// and validated. Returns the watcher and a receiver for validated
    /// forwarding updates.
    pub fn new(
        path: &Path,
        current: ForwardingConfig,
        overrides: ConfigOverrides,
    ) -> (Self, mpsc::UnboundedReceiver<ForwardingConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                current,
                overrides,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file.
    ///
    /// The returned handle must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut current,
            overrides,
            update_tx,
        } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if let Some(next) = reload(&path, &current, &overrides) {
                        current = next.clone();
                        let _ = update_tx.send(next);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "Config watcher started");
        Ok(watcher)
    }
}

/// Load `path` with `overrides` applied and return its forwarding section if
/// it differs from `current`.
///
/// Editors often emit several events per save; unchanged reloads are dropped.
fn reload(
    path: &Path,
    current: &ForwardingConfig,
    overrides: &ConfigOverrides,
) -> Option<ForwardingConfig> {
    match load_config_with(path, overrides) {
        Ok(config) if config.forwarding.strip_prefix != current.strip_prefix => {
            tracing::warn!(
                path = ?path,
                strip_prefix = %config.forwarding.strip_prefix,
                "strip_prefix cannot change without a restart, keeping current settings"
            );
            None
        }
        Ok(config) if config.forwarding == *current => {
            tracing::debug!(path = ?path, "Config file touched, forwarding unchanged");
            None
        }
        Ok(config) => {
            tracing::info!(path = ?path, "Config file changed, forwarding settings reloaded");
            Some(config.forwarding)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current settings");
            None
        }
    }
}
