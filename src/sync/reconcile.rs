use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::generator::{merge_groups, merge_proxies, MergePolicy};
use crate::models::ConfigDocument;
use crate::parser::parse_node_list;
use crate::settings::Settings;
use crate::utils::file::{file_exists, remove_if_exists, replace_file_atomically};
use crate::utils::system::sleep_secs;

use super::{fingerprint, FingerprintStore, Gateway, RunLock, SyncError, SyncOutcome, SyncReport};

/// Drives one reconciliation pass against a [`Gateway`]
pub struct Reconciler<G: Gateway> {
    settings: Settings,
    gateway: G,
}

/// Paths resolved for one pass
struct PassPaths {
    config: PathBuf,
    backup: PathBuf,
    scratch: PathBuf,
}

impl<G: Gateway> Reconciler<G> {
    pub fn new(settings: Settings, gateway: G) -> Self {
        Reconciler { settings, gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Run one pass. The run lock is held for the whole pass and released on
    /// every exit path.
    pub fn run(&self) -> SyncOutcome {
        let _lock = match RunLock::acquire(&self.settings.lock_path) {
            Ok(lock) => lock,
            Err(e) => {
                warn!("{}", e);
                return SyncOutcome::Aborted(e);
            }
        };

        match self.reconcile() {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Update aborted: {}", e);
                SyncOutcome::Aborted(e)
            }
        }
    }

    fn resolve_paths(&self) -> Result<PassPaths, SyncError> {
        let config = self
            .settings
            .resolve_config_path()
            .map_err(|e| SyncError::ConfigNotFound(e.to_string()))?;
        if !file_exists(&config) {
            return Err(SyncError::ConfigNotFound(config.display().to_string()));
        }

        Ok(PassPaths {
            backup: self.settings.backup_path_for(&config),
            scratch: PathBuf::from(&self.settings.scratch_path),
            config,
        })
    }

    fn reconcile(&self) -> Result<SyncOutcome, SyncError> {
        let nodes_path = Path::new(&self.settings.nodes_path);
        let source = fs::read(nodes_path).map_err(|e| SyncError::io(nodes_path, e))?;

        let store = FingerprintStore::new(&self.settings.fingerprint_path);
        let current = fingerprint(&source);
        let previous = store.load().map_err(|e| SyncError::io(store.path(), e))?;
        info!("Node list fingerprint: {}", current);
        if previous.as_deref() == Some(current.as_str()) {
            info!("Node list unchanged, nothing to do");
            return Ok(SyncOutcome::Unchanged);
        }

        let batch = parse_node_list(&String::from_utf8_lossy(&source), self.settings.name_strictness);
        if batch.is_empty() {
            return Err(SyncError::EmptyBatch);
        }

        let paths = self.resolve_paths()?;
        let mut document = ConfigDocument::load(&paths.config)?;
        let proxies = merge_proxies(&mut document, &batch.records, MergePolicy::ReplaceAll);
        let groups = merge_groups(&mut document, &proxies.names, &self.settings.group_selection());

        document.save(&paths.scratch)?;
        if !self.gateway.verify(&paths.scratch) {
            if let Err(e) = remove_if_exists(&paths.scratch) {
                warn!("Failed to remove {}: {}", paths.scratch.display(), e);
            }
            return Err(SyncError::VerificationFailed);
        }
        info!("Merged configuration passed verification");

        self.commit(&paths)?;
        info!("Committed new configuration to {}", paths.config.display());
        if let Err(e) = store.save(&current) {
            warn!("Failed to store fingerprint in {}: {}", store.path().display(), e);
        }

        if self.restart_is_healthy() {
            info!("Gateway restarted cleanly");
            return Ok(SyncOutcome::Committed(SyncReport {
                config_path: paths.config,
                fingerprint: current,
                parsed: batch.success_count,
                parse_errors: batch.error_count,
                proxies,
                groups,
            }));
        }

        error!("Gateway reported a configuration error, rolling back");
        match self.rollback(&paths, &store, previous.as_deref()) {
            Ok(()) => Ok(SyncOutcome::RolledBack(SyncError::PostRestartUnhealthy)),
            Err(e) => {
                error!("Rollback failed: {}", e);
                Ok(SyncOutcome::RolledBack(SyncError::RollbackFailed(e.to_string())))
            }
        }
    }

    /// Back up the live document, then move the verified scratch over it
    fn commit(&self, paths: &PassPaths) -> Result<(), SyncError> {
        fs::copy(&paths.config, &paths.backup).map_err(|e| SyncError::io(&paths.backup, e))?;
        replace_file_atomically(&paths.scratch, &paths.config)
            .map_err(|e| SyncError::io(&paths.config, e))?;
        if let Err(e) = remove_if_exists(&paths.scratch) {
            warn!("Failed to remove {}: {}", paths.scratch.display(), e);
        }
        Ok(())
    }

    fn restart_is_healthy(&self) -> bool {
        let mark = self.gateway.log_mark();
        if let Err(e) = self.gateway.restart() {
            error!("Gateway restart failed: {}", e);
            return false;
        }
        sleep_secs(self.settings.settle_secs);
        !self.gateway.scan_recent_log(&self.settings.error_marker, mark)
    }

    /// Put the backup back over the live document and restart on it. The
    /// previous fingerprint is restored even when the document could not be.
    fn rollback(
        &self,
        paths: &PassPaths,
        store: &FingerprintStore,
        previous: Option<&str>,
    ) -> Result<(), SyncError> {
        if let Err(e) = store.restore(previous) {
            error!("Failed to restore fingerprint in {}: {}", store.path().display(), e);
        }
        replace_file_atomically(&paths.backup, &paths.config)
            .map_err(|e| SyncError::io(&paths.backup, e))?;
        if let Err(e) = self.gateway.restart() {
            error!("Gateway restart after rollback failed: {}", e);
        }
        info!("Restored previous configuration from {}", paths.backup.display());
        Ok(())
    }
}
