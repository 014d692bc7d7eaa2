//! One reconciliation pass
//!
//! lock → fingerprint → parse → merge → serialize → verify → commit →
//! restart → health check, with rollback when the restarted gateway reports a
//! configuration error.

pub mod fingerprint;
pub mod gateway;
pub mod lock;
pub mod reconcile;

use std::path::PathBuf;

use thiserror::Error;

use crate::generator::{GroupMergeReport, ProxyMergeReport};
use crate::models::ConfigError;

pub use fingerprint::{fingerprint, FingerprintStore};
pub use gateway::{CommandGateway, Gateway};
pub use lock::RunLock;
pub use reconcile::Reconciler;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Another update is running (lock {0} exists)")]
    LockHeld(String),

    #[error("Node list produced no usable nodes")]
    EmptyBatch,

    #[error("Gateway rejected the merged configuration")]
    VerificationFailed,

    #[error("Gateway reported errors after restart")]
    PostRestartUnhealthy,

    #[error("Gateway reported errors after restart and the backup could not be restored: {0}")]
    RollbackFailed(String),

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration document error: {0}")]
    Yaml(#[from] ConfigError),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into().display().to_string(),
            source,
        }
    }
}

/// What a committed pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub config_path: PathBuf,
    pub fingerprint: String,
    pub parsed: usize,
    pub parse_errors: usize,
    pub proxies: ProxyMergeReport,
    pub groups: GroupMergeReport,
}

/// Result of [`Reconciler::run`]
#[derive(Debug)]
pub enum SyncOutcome {
    /// Node list unchanged since the last commit; nothing was touched
    Unchanged,
    /// New configuration is live and the gateway came back healthy
    Committed(SyncReport),
    /// Stopped before the live configuration was modified
    Aborted(SyncError),
    /// New configuration was committed, then the gateway came back unhealthy.
    /// [`SyncError::PostRestartUnhealthy`] means the backup is live again,
    /// [`SyncError::RollbackFailed`] means the new configuration still is.
    RolledBack(SyncError),
}

impl SyncOutcome {
    /// Whether the pass ended in a state the caller should treat as success
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SyncOutcome::Unchanged
                | SyncOutcome::Committed(_)
                | SyncOutcome::Aborted(SyncError::LockHeld(_))
        )
    }
}
