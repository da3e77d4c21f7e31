//! Error types for the placement engine and its surrounding daemon.
//!
//! Mirrors the error-kind table of the planner design: startup and
//! configuration failures are fatal (the caller should exit with status 2),
//! while `MigrationRejected` and `Overprovisioned` are recoverable — the
//! cycle continues and the next pass re-plans from fresh state.

use crate::model::Dimension;

#[derive(Debug, thiserror::Error)]
pub enum PlbError {
    #[error("configuration file missing: {0}")]
    ConfigMissing(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("missing or invalid configuration key: {0}")]
    ConfigKey(String),

    #[error("required dependency missing: {0}")]
    DependencyMissing(String),

    #[error("hypervisor API unreachable: {0}")]
    ApiUnreachable(String),

    #[error("DNS resolution failed: {0}")]
    DnsFailure(String),

    #[error("TLS handshake failed: {0}")]
    TlsFailure(String),

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("migration of VM {vmid} ({vm_name}) from {from_node} to {to_node} was rejected: {reason}")]
    MigrationRejected {
        vmid: u32,
        vm_name: String,
        from_node: String,
        to_node: String,
        reason: String,
    },

    #[error("node {node} is overprovisioned on {dimension:?}: assigned {assigned} exceeds total {total}")]
    Overprovisioned {
        node: String,
        dimension: Dimension,
        assigned: u64,
        total: u64,
    },

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
}

impl PlbError {
    /// Whether this error should terminate the process (exit code 2).
    ///
    /// `MigrationRejected` and `Overprovisioned` are isolated failures: the
    /// current cycle continues and the next scheduled cycle re-plans from
    /// live state.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PlbError::MigrationRejected { .. } | PlbError::Overprovisioned { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PlbError>;
