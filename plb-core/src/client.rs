//! The hypervisor client seam the core treats as external.
//!
//! The engine and snapshot builder depend only on this trait; the concrete
//! `reqwest`-based implementation against the Proxmox VE REST API lives in
//! the `plb` binary crate so that `plb-core` can be tested with an
//! in-memory fake.

use serde::Deserialize;

/// Raw node record as returned by `GET /api2/json/nodes`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    pub name: String,
    pub status: String,
    pub maxcpu: u64,
    /// Fractional CPU load, 0.0-1.0, as Proxmox reports it — not an
    /// absolute core count.
    pub cpu: f64,
    pub maxmem: u64,
    pub mem: u64,
    pub maxdisk: u64,
    pub disk: u64,
}

/// Raw VM record as returned by `GET /api2/json/nodes/{node}/qemu`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawVm {
    pub vmid: u32,
    pub name: String,
    pub status: String,
    pub cpus: u32,
    /// Fractional CPU load relative to `cpus`, as Proxmox reports it.
    pub cpu: f64,
    pub maxmem: u64,
    pub mem: u64,
    pub maxdisk: u64,
    pub disk: u64,
}

/// Raw VM configuration, as returned by `GET .../qemu/{vmid}/config`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVmConfig {
    pub tags: Option<String>,
}

/// The capabilities the placement engine's surrounding daemon needs from
/// the hypervisor: enumerate the cluster, and execute a migration.
#[async_trait::async_trait]
pub trait HypervisorClient: Send + Sync {
    async fn list_nodes(&self) -> anyhow::Result<Vec<RawNode>>;
    async fn list_vms(&self, node: &str) -> anyhow::Result<Vec<RawVm>>;
    async fn get_vm_config(&self, node: &str, vmid: u32) -> anyhow::Result<RawVmConfig>;
    async fn migrate(&self, node: &str, vmid: u32, target: &str, online: bool) -> anyhow::Result<()>;
}
