//! The cluster data model: `Node`, `Vm`, `ClusterState`, `Policy` and the
//! `MigrationPlan` the engine produces. Percentages are always derived from
//! the integer counters on demand — there is no stored, independently
//! mutable percentage field to go stale (see DESIGN.md).

use serde::Serialize;
use std::collections::BTreeMap;

/// Which resource axis the policy balances on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Cpu,
    Memory,
    Disk,
}

/// Whether the policy balances observed consumption or provisioned
/// commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Used,
    Assigned,
}

/// Per-dimension resource counters for a node. `free` and every percentage
/// are computed from `total`/`used`/`assigned`, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounters {
    pub total: u64,
    pub used: u64,
    pub assigned: u64,
}

impl ResourceCounters {
    pub fn free(&self) -> u64 {
        self.total.saturating_sub(self.used)
    }

    pub fn used_pct(&self) -> u32 {
        integer_pct(self.used, self.total)
    }

    pub fn free_pct(&self) -> u32 {
        integer_pct(self.free(), self.total)
    }

    pub fn assigned_pct(&self) -> u32 {
        integer_pct(self.assigned, self.total)
    }
}

/// Truncating integer percentage (no rounding) — this is load-bearing:
/// the evaluator's fixed-point detection relies on exact equality between
/// successive truncated percentages.
fn integer_pct(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as u128 * 100) / whole as u128) as u32
}

/// The node's raw Proxmox wire-format fields, as reported by
/// `GET /nodes` (§6), retained verbatim alongside the derived
/// `ResourceCounters` so the mapping from wire shape to internal model
/// stays traceable after the snapshot builder runs. Never consulted by
/// the engine itself — `ResourceCounters` is the only basis planning
/// logic reads or mutates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeRaw {
    pub maxcpu: u64,
    /// Fractional CPU load, 0.0-1.0, as Proxmox reports it.
    pub cpu: f64,
    pub maxmem: u64,
    pub mem: u64,
    pub maxdisk: u64,
    pub disk: u64,
}

/// A physical cluster node. Constructed by the snapshot builder, mutated
/// only by the plan mutator during a single planning pass, discarded at
/// pass end.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub cpu: ResourceCounters,
    pub memory: ResourceCounters,
    pub disk: ResourceCounters,

    /// Raw wire-format fields this node's counters were derived from.
    /// `NodeRaw::default()` for nodes built directly from counters (e.g.
    /// in tests) rather than from a live snapshot.
    pub raw: NodeRaw,

    /// Tracked metric from the previous evaluator iteration within this
    /// pass, for fixed-point detection. `None` before the first iteration.
    pub last_run_pct: Option<u32>,
    /// Whether the tracked metric was unchanged from the last iteration.
    pub stable: bool,
}

impl Node {
    pub fn new(name: impl Into<String>, cpu: ResourceCounters, memory: ResourceCounters, disk: ResourceCounters) -> Self {
        Self {
            name: name.into(),
            cpu,
            memory,
            disk,
            raw: NodeRaw::default(),
            last_run_pct: None,
            stable: false,
        }
    }

    /// Attach the raw wire-format fields this node's counters were derived
    /// from. Used by the snapshot builder; test fixtures that construct a
    /// `Node` straight from counters have no raw record to attach.
    pub fn with_raw(mut self, raw: NodeRaw) -> Self {
        self.raw = raw;
        self
    }

    pub fn counters(&self, dimension: Dimension) -> &ResourceCounters {
        match dimension {
            Dimension::Cpu => &self.cpu,
            Dimension::Memory => &self.memory,
            Dimension::Disk => &self.disk,
        }
    }

    pub fn counters_mut(&mut self, dimension: Dimension) -> &mut ResourceCounters {
        match dimension {
            Dimension::Cpu => &mut self.cpu,
            Dimension::Memory => &mut self.memory,
            Dimension::Disk => &mut self.disk,
        }
    }
}

/// A per-dimension VM resource footprint: how much of the resource the VM
/// is provisioned for (`total`) versus actually consuming (`used`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VmResource {
    pub total: u64,
    pub used: u64,
}

/// A virtual machine resident on the cluster.
#[derive(Debug, Clone)]
pub struct Vm {
    pub name: String,
    pub vmid: u32,
    pub cpu: VmResource,
    pub memory: VmResource,
    pub disk: VmResource,
    /// The node the VM actually resides on at snapshot time. Never
    /// rewritten by the mutator — it is the executor's migration source.
    pub node_parent: String,
    /// The node the planner currently intends to place the VM on.
    /// Initialised to `node_parent`.
    pub node_rebalance: String,
    pub group_include: Option<String>,
    pub group_exclude: Option<String>,
}

impl Vm {
    pub fn resource(&self, dimension: Dimension) -> &VmResource {
        match dimension {
            Dimension::Cpu => &self.cpu,
            Dimension::Memory => &self.memory,
            Dimension::Disk => &self.disk,
        }
    }
}

/// Immutable-by-convention view of the cluster for one planning pass.
/// `BTreeMap` gives deterministic, lexicographic iteration order, which the
/// selection rules rely on for tie-breaking.
#[derive(Debug, Clone, Default)]
pub struct ClusterState {
    pub nodes: BTreeMap<String, Node>,
    pub vms: BTreeMap<String, Vm>,
}

/// Which dimension to balance, and whether to balance on observed usage or
/// provisioned commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub method: Dimension,
    pub mode: Mode,
    pub balanciness: u32,
}

/// One planned migration, ready for the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMigration {
    pub vm_name: String,
    pub vmid: u32,
    pub from_node: String,
    pub to_node: String,
}

pub type MigrationPlan = Vec<PlannedMigration>;
