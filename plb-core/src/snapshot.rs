//! Snapshot Builder: turns raw hypervisor records into an immutable
//! `ClusterState`, applying ignore-lists and deriving group membership.

use crate::client::HypervisorClient;
use crate::model::{ClusterState, Dimension, Node, NodeRaw, ResourceCounters, Vm, VmResource};
use crate::tags::{name_ignored, parse_tags};
use std::collections::BTreeMap;

/// Ignore-list configuration consumed by the builder.
#[derive(Debug, Clone, Default)]
pub struct SnapshotConfig {
    pub ignore_nodes: Vec<String>,
    pub ignore_vms: Vec<String>,
}

/// Convert a fractional Proxmox usage ratio (0.0-1.0) against an integer
/// capacity into an absolute "used" count, rounding to nearest.
fn fractional_used(ratio: f64, capacity: u64) -> u64 {
    (ratio.max(0.0) * capacity as f64).round() as u64
}

/// Enumerate the cluster through `client`, admit nodes and VMs per the
/// ignore-lists and tag vocabulary, and fold VM totals into per-node
/// `assigned` counters.
pub async fn build_snapshot(
    client: &dyn HypervisorClient,
    config: &SnapshotConfig,
) -> anyhow::Result<ClusterState> {
    let mut nodes = BTreeMap::new();
    let mut vms = BTreeMap::new();

    for raw_node in client.list_nodes().await? {
        if raw_node.status != "online" {
            continue;
        }
        if name_ignored(&raw_node.name, &config.ignore_nodes) {
            continue;
        }

        let cpu = ResourceCounters {
            total: raw_node.maxcpu,
            used: fractional_used(raw_node.cpu, raw_node.maxcpu),
            assigned: 0,
        };
        let memory = ResourceCounters {
            total: raw_node.maxmem,
            used: raw_node.mem,
            assigned: 0,
        };
        let disk = ResourceCounters {
            total: raw_node.maxdisk,
            used: raw_node.disk,
            assigned: 0,
        };
        let raw = NodeRaw {
            maxcpu: raw_node.maxcpu,
            cpu: raw_node.cpu,
            maxmem: raw_node.maxmem,
            mem: raw_node.mem,
            maxdisk: raw_node.maxdisk,
            disk: raw_node.disk,
        };

        nodes.insert(
            raw_node.name.clone(),
            Node::new(raw_node.name.clone(), cpu, memory, disk).with_raw(raw),
        );
    }

    for node_name in nodes.keys().cloned().collect::<Vec<_>>() {
        for raw_vm in client.list_vms(&node_name).await? {
            if raw_vm.status != "running" {
                continue;
            }
            if name_ignored(&raw_vm.name, &config.ignore_vms) {
                continue;
            }

            let raw_config = client.get_vm_config(&node_name, raw_vm.vmid).await?;
            let parsed_tags = raw_config.tags.as_deref().map(parse_tags).unwrap_or_default();
            if parsed_tags.ignore_vm {
                continue;
            }

            let cpu = VmResource {
                total: raw_vm.cpus as u64,
                used: fractional_used(raw_vm.cpu, raw_vm.cpus as u64),
            };
            let memory = VmResource { total: raw_vm.maxmem, used: raw_vm.mem };
            let disk = VmResource { total: raw_vm.maxdisk, used: raw_vm.disk };

            if let Some(node) = nodes.get_mut(&node_name) {
                node.cpu.assigned += cpu.total;
                node.memory.assigned += memory.total;
                node.disk.assigned += disk.total;
            }

            vms.insert(
                raw_vm.name.clone(),
                Vm {
                    name: raw_vm.name.clone(),
                    vmid: raw_vm.vmid,
                    cpu,
                    memory,
                    disk,
                    node_parent: node_name.clone(),
                    node_rebalance: node_name.clone(),
                    group_include: parsed_tags.group_include,
                    group_exclude: parsed_tags.group_exclude,
                },
            );
        }
    }

    for node in nodes.values() {
        warn_if_overprovisioned(node, Dimension::Cpu);
        warn_if_overprovisioned(node, Dimension::Memory);
        warn_if_overprovisioned(node, Dimension::Disk);
    }

    Ok(ClusterState { nodes, vms })
}

fn warn_if_overprovisioned(node: &Node, dimension: Dimension) {
    let counters = node.counters(dimension);
    if counters.assigned_pct() > 99 {
        tracing::warn!(
            node = %node.name,
            dimension = ?dimension,
            assigned = counters.assigned,
            total = counters.total,
            "node is overprovisioned"
        );
    }
}
