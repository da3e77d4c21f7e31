//! Selection Rules: pure functions choosing the heaviest not-yet-considered
//! VM and the lightest eligible destination node under the current policy.

use crate::model::{ClusterState, Mode, Policy, Vm};
use std::collections::HashSet;

fn vm_weight(vm: &Vm, policy: &Policy) -> u64 {
    let resource = vm.resource(policy.method);
    match policy.mode {
        Mode::Used => resource.used,
        Mode::Assigned => resource.total,
    }
}

/// Return the heaviest VM (by the policy's weight function) not already in
/// `processed`. Ties break lexicographically by name — iteration is over a
/// `BTreeMap` and only a strictly heavier candidate replaces the current
/// best, so the lexicographically smallest name among ties wins.
pub fn heaviest_vm(state: &ClusterState, policy: &Policy, processed: &HashSet<String>) -> Option<String> {
    let mut best: Option<(&str, u64)> = None;
    for vm in state.vms.values() {
        if processed.contains(&vm.name) {
            continue;
        }
        let weight = vm_weight(vm, policy);
        match best {
            Some((_, best_weight)) if weight <= best_weight => {}
            _ => best = Some((&vm.name, weight)),
        }
    }
    best.map(|(name, _)| name.to_string())
}

/// Return the lightest eligible destination node for the current policy.
///
/// Under `Mode::Used`, the node with the most free capacity on the policy
/// dimension. Under `Mode::Assigned`, the node with the least assigned
/// commitment, restricted to nodes whose assigned percentage is strictly
/// between 0 and 100. Ties break lexicographically by node name.
pub fn lightest_node(state: &ClusterState, policy: &Policy) -> Option<String> {
    match policy.mode {
        Mode::Used => {
            let mut best: Option<(&str, u64)> = None;
            for node in state.nodes.values() {
                let free = node.counters(policy.method).free();
                match best {
                    Some((_, best_free)) if free <= best_free => {}
                    _ => best = Some((&node.name, free)),
                }
            }
            best.map(|(name, _)| name.to_string())
        }
        Mode::Assigned => {
            let mut best: Option<(&str, u64)> = None;
            for node in state.nodes.values() {
                let counters = node.counters(policy.method);
                let pct = counters.assigned_pct();
                if pct == 0 || pct == 100 {
                    continue;
                }
                match best {
                    Some((_, best_assigned)) if counters.assigned >= best_assigned => {}
                    _ => best = Some((&node.name, counters.assigned)),
                }
            }
            best.map(|(name, _)| name.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dimension, Node, ResourceCounters, VmResource};
    use std::collections::BTreeMap;

    fn node(name: &str, total: u64, used: u64, assigned: u64) -> Node {
        Node::new(name, ResourceCounters::default(), ResourceCounters { total, used, assigned }, ResourceCounters::default())
    }

    fn vm(name: &str, memory_used: u64, memory_total: u64) -> Vm {
        Vm {
            name: name.to_string(),
            vmid: 100,
            cpu: VmResource::default(),
            memory: VmResource { used: memory_used, total: memory_total },
            disk: VmResource::default(),
            node_parent: "a".to_string(),
            node_rebalance: "a".to_string(),
            group_include: None,
            group_exclude: None,
        }
    }

    fn policy() -> Policy {
        Policy { method: Dimension::Memory, mode: Mode::Used, balanciness: 10 }
    }

    #[test]
    fn picks_heaviest_unprocessed_vm() {
        let mut vms = BTreeMap::new();
        vms.insert("v1".to_string(), vm("v1", 40, 40));
        vms.insert("v2".to_string(), vm("v2", 10, 10));
        let state = ClusterState { nodes: BTreeMap::new(), vms };

        let processed = HashSet::new();
        assert_eq!(heaviest_vm(&state, &policy(), &processed), Some("v1".to_string()));

        let mut processed = HashSet::new();
        processed.insert("v1".to_string());
        assert_eq!(heaviest_vm(&state, &policy(), &processed), Some("v2".to_string()));
    }

    #[test]
    fn ties_break_lexicographically() {
        let mut vms = BTreeMap::new();
        vms.insert("zeta".to_string(), vm("zeta", 10, 10));
        vms.insert("alpha".to_string(), vm("alpha", 10, 10));
        let state = ClusterState { nodes: BTreeMap::new(), vms };

        assert_eq!(heaviest_vm(&state, &policy(), &HashSet::new()), Some("alpha".to_string()));
    }

    #[test]
    fn picks_node_with_most_free_capacity() {
        let mut nodes = BTreeMap::new();
        nodes.insert("a".to_string(), node("a", 100, 80, 0));
        nodes.insert("b".to_string(), node("b", 100, 10, 0));
        let state = ClusterState { nodes, vms: BTreeMap::new() };

        assert_eq!(lightest_node(&state, &policy()), Some("b".to_string()));
    }

    #[test]
    fn assigned_mode_excludes_zero_and_full_assignment() {
        let mut nodes = BTreeMap::new();
        nodes.insert("empty".to_string(), node("empty", 100, 0, 0));
        nodes.insert("full".to_string(), node("full", 100, 0, 100));
        nodes.insert("partial".to_string(), node("partial", 100, 0, 50));
        let state = ClusterState { nodes, vms: BTreeMap::new() };

        let assigned_policy = Policy { method: Dimension::Memory, mode: Mode::Assigned, balanciness: 10 };
        assert_eq!(lightest_node(&state, &assigned_policy), Some("partial".to_string()));
    }
}
