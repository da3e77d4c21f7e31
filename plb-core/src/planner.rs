//! Planner Loop: iterates Selection + Mutation until the Evaluator signals
//! convergence or every VM has been considered once in this pass.

use crate::evaluator;
use crate::model::{ClusterState, Policy};
use crate::mutator;
use crate::selection;
use std::collections::HashSet;

/// Run the main planning loop against `state` in place. Explicit loop, not
/// recursion, so stack depth is independent of cluster size.
pub fn run(state: &mut ClusterState, policy: &Policy) {
    let mut processed: HashSet<String> = HashSet::new();

    loop {
        if !evaluator::should_continue(state, policy) {
            break;
        }

        let Some(vm_name) = selection::heaviest_vm(state, policy, &processed) else {
            break;
        };
        processed.insert(vm_name.clone());

        let Some(target_node) = selection::lightest_node(state, policy) else {
            break;
        };

        mutator::apply_move(state, &vm_name, &target_node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dimension, Mode, Node, ResourceCounters, Vm, VmResource};
    use std::collections::BTreeMap;

    fn policy(balanciness: u32) -> Policy {
        Policy { method: Dimension::Memory, mode: Mode::Used, balanciness }
    }

    /// Scenario S1: two nodes, one movable VM, clearly imbalanced.
    #[test]
    fn s1_simple_two_node_balance() {
        let mut nodes = BTreeMap::new();
        nodes.insert("a".to_string(), Node::new("a", ResourceCounters::default(), ResourceCounters { total: 100, used: 80, assigned: 80 }, ResourceCounters::default()));
        nodes.insert("b".to_string(), Node::new("b", ResourceCounters::default(), ResourceCounters { total: 100, used: 10, assigned: 10 }, ResourceCounters::default()));

        let mut vms = BTreeMap::new();
        vms.insert("v1".to_string(), Vm {
            name: "v1".to_string(),
            vmid: 100,
            cpu: VmResource::default(),
            memory: VmResource { used: 40, total: 40 },
            disk: VmResource::default(),
            node_parent: "a".to_string(),
            node_rebalance: "a".to_string(),
            group_include: None,
            group_exclude: None,
        });

        let mut state = ClusterState { nodes, vms };
        run(&mut state, &policy(10));

        assert_eq!(state.vms["v1"].node_rebalance, "b");
    }

    /// Scenario S2: already within balanciness, no move should happen.
    #[test]
    fn s2_already_balanced_produces_no_moves() {
        let mut nodes = BTreeMap::new();
        nodes.insert("a".to_string(), Node::new("a", ResourceCounters::default(), ResourceCounters { total: 100, used: 50, assigned: 10 }, ResourceCounters::default()));
        nodes.insert("b".to_string(), Node::new("b", ResourceCounters::default(), ResourceCounters { total: 100, used: 55, assigned: 10 }, ResourceCounters::default()));

        let mut vms = BTreeMap::new();
        vms.insert("v1".to_string(), Vm {
            name: "v1".to_string(), vmid: 100,
            cpu: VmResource::default(), memory: VmResource { used: 10, total: 10 }, disk: VmResource::default(),
            node_parent: "a".to_string(), node_rebalance: "a".to_string(), group_include: None, group_exclude: None,
        });
        vms.insert("v2".to_string(), Vm {
            name: "v2".to_string(), vmid: 101,
            cpu: VmResource::default(), memory: VmResource { used: 10, total: 10 }, disk: VmResource::default(),
            node_parent: "b".to_string(), node_rebalance: "b".to_string(), group_include: None, group_exclude: None,
        });

        let mut state = ClusterState { nodes, vms };
        run(&mut state, &policy(10));

        assert_eq!(state.vms["v1"].node_rebalance, "a");
        assert_eq!(state.vms["v2"].node_rebalance, "b");
    }

    /// Property 1: resource conservation across the pass.
    #[test]
    fn conserves_used_and_assigned_totals() {
        let mut nodes = BTreeMap::new();
        nodes.insert("a".to_string(), Node::new("a", ResourceCounters::default(), ResourceCounters { total: 100, used: 90, assigned: 90 }, ResourceCounters::default()));
        nodes.insert("b".to_string(), Node::new("b", ResourceCounters::default(), ResourceCounters { total: 100, used: 5, assigned: 5 }, ResourceCounters::default()));
        nodes.insert("c".to_string(), Node::new("c", ResourceCounters::default(), ResourceCounters { total: 100, used: 5, assigned: 5 }, ResourceCounters::default()));

        let mut vms = BTreeMap::new();
        for i in 0..3 {
            vms.insert(format!("v{i}"), Vm {
                name: format!("v{i}"), vmid: 100 + i,
                cpu: VmResource::default(), memory: VmResource { used: 25, total: 25 }, disk: VmResource::default(),
                node_parent: "a".to_string(), node_rebalance: "a".to_string(), group_include: None, group_exclude: None,
            });
        }

        let node_used_before: u64 = nodes.values().map(|n| n.memory.used).sum();

        let mut state = ClusterState { nodes, vms };
        run(&mut state, &policy(10));

        let node_used_after: u64 = state.nodes.values().map(|n| n.memory.used).sum();
        assert_eq!(node_used_before, node_used_after);

        let node_assigned_after: u64 = state.nodes.values().map(|n| n.memory.assigned).sum();
        assert_eq!(node_assigned_after, 100); // 90+5+5 assigned totals unchanged in sum
    }

    /// Property 3 / convergence bound.
    #[test]
    fn converges_within_balanciness_or_hits_fixed_point() {
        let mut nodes = BTreeMap::new();
        nodes.insert("a".to_string(), Node::new("a", ResourceCounters::default(), ResourceCounters { total: 100, used: 95, assigned: 95 }, ResourceCounters::default()));
        nodes.insert("b".to_string(), Node::new("b", ResourceCounters::default(), ResourceCounters { total: 100, used: 5, assigned: 5 }, ResourceCounters::default()));

        let mut vms = BTreeMap::new();
        // A single large, indivisible VM: no sequence of moves can close
        // the gap below balanciness, so the loop must hit the fixed point.
        vms.insert("big".to_string(), Vm {
            name: "big".to_string(), vmid: 999,
            cpu: VmResource::default(), memory: VmResource { used: 90, total: 90 }, disk: VmResource::default(),
            node_parent: "a".to_string(), node_rebalance: "a".to_string(), group_include: None, group_exclude: None,
        });

        let mut state = ClusterState { nodes, vms };
        let policy = policy(5);
        run(&mut state, &policy);

        let free_pcts: Vec<u32> = state.nodes.values().map(|n| n.memory.free_pct()).collect();
        let min = *free_pcts.iter().min().unwrap();
        let max = *free_pcts.iter().max().unwrap();
        let within_tolerance = min + policy.balanciness >= max;
        let fixed_point = state.nodes.values().all(|n| n.stable);
        assert!(within_tolerance || fixed_point);
    }

    /// Each VM is considered at most once per pass: the processed set must
    /// prevent ping-ponging the same VM back and forth.
    #[test]
    fn each_vm_considered_at_most_once() {
        let mut nodes = BTreeMap::new();
        nodes.insert("a".to_string(), Node::new("a", ResourceCounters::default(), ResourceCounters { total: 100, used: 60, assigned: 60 }, ResourceCounters::default()));
        nodes.insert("b".to_string(), Node::new("b", ResourceCounters::default(), ResourceCounters { total: 100, used: 40, assigned: 40 }, ResourceCounters::default()));

        let mut vms = BTreeMap::new();
        vms.insert("v1".to_string(), Vm {
            name: "v1".to_string(), vmid: 100,
            cpu: VmResource::default(), memory: VmResource { used: 20, total: 20 }, disk: VmResource::default(),
            node_parent: "a".to_string(), node_rebalance: "a".to_string(), group_include: None, group_exclude: None,
        });

        let mut state = ClusterState { nodes, vms };
        run(&mut state, &policy(1));

        // With only one VM available, the loop must terminate (not loop
        // forever) regardless of whether balance was achieved.
        assert!(state.vms["v1"].node_rebalance == "a" || state.vms["v1"].node_rebalance == "b");
    }
}
