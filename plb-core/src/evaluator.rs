//! Balanciness Evaluator: decides whether another planning iteration is
//! warranted, and detects fixed-point convergence.

use crate::model::{ClusterState, Mode, Policy};

/// The metric the evaluator tracks per node for the current policy: free
/// capacity when balancing observed usage, assigned commitment when
/// balancing provisioning.
fn tracked_metric(state: &ClusterState, policy: &Policy) -> Vec<(String, u32)> {
    state
        .nodes
        .values()
        .map(|node| {
            let counters = node.counters(policy.method);
            let value = match policy.mode {
                Mode::Used => counters.free_pct(),
                Mode::Assigned => counters.assigned_pct(),
            };
            (node.name.clone(), value)
        })
        .collect()
}

/// Update each node's `last_run_pct`/`stable` bookkeeping and decide
/// whether the planner loop should keep iterating.
///
/// Returns `false` when every node's tracked metric is unchanged from the
/// prior iteration (fixed point — converged or stuck), or when the spread
/// between the most- and least-loaded node is already within
/// `policy.balanciness`. Returns `true` otherwise.
pub fn should_continue(state: &mut ClusterState, policy: &Policy) -> bool {
    let values = tracked_metric(state, policy);

    let mut all_stable = true;
    for (name, value) in &values {
        let node = state.nodes.get_mut(name).expect("tracked node must exist");
        let stable = node.last_run_pct == Some(*value);
        node.stable = stable;
        node.last_run_pct = Some(*value);
        if !stable {
            all_stable = false;
        }
    }

    if all_stable {
        return false;
    }

    let min = values.iter().map(|(_, v)| *v).min().unwrap_or(0);
    let max = values.iter().map(|(_, v)| *v).max().unwrap_or(0);
    min + policy.balanciness < max
}
