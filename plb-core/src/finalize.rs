//! Plan Finaliser: projects the working state down to the list of
//! migrations the executor actually needs to issue.

use crate::model::{ClusterState, MigrationPlan, PlannedMigration};

/// Every VM whose planned node differs from its snapshot-time node becomes
/// one `PlannedMigration`. VMs the planner left untouched produce nothing.
/// Output order follows `ClusterState::vms`'s `BTreeMap` iteration, so the
/// plan is in deterministic, lexicographic VM-name order.
pub fn finalize(state: &ClusterState) -> MigrationPlan {
    state
        .vms
        .values()
        .filter(|vm| vm.node_rebalance != vm.node_parent)
        .map(|vm| PlannedMigration {
            vm_name: vm.name.clone(),
            vmid: vm.vmid,
            from_node: vm.node_parent.clone(),
            to_node: vm.node_rebalance.clone(),
        })
        .collect()
}
