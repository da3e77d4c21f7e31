//! Plan Mutator: applies a tentative move to an in-memory working state.
//!
//! `vm.node_parent` is never rewritten by this module — the executor uses
//! it as the migration source. The "source" side of a move is instead the
//! VM's current working location, `vm.node_rebalance` as it stood before
//! this call, so that repeated invocations within a single pass (the main
//! planner loop followed by the group reconciler) keep the working state's
//! resource counters internally consistent even when a VM is moved more
//! than once in a pass. See DESIGN.md for the full rationale.

use crate::model::ClusterState;

/// Move `vm_name` to `destination` in the working state. A no-op if the VM
/// is already there. Accepts a destination node *name*, looking the node
/// up in `state` rather than requiring the caller to hold a reference.
pub fn apply_move(state: &mut ClusterState, vm_name: &str, destination: &str) {
    let current_location = match state.vms.get(vm_name) {
        Some(vm) => vm.node_rebalance.clone(),
        None => return,
    };
    if current_location == destination {
        return;
    }

    let (cpu, memory, disk) = {
        let vm = state.vms.get(vm_name).expect("checked above");
        (vm.cpu, vm.memory, vm.disk)
    };

    if let Some(source) = state.nodes.get_mut(&current_location) {
        source.cpu.used = source.cpu.used.saturating_sub(cpu.used);
        source.cpu.assigned = source.cpu.assigned.saturating_sub(cpu.total);
        source.memory.used = source.memory.used.saturating_sub(memory.used);
        source.memory.assigned = source.memory.assigned.saturating_sub(memory.total);
        source.disk.used = source.disk.used.saturating_sub(disk.used);
        source.disk.assigned = source.disk.assigned.saturating_sub(disk.total);
    }

    if let Some(target) = state.nodes.get_mut(destination) {
        target.cpu.used += cpu.used;
        target.cpu.assigned += cpu.total;
        target.memory.used += memory.used;
        target.memory.assigned += memory.total;
        target.disk.used += disk.used;
        target.disk.assigned += disk.total;
    }

    state.vms.get_mut(vm_name).expect("checked above").node_rebalance = destination.to_string();
}
