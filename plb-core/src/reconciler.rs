//! Group Reconciler: after the main planner loop, enforces include-group
//! (co-location) and exclude-group (anti-co-location) constraints.
//!
//! The exclude-group sweep fixes a known copy-paste defect: a naive
//! implementation buckets exclude groups by the *include* tag. This
//! implementation buckets by `group_exclude` and additionally refuses to
//! place two members of the same exclude group on the same node — an
//! independent per-member random choice could otherwise still collide.

use crate::model::ClusterState;
use crate::mutator;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};

/// Bucket VMs by the tag read through `key`, preserving deterministic
/// (lexicographic) member order within each bucket.
fn bucket_by<'a>(state: &'a ClusterState, key: impl Fn(&'a crate::model::Vm) -> Option<&'a String>) -> BTreeMap<String, Vec<String>> {
    let mut buckets: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for vm in state.vms.values() {
        if let Some(group) = key(vm) {
            buckets.entry(group.clone()).or_default().push(vm.name.clone());
        }
    }
    buckets
}

/// Co-locate every include-group bucket with ≥ 2 members onto the first
/// member's currently planned node.
fn reconcile_include(state: &mut ClusterState) {
    let buckets = bucket_by(state, |vm| vm.group_include.as_ref());
    for members in buckets.into_values() {
        if members.len() < 2 {
            continue;
        }
        let anchor = state.vms[&members[0]].node_rebalance.clone();
        for member in &members[1..] {
            mutator::apply_move(state, member, &anchor);
        }
    }
}

/// Disperse every exclude-group bucket with ≥ 2 members onto distinct
/// nodes. The first member is left untouched and its *current planned*
/// node (`node_rebalance`, which may already differ from `node_parent` —
/// the main planner loop or an earlier include-group sweep may have moved
/// it) is reserved; every other member is shuffled onto a node that is
/// neither its own current parent nor a node already claimed by an
/// earlier member of the same bucket this sweep. A member with no
/// eligible node left is left where it is rather than being forced into a
/// dispersion violation.
fn reconcile_exclude(state: &mut ClusterState, rng: &mut impl Rng) {
    let buckets = bucket_by(state, |vm| vm.group_exclude.as_ref());
    let all_nodes: Vec<String> = state.nodes.keys().cloned().collect();

    for members in buckets.into_values() {
        if members.len() < 2 {
            continue;
        }

        let mut claimed: HashSet<String> = HashSet::new();
        claimed.insert(state.vms[&members[0]].node_rebalance.clone());

        for member in &members[1..] {
            let current_parent = state.vms[member].node_parent.clone();
            let mut candidates: Vec<String> = all_nodes
                .iter()
                .filter(|node| **node != current_parent && !claimed.contains(*node))
                .cloned()
                .collect();
            candidates.shuffle(rng);

            match candidates.into_iter().next() {
                Some(target) => {
                    mutator::apply_move(state, member, &target);
                    claimed.insert(target);
                }
                None => {
                    claimed.insert(state.vms[member].node_rebalance.clone());
                }
            }
        }
    }
}

/// Run both sweeps over the post-loop state.
pub fn run(state: &mut ClusterState, rng: &mut impl Rng) {
    reconcile_include(state);
    reconcile_exclude(state, rng);
}
