//! Placement engine for a virtualization cluster: given a point-in-time
//! snapshot and a balancing policy, computes the set of VM migrations that
//! would bring the cluster back within tolerance.
//!
//! The pipeline is five stages run once per invocation: Snapshot Builder →
//! Planner Loop (Evaluator + Selection + Mutator) → Group Reconciler →
//! Plan Finaliser. Everything downstream of the snapshot operates on a
//! disposable in-memory working copy; nothing here talks to the network.

pub mod client;
pub mod error;
pub mod evaluator;
pub mod finalize;
pub mod model;
pub mod mutator;
pub mod planner;
pub mod reconciler;
pub mod selection;
pub mod snapshot;
pub mod tags;

pub use client::HypervisorClient;
pub use error::{PlbError, Result};
pub use model::{ClusterState, MigrationPlan, Policy};
pub use snapshot::SnapshotConfig;

use rand::Rng;

/// Run the full placement pipeline against an already-built snapshot and
/// return the resulting migration plan. `state` is consumed in place as
/// working scratch space; callers that need the pre-planning snapshot
/// should clone it first.
pub fn plan(state: &mut ClusterState, policy: &Policy, rng: &mut impl Rng) -> MigrationPlan {
    planner::run(state, policy);
    reconciler::run(state, rng);
    finalize::finalize(state)
}
