//! The nightshift scaling engine
//!
//! Pure decision logic plus one thin Kubernetes seam:
//!
//! - [`schedule`] - should the target be active right now?
//! - [`pattern`] - exclusion and sequence pattern grammar
//! - [`resolver`] - workloads grouped by scale priority
//! - [`readiness`] - has a priority group converged?
//! - [`phase`] - observed phase of a namespace
//! - [`executor`] - priority-ordered staged scale execution
//! - [`workload`] - the workload model and the [`workload::WorkloadClient`]
//!   trait over the Kubernetes API
//! - [`clock`] - injectable wall clock, for deterministic schedule tests

pub mod clock;
pub mod executor;
pub mod pattern;
pub mod phase;
pub mod readiness;
pub mod resolver;
pub mod schedule;
pub mod workload;

pub use clock::{Clock, FixedClock, SystemClock};
pub use executor::{ScaleEngine, ScaleOutcome};
pub use workload::{KubeWorkloadClient, Workload, WorkloadClient, WorkloadKind};

#[cfg(any(test, feature = "testing"))]
pub mod test_support;
