//! Custom Resource Definitions for nightshift
//!
//! Two kinds under `finops.nightshift.dev/v1alpha1`:
//! - [`ScalingConfig`] - per-namespace scheduled scaling policy
//! - [`ScalingGroup`] - ordered multi-namespace scaling policy

mod phase;
mod scaling_config;
mod scaling_group;
mod schedule;

pub use phase::{ConfigPhase, ScalingPhase};
pub use scaling_config::{ScalingConfig, ScalingConfigSpec, ScalingConfigStatus};
pub use scaling_group::{ScalingGroup, ScalingGroupSpec, ScalingGroupStatus};
pub use schedule::ScalingSchedule;

/// API group for all nightshift CRDs
pub const API_GROUP: &str = "finops.nightshift.dev";

/// API version for all nightshift CRDs
pub const API_VERSION: &str = "v1alpha1";
