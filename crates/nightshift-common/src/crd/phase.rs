//! Phase enums for scaling statuses
//!
//! Phases are the externally observable state of a config or group; they
//! drive the UI and event semantics. Both enums are closed: status
//! serialization round-trips through their PascalCase strings and nothing
//! else.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observed scaling state of a namespace or group.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ScalingPhase {
    /// Every workload is running with all desired replicas ready
    ScaledUp,
    /// Converging towards the active state
    ScalingUp,
    /// Every workload is at zero replicas
    ScaledDown,
    /// Converging towards zero
    ScalingDown,
    /// Inactive target but every workload still has replicas
    PartlyScaled,
}

impl fmt::Display for ScalingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScalingPhase::ScaledUp => "ScaledUp",
            ScalingPhase::ScalingUp => "ScalingUp",
            ScalingPhase::ScaledDown => "ScaledDown",
            ScalingPhase::ScalingDown => "ScalingDown",
            ScalingPhase::PartlyScaled => "PartlyScaled",
        };
        f.write_str(s)
    }
}

/// Observed state of a ScalingConfig.
///
/// Extends [`ScalingPhase`] with [`ConfigPhase::OverriddenByGroup`]: a
/// config whose target namespace is claimed by any ScalingGroup performs no
/// scaling and reports this phase instead. Groups never carry it.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConfigPhase {
    /// See [`ScalingPhase::ScaledUp`]
    ScaledUp,
    /// See [`ScalingPhase::ScalingUp`]
    ScalingUp,
    /// See [`ScalingPhase::ScaledDown`]
    ScaledDown,
    /// See [`ScalingPhase::ScalingDown`]
    ScalingDown,
    /// See [`ScalingPhase::PartlyScaled`]
    PartlyScaled,
    /// A ScalingGroup claims this config's target namespace; the config is
    /// inert until the group releases it
    OverriddenByGroup,
}

impl From<ScalingPhase> for ConfigPhase {
    fn from(phase: ScalingPhase) -> Self {
        match phase {
            ScalingPhase::ScaledUp => ConfigPhase::ScaledUp,
            ScalingPhase::ScalingUp => ConfigPhase::ScalingUp,
            ScalingPhase::ScaledDown => ConfigPhase::ScaledDown,
            ScalingPhase::ScalingDown => ConfigPhase::ScalingDown,
            ScalingPhase::PartlyScaled => ConfigPhase::PartlyScaled,
        }
    }
}

impl fmt::Display for ConfigPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfigPhase::ScaledUp => "ScaledUp",
            ConfigPhase::ScalingUp => "ScalingUp",
            ConfigPhase::ScaledDown => "ScaledDown",
            ConfigPhase::ScalingDown => "ScalingDown",
            ConfigPhase::PartlyScaled => "PartlyScaled",
            ConfigPhase::OverriddenByGroup => "OverriddenByGroup",
        };
        f.write_str(s)
    }
}

impl ScalingPhase {
    /// Whether this phase is one of the two converging states. The
    /// barrier-bypass timeout only runs while a phase is transitional.
    pub fn is_transitional(&self) -> bool {
        matches!(self, ScalingPhase::ScalingUp | ScalingPhase::ScalingDown)
    }
}

impl ConfigPhase {
    /// Whether this phase is one of the two converging states
    pub fn is_transitional(&self) -> bool {
        matches!(self, ConfigPhase::ScalingUp | ConfigPhase::ScalingDown)
    }
}
