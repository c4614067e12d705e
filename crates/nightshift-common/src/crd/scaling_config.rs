//! ScalingConfig CRD: per-namespace scheduled scaling policy

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::phase::ConfigPhase;
use super::schedule::ScalingSchedule;

/// ScalingConfig binds one target namespace to a scaling schedule.
///
/// Example:
/// ```yaml
/// apiVersion: finops.nightshift.dev/v1alpha1
/// kind: ScalingConfig
/// metadata:
///   name: team-a-hours
///   namespace: nightshift-system
/// spec:
///   targetNamespace: team-a
///   schedules:
///     - days: [1, 2, 3, 4, 5]
///       startTime: "08:00"
///       endTime: "19:00"
///       timezone: Europe/Berlin
///   sequence: ["db-*", "backend", "*"]
///   exclusions: ["ingress-*"]
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "finops.nightshift.dev",
    version = "v1alpha1",
    kind = "ScalingConfig",
    namespaced,
    status = "ScalingConfigStatus",
    printcolumn = r#"{"name":"Target","type":"string","jsonPath":".spec.targetNamespace"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ScalingConfigSpec {
    /// The namespace this config scales. Unique per config.
    pub target_namespace: String,

    /// Manual override for scaling.
    /// Absent: follow the schedules. `true`: force scale-up.
    /// `false`: force scale-down. Presence is meaningful; absent and
    /// `false` are different states.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// Recurring windows during which the namespace should be active
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<ScalingSchedule>,

    /// Ordered workload name patterns defining scale priority.
    /// Each element is a literal name, a prefix glob (`"db-*"`), or the
    /// catch-all `"*"`. Earlier elements scale down first and up last.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence: Vec<String>,

    /// Workload name patterns that are never scaled (same grammar)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<String>,
}

/// Observed state of a ScalingConfig
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScalingConfigStatus {
    /// Current phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<ConfigPhase>,

    /// RFC3339 timestamp of the most recent phase transition (or first
    /// observation). The barrier-bypass timeout is measured against this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_action: Option<String>,

    /// Replica counts recorded before the first scale-down of each
    /// resource, keyed "Kind/Name". An entry is removed only after the
    /// resource is observed back at its original count and ready.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub original_replicas: BTreeMap<String, i32>,
}

impl ScalingConfigStatus {
    /// Parse `last_action` back into a timestamp, if set and well-formed
    pub fn last_action_time(&self) -> Option<DateTime<Utc>> {
        self.last_action
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
    }
}
