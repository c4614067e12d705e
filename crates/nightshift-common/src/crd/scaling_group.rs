//! ScalingGroup CRD: ordered multi-namespace scaling policy

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::phase::ScalingPhase;
use super::schedule::ScalingSchedule;

/// ScalingGroup scales a set of namespaces as one unit, in stages.
///
/// The `sequence` lists stages in *scale-up* order; tear-down runs the
/// mirror image. Each element is one stage: a whitespace-separated list of
/// namespace names acted on in parallel. Namespaces in `namespaces` that
/// appear in no stage form an implicit final stage.
///
/// Example:
/// ```yaml
/// apiVersion: finops.nightshift.dev/v1alpha1
/// kind: ScalingGroup
/// metadata:
///   name: shop
///   namespace: nightshift-system
/// spec:
///   category: Solution
///   namespaces: [shop-db, shop-backend, shop-frontend, shop-jobs]
///   sequence: ["shop-db", "shop-backend shop-jobs", "shop-frontend"]
///   schedules:
///     - days: [1, 2, 3, 4, 5]
///       startTime: "07:00"
///       endTime: "20:00"
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "finops.nightshift.dev",
    version = "v1alpha1",
    kind = "ScalingGroup",
    namespaced,
    status = "ScalingGroupStatus",
    printcolumn = r#"{"name":"Category","type":"string","jsonPath":".spec.category"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Ready","type":"integer","jsonPath":".status.namespacesReady"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ScalingGroupSpec {
    /// Free-form classification label (e.g. "Solution", "Platform")
    pub category: String,

    /// Namespaces managed by this group. A namespace listed here overrides
    /// any individual ScalingConfig targeting it.
    pub namespaces: Vec<String>,

    /// Manual override for scaling; same tri-state semantics as
    /// ScalingConfig
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// Recurring windows during which the group should be active
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<ScalingSchedule>,

    /// Stages in scale-up order; each element is a whitespace-separated
    /// list of namespaces scaled in parallel
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence: Vec<String>,
}

/// Observed state of a ScalingGroup
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScalingGroupStatus {
    /// Current phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<ScalingPhase>,

    /// RFC3339 timestamp of the most recent phase transition (or first
    /// observation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_action: Option<String>,

    /// Replica counts recorded before the first scale-down, keyed
    /// "Namespace/Kind/Name" (the namespace prefix keeps per-namespace
    /// entries disjoint from config-owned "Kind/Name" keys)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub original_replicas: BTreeMap<String, i32>,

    /// Number of namespaces acted on during the last reconcile
    #[serde(default)]
    pub managed_count: i32,

    /// Namespaces that reached the target state
    #[serde(default)]
    pub namespaces_ready: i32,

    /// Namespaces evaluated against the target state
    #[serde(default)]
    pub namespaces_total: i32,
}

impl ScalingGroupStatus {
    /// Parse `last_action` back into a timestamp, if set and well-formed
    pub fn last_action_time(&self) -> Option<DateTime<Utc>> {
        self.last_action
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
    }
}
