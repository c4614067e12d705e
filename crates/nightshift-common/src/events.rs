//! Kubernetes Event emission for the nightshift controllers.
//!
//! The group controller surfaces progress, blocked stages, and timeout
//! bypasses as Events on its own resource, so users can follow a scaling
//! run with `kubectl describe`. Delivery is best-effort by design: engine
//! correctness never depends on an Event landing, and a publish that fails
//! is only logged.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use tracing::warn;

/// Sink for Kubernetes Events.
///
/// `publish` cannot fail: implementations swallow delivery errors after
/// logging them, because a dropped breadcrumb must not break a reconcile.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Record an Event against the referenced object.
    ///
    /// `reason` and `action` are the machine-readable strings that
    /// `kubectl get events` lists (see [`reasons`] and [`actions`]);
    /// `note` carries the free-text message for humans.
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    );
}

/// Publishes through the cluster's events API.
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl KubeEventPublisher {
    /// Build a publisher reporting as `controller_name`.
    ///
    /// The name shows up on every Event as its reporting component, so
    /// each controller gets its own instance.
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.into(),
            instance: None,
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        let event = Event {
            type_,
            reason: reason.into(),
            note,
            action: action.into(),
            secondary: None,
        };
        if let Err(error) = self.recorder.publish(&event, resource_ref).await {
            // Best-effort: the reconcile outcome stands either way
            warn!(reason, action, error = %error, "dropping undeliverable event");
        }
    }
}

/// Publisher that discards everything.
///
/// For contexts with no cluster behind them, such as unit tests.
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(
        &self,
        _: &ObjectReference,
        _: EventType,
        _: &str,
        _: &str,
        _: Option<String>,
    ) {
    }
}

/// Event reason strings, shown in the REASON column of
/// `kubectl get events`.
pub mod reasons {
    /// Group phase changed (e.g. ScalingDown -> ScaledDown)
    pub const PHASE_TRANSITION: &str = "PhaseTransition";
    /// A stage is executing; names the namespaces still converging
    pub const SCALING_ACTIVE: &str = "ScalingActive";
    /// More namespaces reached their target state since the last reconcile
    pub const SCALING_PROGRESS: &str = "ScalingProgress";
    /// The one-minute barrier bypass fired on a blocked stage
    pub const SCALING_TIMEOUT: &str = "ScalingTimeout";
}

/// Event action strings, shown in the ACTION column of
/// `kubectl get events`.
pub mod actions {
    /// Standard reconciliation loop
    pub const RECONCILE: &str = "Reconcile";
    /// Writing replica counts to workloads
    pub const SCALE: &str = "Scale";
}
