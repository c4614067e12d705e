//! Test doubles for the reconciler tests
//!
//! The workload-cluster fake comes from `nightshift-scaler`'s `testing`
//! feature; this module adds the controller-side doubles: a recording
//! control-plane client and a recording event publisher, plus fixture
//! helpers for building contexts and sample resources.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::ObjectReference;
use kube::runtime::events::EventType;

use nightshift_common::crd::{
    ScalingConfig, ScalingConfigSpec, ScalingConfigStatus, ScalingGroup, ScalingGroupSpec,
    ScalingGroupStatus,
};
use nightshift_common::{Error, EventPublisher, NoopEventPublisher};
use nightshift_scaler::{FixedClock, ScaleEngine};

pub use nightshift_scaler::test_support::FakeCluster;

use super::{Context, ControlPlaneClient};

/// Parse a fixed test instant
pub fn at(rfc3339: &str) -> FixedClock {
    FixedClock(
        DateTime::parse_from_rfc3339(rfc3339)
            .expect("test timestamp")
            .with_timezone(&Utc),
    )
}

/// A ScalingConfig in the operator namespace targeting one namespace
pub fn sample_config(name: &str, target_namespace: &str) -> ScalingConfig {
    let mut config = ScalingConfig::new(
        name,
        ScalingConfigSpec {
            target_namespace: target_namespace.to_string(),
            active: None,
            schedules: Vec::new(),
            sequence: Vec::new(),
            exclusions: Vec::new(),
        },
    );
    config.metadata.namespace = Some("nightshift-system".to_string());
    config
}

/// A ScalingGroup in the operator namespace managing the given namespaces
pub fn sample_group(name: &str, namespaces: &[&str]) -> ScalingGroup {
    let mut group = ScalingGroup::new(
        name,
        ScalingGroupSpec {
            category: "Test".to_string(),
            namespaces: namespaces.iter().map(|s| s.to_string()).collect(),
            active: None,
            schedules: Vec::new(),
            sequence: Vec::new(),
        },
    );
    group.metadata.namespace = Some("nightshift-system".to_string());
    group
}

/// Build a Context over the given fakes with no event recording
pub fn test_context(
    cluster: FakeCluster,
    control_plane: FakeControlPlane,
    clock: FixedClock,
) -> (Arc<Context>, Arc<FakeCluster>, Arc<FakeControlPlane>) {
    let cluster = Arc::new(cluster);
    let control_plane = Arc::new(control_plane);
    let ctx = Arc::new(Context {
        kube: control_plane.clone(),
        engine: ScaleEngine::new(cluster.clone()),
        clock: Arc::new(clock),
        events: Arc::new(NoopEventPublisher),
    });
    (ctx, cluster, control_plane)
}

/// Build a Context that also records published events
pub fn test_context_with_events(
    cluster: FakeCluster,
    control_plane: FakeControlPlane,
    clock: FixedClock,
) -> (
    Arc<Context>,
    Arc<FakeCluster>,
    Arc<FakeControlPlane>,
    Arc<RecordingEvents>,
) {
    let cluster = Arc::new(cluster);
    let control_plane = Arc::new(control_plane);
    let events = Arc::new(RecordingEvents::default());
    let ctx = Arc::new(Context {
        kube: control_plane.clone(),
        engine: ScaleEngine::new(cluster.clone()),
        clock: Arc::new(clock),
        events: events.clone(),
    });
    (ctx, cluster, control_plane, events)
}

/// Recording [`ControlPlaneClient`] fake
pub struct FakeControlPlane {
    groups: Mutex<Vec<ScalingGroup>>,
    configs: Mutex<Vec<ScalingConfig>>,
    config_statuses: Mutex<Vec<ScalingConfigStatus>>,
    group_statuses: Mutex<Vec<ScalingGroupStatus>>,
    fail_groups: AtomicBool,
}

impl FakeControlPlane {
    /// Empty control plane
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(Vec::new()),
            configs: Mutex::new(Vec::new()),
            config_statuses: Mutex::new(Vec::new()),
            group_statuses: Mutex::new(Vec::new()),
            fail_groups: AtomicBool::new(false),
        }
    }

    /// Register a ScalingGroup for listing
    pub fn add_group(&self, group: ScalingGroup) {
        self.groups.lock().unwrap().push(group);
    }

    /// Register a ScalingConfig for listing
    pub fn add_config(&self, config: ScalingConfig) {
        self.configs.lock().unwrap().push(config);
    }

    /// Make `list_groups` fail from now on
    pub fn fail_group_listing(&self) {
        self.fail_groups.store(true, Ordering::SeqCst);
    }

    /// Most recent config status write, if any
    pub fn last_config_status(&self) -> Option<ScalingConfigStatus> {
        self.config_statuses.lock().unwrap().last().cloned()
    }

    /// Most recent group status write, if any
    pub fn last_group_status(&self) -> Option<ScalingGroupStatus> {
        self.group_statuses.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ControlPlaneClient for FakeControlPlane {
    async fn list_groups(&self) -> Result<Vec<ScalingGroup>, Error> {
        if self.fail_groups.load(Ordering::SeqCst) {
            return Err(Error::internal_with_context("test", "group listing failed"));
        }
        Ok(self.groups.lock().unwrap().clone())
    }

    async fn list_configs(&self, namespace: &str) -> Result<Vec<ScalingConfig>, Error> {
        Ok(self
            .configs
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.metadata.namespace.as_deref() == Some(namespace))
            .cloned()
            .collect())
    }

    async fn patch_config_status(
        &self,
        _namespace: &str,
        _name: &str,
        status: &ScalingConfigStatus,
    ) -> Result<(), Error> {
        self.config_statuses.lock().unwrap().push(status.clone());
        Ok(())
    }

    async fn patch_group_status(
        &self,
        _namespace: &str,
        _name: &str,
        status: &ScalingGroupStatus,
    ) -> Result<(), Error> {
        self.group_statuses.lock().unwrap().push(status.clone());
        Ok(())
    }
}

/// One captured event
#[derive(Clone, Debug)]
pub struct RecordedEvent {
    /// True for `Warning` events
    pub warning: bool,
    /// Event reason (e.g. "ScalingTimeout")
    pub reason: String,
    /// Human-readable note
    pub note: Option<String>,
}

/// Event publisher that captures everything for assertions
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEvents {
    /// All captured events in publish order
    pub fn recorded(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Captured events with the given reason
    pub fn with_reason(&self, reason: &str) -> Vec<RecordedEvent> {
        self.recorded()
            .into_iter()
            .filter(|e| e.reason == reason)
            .collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingEvents {
    async fn publish(
        &self,
        _resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        _action: &str,
        note: Option<String>,
    ) {
        self.events.lock().unwrap().push(RecordedEvent {
            warning: matches!(type_, EventType::Warning),
            reason: reason.to_string(),
            note,
        });
    }
}
