//! Shared controller plumbing: context, control-plane client seam, and
//! reconcile timing constants

pub mod config;
pub mod group;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::Client;

#[cfg(test)]
use mockall::automock;

use nightshift_common::crd::{
    ScalingConfig, ScalingConfigStatus, ScalingGroup, ScalingGroupStatus,
};
use nightshift_common::{Error, EventPublisher, KubeEventPublisher, FIELD_MANAGER};
use nightshift_scaler::{Clock, KubeWorkloadClient, ScaleEngine, SystemClock, WorkloadClient};

/// Requeue interval while a target is still converging
pub const REQUEUE_CONVERGING: Duration = Duration::from_secs(5);

/// Requeue interval once a target is steady (picks up schedule flips)
pub const REQUEUE_STEADY: Duration = Duration::from_secs(60);

/// Requeue interval for configs overridden by a group
pub const REQUEUE_OVERRIDDEN: Duration = Duration::from_secs(300);

/// Seconds a transitional phase may block a stage before the barrier is
/// bypassed
pub const SCALING_TIMEOUT_SECS: i64 = 60;

/// Whether the barrier-bypass window has elapsed.
///
/// Only transitional phases (`ScalingUp`/`ScalingDown`) time out, measured
/// against the status `lastAction` stamp.
pub(crate) fn barrier_timeout_passed(
    transitional: bool,
    last_action: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    transitional
        && last_action
            .map(|t| now - t > chrono::Duration::seconds(SCALING_TIMEOUT_SECS))
            .unwrap_or(false)
}

/// Client operations the controllers need against their own resources.
///
/// Kept behind a trait so reconcilers are unit-testable without an
/// apiserver; [`KubeControlPlaneClient`] is the production implementation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ControlPlaneClient: Send + Sync {
    /// List ScalingGroups across all namespaces (group primacy check)
    async fn list_groups(&self) -> Result<Vec<ScalingGroup>, Error>;

    /// List ScalingConfigs in one namespace (group inheritance lookup)
    async fn list_configs(&self, namespace: &str) -> Result<Vec<ScalingConfig>, Error>;

    /// Replace a ScalingConfig's status subresource
    async fn patch_config_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ScalingConfigStatus,
    ) -> Result<(), Error>;

    /// Replace a ScalingGroup's status subresource
    async fn patch_group_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ScalingGroupStatus,
    ) -> Result<(), Error>;
}

/// Production implementation over the Kubernetes API
pub struct KubeControlPlaneClient {
    client: Client,
}

impl KubeControlPlaneClient {
    /// Create a new client wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ControlPlaneClient for KubeControlPlaneClient {
    async fn list_groups(&self) -> Result<Vec<ScalingGroup>, Error> {
        let api: Api<ScalingGroup> = Api::all(self.client.clone());
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn list_configs(&self, namespace: &str) -> Result<Vec<ScalingConfig>, Error> {
        let api: Api<ScalingConfig> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn patch_config_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ScalingConfigStatus,
    ) -> Result<(), Error> {
        let api: Api<ScalingConfig> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({ "status": status });
        api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn patch_group_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ScalingGroupStatus,
    ) -> Result<(), Error> {
        let api: Api<ScalingGroup> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({ "status": status });
        api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

/// Shared context for both controllers.
///
/// All collaborators sit behind trait objects so tests can swap in fakes;
/// use [`Context::builder`] to construct production instances.
pub struct Context {
    /// Client for the operator's own resources
    pub kube: Arc<dyn ControlPlaneClient>,
    /// The scaling engine (owns the workload client)
    pub engine: ScaleEngine,
    /// Wall clock for schedule evaluation and the barrier timeout
    pub clock: Arc<dyn Clock>,
    /// Event publisher for group progress breadcrumbs
    pub events: Arc<dyn EventPublisher>,
}

impl Context {
    /// Create a builder for constructing a Context
    pub fn builder(client: Client) -> ContextBuilder {
        ContextBuilder::new(client)
    }
}

/// Builder for [`Context`] instances; every collaborator can be overridden
/// (primarily for tests).
pub struct ContextBuilder {
    client: Client,
    kube: Option<Arc<dyn ControlPlaneClient>>,
    workloads: Option<Arc<dyn WorkloadClient>>,
    clock: Option<Arc<dyn Clock>>,
    events: Option<Arc<dyn EventPublisher>>,
}

impl ContextBuilder {
    fn new(client: Client) -> Self {
        Self {
            client,
            kube: None,
            workloads: None,
            clock: None,
            events: None,
        }
    }

    /// Override the control-plane client
    pub fn control_plane(mut self, kube: Arc<dyn ControlPlaneClient>) -> Self {
        self.kube = Some(kube);
        self
    }

    /// Override the workload client the engine scales through
    pub fn workload_client(mut self, workloads: Arc<dyn WorkloadClient>) -> Self {
        self.workloads = Some(workloads);
        self
    }

    /// Override the clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Override the event publisher
    pub fn event_publisher(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the Context
    pub fn build(self) -> Context {
        let workloads = self
            .workloads
            .unwrap_or_else(|| Arc::new(KubeWorkloadClient::new(self.client.clone())));
        let events = self.events.unwrap_or_else(|| {
            Arc::new(KubeEventPublisher::new(
                self.client.clone(),
                "nightshift-scalinggroup-controller",
            ))
        });
        Context {
            kube: self
                .kube
                .unwrap_or_else(|| Arc::new(KubeControlPlaneClient::new(self.client))),
            engine: ScaleEngine::new(workloads),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            events,
        }
    }
}
