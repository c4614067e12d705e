//! Workload model and the Kubernetes client seam
//!
//! A [`Workload`] is the engine's view of a scalable object: its kind, its
//! desired replica count, and what the orchestrator reports as running and
//! ready. The [`WorkloadClient`] trait is the only path between the engine
//! and the cluster; production uses [`KubeWorkloadClient`], tests use an
//! in-memory fake.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::{Client, ResourceExt};
use serde_json::json;
use std::fmt;

#[cfg(test)]
use mockall::automock;

use nightshift_common::Error;

/// The two scalable workload kinds in scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkloadKind {
    /// Replicated stateless set (`apps/v1` Deployment)
    Deployment,
    /// Replicated stateful set (`apps/v1` StatefulSet)
    StatefulSet,
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadKind::Deployment => f.write_str("Deployment"),
            WorkloadKind::StatefulSet => f.write_str("StatefulSet"),
        }
    }
}

/// Snapshot of one scalable workload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workload {
    /// Which of the two kinds this is
    pub kind: WorkloadKind,
    /// Object name within its namespace
    pub name: String,
    /// Desired replica count from the spec; `None` when unset
    pub desired: Option<i32>,
    /// Replicas the orchestrator currently reports as existing
    pub observed: i32,
    /// Replicas the orchestrator currently reports as ready
    pub ready: i32,
}

impl Workload {
    /// Key under which original replica counts are recorded: `"Kind/Name"`.
    ///
    /// Group statuses prefix this with `"Namespace/"`; that prefixing is
    /// owned by the group reconciler, never by the engine.
    pub fn key(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }

    /// Desired replicas, treating an unset spec field as zero
    pub fn desired_or_zero(&self) -> i32 {
        self.desired.unwrap_or(0)
    }
}

/// Client operations the engine needs against workload objects.
///
/// The desired replica count is the only field ever written.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkloadClient: Send + Sync {
    /// List both workload kinds in a namespace
    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Workload>, Error>;

    /// Fetch the current state of one workload; `None` when it no longer
    /// exists
    async fn get_workload(
        &self,
        namespace: &str,
        kind: WorkloadKind,
        name: &str,
    ) -> Result<Option<Workload>, Error>;

    /// Write the desired replica count
    async fn set_desired_replicas(
        &self,
        namespace: &str,
        kind: WorkloadKind,
        name: &str,
        replicas: i32,
    ) -> Result<(), Error>;
}

/// Production implementation over the Kubernetes API.
pub struct KubeWorkloadClient {
    client: Client,
}

impl KubeWorkloadClient {
    /// Create a new client wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Get a resource by name, returning None on 404 instead of an error
async fn get_optional<K>(api: &Api<K>, name: &str) -> Result<Option<K>, Error>
where
    K: Clone + serde::de::DeserializeOwned + std::fmt::Debug,
{
    match api.get(name).await {
        Ok(resource) => Ok(Some(resource)),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn from_deployment(d: &Deployment) -> Workload {
    Workload {
        kind: WorkloadKind::Deployment,
        name: d.name_any(),
        desired: d.spec.as_ref().and_then(|s| s.replicas),
        observed: d
            .status
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or_default(),
        ready: d
            .status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or_default(),
    }
}

fn from_stateful_set(sts: &StatefulSet) -> Workload {
    Workload {
        kind: WorkloadKind::StatefulSet,
        name: sts.name_any(),
        desired: sts.spec.as_ref().and_then(|s| s.replicas),
        observed: sts.status.as_ref().map(|s| s.replicas).unwrap_or_default(),
        ready: sts
            .status
            .as_ref()
            .and_then(|s| s.ready_replicas)
            .unwrap_or_default(),
    }
}

#[async_trait]
impl WorkloadClient for KubeWorkloadClient {
    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Workload>, Error> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let stateful_sets: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);

        let mut workloads = Vec::new();
        for d in deployments.list(&ListParams::default()).await?.items.iter() {
            workloads.push(from_deployment(d));
        }
        for sts in stateful_sets.list(&ListParams::default()).await?.items.iter() {
            workloads.push(from_stateful_set(sts));
        }
        Ok(workloads)
    }

    async fn get_workload(
        &self,
        namespace: &str,
        kind: WorkloadKind,
        name: &str,
    ) -> Result<Option<Workload>, Error> {
        match kind {
            WorkloadKind::Deployment => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
                Ok(get_optional(&api, name).await?.map(|d| from_deployment(&d)))
            }
            WorkloadKind::StatefulSet => {
                let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
                Ok(get_optional(&api, name)
                    .await?
                    .map(|sts| from_stateful_set(&sts)))
            }
        }
    }

    async fn set_desired_replicas(
        &self,
        namespace: &str,
        kind: WorkloadKind,
        name: &str,
        replicas: i32,
    ) -> Result<(), Error> {
        let patch = Patch::Merge(json!({
            "spec": {
                "replicas": replicas
            }
        }));
        match kind {
            WorkloadKind::Deployment => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
                api.patch(name, &PatchParams::default(), &patch).await?;
            }
            WorkloadKind::StatefulSet => {
                let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
                api.patch(name, &PatchParams::default(), &patch).await?;
            }
        }
        Ok(())
    }
}
