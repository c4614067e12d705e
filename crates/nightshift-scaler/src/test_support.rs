//! In-memory cluster fake for engine and controller tests
//!
//! Plays the role the apiserver plays in production: holds workload state,
//! serves refetches, and records every replica write so tests can assert
//! exclusion safety. With `auto_converge` the fake acts like a cluster
//! whose pods catch up instantly; without it, written replica counts stay
//! unacknowledged, which is how the staging and timeout paths are driven.
//!
//! Available to downstream crates through the `testing` feature.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use nightshift_common::Error;

use crate::workload::{Workload, WorkloadClient, WorkloadKind};

#[derive(Clone, Copy)]
struct Entry {
    desired: Option<i32>,
    observed: i32,
    ready: i32,
}

/// In-memory [`WorkloadClient`] implementation.
pub struct FakeCluster {
    state: Mutex<BTreeMap<(String, WorkloadKind, String), Entry>>,
    writes: Mutex<Vec<String>>,
    auto_converge: bool,
}

impl FakeCluster {
    /// Fake where written replica counts stay unacknowledged
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BTreeMap::new()),
            writes: Mutex::new(Vec::new()),
            auto_converge: false,
        }
    }

    /// Fake where pods catch up with every write instantly
    pub fn auto_converging() -> Self {
        Self {
            auto_converge: true,
            ..Self::new()
        }
    }

    /// Insert or replace a workload
    pub fn put(
        &self,
        namespace: &str,
        kind: WorkloadKind,
        name: &str,
        desired: Option<i32>,
        observed: i32,
        ready: i32,
    ) {
        self.state.lock().unwrap().insert(
            (namespace.to_string(), kind, name.to_string()),
            Entry {
                desired,
                observed,
                ready,
            },
        );
    }

    /// Current desired count of a workload, if it exists
    pub fn desired(&self, namespace: &str, kind: WorkloadKind, name: &str) -> Option<i32> {
        self.state
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), kind, name.to_string()))
            .and_then(|e| e.desired)
    }

    /// Let all pods in a namespace catch up with their desired counts
    pub fn converge(&self, namespace: &str) {
        for ((ns, _, _), entry) in self.state.lock().unwrap().iter_mut() {
            if ns == namespace {
                let desired = entry.desired.unwrap_or(0);
                entry.observed = desired;
                entry.ready = desired;
            }
        }
    }

    /// Every replica write so far, as `"namespace/Kind/Name=replicas"`
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkloadClient for FakeCluster {
    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Workload>, Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .iter()
            .filter(|((ns, _, _), _)| ns == namespace)
            .map(|((_, kind, name), entry)| Workload {
                kind: *kind,
                name: name.clone(),
                desired: entry.desired,
                observed: entry.observed,
                ready: entry.ready,
            })
            .collect())
    }

    async fn get_workload(
        &self,
        namespace: &str,
        kind: WorkloadKind,
        name: &str,
    ) -> Result<Option<Workload>, Error> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), kind, name.to_string()))
            .map(|entry| Workload {
                kind,
                name: name.to_string(),
                desired: entry.desired,
                observed: entry.observed,
                ready: entry.ready,
            }))
    }

    async fn set_desired_replicas(
        &self,
        namespace: &str,
        kind: WorkloadKind,
        name: &str,
        replicas: i32,
    ) -> Result<(), Error> {
        self.writes
            .lock()
            .unwrap()
            .push(format!("{namespace}/{kind}/{name}={replicas}"));

        let mut state = self.state.lock().unwrap();
        let entry = state
            .get_mut(&(namespace.to_string(), kind, name.to_string()))
            .ok_or_else(|| {
                Error::scaling(namespace, format!("workload {kind}/{name} not found"))
            })?;
        entry.desired = Some(replicas);
        if self.auto_converge {
            entry.observed = replicas;
            entry.ready = replicas;
        }
        Ok(())
    }
}
