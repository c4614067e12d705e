//! Priority-ordered staged scale execution
//!
//! The executor walks a namespace's priority groups in order and converges
//! each on the target state before touching the next. Original replica
//! counts are recorded before the first scale-down write of each resource
//! and erased once the resource is observed restored, so a later scale-up
//! is lossless.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use nightshift_common::crd::ScalingPhase;
use nightshift_common::Error;

use crate::phase;
use crate::readiness;
use crate::resolver;
use crate::workload::WorkloadClient;

/// Result of one [`ScaleEngine::scale_target`] pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScaleOutcome {
    /// Updated original-replica records, keyed `"Kind/Name"`
    pub original_replicas: BTreeMap<String, i32>,
    /// Whether every priority group reached the target state
    pub all_ready: bool,
}

/// The scaling engine: executes staged scaling for one namespace at a time.
#[derive(Clone)]
pub struct ScaleEngine {
    workloads: Arc<dyn WorkloadClient>,
}

impl ScaleEngine {
    /// Create an engine over the given workload client
    pub fn new(workloads: Arc<dyn WorkloadClient>) -> Self {
        Self { workloads }
    }

    /// Observe a namespace and derive its phase against the target.
    pub async fn compute_phase(
        &self,
        namespace: &str,
        target_active: bool,
    ) -> Result<ScalingPhase, Error> {
        let workloads = self.workloads.list_workloads(namespace).await?;
        Ok(phase::compute_phase(&workloads, target_active))
    }

    /// Drive one namespace towards the target state.
    ///
    /// Priority groups execute in ascending order for scale-down and
    /// descending for scale-up. A group that fails to converge stops the
    /// pass (`all_ready = false`) unless `timeout_passed` bypasses the
    /// barrier, in which case later groups proceed and the pass reports
    /// ready.
    ///
    /// `original_replicas` is taken by value and handed back updated:
    /// entries are added before the first scale-down write of a resource
    /// and removed once its group is observed restored and ready.
    ///
    /// Writes are idempotent (no write when the observed desired count
    /// already equals the target) and individual write failures are logged
    /// without aborting the group; the readiness gate catches them.
    pub async fn scale_target(
        &self,
        namespace: &str,
        target_active: bool,
        sequence: &[String],
        exclusions: &[String],
        mut original_replicas: BTreeMap<String, i32>,
        timeout_passed: bool,
    ) -> Result<ScaleOutcome, Error> {
        let listed = self.workloads.list_workloads(namespace).await?;
        let groups = resolver::group_by_priority(listed, sequence, exclusions);

        let priorities: Vec<usize> = if target_active {
            groups.keys().rev().copied().collect()
        } else {
            groups.keys().copied().collect()
        };

        for priority in priorities {
            let group = &groups[&priority];

            if readiness::is_group_ready(self.workloads.as_ref(), namespace, group, target_active)
                .await
            {
                continue;
            }

            info!(
                namespace,
                priority,
                count = group.len(),
                target_active,
                "scaling priority group"
            );
            for workload in group {
                let key = workload.key();
                let current = workload.desired_or_zero();

                let target = if !target_active {
                    0
                } else {
                    match original_replicas.get(&key) {
                        Some(&recorded) => recorded,
                        // No record: keep a count the user raised by hand,
                        // only default to 1 from zero
                        None if current > 0 => current,
                        None => 1,
                    }
                };

                if current != target {
                    if !target_active && current > 0 {
                        original_replicas.insert(key.clone(), current);
                    }

                    info!(
                        namespace,
                        resource = %key,
                        from = current,
                        to = target,
                        "setting replicas"
                    );
                    if let Err(e) = self
                        .workloads
                        .set_desired_replicas(namespace, workload.kind, &workload.name, target)
                        .await
                    {
                        error!(
                            namespace,
                            resource = %key,
                            target,
                            error = %e,
                            "failed to update replicas"
                        );
                    }
                }
            }

            let ready =
                readiness::is_group_ready(self.workloads.as_ref(), namespace, group, target_active)
                    .await;
            if !ready {
                if timeout_passed {
                    warn!(
                        namespace,
                        priority,
                        "priority group not ready but timeout passed, bypassing strict sequence"
                    );
                } else {
                    debug!(namespace, priority, "priority group not ready, stopping here");
                    return Ok(ScaleOutcome {
                        original_replicas,
                        all_ready: false,
                    });
                }
            } else if target_active {
                // Restored and ready: the records served their purpose
                for workload in group {
                    original_replicas.remove(&workload.key());
                }
            }
        }

        Ok(ScaleOutcome {
            original_replicas,
            all_ready: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeCluster;
    use crate::workload::WorkloadKind;

    fn engine(fake: FakeCluster) -> (ScaleEngine, Arc<FakeCluster>) {
        let fake = Arc::new(fake);
        (ScaleEngine::new(fake.clone()), fake)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn scale_down_records_original_and_writes_zero() {
        let fake = FakeCluster::auto_converging();
        fake.put("shop", WorkloadKind::Deployment, "api", Some(3), 3, 3);
        let (engine, fake) = engine(fake);

        let outcome = engine
            .scale_target("shop", false, &[], &[], BTreeMap::new(), false)
            .await
            .unwrap();

        assert!(outcome.all_ready);
        assert_eq!(outcome.original_replicas.get("Deployment/api"), Some(&3));
        assert_eq!(fake.desired("shop", WorkloadKind::Deployment, "api"), Some(0));
    }

    #[tokio::test]
    async fn scale_down_then_up_restores_original_count() {
        let fake = FakeCluster::auto_converging();
        fake.put("shop", WorkloadKind::StatefulSet, "db", Some(3), 3, 3);
        let (engine, fake) = engine(fake);

        let down = engine
            .scale_target("shop", false, &[], &[], BTreeMap::new(), false)
            .await
            .unwrap();
        assert_eq!(down.original_replicas.get("StatefulSet/db"), Some(&3));
        assert_eq!(fake.desired("shop", WorkloadKind::StatefulSet, "db"), Some(0));

        let up = engine
            .scale_target("shop", true, &[], &[], down.original_replicas, false)
            .await
            .unwrap();
        assert!(up.all_ready);
        assert_eq!(fake.desired("shop", WorkloadKind::StatefulSet, "db"), Some(3));
        // Restored and ready: the record is gone
        assert!(up.original_replicas.is_empty());
    }

    #[tokio::test]
    async fn scale_up_without_record_defaults_to_one() {
        let fake = FakeCluster::auto_converging();
        fake.put("shop", WorkloadKind::Deployment, "api", Some(0), 0, 0);
        let (engine, fake) = engine(fake);

        let outcome = engine
            .scale_target("shop", true, &[], &[], BTreeMap::new(), false)
            .await
            .unwrap();

        assert!(outcome.all_ready);
        assert_eq!(fake.desired("shop", WorkloadKind::Deployment, "api"), Some(1));
    }

    #[tokio::test]
    async fn scale_up_keeps_a_hand_raised_count() {
        // The user scaled to 4 outside our control and nothing is recorded:
        // do not force it down to 1
        let fake = FakeCluster::new();
        fake.put("shop", WorkloadKind::Deployment, "api", Some(4), 4, 0);
        let (engine, fake) = engine(fake);

        let outcome = engine
            .scale_target("shop", true, &[], &[], BTreeMap::new(), false)
            .await
            .unwrap();

        // Desired already matches the computed target: no write issued
        assert!(fake.writes().is_empty());
        // Replicas exist but are not ready yet
        assert!(!outcome.all_ready);
    }

    #[tokio::test]
    async fn strict_staging_stops_at_first_unready_group() {
        let fake = FakeCluster::new();
        fake.put("shop", WorkloadKind::StatefulSet, "db", Some(1), 1, 1);
        fake.put("shop", WorkloadKind::Deployment, "api", Some(1), 1, 1);
        let (engine, fake) = engine(fake);
        let sequence = strings(&["db", "api"]);

        let outcome = engine
            .scale_target("shop", false, &sequence, &[], BTreeMap::new(), false)
            .await
            .unwrap();

        // db (priority 0) was written but its pods never stopped, so the
        // pass halts before touching api (priority 1)
        assert!(!outcome.all_ready);
        assert_eq!(fake.writes(), ["shop/StatefulSet/db=0"]);
        assert_eq!(fake.desired("shop", WorkloadKind::Deployment, "api"), Some(1));
        // The original count was still recorded before the write
        assert_eq!(outcome.original_replicas.get("StatefulSet/db"), Some(&1));
    }

    #[tokio::test]
    async fn staging_resumes_where_the_last_pass_stopped() {
        let fake = FakeCluster::new();
        fake.put("shop", WorkloadKind::StatefulSet, "db", Some(1), 1, 1);
        fake.put("shop", WorkloadKind::Deployment, "api", Some(1), 1, 1);
        let (engine, fake) = engine(fake);
        let sequence = strings(&["db", "api"]);

        let first = engine
            .scale_target("shop", false, &sequence, &[], BTreeMap::new(), false)
            .await
            .unwrap();
        assert!(!first.all_ready);
        assert_eq!(fake.writes(), ["shop/StatefulSet/db=0"]);

        // db pods terminate; the next pass skips the converged group and
        // moves on to api
        fake.converge("shop");
        let second = engine
            .scale_target("shop", false, &sequence, &[], first.original_replicas, false)
            .await
            .unwrap();
        assert!(!second.all_ready);
        assert_eq!(
            fake.writes(),
            ["shop/StatefulSet/db=0", "shop/Deployment/api=0"]
        );

        fake.converge("shop");
        let third = engine
            .scale_target("shop", false, &sequence, &[], second.original_replicas, false)
            .await
            .unwrap();
        assert!(third.all_ready);
        // Scale-down keeps the records; they only clear on restoration
        assert_eq!(third.original_replicas.get("StatefulSet/db"), Some(&1));
        assert_eq!(third.original_replicas.get("Deployment/api"), Some(&1));
    }

    #[tokio::test]
    async fn timeout_bypass_continues_past_stuck_group() {
        let fake = FakeCluster::new();
        fake.put("shop", WorkloadKind::StatefulSet, "db", Some(1), 1, 1);
        fake.put("shop", WorkloadKind::Deployment, "api", Some(1), 1, 1);
        let (engine, fake) = engine(fake);
        let sequence = strings(&["db", "api"]);

        let outcome = engine
            .scale_target("shop", false, &sequence, &[], BTreeMap::new(), true)
            .await
            .unwrap();

        assert!(outcome.all_ready);
        assert_eq!(fake.writes(), ["shop/StatefulSet/db=0", "shop/Deployment/api=0"]);
    }

    #[tokio::test]
    async fn scale_up_walks_priorities_in_reverse() {
        let fake = FakeCluster::new();
        fake.put("shop", WorkloadKind::StatefulSet, "db", Some(0), 0, 0);
        fake.put("shop", WorkloadKind::Deployment, "api", Some(0), 0, 0);
        let (engine, fake) = engine(fake);
        let sequence = strings(&["db", "api"]);

        let outcome = engine
            .scale_target("shop", true, &sequence, &[], BTreeMap::new(), false)
            .await
            .unwrap();

        // On the way up the last sequence element goes first: api is
        // written, and db stays untouched until api is ready
        assert!(!outcome.all_ready);
        assert_eq!(fake.writes(), ["shop/Deployment/api=1"]);
        assert_eq!(fake.desired("shop", WorkloadKind::StatefulSet, "db"), Some(0));
    }

    #[tokio::test]
    async fn wildcard_exclusion_makes_scale_down_a_noop() {
        let fake = FakeCluster::auto_converging();
        fake.put("shop", WorkloadKind::Deployment, "api", Some(2), 2, 2);
        fake.put("shop", WorkloadKind::StatefulSet, "db", Some(1), 1, 1);
        let (engine, fake) = engine(fake);

        let outcome = engine
            .scale_target("shop", false, &[], &strings(&["*"]), BTreeMap::new(), false)
            .await
            .unwrap();

        assert!(outcome.all_ready);
        assert!(fake.writes().is_empty());
        assert_eq!(fake.desired("shop", WorkloadKind::Deployment, "api"), Some(2));
    }

    #[tokio::test]
    async fn excluded_workload_is_never_written() {
        let fake = FakeCluster::auto_converging();
        fake.put("shop", WorkloadKind::Deployment, "api", Some(2), 2, 2);
        fake.put("shop", WorkloadKind::Deployment, "ingress-nginx", Some(1), 1, 1);
        let (engine, fake) = engine(fake);

        let outcome = engine
            .scale_target(
                "shop",
                false,
                &[],
                &strings(&["ingress-*"]),
                BTreeMap::new(),
                false,
            )
            .await
            .unwrap();

        assert!(outcome.all_ready);
        assert_eq!(fake.writes(), ["shop/Deployment/api=0"]);
        assert_eq!(
            fake.desired("shop", WorkloadKind::Deployment, "ingress-nginx"),
            Some(1)
        );
        assert!(!outcome.original_replicas.contains_key("Deployment/ingress-nginx"));
    }

    #[tokio::test]
    async fn converged_namespace_gets_no_writes() {
        let fake = FakeCluster::new();
        fake.put("shop", WorkloadKind::Deployment, "api", Some(0), 0, 0);
        let (engine, fake) = engine(fake);

        let outcome = engine
            .scale_target("shop", false, &[], &[], BTreeMap::new(), false)
            .await
            .unwrap();

        assert!(outcome.all_ready);
        assert!(fake.writes().is_empty());
    }

    #[tokio::test]
    async fn recorded_original_wins_over_default() {
        let fake = FakeCluster::auto_converging();
        fake.put("shop", WorkloadKind::Deployment, "api", Some(0), 0, 0);
        let (engine, fake) = engine(fake);

        let originals = BTreeMap::from([("Deployment/api".to_string(), 5)]);
        let outcome = engine
            .scale_target("shop", true, &[], &[], originals, false)
            .await
            .unwrap();

        assert!(outcome.all_ready);
        assert_eq!(fake.desired("shop", WorkloadKind::Deployment, "api"), Some(5));
        assert!(outcome.original_replicas.is_empty());
    }

    #[tokio::test]
    async fn empty_namespace_is_immediately_ready() {
        let (engine, fake) = engine(FakeCluster::new());
        let outcome = engine
            .scale_target("empty", false, &[], &[], BTreeMap::new(), false)
            .await
            .unwrap();
        assert!(outcome.all_ready);
        assert!(fake.writes().is_empty());
    }

    #[tokio::test]
    async fn phase_wrapper_reports_namespace_state() {
        let fake = FakeCluster::new();
        fake.put("shop", WorkloadKind::Deployment, "api", Some(2), 2, 2);
        let (engine, fake) = engine(fake);

        assert_eq!(
            engine.compute_phase("shop", true).await.unwrap(),
            ScalingPhase::ScaledUp
        );

        fake.put("shop", WorkloadKind::Deployment, "api", Some(2), 2, 1);
        assert_eq!(
            engine.compute_phase("shop", true).await.unwrap(),
            ScalingPhase::ScalingUp
        );
        assert_eq!(
            engine.compute_phase("shop", false).await.unwrap(),
            ScalingPhase::PartlyScaled
        );
        assert_eq!(
            engine.compute_phase("empty", false).await.unwrap(),
            ScalingPhase::ScaledDown
        );
    }
}
