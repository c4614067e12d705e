//! ScalingGroup reconciliation
//!
//! Multi-namespace control loop. The group's sequence expands into stages
//! of namespaces; stages execute in order with barrier semantics — a stage
//! does not start until the previous one has converged or the one-minute
//! timeout bypassed the barrier. Progress and timeouts surface as
//! Kubernetes Events on the group object.

use std::collections::BTreeMap;
use std::sync::Arc;

use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use kube::{Resource, ResourceExt};
use tracing::{debug, error, info, warn};

use nightshift_common::crd::{ScalingGroup, ScalingPhase};
use nightshift_common::events::{actions, reasons};
use nightshift_common::Error;
use nightshift_scaler::schedule;

use super::{barrier_timeout_passed, Context, REQUEUE_CONVERGING, REQUEUE_STEADY};

/// Expand a group's sequence into stages of namespaces.
///
/// Each sequence element is split on whitespace into one stage. Managed
/// namespaces that appear in no stage are appended as an implicit final
/// stage. Without a sequence the whole group is a single stage.
///
/// Stages are in scale-up order; the caller reverses them for scale-down.
pub fn build_stages(namespaces: &[String], sequence: &[String]) -> Vec<Vec<String>> {
    if sequence.is_empty() {
        return vec![namespaces.to_vec()];
    }

    let mut stages: Vec<Vec<String>> = sequence
        .iter()
        .map(|element| element.split_whitespace().map(String::from).collect())
        .collect();

    let mut missing = Vec::new();
    for namespace in namespaces {
        let listed = stages
            .iter()
            .any(|stage| stage.iter().any(|ns| ns == namespace));
        if !listed {
            missing.push(namespace.clone());
        }
    }
    if !missing.is_empty() {
        stages.push(missing);
    }
    stages
}

/// Reconcile one ScalingGroup.
pub async fn reconcile(group: Arc<ScalingGroup>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = group.name_any();
    let namespace = group.namespace().unwrap_or_default();

    let mut status = group.status.clone().unwrap_or_default();
    let previous_ready = status.namespaces_ready;

    let target_active = schedule::is_active(
        &group.spec.schedules,
        group.spec.active,
        ctx.clock.as_ref(),
    );
    info!(
        group = %name,
        category = %group.spec.category,
        namespaces = ?group.spec.namespaces,
        target_active,
        "reconciling scaling group"
    );

    let mut stages = build_stages(&group.spec.namespaces, &group.spec.sequence);
    // The sequence is written in scale-up order; tear-down is the mirror
    if !target_active {
        stages.reverse();
    }

    let now = ctx.clock.now_utc();
    let timeout_passed = barrier_timeout_passed(
        status.phase.map(|p| p.is_transitional()).unwrap_or(false),
        status.last_action_time(),
        now,
    );

    let mut all_ready = true;
    let mut managed_count = 0i32;
    let mut namespaces_ready = 0i32;
    let mut namespaces_total = 0i32;
    let mut blocking: Vec<String> = Vec::new();

    for (stage_index, stage) in stages.iter().enumerate() {
        info!(group = %name, stage_index, namespaces = ?stage, "processing scaling stage");

        let mut stage_ready = true;
        for target_namespace in stage {
            managed_count += 1;

            // Inherit per-namespace ordering and exclusions from a config
            // targeting this namespace, if one exists alongside the group
            let (sequence, exclusions) = match ctx.kube.list_configs(&namespace).await {
                Ok(configs) => configs
                    .into_iter()
                    .find(|c| c.spec.target_namespace == *target_namespace)
                    .map(|c| {
                        debug!(
                            namespace = %target_namespace,
                            config = %c.name_any(),
                            "inheriting sequence and exclusions from scaling config"
                        );
                        (c.spec.sequence, c.spec.exclusions)
                    })
                    .unwrap_or_default(),
                Err(e) => {
                    warn!(
                        namespace = %target_namespace,
                        error = %e,
                        "failed to list scaling configs for inheritance"
                    );
                    (Vec::new(), Vec::new())
                }
            };

            // The group records originals under "Namespace/Kind/Name"; the
            // engine works on the unprefixed per-namespace view
            let prefix = format!("{target_namespace}/");
            let namespace_replicas: BTreeMap<String, i32> = status
                .original_replicas
                .iter()
                .filter_map(|(key, count)| {
                    key.strip_prefix(&prefix)
                        .map(|rest| (rest.to_string(), *count))
                })
                .collect();

            let outcome = match ctx
                .engine
                .scale_target(
                    target_namespace,
                    target_active,
                    &sequence,
                    &exclusions,
                    namespace_replicas,
                    timeout_passed,
                )
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        group = %name,
                        namespace = %target_namespace,
                        error = %e,
                        "failed to scale namespace"
                    );
                    all_ready = false;
                    stage_ready = false;
                    blocking.push(target_namespace.clone());
                    continue;
                }
            };

            if !outcome.all_ready {
                stage_ready = false;
                all_ready = false;
            }

            // Merge the updated per-namespace records back under the prefix
            status
                .original_replicas
                .retain(|key, _| !key.starts_with(&prefix));
            for (key, count) in outcome.original_replicas {
                status.original_replicas.insert(format!("{prefix}{key}"), count);
            }

            namespaces_total += 1;

            let reached_target = match ctx
                .engine
                .compute_phase(target_namespace, target_active)
                .await
            {
                Ok(phase) => {
                    (target_active && phase == ScalingPhase::ScaledUp)
                        || (!target_active && phase == ScalingPhase::ScaledDown)
                }
                Err(e) => {
                    warn!(
                        namespace = %target_namespace,
                        error = %e,
                        "failed to derive namespace phase"
                    );
                    false
                }
            };

            if reached_target {
                namespaces_ready += 1;
            } else {
                stage_ready = false;
                all_ready = false;
                if !blocking.contains(target_namespace) {
                    blocking.push(target_namespace.clone());
                }
            }
        }

        if !stage_ready {
            if timeout_passed {
                warn!(
                    group = %name,
                    stage_index,
                    "stage not ready but timeout passed, bypassing stage barrier"
                );
                continue;
            }
            info!(group = %name, stage_index, "stage not ready, waiting before next stage");
            break;
        }
    }

    let group_ref = group.object_ref(&());

    if !all_ready && !blocking.is_empty() {
        let stage_number = stages
            .iter()
            .position(|stage| stage.contains(&blocking[0]))
            .map(|index| index + 1)
            .unwrap_or(0);

        if timeout_passed {
            ctx.events
                .publish(
                    &group_ref,
                    EventType::Warning,
                    reasons::SCALING_TIMEOUT,
                    actions::SCALE,
                    Some(format!(
                        "Timeout exceeded 1 min. Overriding sequence. Waiting on Stage {}: {}",
                        stage_number,
                        blocking.join(", ")
                    )),
                )
                .await;
        } else {
            ctx.events
                .publish(
                    &group_ref,
                    EventType::Normal,
                    reasons::SCALING_ACTIVE,
                    actions::SCALE,
                    Some(format!(
                        "Executing Stage {}. Waiting for targets in: {}",
                        stage_number,
                        blocking.join(", ")
                    )),
                )
                .await;
        }
    }

    if namespaces_ready > previous_ready {
        ctx.events
            .publish(
                &group_ref,
                EventType::Normal,
                reasons::SCALING_PROGRESS,
                actions::RECONCILE,
                Some(format!(
                    "Progress updated: {namespaces_ready} of {namespaces_total} namespaces reached target state."
                )),
            )
            .await;
    }

    status.managed_count = managed_count;
    status.namespaces_ready = namespaces_ready;
    status.namespaces_total = namespaces_total;

    let new_phase = match (all_ready, target_active) {
        (true, true) => ScalingPhase::ScaledUp,
        (true, false) => ScalingPhase::ScaledDown,
        (false, true) => ScalingPhase::ScalingUp,
        (false, false) => ScalingPhase::ScalingDown,
    };

    if status.phase != Some(new_phase) {
        let old_phase = status
            .phase
            .map(|p| p.to_string())
            .unwrap_or_else(|| "<none>".to_string());
        status.phase = Some(new_phase);
        status.last_action = Some(now.to_rfc3339());

        ctx.events
            .publish(
                &group_ref,
                EventType::Normal,
                reasons::PHASE_TRANSITION,
                actions::RECONCILE,
                Some(format!(
                    "Group phase transitioned from {old_phase} to {new_phase}"
                )),
            )
            .await;
    } else if status.last_action.is_none() {
        status.last_action = Some(now.to_rfc3339());
    }

    ctx.kube.patch_group_status(&namespace, &name, &status).await?;

    if !all_ready {
        return Ok(Action::requeue(REQUEUE_CONVERGING));
    }
    Ok(Action::requeue(REQUEUE_STEADY))
}

/// Error policy: retry shortly, or back off when retrying cannot help.
pub fn error_policy(group: Arc<ScalingGroup>, error: &Error, _ctx: Arc<Context>) -> Action {
    warn!(group = %group.name_any(), error = %error, "reconcile error, will retry");
    if error.is_retryable() {
        Action::requeue(std::time::Duration::from_secs(30))
    } else {
        Action::requeue(std::time::Duration::from_secs(300))
    }
}
