//! ScalingConfig reconciliation
//!
//! Per-namespace control loop: evaluate the schedule, derive the phase,
//! delegate to the scale executor, and write status back. A namespace
//! claimed by any ScalingGroup is left alone ("group wins").

use std::sync::Arc;

use kube::runtime::controller::Action;
use kube::ResourceExt;
use tracing::{info, warn};

use nightshift_common::crd::{ConfigPhase, ScalingConfig};
use nightshift_common::Error;
use nightshift_scaler::schedule;

use super::{
    barrier_timeout_passed, Context, REQUEUE_CONVERGING, REQUEUE_OVERRIDDEN, REQUEUE_STEADY,
};

/// Reconcile one ScalingConfig.
pub async fn reconcile(config: Arc<ScalingConfig>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = config.name_any();
    let namespace = config.namespace().unwrap_or_default();
    let target_namespace = config.spec.target_namespace.clone();

    let mut status = config.status.clone().unwrap_or_default();

    // Conflict resolution: if any group manages this namespace, the group
    // wins and this config goes inert
    match ctx.kube.list_groups().await {
        Ok(groups) => {
            if let Some(group) = groups
                .iter()
                .find(|g| g.spec.namespaces.iter().any(|ns| *ns == target_namespace))
            {
                info!(
                    config = %name,
                    namespace = %target_namespace,
                    group = %group.name_any(),
                    "namespace managed by group, overriding individual config"
                );
                status.phase = Some(ConfigPhase::OverriddenByGroup);
                status.last_action = Some(ctx.clock.now_utc().to_rfc3339());
                ctx.kube
                    .patch_config_status(&namespace, &name, &status)
                    .await?;
                return Ok(Action::requeue(REQUEUE_OVERRIDDEN));
            }
        }
        Err(e) => {
            warn!(config = %name, error = %e, "failed to list groups, skipping override check");
        }
    }

    let target_active = schedule::is_active(
        &config.spec.schedules,
        config.spec.active,
        ctx.clock.as_ref(),
    );
    info!(
        config = %name,
        namespace = %target_namespace,
        target_active,
        "reconciling scaling config"
    );

    // Track phase and lastAction before executing so the timeout window
    // starts as soon as a transition is observed
    let computed: ConfigPhase = ctx
        .engine
        .compute_phase(&target_namespace, target_active)
        .await?
        .into();
    let now = ctx.clock.now_utc();
    if status.phase != Some(computed) {
        status.phase = Some(computed);
        status.last_action = Some(now.to_rfc3339());
    } else if status.last_action.is_none() {
        status.last_action = Some(now.to_rfc3339());
    }

    let timeout_passed = barrier_timeout_passed(
        status.phase.map(|p| p.is_transitional()).unwrap_or(false),
        status.last_action_time(),
        now,
    );
    if timeout_passed {
        info!(
            config = %name,
            namespace = %target_namespace,
            "scaling timeout exceeded, overriding sequence blocks"
        );
    }

    let outcome = ctx
        .engine
        .scale_target(
            &target_namespace,
            target_active,
            &config.spec.sequence,
            &config.spec.exclusions,
            status.original_replicas.clone(),
            timeout_passed,
        )
        .await?;
    status.original_replicas = outcome.original_replicas;

    ctx.kube
        .patch_config_status(&namespace, &name, &status)
        .await?;

    if !outcome.all_ready {
        return Ok(Action::requeue(REQUEUE_CONVERGING));
    }
    Ok(Action::requeue(REQUEUE_STEADY))
}

/// Error policy: retry shortly, or back off when retrying cannot help.
pub fn error_policy(config: Arc<ScalingConfig>, error: &Error, _ctx: Arc<Context>) -> Action {
    warn!(config = %config.name_any(), error = %error, "reconcile error, will retry");
    if error.is_retryable() {
        Action::requeue(std::time::Duration::from_secs(30))
    } else {
        Action::requeue(std::time::Duration::from_secs(300))
    }
}
