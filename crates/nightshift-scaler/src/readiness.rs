//! Readiness decisions for priority groups
//!
//! A group blocks the next one until every workload in it has converged on
//! the target state. Observed workload state is eventually consistent, so
//! each check refetches.

use tracing::warn;

use crate::workload::{Workload, WorkloadClient};

/// Whether every workload in the group has reached the target state.
///
/// Active: the desired count must be positive (a still-zero desired count
/// means the executor has not acted yet) and at least that many replicas
/// must be ready. Inactive: nothing may be running or ready.
///
/// A workload that has vanished, or whose refetch fails, counts as not
/// ready; readiness never fails a reconcile.
pub async fn is_group_ready(
    client: &dyn WorkloadClient,
    namespace: &str,
    group: &[Workload],
    target_active: bool,
) -> bool {
    for workload in group {
        let current = match client.get_workload(namespace, workload.kind, &workload.name).await {
            Ok(Some(current)) => current,
            Ok(None) => return false,
            Err(error) => {
                warn!(
                    namespace,
                    workload = %workload.key(),
                    error = %error,
                    "failed to refetch workload, treating as not ready"
                );
                return false;
            }
        };

        if target_active {
            let desired = current.desired_or_zero();
            if desired == 0 || current.ready < desired {
                return false;
            }
        } else if current.observed > 0 || current.ready > 0 {
            return false;
        }
    }
    true
}
