//! Phase derivation from observed workload state

use nightshift_common::crd::ScalingPhase;

use crate::workload::Workload;

/// Derive the observable phase of a namespace from its workloads and the
/// target activity.
///
/// Tallies: total workloads, workloads at zero desired replicas, workloads
/// with desired replicas, and workloads whose ready count has caught up
/// with a positive desired count. An unset desired count tallies as one
/// replica, mirroring the apps/v1 default.
pub fn compute_phase(workloads: &[Workload], target_active: bool) -> ScalingPhase {
    let total = workloads.len();
    let mut zero = 0usize;
    let mut running = 0usize;
    let mut ready = 0usize;

    for workload in workloads {
        let desired = workload.desired.unwrap_or(1);
        if desired == 0 {
            zero += 1;
        } else {
            running += 1;
            if workload.ready >= desired {
                ready += 1;
            }
        }
    }

    if total == 0 {
        return if target_active {
            ScalingPhase::ScaledUp
        } else {
            ScalingPhase::ScaledDown
        };
    }

    if zero == total {
        return ScalingPhase::ScaledDown;
    }
    if running == total && ready == total {
        return ScalingPhase::ScaledUp;
    }

    if target_active {
        if zero > 0 || ready < running {
            return ScalingPhase::ScalingUp;
        }
        return ScalingPhase::ScaledUp;
    }

    if running > 0 && zero > 0 {
        return ScalingPhase::ScalingDown;
    }
    if running > 0 && zero == 0 {
        return ScalingPhase::PartlyScaled;
    }
    ScalingPhase::ScaledDown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::WorkloadKind;

    fn workload(name: &str, desired: Option<i32>, ready: i32) -> Workload {
        Workload {
            kind: WorkloadKind::Deployment,
            name: name.into(),
            desired,
            observed: ready,
            ready,
        }
    }

    #[test]
    fn empty_namespace_reflects_the_target() {
        assert_eq!(compute_phase(&[], true), ScalingPhase::ScaledUp);
        assert_eq!(compute_phase(&[], false), ScalingPhase::ScaledDown);
    }

    #[test]
    fn all_zero_is_scaled_down_regardless_of_target() {
        // Every workload at zero reads as ScaledDown even while the target
        // is active; the phase flips to ScalingUp once the executor writes
        // the first positive replica count
        let workloads = [workload("a", Some(0), 0), workload("b", Some(0), 0)];
        assert_eq!(compute_phase(&workloads, true), ScalingPhase::ScaledDown);
        assert_eq!(compute_phase(&workloads, false), ScalingPhase::ScaledDown);
    }

    #[test]
    fn all_running_and_ready_is_scaled_up() {
        // Fully up reads as ScaledUp regardless of the target; the
        // executor, not the phase, decides whether that needs changing
        let workloads = [workload("a", Some(2), 2), workload("b", Some(1), 1)];
        assert_eq!(compute_phase(&workloads, true), ScalingPhase::ScaledUp);
        assert_eq!(compute_phase(&workloads, false), ScalingPhase::ScaledUp);
    }

    #[test]
    fn inactive_target_with_unready_replicas_is_partly_scaled() {
        // Nothing at zero yet and pods lagging behind their desired count
        let workloads = [workload("a", Some(2), 1), workload("b", Some(1), 1)];
        assert_eq!(compute_phase(&workloads, false), ScalingPhase::PartlyScaled);
    }

    #[test]
    fn catching_up_replicas_mean_scaling_up() {
        let workloads = [workload("a", Some(3), 1)];
        assert_eq!(compute_phase(&workloads, true), ScalingPhase::ScalingUp);
    }

    #[test]
    fn mixed_zero_and_running_tracks_the_target() {
        let workloads = [workload("a", Some(0), 0), workload("b", Some(2), 2)];
        assert_eq!(compute_phase(&workloads, true), ScalingPhase::ScalingUp);
        assert_eq!(compute_phase(&workloads, false), ScalingPhase::ScalingDown);
    }

    #[test]
    fn unset_desired_counts_as_one_replica() {
        let caught_up = [workload("a", None, 1)];
        assert_eq!(compute_phase(&caught_up, true), ScalingPhase::ScaledUp);

        let lagging = [workload("a", None, 0)];
        assert_eq!(compute_phase(&lagging, true), ScalingPhase::ScalingUp);
    }
}
