//! nightshift operator: reconciliation controllers for scheduled scaling
//!
//! Two controllers share one engine:
//! - the **ScalingConfig** controller scales a single namespace on its
//!   schedule, unless a ScalingGroup claims that namespace
//! - the **ScalingGroup** controller scales a set of namespaces in ordered
//!   stages with cross-namespace barrier semantics

pub mod controller;
pub mod controller_runner;
