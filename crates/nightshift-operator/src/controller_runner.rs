//! Controller runner - starts and manages both nightshift controllers

use std::sync::Arc;

use futures::StreamExt;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client};
use tracing::info;

use nightshift_common::crd::{ScalingConfig, ScalingGroup};

use crate::controller::{config, group, Context};

/// Run both controllers until shutdown.
///
/// Each controller processes one event per owned object at a time; the two
/// loops run concurrently and share the context.
pub async fn run_controllers(client: Client, ctx: Arc<Context>) {
    let configs: Api<ScalingConfig> = Api::all(client.clone());
    let groups: Api<ScalingGroup> = Api::all(client);

    info!("Starting nightshift controllers...");
    info!("- ScalingConfig controller");
    info!("- ScalingGroup controller");

    let config_controller = Controller::new(configs, WatcherConfig::default())
        .shutdown_on_signal()
        .run(config::reconcile, config::error_policy, ctx.clone())
        .for_each(|result| async move {
            match result {
                Ok(action) => tracing::debug!(?action, "ScalingConfig reconciliation completed"),
                Err(e) => tracing::error!(error = ?e, "ScalingConfig reconciliation error"),
            }
        });

    let group_controller = Controller::new(groups, WatcherConfig::default())
        .shutdown_on_signal()
        .run(group::reconcile, group::error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok(action) => tracing::debug!(?action, "ScalingGroup reconciliation completed"),
                Err(e) => tracing::error!(error = ?e, "ScalingGroup reconciliation error"),
            }
        });

    tokio::select! {
        _ = config_controller => info!("ScalingConfig controller completed"),
        _ = group_controller => info!("ScalingGroup controller completed"),
    }
}
