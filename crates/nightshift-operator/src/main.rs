//! nightshift operator - scheduled scale-down/up of namespaces and groups

use std::sync::Arc;

use clap::Parser;
use kube::{Client, CustomResourceExt};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nightshift_common::crd::{ScalingConfig, ScalingGroup};
use nightshift_operator::controller::Context;
use nightshift_operator::controller_runner;

/// nightshift - Kubernetes FinOps operator for scheduled workload scaling
#[derive(Parser, Debug)]
#[command(name = "nightshift-operator", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.crd {
        print!("{}", serde_yaml::to_string(&ScalingConfig::crd())?);
        println!("---");
        print!("{}", serde_yaml::to_string(&ScalingGroup::crd())?);
        return Ok(());
    }

    let client = Client::try_default().await?;
    let ctx = Arc::new(Context::builder(client.clone()).build());

    controller_runner::run_controllers(client, ctx).await;
    Ok(())
}
