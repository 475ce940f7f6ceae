//! `pf` command: forward a local port to an in-cluster database.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use pocket_common::Backend;

use crate::app::AppContext;
use crate::application::services::forward::{self, ForwardRequest};
use crate::infra::cluster::KubeCluster;

/// Arguments for the pf command.
#[derive(Args)]
pub struct PfArgs {
    /// Database to forward to
    #[arg(value_enum)]
    pub backend: Backend,

    /// Local port [default: the database's standard port]
    pub local_port: Option<u16>,

    /// Local address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    pub address: String,
}

/// Run the pf command until interrupted.
///
/// # Errors
///
/// Returns an error if no target service is found or the local port
/// cannot be bound.
pub async fn run(app: &AppContext, cluster: &Arc<KubeCluster>, args: PfArgs) -> Result<()> {
    let request = ForwardRequest {
        backend: args.backend,
        namespace: cluster.namespace().to_string(),
        address: args.address,
        local_port: args.local_port,
    };
    let reporter = app.reporter();
    forward::run_forward(Arc::clone(cluster), &request, &reporter, &app.cancel).await
}
