//! kubectl-pocket - throwaway database clients for Kubernetes

use clap::Parser;
use pocket_cli::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Env var holding a `tracing` filter directive; overrides `-v`.
const LOG_ENV: &str = "POCKET_LOG";

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let code = match cli.run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e:#}");
            1
        }
    };
    // An interactive session may leave a blocking stdin read behind; exiting
    // here keeps runtime shutdown from waiting on it.
    std::process::exit(code);
}
