//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::app::{AppContext, AppFlags, ClusterFlags, OutputFlags};
use crate::application::ports::ConfigStore;
use crate::commands;
use crate::domain::{PocketConfig, PocketError};
use crate::infra::config::YamlConfigStore;
use crate::infra::signals;
use crate::output::json;

/// Throwaway database clients for Kubernetes: test connections, open shells,
/// forward ports
#[derive(Parser)]
#[command(
    name = "kubectl-pocket",
    bin_name = "kubectl pocket",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Namespace to work in
    #[arg(short, long, global = true)]
    pub namespace: Option<String>,

    /// Path to the kubeconfig file
    #[arg(long, global = true, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long, global = true)]
    pub context: Option<String>,

    /// How long a connection test may take, in seconds or with a unit
    /// suffix (30, 30s, 2m, 1h)
    #[arg(long, global = true, value_name = "DURATION", default_value = "30s",
          value_parser = parse_timeout)]
    pub timeout: Duration,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Parse a whole number of seconds, minutes (`m`) or hours (`h`); a bare
/// number or an `s` suffix means seconds.
fn parse_timeout(raw: &str) -> std::result::Result<Duration, String> {
    let usage = || format!("invalid duration '{raw}': expected seconds like 30 or 30s, or 2m, 1h");
    let raw = raw.trim();
    let (digits, scale) = match raw.char_indices().last() {
        Some((at, 's')) => (&raw[..at], 1),
        Some((at, 'm')) => (&raw[..at], 60),
        Some((at, 'h')) => (&raw[..at], 3600),
        _ => (raw, 1),
    };
    let value: u64 = digits.parse().map_err(|_| usage())?;
    let secs = value
        .checked_mul(scale)
        .ok_or_else(|| format!("duration '{raw}' is too large"))?;
    if secs == 0 {
        return Err("timeout must be at least 1 second".to_string());
    }
    Ok(Duration::from_secs(secs))
}

#[derive(Subcommand)]
pub enum Command {
    /// Test a database connection from inside the cluster
    Test(commands::test::TestArgs),

    /// Forward a local port to a database in the cluster
    #[command(name = "pf", visible_aliases = ["portforward", "port-forward"])]
    Pf(commands::pf::PfArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the command fails.
    /// With `--json` the error is also printed to stdout as a JSON object,
    /// except for a failed probe whose report already went out.
    pub async fn run(self) -> Result<()> {
        let json = self.json;
        let result = self.execute().await;
        if let Err(e) = &result
            && json
            && !matches!(e.downcast_ref::<PocketError>(), Some(PocketError::ProbeFailed { .. }))
        {
            println!("{}", json::format_error(&format!("{e:#}"), json::error_code(e))?);
        }
        result
    }

    async fn execute(self) -> Result<()> {
        let Cli {
            namespace,
            kubeconfig,
            context,
            timeout,
            json,
            quiet,
            no_color,
            verbose: _,
            command,
        } = self;

        let config = match command {
            Command::Version => PocketConfig::default(),
            _ => YamlConfigStore::default().load()?,
        };
        let app = AppContext::new(
            AppFlags {
                output: OutputFlags {
                    no_color,
                    quiet,
                    json,
                },
                cluster: ClusterFlags {
                    namespace,
                    kubeconfig,
                    context,
                },
                probe_timeout: timeout,
            },
            config,
        );

        match command {
            Command::Version => commands::version::run(&app),
            Command::Test(args) => {
                let cluster = app.connect().await?;
                let listener = signals::spawn_interrupt_listener(app.cancel.clone());
                let result = commands::test::run(&app, &cluster, args).await;
                app.sweep(&cluster).await;
                listener.abort();
                result
            }
            Command::Pf(args) => {
                let cluster = app.connect().await?;
                let listener = signals::spawn_interrupt_listener(app.cancel.clone());
                let result = commands::pf::run(&app, &cluster, args).await;
                listener.abort();
                result
            }
        }
    }
}
