//! Human-readable terminal renderer.

use crate::domain::{ProbeReport, ProbeVerdict};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version.
    pub fn render_version(&self, version: &str) {
        if self.ctx.quiet {
            return;
        }
        println!("kubectl-pocket {version}");
    }

    /// Render the outcome of a connection test.
    ///
    /// Failures are written to stderr even when `quiet`.
    pub fn render_probe(&self, report: &ProbeReport, verdict: ProbeVerdict) {
        let name = report.backend.display_name();
        if verdict.is_success() {
            self.ctx.success(&format!("{name} connection successful!"));
            self.ctx.kv("Response:", &report.output);
            return;
        }

        self.ctx.error(&format!("{name} connection failed"));
        match verdict {
            ProbeVerdict::PhaseFailed(phase) => {
                self.ctx.kv("Pod phase:", phase.as_str());
            }
            ProbeVerdict::MarkerMissing(marker) => {
                self.ctx.kv("Expected:", &format!("{marker:?} in the client output"));
            }
            ProbeVerdict::Success => {}
        }
        if report.output.is_empty() {
            self.ctx.info("The client produced no output");
        } else {
            self.ctx.transcript(&report.output);
        }
    }
}
