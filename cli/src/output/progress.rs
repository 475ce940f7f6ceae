//! Spinners for steps that wait on the cluster.
//!
//! Pod scheduling and image pulls can take a while, so the spinner shows
//! how long the current step has been running.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const FRAMES: &[&str] = &["◐", "◓", "◑", "◒", "●"];
const RUNNING: &str = "  {spinner:.magenta} {msg} {elapsed:.dim}";
const SETTLED: &str = "  {prefix:.green} {msg}";

/// Falls back to indicatif's default look if `template` does not parse.
fn style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Start a spinner labelled `msg`.
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(style(RUNNING).tick_strings(FRAMES));
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Leave the step on screen as done.
pub fn finish_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(style(SETTLED));
    pb.set_prefix("✓");
    pb.finish_with_message(msg.to_string());
}

/// Stop a spinner and erase its line.
pub fn clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}
