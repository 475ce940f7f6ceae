//! Colours for human-readable output.
//!
//! A fresh [`Styles`] is plain text. [`Styles::colorize`] turns colour on
//! once the output context has decided stdout is a colour-capable terminal.

use owo_colors::Style;

#[derive(Default, Clone)]
pub struct Styles {
    /// `✓` lines: a passing probe, a removed pod, a live tunnel.
    pub success: Style,
    pub warning: Style,
    /// `✗` lines on stderr.
    pub error: Style,
    pub info: Style,
    /// Keys of key/value lines such as `Pod phase:` or `Response:`.
    pub label: Style,
    /// Heading above the client transcript.
    pub title: Style,
    /// Lines the database client printed inside the pod.
    pub transcript: Style,
    /// Arrow in front of a step when no spinner is shown.
    pub step: Style,
}

impl Styles {
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().bright_red().bold();
        self.info = Style::new().blue();
        self.label = Style::new().dimmed();
        self.title = Style::new().bold().magenta();
        self.transcript = Style::new().italic();
        self.step = Style::new().magenta();
    }
}
