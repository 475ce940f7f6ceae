//! Infrastructure implementation of the `TerminalControl` port.

use std::io::IsTerminal;

use anyhow::{Context, Result};

use crate::application::ports::TerminalControl;
use crate::domain::TerminalSize;

/// The process's controlling terminal, driven through crossterm.
pub struct CrosstermTerminal;

impl TerminalControl for CrosstermTerminal {
    fn is_terminal(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn enable_raw(&self) -> Result<()> {
        crossterm::terminal::enable_raw_mode().context("cannot enable raw terminal mode")
    }

    fn disable_raw(&self) -> Result<()> {
        crossterm::terminal::disable_raw_mode().context("cannot restore terminal mode")
    }

    fn size(&self) -> Option<TerminalSize> {
        crossterm::terminal::size()
            .ok()
            .map(|(width, height)| TerminalSize { width, height })
    }
}
