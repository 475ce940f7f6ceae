//! Value types shared by interactive sessions.

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub width: u16,
    pub height: u16,
}

/// How the remote process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteExit {
    pub success: bool,
    /// Server-provided explanation when the process failed.
    pub message: Option<String>,
}

impl RemoteExit {
    #[must_use]
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}
