//! Interactive session over an exec channel.
//!
//! Local stdin is pumped to the remote process and remote stdout/stderr to
//! the local streams, each on its own task. The session ends when the
//! remote process exits or `cancel` fires; either way the pumps are torn
//! down and the terminal is restored before returning.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::application::ports::{ExecChannel, RemoteProcess, TerminalControl, WorkloadApi};
use crate::application::services::lifecycle;
use crate::domain::{LifecyclePhase, PocketError, ResourceHandle};

/// How long remote output may keep flowing after the process has exited.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Local ends of the session.
pub struct IoBindings<R, W, E> {
    pub stdin: R,
    pub stdout: W,
    pub stderr: E,
}

impl IoBindings<tokio::io::Stdin, tokio::io::Stdout, tokio::io::Stderr> {
    /// The process's own standard streams.
    #[must_use]
    pub fn stdio() -> Self {
        Self {
            stdin: tokio::io::stdin(),
            stdout: tokio::io::stdout(),
            stderr: tokio::io::stderr(),
        }
    }
}

/// Raw mode held for the lifetime of the guard.
///
/// Restores the previous terminal mode on drop, on every exit path.
pub struct RawModeGuard<'a, T: TerminalControl> {
    terminal: &'a T,
    active: bool,
}

impl<'a, T: TerminalControl> RawModeGuard<'a, T> {
    /// Switch `terminal` to raw mode if `enable` is set; otherwise an inert guard.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal refuses raw mode.
    pub fn engage(terminal: &'a T, enable: bool) -> anyhow::Result<Self> {
        if enable {
            terminal.enable_raw()?;
        }
        Ok(Self {
            terminal,
            active: enable,
        })
    }
}

impl<T: TerminalControl> Drop for RawModeGuard<'_, T> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = self.terminal.disable_raw() {
            warn!("failed to restore terminal: {e:#}");
        }
    }
}

/// Attach to `command` inside the running pod behind `handle`.
///
/// Raw mode is only engaged when `tty` is requested and stdin is a terminal.
///
/// # Errors
///
/// - [`PocketError::NotReady`] if the pod is not `Running`.
/// - [`PocketError::Session`] if the channel cannot be established or the
///   remote process fails.
/// - [`PocketError::Interrupted`] if `cancel` fires.
#[allow(clippy::too_many_arguments)]
pub async fn attach<C, T, R, W, E>(
    api: &C,
    terminal: &T,
    handle: &ResourceHandle,
    command: &[String],
    io: IoBindings<R, W, E>,
    tty: bool,
    cancel: &CancellationToken,
) -> Result<(), PocketError>
where
    C: WorkloadApi + ExecChannel,
    T: TerminalControl,
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
    E: AsyncWrite + Send + Unpin + 'static,
{
    let status = lifecycle::get_status(api, handle).await?;
    if status.phase != LifecyclePhase::Running {
        return Err(PocketError::NotReady {
            name: handle.name().to_string(),
            phase: status.phase,
        });
    }

    let _raw = RawModeGuard::engage(terminal, tty && terminal.is_terminal()).map_err(|e| {
        PocketError::Session {
            reason: format!("failed to switch terminal to raw mode: {e:#}"),
        }
    })?;

    let remote = api
        .exec(handle, command, tty)
        .await
        .map_err(|e| PocketError::Session {
            reason: format!("failed to attach to {handle}: {e:#}"),
        })?;
    debug!(pod = %handle, ?command, tty, "attached");

    run(remote, io, terminal, cancel).await
}

async fn run<T, R, W, E>(
    remote: RemoteProcess,
    io: IoBindings<R, W, E>,
    terminal: &T,
    cancel: &CancellationToken,
) -> Result<(), PocketError>
where
    T: TerminalControl,
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
    E: AsyncWrite + Send + Unpin + 'static,
{
    let RemoteProcess {
        stdin,
        stdout,
        stderr,
        resize,
        mut exit,
    } = remote;
    let IoBindings {
        stdin: local_in,
        stdout: local_out,
        stderr: local_err,
    } = io;

    let pumps = cancel.child_token();
    let mut inbound = JoinSet::new();
    let mut outbound = JoinSet::new();
    if let Some(remote_in) = stdin {
        outbound.spawn(pump("stdin", local_in, remote_in, pumps.clone()));
    }
    if let Some(remote_out) = stdout {
        inbound.spawn(pump("stdout", remote_out, local_out, pumps.clone()));
    }
    if let Some(remote_err) = stderr {
        inbound.spawn(pump("stderr", remote_err, local_err, pumps.clone()));
    }

    if let (Some(tx), Some(size)) = (resize.as_ref(), terminal.size()) {
        let _ = tx.send(size).await;
    }
    let mut resizes = ResizeWatcher::new(resize.is_some());

    let outcome = loop {
        tokio::select! {
            status = &mut exit => break Some(status),
            () = cancel.cancelled() => break None,
            () = resizes.changed() => {
                if let (Some(tx), Some(size)) = (resize.as_ref(), terminal.size()) {
                    let _ = tx.try_send(size);
                }
            }
        }
    };

    if outcome.is_some() {
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while let Some(done) = inbound.join_next().await {
                log_pump(done);
            }
        })
        .await;
        if drained.is_err() {
            debug!("remote output still open after exit");
        }
    }
    pumps.cancel();
    while let Some(done) = inbound.join_next().await {
        log_pump(done);
    }
    while let Some(done) = outbound.join_next().await {
        log_pump(done);
    }

    match outcome {
        None => Err(PocketError::Interrupted),
        Some(exit) if exit.success => Ok(()),
        Some(exit) => Err(PocketError::Session {
            reason: exit
                .message
                .unwrap_or_else(|| "remote process exited with an error".to_string()),
        }),
    }
}

/// Copy `reader` into `writer` until EOF or cancellation, flushing each
/// chunk so interactive output is not held back.
async fn pump<R, W>(
    label: &'static str,
    mut reader: R,
    mut writer: W,
    cancel: CancellationToken,
) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let n = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            read = reader.read(&mut buf) => read?,
        };
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
        writer.flush().await?;
        total += n as u64;
    }
    // EOF on local stdin must reach the remote process.
    let _ = writer.shutdown().await;
    trace!(stream = label, bytes = total, "pump finished");
    Ok(total)
}

fn log_pump(done: Result<io::Result<u64>, tokio::task::JoinError>) {
    match done {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => debug!("stream closed with error: {e}"),
        Err(e) => warn!("stream task failed: {e}"),
    }
}

/// Window-size change notifications (SIGWINCH on unix).
struct ResizeWatcher {
    #[cfg(unix)]
    signal: Option<tokio::signal::unix::Signal>,
}

impl ResizeWatcher {
    fn new(enabled: bool) -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let signal = if enabled {
                signal(SignalKind::window_change())
                    .map_err(|e| debug!("cannot watch window size: {e}"))
                    .ok()
            } else {
                None
            };
            Self { signal }
        }
        #[cfg(not(unix))]
        {
            let _ = enabled;
            Self {}
        }
    }

    /// Resolves on the next change; pends forever when not watching.
    async fn changed(&mut self) {
        #[cfg(unix)]
        if let Some(signal) = self.signal.as_mut() {
            if signal.recv().await.is_some() {
                return;
            }
            self.signal = None;
        }
        std::future::pending::<()>().await;
    }
}
