//! Unit tests for interactive sessions over in-memory streams.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use pocket_cli::application::services::session::{IoBindings, attach};
use pocket_cli::domain::{LifecyclePhase, PocketError, RemoteExit, ResourceHandle, TerminalSize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::mocks::{FakeCluster, FakeTerminal, remote_process};

fn handle() -> ResourceHandle {
    ResourceHandle::existing("default", "pocket-redis-1")
}

fn command() -> Vec<String> {
    vec!["redis-cli".to_string(), "-h".to_string(), "redis-svc".to_string()]
}

#[tokio::test]
async fn bytes_flow_both_ways_and_terminal_is_restored() {
    let (process, mut ends) = remote_process();
    let api = FakeCluster::new()
        .with_phases([LifecyclePhase::Running])
        .with_remote(process);
    let terminal = FakeTerminal::tty();
    let (mut user_keys, local_in) = tokio::io::duplex(1024);
    let (local_out, mut screen) = tokio::io::duplex(1024);
    let io = IoBindings {
        stdin: local_in,
        stdout: local_out,
        stderr: tokio::io::sink(),
    };
    let cancel = CancellationToken::new();
    let watched = &terminal;

    let driver = async move {
        assert_eq!(
            ends.resizes.recv().await,
            Some(TerminalSize {
                width: 80,
                height: 24
            })
        );

        user_keys.write_all(b"PING\r").await.unwrap();
        let mut typed = [0u8; 5];
        ends.stdin.read_exact(&mut typed).await.unwrap();
        assert_eq!(&typed, b"PING\r");

        ends.stdout.write_all(b"PONG\r\n").await.unwrap();
        let mut shown = [0u8; 6];
        screen.read_exact(&mut shown).await.unwrap();
        assert_eq!(&shown, b"PONG\r\n");

        assert!(watched.is_raw());
        drop(ends.stdout);
        ends.exit.send(RemoteExit::success()).unwrap();
    };

    let pod = handle();
    let shell = command();
    let (result, ()) = tokio::join!(
        attach(&api, &terminal, &pod, &shell, io, true, &cancel),
        driver
    );

    result.unwrap();
    assert!(!terminal.is_raw());
    assert_eq!(terminal.counts(), (1, 1));
    let execs = api.execs.lock().unwrap().clone();
    assert_eq!(execs, vec![("pocket-redis-1".to_string(), command(), true)]);
}

#[tokio::test]
async fn cancellation_ends_the_session_and_restores_the_terminal() {
    let (process, _ends) = remote_process();
    let api = FakeCluster::new()
        .with_phases([LifecyclePhase::Running])
        .with_remote(process);
    let terminal = FakeTerminal::tty();
    let (_user_keys, local_in) = tokio::io::duplex(64);
    let io = IoBindings {
        stdin: local_in,
        stdout: tokio::io::sink(),
        stderr: tokio::io::sink(),
    };
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = attach(&api, &terminal, &handle(), &command(), io, true, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, PocketError::Interrupted));
    assert!(!terminal.is_raw());
    assert_eq!(terminal.counts(), (1, 1));
}

#[tokio::test]
async fn remote_failure_is_a_session_error() {
    let (process, ends) = remote_process();
    let api = FakeCluster::new()
        .with_phases([LifecyclePhase::Running])
        .with_remote(process);
    let terminal = FakeTerminal::piped();
    let (_user_keys, local_in) = tokio::io::duplex(64);
    let io = IoBindings {
        stdin: local_in,
        stdout: tokio::io::sink(),
        stderr: tokio::io::sink(),
    };
    drop(ends.stdout);
    ends.exit
        .send(RemoteExit::failure("command terminated with non-zero exit code: 1"))
        .unwrap();

    let err = attach(
        &api,
        &terminal,
        &handle(),
        &command(),
        io,
        true,
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PocketError::Session { ref reason } if reason.contains("non-zero")));
    assert_eq!(terminal.counts(), (0, 0), "piped stdin never enters raw mode");
}

#[tokio::test]
async fn pod_that_is_not_running_is_rejected() {
    let api = FakeCluster::new().with_phases([LifecyclePhase::Pending]);
    let terminal = FakeTerminal::tty();
    let io = IoBindings {
        stdin: tokio::io::empty(),
        stdout: tokio::io::sink(),
        stderr: tokio::io::sink(),
    };

    let err = attach(
        &api,
        &terminal,
        &handle(),
        &command(),
        io,
        true,
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        PocketError::NotReady {
            phase: LifecyclePhase::Pending,
            ..
        }
    ));
    assert_eq!(terminal.counts(), (0, 0));
    assert!(api.execs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn refused_upgrade_restores_the_terminal() {
    let api = FakeCluster::new().with_phases([LifecyclePhase::Running]);
    let terminal = FakeTerminal::tty();
    let io = IoBindings {
        stdin: tokio::io::empty(),
        stdout: tokio::io::sink(),
        stderr: tokio::io::sink(),
    };

    let err = attach(
        &api,
        &terminal,
        &handle(),
        &command(),
        io,
        true,
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, PocketError::Session { ref reason } if reason.contains("upgrade refused")));
    assert_eq!(terminal.counts(), (1, 1));
}
