//! End-to-end session tests against scripted fake engines.
//!
//! Each test writes a small shell script that mimics the routing engine's
//! log output and uses it as the "interpreter", so a full session run
//! (spawn, stream reading, classification, publishing, exit) is exercised
//! without the real engine.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use routebridge_engine::config::JobConfig;
use routebridge_engine::presenter::ProgressPresenter;
use routebridge_engine::session::{EventSink, Session, SessionError};
use routebridge_engine::wire::RemoteMessage;

/// Write an executable script into `dir` and return its path.
fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-engine.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
    let mut perms = std::fs::metadata(&path).expect("stat script").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod script");
    path
}

fn config_for(script: PathBuf, artifact: PathBuf) -> JobConfig {
    JobConfig {
        interpreter: script,
        engine_archive: "engine.jar".into(),
        extra_args: Vec::new(),
        artifact_path: artifact,
        headless: false,
        display_address: ":95".into(),
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<RemoteMessage>) -> Vec<RemoteMessage> {
    let mut messages = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        messages.push(msg);
    }
    messages
}

// ---------------------------------------------------------------------------
// Test: a full run publishes progress and a final result to a remote sink
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completed_run_publishes_progress_and_result() {
    let dir = tempfile::tempdir().expect("temp dir");
    let artifact = dir.path().join("board.ses");
    let script = write_script(
        dir.path(),
        &format!(
            r#"printf 'routed' > {artifact}
echo "d t z INFO m Before route: 4"
echo "d t z INFO m Auto-router pass #1 done: 2"
echo "some diagnostic chatter" >&2
echo "d t z INFO m After route: 1"
echo "d t z INFO m Route optimization was completed in 1s"
exit 0
"#,
            artifact = artifact.display(),
        ),
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = Session::new(config_for(script, artifact));
    let outcome = session
        .run(None, EventSink::Remote(tx), CancellationToken::new())
        .await
        .expect("session runs");

    assert_eq!(outcome.exit_code, 0);
    let completion = outcome.completion.expect("job completed");
    assert_eq!(completion.final_count, 1);
    assert_eq!(completion.total, Some(4));

    let messages = drain(&mut rx);
    assert_eq!(
        messages,
        vec![
            RemoteMessage::RoutingProgress {
                incomplete_net_num: 4,
                data: b"routed".to_vec(),
            },
            RemoteMessage::RoutingProgress {
                incomplete_net_num: 2,
                data: b"routed".to_vec(),
            },
            RemoteMessage::RoutingProgress {
                incomplete_net_num: 1,
                data: b"routed".to_vec(),
            },
            RemoteMessage::RoutingResult {
                incomplete_net_num: 1,
                complete: false,
                data: b"routed".to_vec(),
            },
        ],
    );
}

// ---------------------------------------------------------------------------
// Test: a fully routed board reports complete = true
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fully_routed_board_is_complete() {
    let dir = tempfile::tempdir().expect("temp dir");
    let artifact = dir.path().join("board.ses");
    let script = write_script(
        dir.path(),
        &format!(
            r#"printf 'done' > {artifact}
echo "d t z INFO m Before route: 2"
echo "d t z INFO m After route: 0"
echo "d t z INFO m Route optimization was completed in 1s"
"#,
            artifact = artifact.display(),
        ),
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = Session::new(config_for(script, artifact));
    let outcome = session
        .run(None, EventSink::Remote(tx), CancellationToken::new())
        .await
        .expect("session runs");

    assert_eq!(outcome.completion.map(|c| c.final_count), Some(0));
    let messages = drain(&mut rx);
    assert!(matches!(
        messages.last(),
        Some(RemoteMessage::RoutingResult { complete: true, incomplete_net_num: 0, .. })
    ));
}

// ---------------------------------------------------------------------------
// Test: engine exit without completion is a failed job, no result message
// ---------------------------------------------------------------------------

#[tokio::test]
async fn early_exit_propagates_code_and_sends_no_result() {
    let dir = tempfile::tempdir().expect("temp dir");
    let artifact = dir.path().join("board.ses");
    let script = write_script(
        dir.path(),
        r#"echo "d t z INFO m Before route: 4"
echo "java.lang.OutOfMemoryError" >&2
exit 3
"#,
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = Session::new(config_for(script, artifact));
    let outcome = session
        .run(None, EventSink::Remote(tx), CancellationToken::new())
        .await
        .expect("session runs");

    assert_eq!(outcome.exit_code, 3);
    assert!(outcome.completion.is_none());
    assert!(
        !drain(&mut rx)
            .iter()
            .any(|m| matches!(m, RemoteMessage::RoutingResult { .. })),
        "failed jobs must not send a result message",
    );
}

// ---------------------------------------------------------------------------
// Test: cancellation terminates the engine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancellation_kills_a_hung_engine() {
    let dir = tempfile::tempdir().expect("temp dir");
    let artifact = dir.path().join("board.ses");
    let script = write_script(dir.path(), "sleep 30\n");

    let cancel = CancellationToken::new();
    cancel.cancel();

    let session = Session::new(config_for(script, artifact));
    let outcome = session
        .run(None, EventSink::Terminal(ProgressPresenter::new()), cancel)
        .await
        .expect("session runs");

    assert!(outcome.completion.is_none());
    assert_ne!(outcome.exit_code, 0);
}

// ---------------------------------------------------------------------------
// Test: a terminal-sink run completes without a remote peer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn terminal_sink_run_completes() {
    let dir = tempfile::tempdir().expect("temp dir");
    let artifact = dir.path().join("board.ses");
    let script = write_script(
        dir.path(),
        &format!(
            r#"printf 'routed' > {artifact}
echo "d t z INFO m Before route: 1"
echo "d t z INFO m After route: 0"
echo "d t z INFO m Route optimization was completed in 1s"
"#,
            artifact = artifact.display(),
        ),
    );

    let session = Session::new(config_for(script, artifact));
    let outcome = session
        .run(
            None,
            EventSink::Terminal(ProgressPresenter::new()),
            CancellationToken::new(),
        )
        .await
        .expect("session runs");

    assert!(outcome.is_completed());
    assert_eq!(outcome.exit_code, 0);
}

// ---------------------------------------------------------------------------
// Test: an unlaunchable interpreter is a spawn error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_interpreter_is_a_spawn_error() {
    let config = config_for("/nonexistent/interpreter".into(), "board.ses".into());
    let session = Session::new(config);
    let err = session
        .run(
            None,
            EventSink::Terminal(ProgressPresenter::new()),
            CancellationToken::new(),
        )
        .await
        .expect_err("spawn must fail");

    assert!(matches!(err, SessionError::Spawn(_)));
}
