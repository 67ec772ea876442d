//! WebSocket session endpoint.
//!
//! One persistent connection per remote peer. A `startRoute` frame claims
//! the session slot, persists the attached artifact to a temp file, and
//! binds a routing session to the connection; progress and result frames
//! flow back until the job ends. A peer disconnecting does not cancel an
//! in-flight job -- the engine keeps routing and the artifact still lands
//! on disk.

use std::io::Write;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tempfile::{NamedTempFile, TempPath};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use routebridge_engine::config::JobConfig;
use routebridge_engine::session::{self, EventSink, Session};
use routebridge_engine::wire::{self, RemoteMessage};

use crate::state::{AppState, SessionPermit};

/// HTTP handler that upgrades the connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single session connection after upgrade.
///
/// Splits the socket into sink and stream, spawns a sender task that
/// forwards wire messages to the peer, and processes inbound frames on
/// the current task.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, "Session peer connected");

    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<RemoteMessage>();

    // Sender task: serialize outbound messages onto the socket.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let frame = Message::Text(wire::encode_message(&msg).into());
            if sink.send(frame).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "Session peer sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound frames.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => handle_text_frame(&text, &state, &out_tx, &conn_id),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "Session receive error");
                break;
            }
        }
    }

    send_task.abort();
    tracing::info!(conn_id = %conn_id, "Session peer disconnected");
}

/// Dispatch one inbound text frame.
///
/// Malformed frames and unexpected actions are dropped with a warning;
/// they never affect a running job.
fn handle_text_frame(
    text: &str,
    state: &AppState,
    out_tx: &mpsc::UnboundedSender<RemoteMessage>,
    conn_id: &str,
) {
    match wire::parse_message(text) {
        Ok(RemoteMessage::StartRoute { data }) => start_job(state, data, out_tx, conn_id),
        Ok(_) => {
            tracing::warn!(conn_id = %conn_id, "Ignoring non-request message");
        }
        Err(e) => {
            tracing::warn!(conn_id = %conn_id, error = %e, "Dropping malformed session frame");
        }
    }
}

/// Start a routing job for the attached artifact, or reject if busy.
fn start_job(
    state: &AppState,
    data: Vec<u8>,
    out_tx: &mpsc::UnboundedSender<RemoteMessage>,
    conn_id: &str,
) {
    let Some(permit) = state.slot.try_acquire() else {
        tracing::warn!(conn_id = %conn_id, "Rejecting start request; a job is already running");
        let _ = out_tx.send(RemoteMessage::RouteRejected {
            reason: "a routing job is already running".into(),
        });
        return;
    };

    let input = match persist_input_artifact(&data) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!(conn_id = %conn_id, error = %e, "Could not persist input artifact");
            return;
        }
    };

    tracing::info!(conn_id = %conn_id, bytes = data.len(), "Starting remote routing job");

    let config = (*state.config).clone();
    let session = Session::new(config.clone());
    let out_tx = out_tx.clone();
    let cancel = state.cancel.child_token();

    tokio::spawn(run_remote_job(session, config, input, out_tx, cancel, permit));
}

/// Drive one remote job to its end and clean up.
///
/// The temp input artifact is removed exactly once when `input` drops,
/// on every exit path. The data artifact is removed only after a
/// completed job; failures keep it for diagnosis.
async fn run_remote_job(
    session: Session,
    config: JobConfig,
    input: TempPath,
    out_tx: mpsc::UnboundedSender<RemoteMessage>,
    cancel: CancellationToken,
    permit: SessionPermit,
) {
    let _permit = permit;

    let result = session
        .run(Some(input.to_path_buf()), EventSink::Remote(out_tx), cancel)
        .await;

    match result {
        Ok(outcome) if outcome.is_completed() => {
            session::remove_artifact(&config.artifact_path).await;
        }
        Ok(outcome) => {
            tracing::error!(exit_code = outcome.exit_code, "Remote routing job failed");
        }
        Err(e) => {
            tracing::error!(error = %e, "Remote routing job could not run");
        }
    }
}

/// Write the inbound artifact to a temp file whose path guard deletes it
/// on drop.
fn persist_input_artifact(data: &[u8]) -> std::io::Result<TempPath> {
    let mut file = NamedTempFile::new()?;
    file.write_all(data)?;
    Ok(file.into_temp_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_artifact_is_removed_when_the_path_guard_drops() {
        let path = persist_input_artifact(b"design").expect("persist artifact");
        let on_disk = path.to_path_buf();
        assert_eq!(std::fs::read(&on_disk).expect("read back"), b"design");

        // The guard holds the only delete, so this covers every exit path
        // of a remote job.
        drop(path);
        assert!(!on_disk.exists());
    }
}
