//! One routing job from spawn to exit.
//!
//! A [`Session`] owns the engine process for exactly one job: it selects
//! over the two output streams, classifies stdout lines, folds the events
//! into a [`ProgressState`], and publishes every change to its sink. Both
//! streams feed the same single-threaded processing path, so state updates
//! are never concurrent; lines within one stream are handled in emission
//! order, with no ordering guaranteed between the two streams.
//!
//! A session runs once. Starting another job means creating a new session;
//! callers that must refuse concurrent jobs guard session creation, not
//! the session itself.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::classifier::{LogClassifier, TokenClassifier};
use crate::config::JobConfig;
use crate::events::LogEvent;
use crate::presenter::ProgressPresenter;
use crate::process::{EngineProcess, SpawnError};
use crate::progress::{ProgressState, StateChange};
use crate::wire::RemoteMessage;

/// Tracing target used to echo raw engine output.
const ENGINE_LOG_TARGET: &str = "routebridge::engine";

/// Where a session publishes progress.
pub enum EventSink {
    /// Redraw a local terminal progress bar on every change.
    Terminal(ProgressPresenter),
    /// Serialize every change, with the current on-disk artifact bytes,
    /// onto a remote session connection.
    Remote(mpsc::UnboundedSender<RemoteMessage>),
}

/// How a finished job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Nets still incomplete when optimization finished.
    pub final_count: u32,
    /// The announced total, if the engine ever announced one.
    pub total: Option<u32>,
}

/// Terminal result of one session.
///
/// An engine exit without an observed completion is a failed job; the
/// exit code is the outward failure signal, and artifacts are left on
/// disk for diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOutcome {
    pub exit_code: i32,
    pub completion: Option<Completion>,
}

impl JobOutcome {
    pub fn is_completed(&self) -> bool {
        self.completion.is_some()
    }
}

/// Errors that prevent a session from producing an outcome.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error("failed to await engine exit: {0}")]
    Wait(#[source] std::io::Error),
}

/// Orchestrates one routing job.
pub struct Session {
    config: JobConfig,
    classifier: Box<dyn LogClassifier>,
    progress: ProgressState,
    completion: Option<Completion>,
}

impl Session {
    /// Session with the standard engine log matcher.
    pub fn new(config: JobConfig) -> Self {
        Self::with_classifier(config, Box::new(TokenClassifier))
    }

    /// Session with a caller-chosen classification strategy.
    pub fn with_classifier(config: JobConfig, classifier: Box<dyn LogClassifier>) -> Self {
        Self {
            config,
            classifier,
            progress: ProgressState::new(),
            completion: None,
        }
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    /// Run the job to engine exit.
    ///
    /// Consumes the session: its engine process cannot be restarted, only
    /// replaced. Cancellation terminates the engine; the loop then drains
    /// the remaining output and reports the (killed) exit code.
    pub async fn run(
        mut self,
        input_artifact: Option<PathBuf>,
        mut sink: EventSink,
        cancel: CancellationToken,
    ) -> Result<JobOutcome, SessionError> {
        let mut process = EngineProcess::spawn(&self.config, input_artifact.as_deref())?;

        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut cancelled = false;

        while stdout_open || stderr_open {
            tokio::select! {
                _ = cancel.cancelled(), if !cancelled => {
                    tracing::info!("Cancellation requested; terminating engine");
                    process.terminate();
                    cancelled = true;
                }
                line = process.stdout.next_line(), if stdout_open => match line {
                    Ok(Some(line)) => self.handle_stdout_line(&line, &mut sink).await,
                    Ok(None) => stdout_open = false,
                    Err(e) => {
                        tracing::warn!(error = %e, "Engine stdout read failed");
                        stdout_open = false;
                    }
                },
                line = process.stderr.next_line(), if stderr_open => match line {
                    Ok(Some(line)) => tracing::info!(target: ENGINE_LOG_TARGET, "{line}"),
                    Ok(None) => stderr_open = false,
                    Err(e) => {
                        tracing::warn!(error = %e, "Engine stderr read failed");
                        stderr_open = false;
                    }
                },
            }
        }

        let exit_code = process.wait().await.map_err(SessionError::Wait)?;

        let outcome = JobOutcome {
            exit_code,
            completion: self.completion,
        };

        if outcome.is_completed() {
            tracing::info!(exit_code, "Routing job completed");
        } else {
            tracing::warn!(exit_code, "Engine exited without reporting completion");
        }

        Ok(outcome)
    }

    /// Classify one stdout line and publish the resulting state change.
    async fn handle_stdout_line(&mut self, line: &str, sink: &mut EventSink) {
        let event = self.classifier.classify(line);
        if event == LogEvent::Unrecognized {
            tracing::info!(target: ENGINE_LOG_TARGET, "{line}");
            return;
        }
        tracing::debug!(target: ENGINE_LOG_TARGET, "{line}");

        match self.progress.apply(event) {
            StateChange::None => {}
            StateChange::Started { total } => {
                tracing::info!(total, "Routing started");
                match sink {
                    EventSink::Terminal(presenter) => presenter.update(&self.progress),
                    EventSink::Remote(tx) => {
                        let data = self.read_artifact().await;
                        let _ = tx.send(RemoteMessage::RoutingProgress {
                            incomplete_net_num: total,
                            data,
                        });
                    }
                }
            }
            StateChange::Ticked { current } => match sink {
                EventSink::Terminal(presenter) => presenter.update(&self.progress),
                EventSink::Remote(tx) => {
                    let data = self.read_artifact().await;
                    let _ = tx.send(RemoteMessage::RoutingProgress {
                        incomplete_net_num: current,
                        data,
                    });
                }
            },
            StateChange::Finished { final_count } => {
                self.completion = Some(Completion {
                    final_count,
                    total: self.progress.total,
                });
                match sink {
                    EventSink::Terminal(presenter) => presenter.finish(&self.progress),
                    EventSink::Remote(tx) => {
                        let data = self.read_artifact().await;
                        let _ = tx.send(RemoteMessage::RoutingResult {
                            incomplete_net_num: final_count,
                            complete: final_count == 0,
                            data,
                        });
                    }
                }
            }
        }
    }

    /// Current on-disk artifact bytes.
    ///
    /// The engine rewrites the artifact between ticks, so it is re-read
    /// on every publish rather than cached. A read failure downgrades the
    /// payload to empty; it never fails the job.
    async fn read_artifact(&self) -> Vec<u8> {
        match tokio::fs::read(&self.config.artifact_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    path = %self.config.artifact_path.display(),
                    error = %e,
                    "Could not read artifact; sending empty payload",
                );
                Vec::new()
            }
        }
    }
}

/// Remove the data artifact after a completed job.
///
/// Failed jobs keep their artifacts for diagnosis, so callers invoke this
/// only on the completed path.
pub async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed data artifact"),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not remove data artifact")
        }
    }
}
