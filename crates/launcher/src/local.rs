//! Local run mode: one job, terminal progress, exit-code passthrough.

use routebridge_engine::classifier::PassthroughClassifier;
use routebridge_engine::config::JobConfig;
use routebridge_engine::presenter::ProgressPresenter;
use routebridge_engine::session::{self, EventSink, Session};
use tokio_util::sync::CancellationToken;

/// Run one routing job against the local terminal.
///
/// Returns the supervisor exit code, which equals the engine's own exit
/// code whenever the engine ran at all. With `raw` set, classification is
/// disabled and every line is echoed as-is.
pub async fn run(config: JobConfig, raw: bool, cancel: CancellationToken) -> i32 {
    let session = if raw {
        Session::with_classifier(config.clone(), Box::new(PassthroughClassifier))
    } else {
        Session::new(config.clone())
    };

    match session
        .run(None, EventSink::Terminal(ProgressPresenter::new()), cancel)
        .await
    {
        Ok(outcome) => {
            if outcome.is_completed() {
                session::remove_artifact(&config.artifact_path).await;
            } else if !raw {
                tracing::error!(
                    exit_code = outcome.exit_code,
                    "Engine exited before reporting completion",
                );
            }
            outcome.exit_code
        }
        Err(e) => {
            tracing::error!(error = %e, "Routing job could not run");
            1
        }
    }
}
