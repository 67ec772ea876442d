//! Virtual display-server helper process.
//!
//! Headless hosts have no display for the engine's GUI requirements, so a
//! helper (e.g. `Xvfb`) is started on a dedicated display address before
//! any job runs and torn down when the supervisor exits.

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::process::SpawnError;

/// One running display-server helper.
///
/// `kill_on_drop` is set, so the helper dies with the supervisor even on
/// unclean exit paths.
pub struct DisplayServer {
    child: Child,
    address: String,
}

impl DisplayServer {
    /// Launch the helper listening on `address` (e.g. `:95`).
    pub fn spawn(helper: &Path, address: &str) -> Result<Self, SpawnError> {
        let child = Command::new(helper)
            .arg(address)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpawnError::Launch {
                program: helper.display().to_string(),
                source,
            })?;

        tracing::info!(helper = %helper.display(), address, "Display server started");

        Ok(Self {
            child,
            address: address.to_string(),
        })
    }

    /// The display address the helper serves.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Terminate the helper and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::debug!(error = %e, "Display server already gone");
        }
        let _ = self.child.wait().await;
        tracing::info!(address = %self.address, "Display server stopped");
    }
}
