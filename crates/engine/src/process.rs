//! Routing-engine child process supervision.
//!
//! [`EngineProcess`] wraps one spawned engine instance: the invocation is
//! assembled from a [`JobConfig`], both output streams are exposed as
//! line readers, and the child is killed if the handle is dropped while
//! still running.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::config::JobConfig;

/// Name of the environment variable carrying the display address.
const DISPLAY_ENV: &str = "DISPLAY";

/// Errors raised while launching a child process.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The child was spawned without a captured stream. Indicates a stdio
    /// wiring bug, not an engine failure.
    #[error("engine process is missing its {0} stream")]
    MissingStream(&'static str),
}

/// One live (or exited) routing-engine child process.
///
/// Owned exclusively by the session that spawned it; a finished stream
/// cannot be restarted, only a new process can.
pub struct EngineProcess {
    child: Child,
    /// Line reader over the engine's standard output. Public so callers
    /// can poll both streams concurrently without borrowing the whole
    /// process handle.
    pub stdout: LineStream<ChildStdout>,
    /// Line reader over the engine's standard error.
    pub stderr: LineStream<ChildStderr>,
}

/// A finite, line-buffered view of one child output stream.
pub type LineStream<R> = Lines<BufReader<R>>;

impl EngineProcess {
    /// Spawn the engine described by `config`.
    ///
    /// The invocation is
    /// `<interpreter> -jar <archive> <extra args…> -dct 0
    /// [-de <input>] [-df -op <artifact>]`; when headless, the configured
    /// display address is injected into the child environment.
    pub fn spawn(config: &JobConfig, input_artifact: Option<&Path>) -> Result<Self, SpawnError> {
        let mut cmd = Command::new(&config.interpreter);
        cmd.arg("-jar")
            .arg(&config.engine_archive)
            .args(&config.extra_args)
            .args(["-dct", "0"]);

        if let Some(input) = input_artifact {
            cmd.arg("-de").arg(input);
        }

        cmd.args(["-df", "-op"]).arg(&config.artifact_path);

        if config.headless {
            cmd.env(DISPLAY_ENV, &config.display_address);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| SpawnError::Launch {
            program: config.interpreter.display().to_string(),
            source,
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or(SpawnError::MissingStream("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(SpawnError::MissingStream("stderr"))?;

        tracing::debug!(
            interpreter = %config.interpreter.display(),
            archive = %config.engine_archive.display(),
            headless = config.headless,
            "Engine process spawned",
        );

        Ok(Self {
            child,
            stdout: BufReader::new(stdout).lines(),
            stderr: BufReader::new(stderr).lines(),
        })
    }

    /// Send a termination signal to the engine.
    ///
    /// Errors are logged, not returned: the process may already have
    /// exited on its own.
    pub fn terminate(&mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::debug!(error = %e, "Engine termination signal not delivered");
        }
    }

    /// Wait for the engine to exit and return its exit code.
    ///
    /// A signal-terminated child has no code and is reported as `-1`.
    pub async fn wait(&mut self) -> std::io::Result<i32> {
        let status = self.child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }
}
