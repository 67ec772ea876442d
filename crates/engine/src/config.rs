//! Job configuration and auxiliary-executable discovery.

use std::path::{Path, PathBuf};

/// Errors raised while assembling or validating a [`JobConfig`].
///
/// All of these are fatal before any job starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("executable '{0}' not found on PATH")]
    ExecutableNotFound(String),

    #[error("engine archive not found: {0}")]
    EngineArchiveNotFound(PathBuf),
}

/// Immutable description of one routing job.
///
/// Built once at startup from validated input and shared read-only by every
/// session started from it.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Interpreter used to launch the engine archive (typically `java`).
    pub interpreter: PathBuf,
    /// The routing-engine archive handed to the interpreter via `-jar`.
    pub engine_archive: PathBuf,
    /// Extra engine options, already normalized to `-key value` form.
    pub extra_args: Vec<String>,
    /// The data/output artifact the engine rewrites while routing.
    pub artifact_path: PathBuf,
    /// Whether the engine runs against a virtual display server.
    pub headless: bool,
    /// Display address injected into the engine environment when headless.
    pub display_address: String,
}

impl JobConfig {
    /// Verify that the engine archive exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.engine_archive.is_file() {
            return Err(ConfigError::EngineArchiveNotFound(
                self.engine_archive.clone(),
            ));
        }
        Ok(())
    }
}

/// Normalize user-supplied delivery options into engine arguments.
///
/// Each `key=value` entry becomes the pair `-key value`; an entry without
/// `=` becomes the bare flag `-key`. Blank entries are skipped.
pub fn normalize_delivery_args(raw: &[String]) -> Vec<String> {
    let mut args = Vec::new();
    for entry in raw {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        match entry.split_once('=') {
            Some((key, value)) => {
                args.push(format!("-{key}"));
                args.push(value.to_string());
            }
            None => args.push(format!("-{entry}")),
        }
    }
    args
}

/// Resolve an executable name or path to an on-disk file.
///
/// A value containing a path separator (or naming an existing file) is
/// accepted as-is; a bare name is searched for in every `PATH` directory.
pub fn find_executable(name: &str) -> Result<PathBuf, ConfigError> {
    let dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect())
        .unwrap_or_default();
    search_executable(name, &dirs)
}

fn search_executable(name: &str, dirs: &[PathBuf]) -> Result<PathBuf, ConfigError> {
    let candidate = Path::new(name);
    if candidate.is_file() {
        return Ok(candidate.to_path_buf());
    }
    if candidate.components().count() == 1 {
        for dir in dirs {
            let path = dir.join(candidate);
            if path.is_file() {
                return Ok(path);
            }
        }
    }
    Err(ConfigError::ExecutableNotFound(name.to_string()))
}
