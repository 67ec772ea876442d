//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

/// Supervise an external routing engine and bridge its progress to a
/// terminal bar or to a remote peer over a WebSocket session.
#[derive(Parser, Debug)]
#[command(name = "routebridge", version)]
pub struct Cli {
    /// Path to the routing-engine archive launched via `-jar`
    #[arg(long = "jar", value_name = "FILE")]
    pub engine_archive: PathBuf,

    /// Interpreter used to launch the engine archive
    #[arg(long, default_value = "java", value_name = "PATH")]
    pub interpreter: String,

    /// Extra engine option; `key=value` becomes `-key value`. Repeatable.
    #[arg(short = 'd', long = "deliver", value_name = "KEY=VALUE")]
    pub deliver: Vec<String>,

    /// Data/output artifact file the engine rewrites while routing
    #[arg(long, default_value = ".data.tmp", value_name = "FILE")]
    pub data: PathBuf,

    /// Launch the engine with its own GUI instead of a virtual display
    #[arg(long)]
    pub gui: bool,

    /// Display-server helper executable used when headless
    #[arg(long, default_value = "Xvfb", value_name = "PATH")]
    pub display_helper: String,

    /// Display address handed to the helper and the engine
    #[arg(long, default_value = ":95", value_name = "ADDR")]
    pub display: String,

    /// Echo every engine line without interpreting progress
    #[arg(long, conflicts_with = "serve")]
    pub raw: bool,

    /// Run the session server instead of a single local job
    #[arg(long)]
    pub serve: bool,

    /// Session server port
    #[arg(long, default_value_t = 3579)]
    pub port: u16,

    /// Print the assembled engine invocation before launching
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_invocation_parses() {
        let cli = Cli::try_parse_from(["routebridge", "--jar", "engine.jar"]).unwrap();
        assert_eq!(cli.engine_archive, PathBuf::from("engine.jar"));
        assert_eq!(cli.interpreter, "java");
        assert_eq!(cli.display, ":95");
        assert!(!cli.serve);
    }

    #[test]
    fn deliver_options_accumulate_in_order() {
        let cli = Cli::try_parse_from([
            "routebridge",
            "--jar",
            "engine.jar",
            "-d",
            "de=input.dsn",
            "--deliver",
            "mp=20",
        ])
        .unwrap();
        assert_eq!(cli.deliver, vec!["de=input.dsn", "mp=20"]);
    }

    #[test]
    fn raw_conflicts_with_serve() {
        let err = Cli::try_parse_from(["routebridge", "--jar", "engine.jar", "--raw", "--serve"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn jar_is_required() {
        assert!(Cli::try_parse_from(["routebridge"]).is_err());
    }
}
