//! Command Line Interface
//!
//! Argument parsing for the `daqflow` binary: one positional command file
//! plus logging options.

use std::path::PathBuf;

use clap::Parser;

use crate::core::version;

/// Command-line arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "daqflow")]
#[command(about = "Process-local data acquisition runtime")]
#[command(version, long_version = version::long_version())]
pub struct Args {
    /// Command file to execute (.json or .jstream)
    #[arg(value_name = "COMMANDS")]
    pub commands: PathBuf,

    /// Log level
    #[arg(long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Force colored output (overrides TTY detection)
    #[arg(long = "color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", conflicts_with = "color")]
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_file_is_required() {
        assert!(Args::try_parse_from(["daqflow"]).is_err());
        let args = Args::try_parse_from(["daqflow", "run.json"]).unwrap();
        assert_eq!(args.commands, PathBuf::from("run.json"));
        assert!(args.log_level.is_none());
    }

    #[test]
    fn test_logging_flags_parse() {
        let args = Args::try_parse_from([
            "daqflow",
            "run.jstream",
            "--log-level",
            "debug",
            "--log-format",
            "json",
            "--no-color",
        ])
        .unwrap();
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.log_format.as_deref(), Some("json"));
        assert!(args.no_color);
    }

    #[test]
    fn test_color_flags_conflict() {
        assert!(Args::try_parse_from(["daqflow", "run.json", "--color", "--no-color"]).is_err());
    }
}
