//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Values left unset fall back to the
//! configuration file and then to built-in defaults.

use clap::Parser;
use std::path::PathBuf;

/// NodePulse - periodic CSV sampler for cluster nodes and nodeclaims
///
/// Every few seconds, counts nodes and nodeclaims by readiness, health,
/// taints, lifecycle conditions and deletion state, and appends one CSV
/// row per sample to stdout and optionally a file.
///
/// Examples:
///   nodepulse --source ./cluster-state
///   nodepulse --source ./cluster-state -o samples.csv
///   nodepulse --source ./cluster-state -o samples.csv -f --interval 10
///   nodepulse --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Output CSV file
    ///
    /// Rows are always mirrored to stdout unless --no-stdout is given.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Force overwrite if the output file exists
    #[arg(short, long)]
    pub force: bool,

    /// Directory holding nodes.json and nodeclaims.json list dumps
    #[arg(short, long, value_name = "DIR", env = "NODEPULSE_SOURCE")]
    pub source: Option<PathBuf>,

    /// Seconds to wait between samples (default: 5)
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Worker threads used to classify each collection (default: 16, max: 256)
    #[arg(long, value_name = "NUM")]
    pub workers: Option<usize>,

    /// Immediate retries allowed per second while the source is failing (default: 20)
    #[arg(long, value_name = "NUM")]
    pub max_retries_per_second: Option<u32>,

    /// Do not mirror rows to stdout
    #[arg(long)]
    pub no_stdout: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .nodepulse.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .nodepulse.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.interval == Some(0) {
            return Err("Interval must be at least 1 second".to_string());
        }

        if self.workers == Some(0) {
            return Err("Workers must be at least 1".to_string());
        }

        if self.max_retries_per_second == Some(0) {
            return Err("Max retries per second must be at least 1".to_string());
        }

        if let Some(ref source) = self.source {
            if !source.exists() {
                return Err(format!(
                    "Source directory does not exist: {}",
                    source.display()
                ));
            }
            if !source.is_dir() {
                return Err(format!(
                    "Source path is not a directory: {}",
                    source.display()
                ));
            }
        }

        if self.no_stdout && self.output.is_none() {
            return Err("--no-stdout requires --output".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_args() -> Args {
        Args {
            output: None,
            force: false,
            source: None,
            interval: None,
            workers: None,
            max_retries_per_second: None,
            no_stdout: false,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_short_flags() {
        let args = Args::parse_from(["nodepulse", "-o", "out.csv", "-f"]);
        assert_eq!(args.output, Some(PathBuf::from("out.csv")));
        assert!(args.force);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_interval() {
        let mut args = make_args();
        args.interval = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_source_directory() {
        let mut args = make_args();
        args.source = Some(PathBuf::from("/definitely/not/here"));
        assert!(args.validate().is_err());

        let dir = TempDir::new().unwrap();
        args.source = Some(dir.path().to_path_buf());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_no_stdout_requires_output() {
        let mut args = make_args();
        args.no_stdout = true;
        assert!(args.validate().is_err());

        args.output = Some(PathBuf::from("out.csv"));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
