//! Configuration file handling.
//!
//! This module handles loading `.nodepulse.toml` files and merging them
//! with command-line arguments.

use crate::analysis::Parallelism;
use crate::sampler::SamplerConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = ".nodepulse.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Sampling loop settings.
    #[serde(default)]
    pub sampler: SamplerSettings,

    /// Aggregation settings.
    #[serde(default)]
    pub aggregator: AggregatorSettings,

    /// Output settings.
    #[serde(default)]
    pub output: OutputSettings,

    /// Resource source settings.
    #[serde(default)]
    pub source: SourceSettings,
}

/// Sampling loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerSettings {
    /// Seconds between the end of one row and the next fetch.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,

    /// Immediate retries of failed fetches allowed per second.
    #[serde(default = "default_max_retries")]
    pub max_retries_per_second: u32,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            max_retries_per_second: default_max_retries(),
        }
    }
}

fn default_interval() -> u64 {
    crate::sampler::DEFAULT_INTERVAL.as_secs()
}

fn default_max_retries() -> u32 {
    crate::sampler::DEFAULT_MAX_RETRIES_PER_SECOND
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorSettings {
    /// Worker threads per collection (capped at 256).
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    crate::analysis::aggregator::DEFAULT_WORKERS
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// CSV file to write. Stdout only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Replace an existing output file.
    #[serde(default)]
    pub force: bool,

    /// Mirror rows to stdout.
    #[serde(default = "default_true")]
    pub stdout: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: None,
            force: false,
            stdout: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Where resource lists are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Directory holding `nodes.json` and `nodeclaims.json`.
    #[serde(default = "default_source_dir")]
    pub dir: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            dir: default_source_dir(),
        }
    }
}

fn default_source_dir() -> String {
    "cluster-state".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings when given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(interval) = args.interval {
            self.sampler.interval_seconds = interval;
        }
        if let Some(max_retries) = args.max_retries_per_second {
            self.sampler.max_retries_per_second = max_retries;
        }
        if let Some(workers) = args.workers {
            self.aggregator.workers = workers;
        }

        if let Some(ref output) = args.output {
            self.output.path = Some(output.display().to_string());
        }
        if args.force {
            self.output.force = true;
        }
        if args.no_stdout {
            self.output.stdout = false;
        }

        if let Some(ref source) = args.source {
            self.source.dir = source.display().to_string();
        }
    }

    /// Reject settings the sampler cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sampler.interval_seconds == 0 {
            bail!("sampler.interval_seconds must be at least 1");
        }
        if self.sampler.max_retries_per_second == 0 {
            bail!("sampler.max_retries_per_second must be at least 1");
        }
        if self.aggregator.workers == 0 {
            bail!("aggregator.workers must be at least 1");
        }
        Ok(())
    }

    /// Settings for the sampling loop.
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            interval: Duration::from_secs(self.sampler.interval_seconds),
            parallelism: Parallelism::new(self.aggregator.workers),
            max_retries_per_second: self.sampler.max_retries_per_second,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
