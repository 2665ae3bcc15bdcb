//! CLI argument definitions for traefik-officer.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.
//! Flags keep the names operators already use in Traefik sidecar manifests
//! (`--log-file`, `--config-file`, `--json-logs`, ...).

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use officer_core::config::OfficerConfig;

/// Shown under `--help`. Older deployments pass Go-style single-dash flags.
const SINGLE_DASH_NOTE: &str = "Flags use the double-dash form (--log-file, --json-logs, ...). \
Single-dash spellings such as -log-file are rejected; update existing manifests when migrating.";

/// Traefik access log latency exporter.
///
/// Tails a Traefik access log, turns each request into per-endpoint latency
/// metrics and serves them on a Prometheus scrape endpoint.
#[derive(Parser, Debug, Default)]
#[command(name = "traefik-officer")]
#[command(version, about, long_about = None)]
#[command(after_help = SINGLE_DASH_NOTE)]
pub struct DaemonCli {
    /// Path to an officer.toml settings file.
    ///
    /// Without it the daemon starts from built-in defaults.
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Access log file to tail.
    #[arg(long)]
    pub log_file: Option<String>,

    /// Keep query arguments in the RequestPath label.
    #[arg(long)]
    pub include_query_args: bool,

    /// Filter rules file (JSON, or YAML for .yml/.yaml).
    #[arg(long)]
    pub config_file: Option<String>,

    /// Port of the Prometheus scrape endpoint.
    #[arg(long)]
    pub listen_port: Option<u16>,

    /// Rotate the access log after roughly this many megabytes.
    #[arg(long)]
    pub max_accesslog_size: Option<u64>,

    /// Only record paths listed in WhitelistPaths.
    #[arg(long)]
    pub strict_whitelist: bool,

    /// Parse the access log as JSON lines.
    #[arg(long)]
    pub json_logs: bool,

    /// Echo whitelisted requests slower than this many seconds to stdout.
    #[arg(long)]
    pub pass_log_above_threshold: Option<f64>,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the settings file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the settings file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of an already loaded config.
    ///
    /// Boolean flags can only switch a feature on; they never turn off
    /// something the settings file enabled.
    pub fn apply_overrides(&self, config: &mut OfficerConfig) {
        if let Some(path) = &self.log_file {
            config.log_source.path = path.clone();
        }
        if self.include_query_args {
            config.log_source.include_query_args = true;
        }
        if let Some(path) = &self.config_file {
            config.filter.rules_file = Some(path.clone());
        }
        if let Some(port) = self.listen_port {
            config.metrics.port = port;
        }
        if let Some(size) = self.max_accesslog_size {
            config.log_source.max_accesslog_size_mb = size;
        }
        if self.strict_whitelist {
            config.filter.strict_whitelist = true;
        }
        if self.json_logs {
            config.log_source.json_logs = true;
        }
        if let Some(secs) = self.pass_log_above_threshold {
            config.filter.pass_log_above_threshold_secs = secs;
        }
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if self.debug {
            config.general.log_level = "debug".to_owned();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
    }

    /// Build the effective configuration.
    ///
    /// Layers, lowest to highest priority: defaults, settings file,
    /// `OFFICER_*` environment variables, command-line flags.
    pub async fn load_config(&self) -> Result<OfficerConfig> {
        let mut config = match &self.settings {
            Some(path) => OfficerConfig::from_file(path).await.map_err(|e| {
                anyhow::anyhow!("failed to load settings from {}: {}", path.display(), e)
            })?,
            None => OfficerConfig::default(),
        };

        config.apply_env_overrides();
        self.apply_overrides(&mut config);

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
        Ok(config)
    }
}
