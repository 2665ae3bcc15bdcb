//! Daemon orchestration -- assembly, wiring, and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `traefik-officer`.
//! It validates configuration, starts the Prometheus exporter, builds the
//! log pipeline, and runs until a shutdown signal arrives or the pipeline
//! fails.
//!
//! # Tasks
//!
//! 1. Prometheus HTTP listener (reads the recorder)
//! 2. Log pipeline worker (tail, parse, classify, aggregate, rotate)
//! 3. Pass-through writer (prints slow whitelisted lines to stdout)
//!
//! # Shutdown Order
//!
//! 1. Log pipeline (stop writing metrics, close the pass-through channel)
//! 2. Pass-through writer (drains what is left in the channel)
//! 3. Exporter and upkeep tasks

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use officer_core::config::OfficerConfig;
use officer_core::pipeline::{HealthStatus, MetricsSink, Pipeline};
use officer_log_pipeline::{LogPipeline, LogPipelineBuilder, PipelineConfig};

use crate::metrics_server::{self, MetricsExporter};

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: OfficerConfig,
    /// The access log pipeline.
    pipeline: LogPipeline,
    /// Pass-through lines from the pipeline, taken by the writer task.
    pass_through_rx: Option<mpsc::Receiver<String>>,
    /// Running Prometheus exporter.
    metrics: MetricsExporter,
    /// Stops the exporter and writer tasks.
    shutdown: CancellationToken,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Build from an already-loaded configuration.
    ///
    /// Starts the Prometheus exporter immediately so the scrape endpoint is
    /// up before the first line is read.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The metrics listener cannot be bound
    /// - The pipeline configuration is invalid
    pub async fn build_from_config(config: OfficerConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        let pipeline_config = PipelineConfig::from_core(&config)
            .map_err(|e| anyhow::anyhow!("invalid pipeline config: {}", e))?;

        let shutdown = CancellationToken::new();
        let metrics = metrics_server::spawn_metrics_exporter(&config.metrics, shutdown.clone())?;

        let sink: Arc<dyn MetricsSink> = metrics.sink.clone();
        let (pipeline, pass_through_rx) = LogPipelineBuilder::new()
            .config(pipeline_config)
            .metrics_sink(sink)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build log pipeline: {}", e))?;

        tracing::info!("orchestrator initialized");

        Ok(Self {
            config,
            pipeline,
            pass_through_rx,
            metrics,
            shutdown,
            start_time: Instant::now(),
        })
    }

    /// Start the pipeline and block until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if signal handlers cannot be installed, the pipeline
    /// fails to start, or the log source becomes unavailable.
    pub async fn run(&mut self) -> Result<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
        let mut sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

        self.run_until(async move {
            tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            }
        })
        .await
    }

    /// Start the pipeline and run until `shutdown` resolves or the pipeline
    /// worker exits on its own.
    pub async fn run_until(
        &mut self,
        shutdown: impl Future<Output = &'static str>,
    ) -> Result<()> {
        self.log_startup_banner();

        self.pipeline
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start log pipeline: {}", e))?;

        let writer = self
            .pass_through_rx
            .take()
            .map(|rx| spawn_pass_through_writer(rx, self.shutdown.clone()));

        tracing::info!("entering main event loop");
        let done = self.pipeline.done_token();
        tokio::select! {
            signal = shutdown => {
                tracing::info!(signal = signal, "shutdown signal received");
            }
            _ = done.cancelled() => {
                tracing::error!("log pipeline exited, shutting down");
            }
        }

        let result = self.pipeline.stop().await;

        // The pipeline dropped its sender, so the writer finishes once the
        // channel is drained.
        if let Some(writer) = writer {
            join_pass_through_writer(writer).await;
        }
        self.shutdown.cancel();

        tracing::info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            "traefik-officer stopped"
        );

        result.map_err(|e| anyhow::anyhow!("log pipeline failed: {}", e))
    }

    /// Log the effective configuration once at startup.
    fn log_startup_banner(&self) {
        let source = &self.config.log_source;
        let filter = &self.config.filter;
        let pipeline = self.pipeline.config();

        tracing::info!(
            log_file = %source.path,
            rules_file = filter.rules_file.as_deref().unwrap_or("<none>"),
            include_query_args = source.include_query_args,
            json_logs = source.json_logs,
            strict_whitelist = filter.strict_whitelist,
            pass_log_above_threshold_secs = filter.pass_log_above_threshold_secs,
            "traefik-officer configuration"
        );
        tracing::info!(
            enabled = self.config.rotation.enabled,
            writer_process = %self.config.rotation.writer_process,
            max_accesslog_size_mb = source.max_accesslog_size_mb,
            threshold_lines = pipeline.rotation_threshold_lines(),
            "log rotation"
        );
        tracing::info!(
            listen_addr = %self.metrics.listen_addr,
            endpoint = %self.config.metrics.endpoint,
            router_label = self.config.metrics.router_label,
            "metrics endpoint"
        );
    }

    /// Current pipeline health.
    pub async fn health(&self) -> HealthStatus {
        self.pipeline.health_check().await
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &OfficerConfig {
        &self.config
    }

    /// Render the current scrape payload.
    pub fn metrics_handle(&self) -> &PrometheusHandle {
        &self.metrics.handle
    }
}

/// Print pass-through lines to stdout until the channel closes.
fn spawn_pass_through_writer(
    mut rx: mpsc::Receiver<String>,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        loop {
            let line = tokio::select! {
                line = rx.recv() => line,
                _ = shutdown.cancelled() => None,
            };
            let Some(mut line) = line else {
                break;
            };
            line.push('\n');
            if let Err(e) = stdout.write_all(line.as_bytes()).await {
                tracing::warn!(error = %e, "failed to write pass-through line");
                continue;
            }
            if let Err(e) = stdout.flush().await {
                tracing::warn!(error = %e, "failed to flush stdout");
            }
        }
        tracing::debug!("pass-through writer stopped");
    })
}

/// Wait for the pass-through writer. Returns `false` if the task panicked
/// or was aborted.
async fn join_pass_through_writer(writer: tokio::task::JoinHandle<()>) -> bool {
    match writer.await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "pass-through writer task failed");
            false
        }
    }
}
