//! Prometheus metrics HTTP server.
//!
//! Uses the built-in HTTP listener from `metrics-exporter-prometheus`
//! to expose the Prometheus scrape endpoint.
//!
//! The recorder is never installed globally. It is wrapped in a
//! [`RecorderSink`] and handed to the log pipeline, so nothing else in the
//! process can write to the scraped registry.
//!
//! # Usage
//!
//! ```ignore
//! let exporter = spawn_metrics_exporter(&config.metrics, shutdown.clone())?;
//! let sink: Arc<dyn MetricsSink> = exporter.sink.clone();
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio_util::sync::CancellationToken;

use officer_core::config::MetricsConfig;
use officer_core::metrics::{LATENCY, LATENCY_BUCKETS_MS, RecorderSink};

/// How often histogram and summary buffers are drained into the registry.
const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// A running Prometheus exporter.
pub struct MetricsExporter {
    /// Write side, injected into the pipeline.
    pub sink: Arc<RecorderSink>,
    /// Read side, renders the scrape payload.
    pub handle: PrometheusHandle,
    /// Address the HTTP listener is bound to.
    pub listen_addr: SocketAddr,
}

/// Parse and check the scrape address from config.
pub fn listen_addr(config: &MetricsConfig) -> Result<SocketAddr> {
    if config.endpoint != "/metrics" {
        return Err(anyhow::anyhow!(
            "unsupported metrics endpoint '{}': only '/metrics' is currently supported",
            config.endpoint
        ));
    }

    format!("{}:{}", config.listen_addr, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics listen address: {}", e))
}

/// Build the Prometheus recorder and start the HTTP listener.
///
/// Must be called from within a Tokio runtime. The listener and the upkeep
/// task run until `shutdown` is cancelled.
///
/// # Errors
///
/// - Unsupported endpoint path or unparsable address
/// - Socket binding fails
pub fn spawn_metrics_exporter(
    config: &MetricsConfig,
    shutdown: CancellationToken,
) -> Result<MetricsExporter> {
    let addr = listen_addr(config)?;

    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics endpoint is exposed on all interfaces; restrict listen_addr in untrusted networks"
        );
    }

    tracing::info!(listen_addr = %addr, "starting Prometheus exporter");

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(Matcher::Full(LATENCY.to_owned()), &LATENCY_BUCKETS_MS)
        .map_err(|e| anyhow::anyhow!("invalid latency buckets: {}", e))?
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build metrics exporter: {}", e))?;

    let handle = recorder.handle();

    let listener_shutdown = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = exporter => {
                if let Err(e) = result {
                    tracing::error!(error = ?e, "metrics HTTP listener failed");
                }
            }
            _ = listener_shutdown.cancelled() => {
                tracing::debug!("metrics HTTP listener stopped");
            }
        }
    });

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPKEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => upkeep_handle.run_upkeep(),
                _ = shutdown.cancelled() => break,
            }
        }
    });

    let sink = Arc::new(RecorderSink::new(Arc::new(recorder)));

    tracing::info!(
        listen_addr = %addr,
        endpoint = %config.endpoint,
        "Prometheus metrics endpoint active"
    );

    Ok(MetricsExporter {
        sink,
        handle,
        listen_addr: addr,
    })
}
