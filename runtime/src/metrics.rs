//! Prometheus metrics for the store, the request orchestrator and retries.
//!
//! Metrics are recorded through the `metrics` facade everywhere; nothing is
//! exported until a recorder is installed. The demo binary installs the
//! Prometheus exporter when a listen address is configured.
//!
//! # Example
//!
//! ```rust,no_run
//! use dashboard_state_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
}

/// Prometheus metrics server.
///
/// Serves the scrape endpoint on `addr` once started.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server bound to `addr` once started.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Register metric descriptions, install the Prometheus recorder and
    /// spawn the HTTP scrape endpoint.
    ///
    /// Must be called from within a tokio runtime. Installing twice in one
    /// process is tolerated with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Build`] if the exporter cannot be built.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let (recorder, exporter) = PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .build()
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
            return Ok(());
        }

        tokio::spawn(async move {
            if exporter.await.is_err() {
                // `ExporterError` implements neither `Debug` nor `Display`.
                tracing::error!("Metrics exporter stopped");
            }
        });

        self.handle = Some(handle);
        tracing::info!(addr = %self.addr, "Metrics available at http://{}/metrics", self.addr);
        Ok(())
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the server hasn't been started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
pub fn register_metrics() {
    // Store
    describe_counter!("store_actions_total", "Total number of actions sent to the store");
    describe_counter!(
        "store_actions_rejected_total",
        "Actions rejected because the store is shutting down"
    );
    describe_histogram!("store_reducer_duration_seconds", "Time taken to run the root reducer");
    describe_counter!("store_effects_executed_total", "Effects executed, labelled by type");
    describe_gauge!("store_effects_pending", "Effects currently running");

    // Orchestrator
    describe_counter!(
        "transport_invocations_total",
        "Transport invocations, labelled by kind and operation"
    );
    describe_counter!(
        "transport_failures_total",
        "Failed transport invocations, labelled by kind and operation"
    );
    describe_histogram!("transport_duration_seconds", "Time taken by a transport invocation");
    describe_counter!(
        "orchestrator_dedup_hits_total",
        "Intents suppressed because an identical request was in flight"
    );

    // Retries
    describe_counter!("retry_attempts_total", "Total number of retry attempts");
    describe_counter!("retry_successes_total", "Operations that succeeded after retrying");
    describe_counter!("retry_exhausted_total", "Operations that failed after max retries");
}

/// Orchestrator metrics recorder.
pub struct TransportMetrics;

impl TransportMetrics {
    /// Record a completed transport invocation.
    pub fn record_invocation(kind: &'static str, operation: &'static str, duration: Duration, ok: bool) {
        counter!("transport_invocations_total", "kind" => kind, "operation" => operation).increment(1);
        histogram!("transport_duration_seconds", "kind" => kind).record(duration.as_secs_f64());
        if !ok {
            counter!("transport_failures_total", "kind" => kind, "operation" => operation).increment(1);
        }
    }

    /// Record an intent absorbed by an in-flight identical request.
    pub fn record_dedup_hit(kind: &'static str, operation: &'static str) {
        counter!("orchestrator_dedup_hits_total", "kind" => kind, "operation" => operation)
            .increment(1);
    }
}

/// Store metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record one action passing through the root reducer.
    pub fn record_action(duration: Duration) {
        counter!("store_actions_total").increment(1);
        histogram!("store_reducer_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record an action rejected during shutdown.
    pub fn record_rejected() {
        counter!("store_actions_rejected_total").increment(1);
    }

    /// Record an executed effect.
    pub fn record_effect(kind: &'static str) {
        counter!("store_effects_executed_total", "type" => kind).increment(1);
    }

    /// Record the number of effects currently running.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_pending(pending: usize) {
        gauge!("store_effects_pending").set(pending as f64);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_metrics_server_creation() {
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = MetricsServer::new(addr);
        assert!(server.handle().is_none());
        assert!(server.render().is_none());
    }

    #[test]
    fn test_recorders_are_noops_without_exporter() {
        // No recorder installed in this test: recording must not fail.
        register_metrics();
        TransportMetrics::record_invocation("project", "list", Duration::from_millis(3), true);
        TransportMetrics::record_dedup_hit("project", "list");
        StoreMetrics::record_action(Duration::from_micros(40));
        StoreMetrics::record_effect("future");
        StoreMetrics::record_pending(0);
    }
}
