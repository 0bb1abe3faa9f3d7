// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Orders created (by payment method)
// - Status transitions (by source and target status)
// - Manual payment confirmations (by payment method)
// - Failed operations (by operation and error kind)
// - Operation latency
//
// All metrics are registered with one registry and scraped via /metrics.
//
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounterVec,
    pub status_transitions: IntCounterVec,
    pub payments_confirmed: IntCounterVec,
    pub operation_failures: IntCounterVec,
    pub operation_duration: HistogramVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounterVec::new(
            Opts::new("orders_created_total", "Orders successfully created"),
            &["payment_method"],
        )?;
        registry.register(Box::new(orders_created.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("order_status_transitions_total", "Order status transitions applied"),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let payments_confirmed = IntCounterVec::new(
            Opts::new("payments_confirmed_total", "Manual payment confirmations"),
            &["payment_method"],
        )?;
        registry.register(Box::new(payments_confirmed.clone()))?;

        let operation_failures = IntCounterVec::new(
            Opts::new("order_operation_failures_total", "Failed order operations"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(operation_failures.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new("order_operation_duration_seconds", "Order operation latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            status_transitions,
            payments_confirmed,
            operation_failures,
            operation_duration,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self, payment_method: &str) {
        self.orders_created.with_label_values(&[payment_method]).inc();
    }

    pub fn record_status_transition(&self, from: &str, to: &str) {
        self.status_transitions.with_label_values(&[from, to]).inc();
    }

    pub fn record_payment_confirmed(&self, payment_method: &str) {
        self.payments_confirmed.with_label_values(&[payment_method]).inc();
    }

    pub fn record_failure(&self, operation: &str, kind: &str) {
        self.operation_failures.with_label_values(&[operation, kind]).inc();
    }

    pub fn observe_operation(&self, operation: &str, duration_secs: f64) {
        self.operation_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
