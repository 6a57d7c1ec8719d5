//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `ledger_transactions_total` - Total wallet transactions recorded
//! - `ledger_rejected_debits_total` - Debits rejected for insufficient funds
//! - `ledger_batch_size` - Histogram of applied batch sizes
//! - `ledger_apply_duration_seconds` - Histogram of batch apply latencies

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Total wallet transactions recorded
    pub transactions_total: IntCounter,

    /// Debits rejected for insufficient funds
    pub rejected_debits_total: IntCounter,

    /// Applied batch size histogram
    pub batch_size: Histogram,

    /// Batch apply duration histogram
    pub apply_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_total = IntCounter::with_opts(Opts::new(
            "ledger_transactions_total",
            "Total wallet transactions recorded",
        ))?;
        registry.register(Box::new(transactions_total.clone()))?;

        let rejected_debits_total = IntCounter::with_opts(Opts::new(
            "ledger_rejected_debits_total",
            "Debits rejected for insufficient funds",
        ))?;
        registry.register(Box::new(rejected_debits_total.clone()))?;

        let batch_size = Histogram::with_opts(
            HistogramOpts::new("ledger_batch_size", "Histogram of applied batch sizes")
                .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        )?;
        registry.register(Box::new(batch_size.clone()))?;

        let apply_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_apply_duration_seconds",
                "Histogram of batch apply latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500]),
        )?;
        registry.register(Box::new(apply_duration.clone()))?;

        Ok(Self {
            transactions_total,
            rejected_debits_total,
            batch_size,
            apply_duration,
            registry,
        })
    }

    /// Record a wallet transaction
    pub fn record_transaction(&self) {
        self.transactions_total.inc();
    }

    /// Record a rejected debit
    pub fn record_rejected_debit(&self) {
        self.rejected_debits_total.inc();
    }

    /// Record an applied batch
    pub fn record_batch(&self, batch_size: usize) {
        self.batch_size.observe(batch_size as f64);
    }

    /// Record batch apply duration
    pub fn record_apply_duration(&self, duration_seconds: f64) {
        self.apply_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.transactions_total.get(), 0);
        assert_eq!(metrics.rejected_debits_total.get(), 0);
    }

    #[test]
    fn test_record_transaction() {
        let metrics = Metrics::new().unwrap();
        metrics.record_transaction();
        metrics.record_transaction();
        assert_eq!(metrics.transactions_total.get(), 2);
    }

    #[test]
    fn test_record_rejected_debit() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejected_debit();
        assert_eq!(metrics.rejected_debits_total.get(), 1);
    }

    #[test]
    fn test_record_batch() {
        let metrics = Metrics::new().unwrap();
        metrics.record_batch(5);
        metrics.record_batch(12);
        // Histogram recorded successfully (no assertion on histogram internals)
    }
}
