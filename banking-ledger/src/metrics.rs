//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `ledger_operations_total{operation}` - Successful operations
//! - `ledger_operation_failures_total{operation,reason}` - Rejected operations
//! - `ledger_cashbacks_applied_total` - Matured cashbacks credited
//! - `ledger_cashback_credited_units_total` - Currency units credited as cashback
//! - `ledger_pending_cashbacks` - Cashbacks waiting for maturity
//! - `ledger_active_accounts` - Accounts not absorbed by a merge

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Successful operations by kind
    pub operations_total: IntCounterVec,

    /// Failed operations by kind and reason
    pub failures_total: IntCounterVec,

    /// Matured cashbacks credited
    pub cashbacks_applied: IntCounter,

    /// Units credited through cashback
    pub cashback_units: IntCounter,

    /// Pending cashbacks
    pub pending_cashbacks: IntGauge,

    /// Active accounts
    pub active_accounts: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector on a private registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let operations_total = IntCounterVec::new(
            Opts::new("ledger_operations_total", "Successful ledger operations"),
            &["operation"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let failures_total = IntCounterVec::new(
            Opts::new(
                "ledger_operation_failures_total",
                "Rejected ledger operations",
            ),
            &["operation", "reason"],
        )?;
        registry.register(Box::new(failures_total.clone()))?;

        let cashbacks_applied = IntCounter::new(
            "ledger_cashbacks_applied_total",
            "Matured cashbacks credited",
        )?;
        registry.register(Box::new(cashbacks_applied.clone()))?;

        let cashback_units = IntCounter::new(
            "ledger_cashback_credited_units_total",
            "Currency units credited as cashback",
        )?;
        registry.register(Box::new(cashback_units.clone()))?;

        let pending_cashbacks = IntGauge::new(
            "ledger_pending_cashbacks",
            "Cashbacks waiting for maturity",
        )?;
        registry.register(Box::new(pending_cashbacks.clone()))?;

        let active_accounts = IntGauge::new(
            "ledger_active_accounts",
            "Accounts not absorbed by a merge",
        )?;
        registry.register(Box::new(active_accounts.clone()))?;

        Ok(Self {
            operations_total,
            failures_total,
            cashbacks_applied,
            cashback_units,
            pending_cashbacks,
            active_accounts,
            registry,
        })
    }

    /// Record the outcome of an operation
    pub fn record_outcome<T>(&self, operation: &str, outcome: &crate::Result<T>) {
        match outcome {
            Ok(_) => self.operations_total.with_label_values(&[operation]).inc(),
            Err(err) => self
                .failures_total
                .with_label_values(&[operation, err.kind()])
                .inc(),
        }
    }

    /// Record a credited cashback
    pub fn record_cashback(&self, amount: i64) {
        self.cashbacks_applied.inc();
        self.cashback_units.inc_by(u64::try_from(amount).unwrap_or(0));
    }

    /// Update state gauges
    pub fn update_gauges(&self, pending: usize, active_accounts: usize) {
        self.pending_cashbacks.set(pending as i64);
        self.active_accounts.set(active_accounts as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("cashbacks_applied", &self.cashbacks_applied.get())
            .field("pending_cashbacks", &self.pending_cashbacks.get())
            .field("active_accounts", &self.active_accounts.get())
            .finish_non_exhaustive()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        // Names are static and unique, and the registry is private, so
        // registration cannot collide
        Self::new().expect("Failed to create metrics")
    }
}
