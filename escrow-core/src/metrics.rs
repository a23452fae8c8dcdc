//! Metrics collection for observability
//!
//! This module provides Prometheus counters for monitoring the escrow
//! ledger.
//!
//! # Metrics
//!
//! - `escrow_deals_opened_total` - Deals successfully opened
//! - `escrow_payments_completed_total` - Payments successfully settled
//! - `escrow_ratings_total` - Ratings successfully recorded
//! - `escrow_rejections_total` - Mutating calls rejected by a guard

use prometheus::{IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Deals successfully opened
    pub deals_opened: IntCounter,

    /// Payments successfully settled
    pub payments_completed: IntCounter,

    /// Ratings successfully recorded
    pub ratings_recorded: IntCounter,

    /// Mutating calls rejected by a guard
    pub rejections: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with a private registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let deals_opened =
            IntCounter::new("escrow_deals_opened_total", "Deals successfully opened")?;
        registry.register(Box::new(deals_opened.clone()))?;

        let payments_completed = IntCounter::new(
            "escrow_payments_completed_total",
            "Payments successfully settled",
        )?;
        registry.register(Box::new(payments_completed.clone()))?;

        let ratings_recorded =
            IntCounter::new("escrow_ratings_total", "Ratings successfully recorded")?;
        registry.register(Box::new(ratings_recorded.clone()))?;

        let rejections = IntCounter::new(
            "escrow_rejections_total",
            "Mutating calls rejected by a guard",
        )?;
        registry.register(Box::new(rejections.clone()))?;

        Ok(Self {
            deals_opened,
            payments_completed,
            ratings_recorded,
            rejections,
            registry,
        })
    }

    /// Record the outcome of a mutating operation
    ///
    /// On success increments the counter selected by `counter`; on guard
    /// rejection increments the shared rejection counter. Infrastructure
    /// failures count toward neither.
    pub fn record_mutation<T>(
        &self,
        result: &crate::Result<T>,
        counter: impl FnOnce(&Self) -> &IntCounter,
    ) {
        match result {
            Ok(_) => counter(self).inc(),
            Err(e) if e.is_rejection() => self.rejections.inc(),
            Err(_) => {}
        }
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
