//! Main escrow orchestration layer
//!
//! This module ties together storage, host interfaces, and the actor
//! into a high-level API for deals, escrow payments, and trust profiles.
//!
//! # Example
//!
//! ```no_run
//! use escrow_core::{AccountId, BlockCounter, Config, Escrow, InMemoryBank};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> escrow_core::Result<()> {
//!     let bank = Arc::new(InMemoryBank::new());
//!     let heights = Arc::new(BlockCounter::new(1));
//!     let escrow = Escrow::open(Config::default(), bank, heights).await?;
//!
//!     let deal_id = escrow
//!         .initiate_deal(AccountId::new("alice"), AccountId::new("bob"), 1000)
//!         .await?;
//!     let _deal = escrow.deal_info(deal_id).await?;
//!
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_escrow_actor, EscrowHandle},
    host::{HeightSource, ValueTransfer},
    metrics::Metrics,
    types::{AccountId, Deal, DealId, Payment, PaymentId, TrustProfile},
    Config, Result, Storage,
};
use std::sync::Arc;

/// Main escrow ledger interface
///
/// All three mutating operations and all three queries go through the
/// single-writer actor, so each call observes and produces a consistent
/// snapshot: either every write of an operation is visible or none is.
pub struct Escrow {
    /// Actor handle for all operations
    handle: EscrowHandle,

    /// Operation counters
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Escrow {
    /// Open escrow ledger with configuration and host interfaces
    pub async fn open(
        config: Config,
        bank: Arc<dyn ValueTransfer>,
        heights: Arc<dyn HeightSource>,
    ) -> Result<Self> {
        config.validate()?;

        let storage = Arc::new(Storage::open(&config)?);
        let metrics = Metrics::new()
            .map_err(|e| crate::Error::Config(format!("Failed to create metrics: {}", e)))?;

        let handle = spawn_escrow_actor(
            storage,
            bank,
            heights,
            config.admin.clone(),
            config.min_deal_value,
            metrics.clone(),
            config.mailbox_capacity,
        );

        Ok(Self {
            handle,
            metrics,
            config,
        })
    }

    /// Open a deal between the caller and a counterparty
    ///
    /// Creates the deal and its paired escrow payment in one atomic step
    /// and returns the fresh deal identifier. No value moves yet; custody
    /// is only asserted. Fails with `SelfDeal`, `InvalidUser`,
    /// `ZeroAmount`, or `LowValue` before anything is written.
    pub async fn initiate_deal(
        &self,
        caller: AccountId,
        counterparty: AccountId,
        value: u64,
    ) -> Result<DealId> {
        self.handle.initiate_deal(caller, counterparty, value).await
    }

    /// Settle an escrow payment
    ///
    /// Only the payer may complete, exactly once: a repeat call fails with
    /// `AlreadyComplete` and never transfers twice. The host transfer runs
    /// before any ledger write, so a refused transfer mutates nothing.
    pub async fn complete_payment(&self, caller: AccountId, payment_id: PaymentId) -> Result<()> {
        self.handle.complete_payment(caller, payment_id).await
    }

    /// Rate the initiator of a completed deal
    ///
    /// Only the deal's counterparty may rate, exactly once, with a
    /// positive rating, and only after the paired payment has settled.
    /// Folds the rating into the initiator's trust profile.
    pub async fn rate_counterparty(
        &self,
        caller: AccountId,
        deal_id: DealId,
        rating: u32,
    ) -> Result<()> {
        self.handle.rate_counterparty(caller, deal_id, rating).await
    }

    /// Get deal by ID
    pub async fn deal_info(&self, deal_id: DealId) -> Result<Option<Deal>> {
        self.handle.get_deal(deal_id).await
    }

    /// Get payment by ID
    pub async fn payment_info(&self, payment_id: PaymentId) -> Result<Option<Payment>> {
        self.handle.get_payment(payment_id).await
    }

    /// Get trust profile for an account
    ///
    /// Never errors for unknown accounts: an address that has never been
    /// rated reads as the zero profile.
    pub async fn trust_profile(&self, account: AccountId) -> Result<TrustProfile> {
        self.handle.get_profile(account).await
    }

    /// Operation metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration this ledger was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown escrow ledger
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}
