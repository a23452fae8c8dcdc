//! Actor-based concurrency for the escrow ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! one task owns all storage access, so every operation's guard checks
//! and writes execute as one serialized step. That is the mutual
//! exclusion a host chain would otherwise provide: no identifier is
//! allocated twice, no payment settles twice, no rating double-counts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               EscrowHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              EscrowActor (Single Task)                │
//! │   guards → host transfer → atomic WriteBatch          │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::{
    host::{HeightSource, ValueTransfer},
    metrics::Metrics,
    types::{AccountId, Deal, DealId, DealState, Payment, PaymentId, TrustProfile},
    Error, Result, Storage,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the escrow actor
pub enum EscrowMessage {
    /// Open a new deal with a paired escrow payment
    InitiateDeal {
        /// Deal creator (the paying side)
        caller: AccountId,
        /// Other party
        counterparty: AccountId,
        /// Deal value
        value: u64,
        /// Response channel
        response: oneshot::Sender<Result<DealId>>,
    },

    /// Settle an escrow payment
    CompletePayment {
        /// Must be the payer
        caller: AccountId,
        /// Payment to settle
        payment_id: PaymentId,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Rate the initiator of a completed deal
    RateCounterparty {
        /// Must be the deal's counterparty
        caller: AccountId,
        /// Deal being rated
        deal_id: DealId,
        /// Rating value (positive)
        rating: u32,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Get deal by ID
    GetDeal {
        /// Deal ID
        deal_id: DealId,
        /// Response channel
        response: oneshot::Sender<Result<Option<Deal>>>,
    },

    /// Get payment by ID
    GetPayment {
        /// Payment ID
        payment_id: PaymentId,
        /// Response channel
        response: oneshot::Sender<Result<Option<Payment>>>,
    },

    /// Get trust profile (zero profile if never rated)
    GetProfile {
        /// Account to look up
        account: AccountId,
        /// Response channel
        response: oneshot::Sender<Result<TrustProfile>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes escrow messages
pub struct EscrowActor {
    /// Storage backend
    storage: Arc<Storage>,

    /// Host value-transfer primitive
    bank: Arc<dyn ValueTransfer>,

    /// Host block-height source
    heights: Arc<dyn HeightSource>,

    /// Admin identity (never a valid counterparty)
    admin: AccountId,

    /// Minimum accepted deal value
    min_deal_value: u64,

    /// Operation counters
    metrics: Metrics,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<EscrowMessage>,
}

impl EscrowActor {
    /// Create new actor
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        storage: Arc<Storage>,
        bank: Arc<dyn ValueTransfer>,
        heights: Arc<dyn HeightSource>,
        admin: AccountId,
        min_deal_value: u64,
        metrics: Metrics,
        mailbox: mpsc::Receiver<EscrowMessage>,
    ) -> Self {
        Self {
            storage,
            bank,
            heights,
            admin,
            min_deal_value,
            metrics,
            mailbox,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                EscrowMessage::Shutdown => break,
                _ => self.handle_message(msg),
            }
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: EscrowMessage) {
        match msg {
            EscrowMessage::InitiateDeal {
                caller,
                counterparty,
                value,
                response,
            } => {
                let result = self.initiate_deal(caller, counterparty, value);
                self.metrics.record_mutation(&result, |m| &m.deals_opened);
                let _ = response.send(result);
            }

            EscrowMessage::CompletePayment {
                caller,
                payment_id,
                response,
            } => {
                let result = self.complete_payment(caller, payment_id);
                self.metrics
                    .record_mutation(&result, |m| &m.payments_completed);
                let _ = response.send(result);
            }

            EscrowMessage::RateCounterparty {
                caller,
                deal_id,
                rating,
                response,
            } => {
                let result = self.rate_counterparty(caller, deal_id, rating);
                self.metrics
                    .record_mutation(&result, |m| &m.ratings_recorded);
                let _ = response.send(result);
            }

            EscrowMessage::GetDeal { deal_id, response } => {
                let _ = response.send(self.storage.get_deal(deal_id));
            }

            EscrowMessage::GetPayment {
                payment_id,
                response,
            } => {
                let _ = response.send(self.storage.get_payment(payment_id));
            }

            EscrowMessage::GetProfile { account, response } => {
                let _ = response.send(self.storage.get_profile(&account));
            }

            EscrowMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    /// Open a deal and its paired escrow payment
    ///
    /// Guard order: SelfDeal, InvalidUser, ZeroAmount, LowValue. The
    /// identifiers are read only after every guard has passed, so a
    /// rejected request never burns an id.
    fn initiate_deal(
        &self,
        caller: AccountId,
        counterparty: AccountId,
        value: u64,
    ) -> Result<DealId> {
        if counterparty == caller {
            return Err(Error::SelfDeal);
        }
        if counterparty == self.admin {
            return Err(Error::InvalidUser(counterparty.to_string()));
        }
        if value == 0 {
            return Err(Error::ZeroAmount);
        }
        if value < self.min_deal_value {
            return Err(Error::LowValue {
                value,
                minimum: self.min_deal_value,
            });
        }

        let deal_id = self.storage.deal_counter()?;
        let payment_id = self.storage.payment_counter()?;
        let height = self.heights.current_height();

        let deal = Deal {
            deal_id,
            payment_id,
            initiator: caller.clone(),
            counterparty: counterparty.clone(),
            value,
            state: DealState::Open,
            timestamp: height,
            trust_score: None,
        };

        let payment = Payment {
            payment_id,
            deal_id,
            from: caller,
            to: counterparty,
            amount: value,
            is_complete: false,
            created_at: height,
        };

        self.storage.commit_deal_open(&deal, &payment)?;

        tracing::info!(deal_id, payment_id, value, height, "Deal initiated");

        Ok(deal_id)
    }

    /// Settle an escrow payment through the host transfer primitive
    ///
    /// Guard order: NoPayment, NoAuth, AlreadyComplete. The transfer runs
    /// before any write, so a refused transfer leaves the ledger untouched.
    fn complete_payment(&self, caller: AccountId, payment_id: PaymentId) -> Result<()> {
        let mut payment = self
            .storage
            .get_payment(payment_id)?
            .ok_or(Error::NoPayment(payment_id))?;

        if caller != payment.from {
            return Err(Error::NoAuth(payment_id));
        }
        if payment.is_complete {
            return Err(Error::AlreadyComplete(payment_id));
        }

        let mut deal = self.storage.get_deal(payment.deal_id)?.ok_or_else(|| {
            Error::InvariantViolation(format!(
                "Payment {} references missing deal {}",
                payment_id, payment.deal_id
            ))
        })?;

        self.bank.transfer(&payment.from, &payment.to, payment.amount)?;

        payment.is_complete = true;
        deal.state = DealState::Complete;
        self.storage.commit_payment_complete(&payment, &deal)?;

        tracing::info!(
            payment_id,
            deal_id = payment.deal_id,
            amount = payment.amount,
            "Payment completed"
        );

        Ok(())
    }

    /// Record the counterparty's rating of the initiator
    ///
    /// Guard order: InvalidDealId, DealNotExist, NotAuthorized, BadRating,
    /// AlreadyRated, DealNotComplete.
    fn rate_counterparty(&self, caller: AccountId, deal_id: DealId, rating: u32) -> Result<()> {
        if deal_id == 0 || deal_id >= self.storage.deal_counter()? {
            return Err(Error::InvalidDealId(deal_id));
        }

        let mut deal = self
            .storage
            .get_deal(deal_id)?
            .ok_or(Error::DealNotExist(deal_id))?;

        if caller != deal.counterparty {
            return Err(Error::NotAuthorized(deal_id));
        }
        if rating == 0 {
            return Err(Error::BadRating);
        }
        if deal.trust_score.is_some() {
            return Err(Error::AlreadyRated(deal_id));
        }
        if deal.state != DealState::Complete {
            return Err(Error::DealNotComplete(deal_id));
        }

        let mut profile = self.storage.get_profile(&deal.initiator)?;
        profile.apply_rating(rating);
        deal.trust_score = Some(rating);

        let rated = deal.initiator.clone();
        self.storage.commit_rating(&deal, &rated, &profile)?;

        tracing::info!(deal_id, rated = %rated, rating, "Counterparty rated");

        Ok(())
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct EscrowHandle {
    sender: mpsc::Sender<EscrowMessage>,
}

impl EscrowHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<EscrowMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> EscrowMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Open a new deal
    pub async fn initiate_deal(
        &self,
        caller: AccountId,
        counterparty: AccountId,
        value: u64,
    ) -> Result<DealId> {
        self.request(|response| EscrowMessage::InitiateDeal {
            caller,
            counterparty,
            value,
            response,
        })
        .await
    }

    /// Settle an escrow payment
    pub async fn complete_payment(&self, caller: AccountId, payment_id: PaymentId) -> Result<()> {
        self.request(|response| EscrowMessage::CompletePayment {
            caller,
            payment_id,
            response,
        })
        .await
    }

    /// Rate the initiator of a completed deal
    pub async fn rate_counterparty(
        &self,
        caller: AccountId,
        deal_id: DealId,
        rating: u32,
    ) -> Result<()> {
        self.request(|response| EscrowMessage::RateCounterparty {
            caller,
            deal_id,
            rating,
            response,
        })
        .await
    }

    /// Get deal by ID
    pub async fn get_deal(&self, deal_id: DealId) -> Result<Option<Deal>> {
        self.request(|response| EscrowMessage::GetDeal { deal_id, response })
            .await
    }

    /// Get payment by ID
    pub async fn get_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>> {
        self.request(|response| EscrowMessage::GetPayment {
            payment_id,
            response,
        })
        .await
    }

    /// Get trust profile
    pub async fn get_profile(&self, account: AccountId) -> Result<TrustProfile> {
        self.request(|response| EscrowMessage::GetProfile { account, response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(EscrowMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the escrow actor
pub fn spawn_escrow_actor(
    storage: Arc<Storage>,
    bank: Arc<dyn ValueTransfer>,
    heights: Arc<dyn HeightSource>,
    admin: AccountId,
    min_deal_value: u64,
    metrics: Metrics,
    mailbox_capacity: usize,
) -> EscrowHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity);
    let actor = EscrowActor::new(storage, bank, heights, admin, min_deal_value, metrics, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    EscrowHandle::new(tx)
}
