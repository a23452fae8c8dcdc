//! Core types for the escrow ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (integer ledger units for value)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deal identifier, allocated sequentially starting at 1.
pub type DealId = u64;

/// Payment identifier, allocated sequentially starting at 1.
pub type PaymentId = u64;

/// Account identifier (an identity asserted by the host environment)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get as bytes (storage key form)
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deal lifecycle state
///
/// A closed enumeration: a deal is `Open` from creation until its paired
/// payment settles, then `Complete` forever after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DealState {
    /// Escrow reserved, payment not yet settled
    Open = 1,
    /// Paired payment settled (terminal)
    Complete = 2,
}

impl fmt::Display for DealState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DealState::Open => write!(f, "OPEN"),
            DealState::Complete => write!(f, "COMPLETE"),
        }
    }
}

/// Escrow payment record
///
/// Created together with its deal. Only `is_complete` ever changes,
/// false to true, exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID
    pub payment_id: PaymentId,

    /// Deal this payment settles
    pub deal_id: DealId,

    /// Payer account
    pub from: AccountId,

    /// Payee account
    pub to: AccountId,

    /// Escrowed value (ledger units, always positive)
    pub amount: u64,

    /// Whether the value transfer has settled
    pub is_complete: bool,

    /// Block height at creation
    pub created_at: u64,
}

/// Deal record between an initiator and a counterparty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    /// Deal ID
    pub deal_id: DealId,

    /// Paired escrow payment
    pub payment_id: PaymentId,

    /// Deal creator (the paying side)
    pub initiator: AccountId,

    /// Other party (the receiving side, and the only permitted rater)
    pub counterparty: AccountId,

    /// Deal value (ledger units, always positive)
    pub value: u64,

    /// Lifecycle state
    pub state: DealState,

    /// Block height at creation
    pub timestamp: u64,

    /// Rating assigned by the counterparty, set at most once
    pub trust_score: Option<u32>,
}

impl Deal {
    /// Check if the deal can still be rated (complete and not yet rated)
    pub fn is_rateable(&self) -> bool {
        self.state == DealState::Complete && self.trust_score.is_none()
    }
}

/// Per-account reputation aggregate
///
/// Both fields are monotonically non-decreasing. An absent profile is
/// equivalent to the zero profile, so reads never fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustProfile {
    /// Sum of all ratings received
    pub cumulative_score: u64,

    /// Number of rated deals counted
    pub deal_count: u64,
}

impl TrustProfile {
    /// Fold one rating into the aggregate
    ///
    /// Saturating so the aggregate can never wrap backwards.
    pub fn apply_rating(&mut self, rating: u32) {
        self.cumulative_score = self.cumulative_score.saturating_add(u64::from(rating));
        self.deal_count = self.deal_count.saturating_add(1);
    }
}
