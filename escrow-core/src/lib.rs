//! Escrow & Reputation Ledger Core
//!
//! Deals between two parties, escrowed payments settled through a host
//! value-transfer primitive, and per-account trust profiles aggregated
//! from post-completion ratings.
//!
//! # Architecture
//!
//! - **Single Writer**: one actor task owns all storage access, so guard
//!   checks and writes are serialized per operation
//! - **Atomic Commits**: every operation's writes land in one RocksDB
//!   `WriteBatch`, either all applied or none
//! - **Host Interfaces**: value custody and block heights are injected,
//!   never owned by the core
//!
//! # Invariants
//!
//! - Identifiers are dense, strictly increasing, never reused, and never
//!   burned by a rejected request
//! - A payment settles at most once; a repeat completion is rejected and
//!   never double-transfers
//! - A deal is rated at most once, only by its counterparty, only after
//!   its payment has settled
//! - Trust profiles are monotone: every successful rating adds exactly
//!   once to the rated account's sum and count

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod config;
pub mod error;
pub mod escrow;
pub mod host;
pub mod metrics;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use escrow::Escrow;
pub use host::{BlockCounter, HeightSource, InMemoryBank, ValueTransfer};
pub use metrics::Metrics;
pub use storage::Storage;
pub use types::{AccountId, Deal, DealId, DealState, Payment, PaymentId, TrustProfile};
