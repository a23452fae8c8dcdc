//! Error types for the escrow ledger
//!
//! Every guard failure is a distinct named kind so callers can branch on
//! the exact precondition that failed. An operation either fully succeeds
//! or returns one of these with zero writes applied.

use thiserror::Error;

/// Result type for escrow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Escrow ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Counterparty is the caller itself
    #[error("Cannot open a deal with yourself")]
    SelfDeal,

    /// Counterparty is the admin identity
    #[error("Invalid user: {0}")]
    InvalidUser(String),

    /// Deal value is zero
    #[error("Deal value must be positive")]
    ZeroAmount,

    /// Deal value is below the configured minimum
    #[error("Deal value {value} is below minimum {minimum}")]
    LowValue {
        /// Requested value
        value: u64,
        /// Configured minimum
        minimum: u64,
    },

    /// Payment not found
    #[error("Payment not found: {0}")]
    NoPayment(u64),

    /// Caller is not the payer of this payment
    #[error("Not authorized to complete payment {0}")]
    NoAuth(u64),

    /// Payment already settled; completing twice never double-transfers
    #[error("Payment {0} is already complete")]
    AlreadyComplete(u64),

    /// Deal identifier outside the allocated range
    #[error("Invalid deal id: {0}")]
    InvalidDealId(u64),

    /// Deal not found
    #[error("Deal not found: {0}")]
    DealNotExist(u64),

    /// Caller is not the counterparty of this deal
    #[error("Not authorized to rate deal {0}")]
    NotAuthorized(u64),

    /// Rating is zero
    #[error("Rating must be positive")]
    BadRating,

    /// Deal already carries a rating; rating twice never double-counts
    #[error("Deal {0} is already rated")]
    AlreadyRated(u64),

    /// Paired payment has not settled yet
    #[error("Deal {0} is not complete")]
    DealNotComplete(u64),

    /// Host value-transfer primitive refused the transfer
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Invariant violation (paired record missing, counter regression, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this is a guard rejection (a precondition the caller
    /// failed), as opposed to an infrastructure failure
    pub fn is_rejection(&self) -> bool {
        match self {
            Error::SelfDeal
            | Error::InvalidUser(_)
            | Error::ZeroAmount
            | Error::LowValue { .. }
            | Error::NoPayment(_)
            | Error::NoAuth(_)
            | Error::AlreadyComplete(_)
            | Error::InvalidDealId(_)
            | Error::DealNotExist(_)
            | Error::NotAuthorized(_)
            | Error::BadRating
            | Error::AlreadyRated(_)
            | Error::DealNotComplete(_) => true,
            Error::Transfer(_)
            | Error::Storage(_)
            | Error::Serialization(_)
            | Error::InvariantViolation(_)
            | Error::Concurrency(_)
            | Error::Config(_)
            | Error::Io(_) => false,
        }
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
