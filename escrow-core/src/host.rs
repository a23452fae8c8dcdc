//! Host ledger interfaces
//!
//! The escrow core never holds balances or tells time itself. Both come
//! from the host environment through the traits here: an atomic value
//! transfer primitive and a monotone block-height source. The in-memory
//! implementations back the test suite and the demo server binary.

use crate::{
    error::{Error, Result},
    types::AccountId,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic value transfer primitive supplied by the host ledger
///
/// `transfer` is all-or-nothing: on error no balance has moved.
pub trait ValueTransfer: Send + Sync {
    /// Move `amount` units from `from` to `to`
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64) -> Result<()>;
}

/// Monotone block-height source supplied by the host ledger
pub trait HeightSource: Send + Sync {
    /// Current block height
    fn current_height(&self) -> u64;
}

/// In-memory balance book implementing [`ValueTransfer`]
///
/// A stand-in for the host chain's native token ledger.
#[derive(Default)]
pub struct InMemoryBank {
    balances: RwLock<HashMap<AccountId, u64>>,
}

impl InMemoryBank {
    /// Create an empty bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account (test/demo funding)
    pub fn credit(&self, account: &AccountId, amount: u64) {
        let mut balances = self.balances.write();
        let entry = balances.entry(account.clone()).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Current balance of an account (zero if unknown)
    pub fn balance(&self, account: &AccountId) -> u64 {
        *self.balances.read().get(account).unwrap_or(&0)
    }
}

impl ValueTransfer for InMemoryBank {
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64) -> Result<()> {
        let mut balances = self.balances.write();

        let from_balance = *balances.get(from).unwrap_or(&0);
        let debited = from_balance.checked_sub(amount).ok_or_else(|| {
            Error::Transfer(format!(
                "Insufficient balance: {} has {} of {} required",
                from, from_balance, amount
            ))
        })?;

        let to_balance = *balances.get(to).unwrap_or(&0);
        let credited = to_balance.checked_add(amount).ok_or_else(|| {
            Error::Transfer(format!("Balance overflow crediting {}", to))
        })?;

        balances.insert(from.clone(), debited);
        balances.insert(to.clone(), credited);

        tracing::debug!(from = %from, to = %to, amount, "Value transferred");

        Ok(())
    }
}

/// Manually advanced block counter implementing [`HeightSource`]
pub struct BlockCounter {
    height: AtomicU64,
}

impl BlockCounter {
    /// Create a counter starting at `height`
    pub fn new(height: u64) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    /// Advance to the next block, returning the new height
    pub fn advance(&self) -> u64 {
        self.height.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl HeightSource for BlockCounter {
    fn current_height(&self) -> u64 {
        self.height.load(Ordering::SeqCst)
    }
}
