//! Credit ledger
//!
//! Balances are kept in the smallest currency unit. Every debit is keyed by
//! the trial id that caused it, so replaying a trial can never charge twice.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

/// Ledger failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The account cannot cover the debit
    #[error("Insufficient balance: {available} available, {required} required")]
    InsufficientBalance { available: i64, required: i64 },

    /// The ledger backend could not be reached
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Result of a debit that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// Debit applied; remaining balance attached
    Applied { remaining: i64 },

    /// A debit for this trial id already exists; nothing changed
    AlreadyApplied,
}

/// Account balance store with idempotent, trial-keyed debits.
///
/// Implementations must make `debit` atomic per trial id without a global
/// lock: two concurrent debits for the same trial apply exactly once.
#[async_trait]
pub trait CreditLedger: Send + Sync {
    /// Current balance; unknown users have zero.
    async fn balance(&self, user_id: i64) -> Result<i64, LedgerError>;

    /// Whether a debit for `trial_id` has already been applied.
    async fn is_applied(&self, trial_id: &str) -> Result<bool, LedgerError>;

    /// Charge `amount` to `user_id` for `trial_id`.
    async fn debit(
        &self,
        user_id: i64,
        trial_id: &str,
        amount: i64,
    ) -> Result<DebitOutcome, LedgerError>;
}

/// One applied debit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub user_id: i64,
    pub amount: i64,
    pub applied_at: DateTime<Utc>,
}

/// In-process ledger backed by concurrent maps.
///
/// Debits settle work that already happened, so they are applied even when
/// they take the balance below zero; refusing for funds is the job of the
/// admission check in front of the backend call.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: DashMap<i64, i64>,
    entries: DashMap<String, LedgerEntry>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger with one pre-funded account.
    pub fn with_balance(user_id: i64, amount: i64) -> Self {
        let ledger = Self::new();
        ledger.credit(user_id, amount);
        ledger
    }

    /// Top up an account; returns the new balance.
    pub fn credit(&self, user_id: i64, amount: i64) -> i64 {
        let mut balance = self.balances.entry(user_id).or_insert(0);
        *balance = balance.saturating_add(amount);
        *balance
    }

    /// Applied debit for a trial, if any.
    pub fn entry(&self, trial_id: &str) -> Option<LedgerEntry> {
        self.entries.get(trial_id).map(|e| e.value().clone())
    }

    /// Number of applied debits.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl CreditLedger for InMemoryLedger {
    async fn balance(&self, user_id: i64) -> Result<i64, LedgerError> {
        Ok(self.balances.get(&user_id).map(|b| *b).unwrap_or(0))
    }

    async fn is_applied(&self, trial_id: &str) -> Result<bool, LedgerError> {
        Ok(self.entries.contains_key(trial_id))
    }

    async fn debit(
        &self,
        user_id: i64,
        trial_id: &str,
        amount: i64,
    ) -> Result<DebitOutcome, LedgerError> {
        // Entry lock on the trial id serializes replays of the same trial;
        // lock order is always entries -> balances.
        match self.entries.entry(trial_id.to_string()) {
            Entry::Occupied(_) => Ok(DebitOutcome::AlreadyApplied),
            Entry::Vacant(slot) => {
                let remaining = {
                    let mut balance = self.balances.entry(user_id).or_insert(0);
                    *balance = balance.saturating_sub(amount);
                    *balance
                };
                slot.insert(LedgerEntry {
                    user_id,
                    amount,
                    applied_at: Utc::now(),
                });
                Ok(DebitOutcome::Applied { remaining })
            }
        }
    }
}
