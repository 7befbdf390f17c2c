//! # Ledger State
//!
//! The state maps account ids to balances. It is never mutated in place:
//! [`LedgerState::fold`] returns a new state and leaves its input alone, so
//! any snapshot a caller kept around stays valid for audit or rollback.
//!
//! ## State Transition
//!
//! A transaction `T` is valid against state `S` iff
//!
//! 1. `sum(T) == 0` (value is moved, never created or destroyed), and
//! 2. `S[a] + T[a] >= 0` for every account `a` in `T` (absent accounts
//!    count as 0).
//!
//! Rule 1 is checked first; it needs no state lookups. Folding adds each
//! delta to the account's balance and carries every other account over.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransactionError};
use crate::hash::{content_id, ContentId};
use crate::transaction::{AccountId, Transaction};

// ---------------------------------------------------------------------------
// LedgerState
// ---------------------------------------------------------------------------

/// Balances at one point in the chain.
///
/// Serializes as a plain `{account: balance}` mapping, key-sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerState {
    balances: BTreeMap<AccountId, i64>,
}

impl LedgerState {
    /// An empty state: no accounts, every balance reads as 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `account`, 0 if it has never been touched.
    pub fn balance(&self, account: &str) -> i64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Whether `account` has an entry (a zero balance still counts).
    pub fn contains(&self, account: &str) -> bool {
        self.balances.contains_key(account)
    }

    /// Number of accounts with an entry.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// `true` if no account has an entry.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// `(account, balance)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.balances.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Sum of all balances. Constant across any run of valid transactions.
    pub fn total_supply(&self) -> i128 {
        self.balances.values().map(|b| *b as i128).sum()
    }

    /// Content id of the state's canonical encoding, handy for comparing
    /// snapshots without shipping them around.
    pub fn digest(&self) -> Result<ContentId> {
        content_id(self)
    }

    /// Check `tx` against this state and name the first rule it breaks.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::Unbalanced`] if the deltas do not sum to zero.
    /// - [`TransactionError::Overdrawn`] if an account would end below zero.
    /// - [`TransactionError::Overflow`] if a balance would leave `i64` range.
    pub fn validate(&self, tx: &Transaction) -> Result<(), TransactionError> {
        let net = tx.net_delta();
        if net != 0 {
            return Err(TransactionError::Unbalanced { net });
        }

        for (account, delta) in tx.iter() {
            let balance = self.balance(account);
            let next = balance
                .checked_add(delta)
                .ok_or_else(|| TransactionError::Overflow {
                    account: account.to_string(),
                })?;
            if next < 0 {
                return Err(TransactionError::Overdrawn {
                    account: account.to_string(),
                    balance,
                    delta,
                });
            }
        }

        Ok(())
    }

    /// `true` iff [`LedgerState::validate`] accepts `tx`.
    pub fn is_valid(&self, tx: &Transaction) -> bool {
        self.validate(tx).is_ok()
    }

    /// Apply `tx` without checking the transfer rules, returning the new
    /// state.
    ///
    /// Genesis transactions go through here directly; everything else should
    /// pass [`LedgerState::validate`] first.
    ///
    /// # Errors
    ///
    /// [`TransactionError::Overflow`] if a balance would leave `i64` range.
    /// `self` is untouched either way.
    pub fn fold(&self, tx: &Transaction) -> Result<LedgerState, TransactionError> {
        let mut balances = self.balances.clone();
        for (account, delta) in tx.iter() {
            let slot = balances.entry(account.to_string()).or_insert(0);
            *slot = slot
                .checked_add(delta)
                .ok_or_else(|| TransactionError::Overflow {
                    account: account.to_string(),
                })?;
        }
        Ok(LedgerState { balances })
    }

    /// Validate then fold.
    pub fn apply(&self, tx: &Transaction) -> Result<LedgerState, TransactionError> {
        self.validate(tx)?;
        self.fold(tx)
    }

    /// Fold a sequence of transactions in order, unchecked.
    pub fn fold_all<'a, I>(&self, txs: I) -> Result<LedgerState, TransactionError>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        txs.into_iter()
            .try_fold(self.clone(), |state, tx| state.fold(tx))
    }
}

impl<K: Into<AccountId>> FromIterator<(K, i64)> for LedgerState {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        LedgerState {
            balances: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<AccountId>, const N: usize> From<[(K, i64); N]> for LedgerState {
    fn from(entries: [(K, i64); N]) -> Self {
        entries.into_iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
