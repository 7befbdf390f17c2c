//! Balance-transfer transactions.
//!
//! A [`Transaction`] maps account ids to signed deltas. It carries no
//! sender, receiver or signature: whoever holds the chain decides what to
//! submit, and the state rules in [`crate::state`] decide whether it may be
//! applied. Keys are kept in a `BTreeMap` so iteration (and therefore fold
//! order and encoding) never depends on how the map was built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransactionError};
use crate::hash::{content_id, ContentId};

/// Account identifier.
pub type AccountId = String;

/// A set of balance deltas across accounts.
///
/// Valid transactions are zero-sum, but nothing stops you from building an
/// unbalanced one: genesis blocks mint with exactly that, and validation
/// is where the rule is enforced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction(BTreeMap<AccountId, i64>);

impl Transaction {
    /// An empty transaction. Valid and a no-op against any state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style: add `delta` to `account`, accumulating with any delta
    /// already present.
    ///
    /// # Errors
    ///
    /// [`TransactionError::Overflow`] if the accumulated delta leaves `i64`
    /// range.
    pub fn with(
        mut self,
        account: impl Into<AccountId>,
        delta: i64,
    ) -> Result<Self, TransactionError> {
        let account = account.into();
        let current = self.0.get(&account).copied().unwrap_or(0);
        let next = current
            .checked_add(delta)
            .ok_or_else(|| TransactionError::Overflow {
                account: account.clone(),
            })?;
        self.0.insert(account, next);
        Ok(self)
    }

    /// Move `amount` from `from` to `to`. A transfer to oneself nets to a
    /// zero delta.
    ///
    /// # Errors
    ///
    /// [`TransactionError::Overflow`] for `i64::MIN`, whose negation has no
    /// `i64` representation.
    ///
    /// # Example
    ///
    /// ```
    /// use tally_ledger::transaction::Transaction;
    ///
    /// let tx = Transaction::transfer("Tom", "Medium", 1).unwrap();
    /// assert_eq!(tx.delta("Tom"), Some(-1));
    /// assert_eq!(tx.delta("Medium"), Some(1));
    /// assert_eq!(tx.net_delta(), 0);
    /// ```
    pub fn transfer(
        from: impl Into<AccountId>,
        to: impl Into<AccountId>,
        amount: i64,
    ) -> Result<Self, TransactionError> {
        let from = from.into();
        let debit = amount
            .checked_neg()
            .ok_or_else(|| TransactionError::Overflow {
                account: from.clone(),
            })?;
        Self::new().with(from, debit)?.with(to, amount)
    }

    /// Delta applied to `account`, if the transaction touches it.
    pub fn delta(&self, account: &str) -> Option<i64> {
        self.0.get(account).copied()
    }

    /// Sum of every delta, widened so it cannot overflow.
    pub fn net_delta(&self) -> i128 {
        self.0.values().map(|d| *d as i128).sum()
    }

    /// Accounts touched, in key order.
    pub fn accounts(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(account, delta)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of accounts touched.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when no account is touched.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Content id of this transaction's canonical encoding.
    pub fn id(&self) -> Result<ContentId> {
        content_id(self)
    }
}

/// Collects like a map literal: a repeated account keeps its last delta.
/// Use [`Transaction::with`] to accumulate instead.
impl<K: Into<AccountId>> FromIterator<(K, i64)> for Transaction {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        Transaction(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<K: Into<AccountId>, const N: usize> From<[(K, i64); N]> for Transaction {
    fn from(entries: [(K, i64); N]) -> Self {
        entries.into_iter().collect()
    }
}
