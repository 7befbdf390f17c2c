//! Error types for ledger validation and mutation.
//!
//! Two layers: [`TransactionError`] names the rule a single transaction
//! broke against a given state, and [`LedgerError`] places failures inside
//! a chain (which block, which transaction) so callers can branch on the
//! kind without parsing messages.

use thiserror::Error;

use crate::hash::ContentId;

/// Convenience alias used throughout the crate.
pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// TransactionError
// ---------------------------------------------------------------------------

/// Why a transaction cannot be applied to a state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// The deltas do not sum to zero, so the transaction would mint or burn
    /// value.
    #[error("deltas sum to {net}, expected 0")]
    Unbalanced {
        /// Sum of every delta in the transaction.
        net: i128,
    },

    /// Applying the delta would leave the account below zero.
    #[error("account {account} would go negative: balance {balance}, delta {delta}")]
    Overdrawn {
        /// The account that would be overdrawn.
        account: String,
        /// Its balance before the transaction.
        balance: i64,
        /// The delta the transaction applies to it.
        delta: i64,
    },

    /// The resulting balance does not fit in an `i64`.
    #[error("balance of {account} overflows a 64-bit signed integer")]
    Overflow {
        /// The account whose balance overflows.
        account: String,
    },
}

// ---------------------------------------------------------------------------
// LinkageFault
// ---------------------------------------------------------------------------

/// The way a block fails to attach to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkageFault {
    /// `block_number` is not the parent's plus one (or not zero for genesis).
    #[error("expected block number {expected}, found {found}")]
    BlockNumber {
        /// The block number the position requires.
        expected: u64,
        /// The block number the block declares.
        found: u64,
    },

    /// `parent_hash` does not name the parent block.
    #[error("expected parent hash {expected}, found {}", describe_parent(.found))]
    ParentHash {
        /// Hash committed by the parent block.
        expected: ContentId,
        /// Parent hash declared by the block.
        found: Option<ContentId>,
    },

    /// The parent already sits at `u64::MAX`; nothing can follow it.
    #[error("parent block number {parent} has no successor")]
    NumberSpaceExhausted {
        /// Block number of the parent.
        parent: u64,
    },

    /// The first block of a chain declares a parent.
    #[error("genesis block must not have a parent, found {found}")]
    GenesisParent {
        /// The parent hash the genesis block declares.
        found: ContentId,
    },
}

fn describe_parent(found: &Option<ContentId>) -> String {
    match found {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    }
}

// ---------------------------------------------------------------------------
// LedgerError
// ---------------------------------------------------------------------------

/// Every failure a ledger operation can surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A value could not be written in canonical form.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// The committed hash does not match the recomputed one.
    #[error("block {block_number} hash mismatch: stored={stored}, computed={computed}")]
    HashMismatch {
        /// Block number declared by the offending block.
        block_number: u64,
        /// Hash stored in the block.
        stored: ContentId,
        /// Hash recomputed from the block contents.
        computed: ContentId,
    },

    /// The block does not attach to its parent.
    #[error("block {block_number} linkage broken: {fault}")]
    Linkage {
        /// Chain position where the link breaks: the number the block
        /// should carry there, or the parent's own number when the parent
        /// has no successor.
        block_number: u64,
        /// What exactly is wrong with the link.
        fault: LinkageFault,
    },

    /// A transaction in a block (or a submitted one) violates the rules.
    #[error("block {block_number} transaction {index} rejected: {source}")]
    InvalidTransaction {
        /// Block number the transaction belongs to (or would belong to).
        block_number: u64,
        /// Position of the transaction inside its block.
        index: usize,
        /// The rule it broke.
        #[source]
        source: TransactionError,
    },

    /// `transaction_count` disagrees with the batch it describes.
    #[error("block {block_number} declares {declared} transactions but carries {actual}")]
    TransactionCount {
        /// Block number declared by the offending block.
        block_number: u64,
        /// Value of the `transaction_count` field.
        declared: u64,
        /// Length of the `transactions` list.
        actual: usize,
    },

    /// A chain must hold at least its genesis block.
    #[error("chain has no blocks")]
    EmptyChain,

    /// External input could not be parsed into a chain.
    #[error("malformed chain input: {0}")]
    MalformedInput(String),

    /// The state handed to a mutation is not the one the chain derives to.
    #[error("state supplied for block {block_number} diverges from the chain's derived state")]
    StateDivergence {
        /// Block number of the block being appended.
        block_number: u64,
    },
}

impl LedgerError {
    /// Block number the failure is pinned to, when there is one.
    pub fn block_number(&self) -> Option<u64> {
        match self {
            LedgerError::HashMismatch { block_number, .. }
            | LedgerError::Linkage { block_number, .. }
            | LedgerError::InvalidTransaction { block_number, .. }
            | LedgerError::TransactionCount { block_number, .. }
            | LedgerError::StateDivergence { block_number } => Some(*block_number),
            LedgerError::Encoding(_) | LedgerError::EmptyChain | LedgerError::MalformedInput(_) => {
                None
            }
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Encoding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_error_messages_name_the_account() {
        let err = TransactionError::Overdrawn {
            account: "Tom".to_string(),
            balance: 7,
            delta: -100,
        };
        assert_eq!(
            err.to_string(),
            "account Tom would go negative: balance 7, delta -100"
        );
    }

    #[test]
    fn invalid_transaction_carries_location_and_source() {
        let err = LedgerError::InvalidTransaction {
            block_number: 3,
            index: 0,
            source: TransactionError::Unbalanced { net: -100 },
        };
        assert_eq!(
            err.to_string(),
            "block 3 transaction 0 rejected: deltas sum to -100, expected 0"
        );
        assert_eq!(err.block_number(), Some(3));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn parent_fault_renders_missing_parent() {
        let expected = ContentId::parse(&"ab".repeat(32)).unwrap();
        let fault = LinkageFault::ParentHash {
            expected: expected.clone(),
            found: None,
        };
        assert_eq!(
            fault.to_string(),
            format!("expected parent hash {}, found none", expected)
        );
    }

    #[test]
    fn chain_level_errors_have_no_block() {
        assert_eq!(LedgerError::EmptyChain.block_number(), None);
        assert_eq!(
            LedgerError::MalformedInput("not json".into()).block_number(),
            None
        );
    }
}
