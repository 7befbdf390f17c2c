//! Thread-safe handle around one chain and its state.
//!
//! The core is value-based and single-threaded. A long-lived service that
//! owns a chain needs two things on top of it:
//!
//! - Readers take a [`Snapshot`]: an owned copy of chain and state, cloned
//!   under a short read lock and usable afterwards without any lock.
//! - Appends are serialized. [`SharedLedger::submit_batch`] holds the write
//!   lock across read-tail, build-block and append, so two concurrent
//!   submissions can never both build on the same tip and claim the same
//!   block number.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::block::Block;
use crate::chain::{add_block, check_chain, Chain};
use crate::error::Result;
use crate::state::LedgerState;
use crate::transaction::Transaction;

/// Owned view of the ledger at one moment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// The chain as of this snapshot.
    pub chain: Chain,
    /// The state derived from `chain`.
    pub state: LedgerState,
}

/// Cloneable handle; all clones share the same chain.
#[derive(Clone, Debug)]
pub struct SharedLedger {
    inner: Arc<RwLock<Snapshot>>,
}

impl SharedLedger {
    /// Start a ledger from a genesis block.
    pub fn new(genesis: Block) -> Result<Self> {
        Self::from_chain(Chain::new(genesis))
    }

    /// Adopt an existing chain after validating it.
    ///
    /// # Errors
    ///
    /// Whatever [`check_chain`] reports for `chain`.
    pub fn from_chain(chain: Chain) -> Result<Self> {
        let state = check_chain(&chain)?;
        info!(blocks = chain.len(), accounts = state.len(), "ledger opened");
        Ok(SharedLedger {
            inner: Arc::new(RwLock::new(Snapshot { chain, state })),
        })
    }

    /// Copy out the current chain and state.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().clone()
    }

    /// Copy out the current state only.
    pub fn state(&self) -> LedgerState {
        self.inner.read().state.clone()
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.inner.read().chain.len()
    }

    /// Block number of the current tip.
    pub fn height(&self) -> u64 {
        self.inner.read().chain.tip().block_number()
    }

    /// Always `false`: a ledger holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.inner.read().chain.is_empty()
    }

    /// Current balance of `account`.
    pub fn balance(&self, account: &str) -> i64 {
        self.inner.read().state.balance(account)
    }

    /// Append a block holding `tx`; returns the new block.
    pub fn submit(&self, tx: Transaction) -> Result<Block> {
        self.submit_batch(vec![tx])
    }

    /// Append a block holding `transactions`; returns the new block.
    ///
    /// # Errors
    ///
    /// As for [`add_block`]. On error the shared chain and state are
    /// unchanged.
    pub fn submit_batch(&self, transactions: Vec<Transaction>) -> Result<Block> {
        let mut guard = self.inner.write();
        let (state, chain) = add_block(transactions, &guard.state, &guard.chain)?;
        let block = chain.tip().clone();
        *guard = Snapshot { chain, state };
        Ok(block)
    }
}
