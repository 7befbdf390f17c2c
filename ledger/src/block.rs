//! # Block Structure
//!
//! A block commits to a batch of transactions and to its parent.
//!
//! ## Block Layout
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  hash: ContentId    (SHA-256 of contents)     │
//! ├───────────────────────────────────────────────┤
//! │  BlockContents                                │
//! │  ├── block_number: u64                        │
//! │  ├── parent_hash: Option<ContentId>           │
//! │  ├── transaction_count: u64  (batch size)     │
//! │  └── transactions: Vec<Transaction>           │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Hash Computation
//!
//! `hash = content_id(contents)`: every field of the contents is covered,
//! so editing any of them after construction is caught by
//! [`Block::verify_hash`]. Genesis is the only block without a parent hash.

use serde::{Deserialize, Serialize};

use crate::config::GENESIS_BLOCK_NUMBER;
use crate::error::{LedgerError, LinkageFault, Result};
use crate::hash::{content_id, ContentId};
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// BlockContents
// ---------------------------------------------------------------------------

/// Everything a block hash commits to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockContents {
    /// Position in the chain, genesis = 0.
    pub block_number: u64,
    /// Hash of the parent block. `None` only for genesis.
    pub parent_hash: Option<ContentId>,
    /// Number of entries in `transactions`.
    pub transaction_count: u64,
    /// Ordered transaction batch.
    pub transactions: Vec<Transaction>,
}

impl BlockContents {
    fn assemble(
        block_number: u64,
        parent_hash: Option<ContentId>,
        transactions: Vec<Transaction>,
    ) -> Self {
        BlockContents {
            block_number,
            parent_hash,
            transaction_count: transactions.len() as u64,
            transactions,
        }
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// Committed block: contents plus the hash over them.
///
/// Nothing prevents editing the public fields, but any edit breaks the
/// commitment and chain validation will reject the block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    /// `content_id(contents)` at construction time.
    pub hash: ContentId,
    /// The committed data.
    pub contents: BlockContents,
}

impl Block {
    /// Construct a genesis block that seeds balances with `transactions`.
    ///
    /// Genesis transactions mint: they are applied unconditionally when the
    /// chain is validated.
    ///
    /// # Example
    ///
    /// ```
    /// use tally_ledger::block::Block;
    /// use tally_ledger::transaction::Transaction;
    ///
    /// let genesis = Block::genesis(vec![Transaction::from([("Tom", 10)])]).unwrap();
    /// assert_eq!(genesis.block_number(), 0);
    /// assert!(genesis.contents.parent_hash.is_none());
    /// assert!(genesis.verify_hash().is_ok());
    /// ```
    pub fn genesis(transactions: Vec<Transaction>) -> Result<Self> {
        Self::seal(BlockContents::assemble(
            GENESIS_BLOCK_NUMBER,
            None,
            transactions,
        ))
    }

    /// Construct a block extending `parent` with `transactions`.
    ///
    /// Does not validate the transactions; that needs a state, and lives in
    /// [`crate::chain`].
    pub fn new(parent: &Block, transactions: Vec<Transaction>) -> Result<Self> {
        let block_number = parent.successor_number()?;
        Self::seal(BlockContents::assemble(
            block_number,
            Some(parent.hash.clone()),
            transactions,
        ))
    }

    /// Hash `contents` and wrap them. Use this to rebuild a block from parts
    /// you already trust; the result always verifies.
    pub fn seal(contents: BlockContents) -> Result<Self> {
        let hash = content_id(&contents)?;
        Ok(Block { hash, contents })
    }

    /// Recompute the hash from the current contents.
    pub fn compute_hash(&self) -> Result<ContentId> {
        content_id(&self.contents)
    }

    /// Check the stored hash against the contents.
    ///
    /// # Errors
    ///
    /// [`LedgerError::HashMismatch`] with both hashes if they differ.
    pub fn verify_hash(&self) -> Result<()> {
        let computed = self.compute_hash()?;
        if computed != self.hash {
            return Err(LedgerError::HashMismatch {
                block_number: self.contents.block_number,
                stored: self.hash.clone(),
                computed,
            });
        }
        Ok(())
    }

    /// Block number a child of this block must carry.
    ///
    /// # Errors
    ///
    /// [`LedgerError::Linkage`] with
    /// [`LinkageFault::NumberSpaceExhausted`] when this block is at
    /// `u64::MAX`.
    pub fn successor_number(&self) -> Result<u64> {
        let parent = self.contents.block_number;
        parent.checked_add(1).ok_or(LedgerError::Linkage {
            block_number: parent,
            fault: LinkageFault::NumberSpaceExhausted { parent },
        })
    }

    /// Block number.
    pub fn block_number(&self) -> u64 {
        self.contents.block_number
    }

    /// Transactions in this block.
    pub fn transactions(&self) -> &[Transaction] {
        &self.contents.transactions
    }

    /// `true` for a block with no parent.
    pub fn is_genesis(&self) -> bool {
        self.contents.parent_hash.is_none()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
