//! # Chain
//!
//! An ordered, never-empty sequence of blocks starting at genesis, plus the
//! operations that check it and extend it.
//!
//! ```text
//! validate.rs : check_block_hash / check_block_validity / check_chain
//! mutate.rs   : add_transaction / add_block (validate, append, re-check)
//! loader.rs   : load_chain / export_chain for the persisted JSON shape
//! ```
//!
//! A [`Chain`] is a value. Appending produces a new chain and leaves the old
//! one intact, so a caller holding a previous chain (and its state) can
//! always fall back to it.

pub mod loader;
pub mod mutate;
pub mod validate;

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::{LedgerError, Result};

pub use loader::{export_chain, load_and_check, load_chain};
pub use mutate::{add_block, add_transaction};
pub use validate::{check_block_hash, check_block_validity, check_blocks, check_chain};

/// Ordered blocks, index 0 is genesis. Never empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Block>", into = "Vec<Block>")]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// A chain holding only `genesis`.
    pub fn new(genesis: Block) -> Self {
        Chain {
            blocks: vec![genesis],
        }
    }

    /// Wrap an existing block sequence without validating it.
    ///
    /// # Errors
    ///
    /// [`LedgerError::EmptyChain`] if `blocks` is empty.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self> {
        if blocks.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        Ok(Chain { blocks })
    }

    /// The first block.
    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    /// The latest block.
    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// All blocks in order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Iterate blocks in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    /// Unwrap into the block vector.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// A new chain with `block` appended. `self` is unchanged.
    pub(crate) fn appended(&self, block: Block) -> Chain {
        let mut blocks = Vec::with_capacity(self.blocks.len() + 1);
        blocks.extend_from_slice(&self.blocks);
        blocks.push(block);
        Chain { blocks }
    }
}

impl TryFrom<Vec<Block>> for Chain {
    type Error = LedgerError;

    fn try_from(blocks: Vec<Block>) -> Result<Self> {
        Chain::from_blocks(blocks)
    }
}

impl From<Chain> for Vec<Block> {
    fn from(chain: Chain) -> Self {
        chain.blocks
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;

    fn genesis() -> Block {
        Block::genesis(vec![Transaction::from([("Tom", 10)])]).unwrap()
    }

    #[test]
    fn new_chain_has_genesis_as_tip() {
        let chain = Chain::new(genesis());
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
        assert_eq!(chain.tip(), chain.genesis());
    }

    #[test]
    fn from_blocks_rejects_empty() {
        assert_eq!(Chain::from_blocks(vec![]), Err(LedgerError::EmptyChain));
    }

    #[test]
    fn appended_leaves_original_untouched() {
        let chain = Chain::new(genesis());
        let block = Block::new(chain.tip(), vec![]).unwrap();
        let longer = chain.appended(block.clone());

        assert_eq!(chain.len(), 1);
        assert_eq!(longer.len(), 2);
        assert_eq!(longer.tip(), &block);
        assert_eq!(longer.get(0), Some(chain.genesis()));
    }

    #[test]
    fn deserializing_an_empty_array_fails() {
        assert!(serde_json::from_str::<Chain>("[]").is_err());
    }
}
