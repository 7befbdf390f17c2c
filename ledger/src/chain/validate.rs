//! Chain validation: re-derive the ledger state from genesis while checking
//! every block's integrity and linkage.
//!
//! Every non-genesis block goes through the same checks, cheapest and most
//! fundamental first, and the first failure aborts the walk:
//!
//! 1. **Hash**: the stored hash equals `content_id(contents)`. Nothing
//!    else about a block is trusted until this holds.
//! 2. **Linkage**: `block_number` is the parent's plus one and
//!    `parent_hash` is the parent's hash.
//! 3. **Count**: `transaction_count` equals the batch length.
//! 4. **Transactions**: each one, in order, is valid against the running
//!    state and is folded into it.
//!
//! Genesis is special: it must be block 0 with no parent, and its
//! transactions are folded without the transfer rules, since they are what
//! creates the initial balances.

use tracing::{debug, warn};

use crate::block::Block;
use crate::config::GENESIS_BLOCK_NUMBER;
use crate::error::{LedgerError, LinkageFault, Result};
use crate::state::LedgerState;
use crate::transaction::Transaction;

use super::Chain;

/// Check a block's stored hash against its contents.
///
/// # Errors
///
/// [`LedgerError::HashMismatch`] naming both hashes.
pub fn check_block_hash(block: &Block) -> Result<()> {
    block.verify_hash()
}

/// Validate `block` as the child of `parent`, starting from `state` (the
/// state after `parent`), and return the state after `block`.
///
/// `state` is not modified; on failure the caller still holds it.
///
/// # Errors
///
/// The first violated rule, in the order listed in the module docs:
/// [`LedgerError::HashMismatch`], [`LedgerError::Linkage`],
/// [`LedgerError::TransactionCount`], [`LedgerError::InvalidTransaction`].
pub fn check_block_validity(
    block: &Block,
    parent: &Block,
    state: &LedgerState,
) -> Result<LedgerState> {
    let outcome = check_block_hash(block)
        .and_then(|()| check_linkage(block, parent))
        .and_then(|()| check_transaction_count(block))
        .and_then(|()| apply_batch(block.block_number(), block.transactions(), state));

    match outcome {
        Ok(next) => {
            debug!(
                block_number = block.block_number(),
                transactions = block.transactions().len(),
                hash = %block.hash.short(),
                "block validated"
            );
            Ok(next)
        }
        Err(err) => Err(rejected(err)),
    }
}

/// Validate a whole chain from genesis and return its final state.
///
/// Calling this twice on the same chain yields the same state; nothing is
/// cached between calls.
///
/// # Example
///
/// ```
/// use tally_ledger::block::Block;
/// use tally_ledger::chain::{check_chain, Chain};
/// use tally_ledger::transaction::Transaction;
///
/// let genesis = Block::genesis(vec![Transaction::from([("Tom", 10)])]).unwrap();
/// let chain = Chain::new(genesis);
/// assert_eq!(check_chain(&chain).unwrap().balance("Tom"), 10);
/// ```
pub fn check_chain(chain: &Chain) -> Result<LedgerState> {
    check_blocks(chain.blocks())
}

/// [`check_chain`] over a raw block slice.
///
/// # Errors
///
/// [`LedgerError::EmptyChain`] if `blocks` is empty, otherwise the first
/// rule violated by any block, tagged with that block's number.
pub fn check_blocks(blocks: &[Block]) -> Result<LedgerState> {
    let (genesis, rest) = blocks.split_first().ok_or(LedgerError::EmptyChain)?;

    let mut state = check_genesis(genesis).map_err(rejected)?;
    let mut parent = genesis;

    for block in rest {
        state = check_block_validity(block, parent, &state)?;
        parent = block;
    }

    debug!(
        blocks = blocks.len(),
        accounts = state.len(),
        tip = %parent.hash.short(),
        "chain validated"
    );
    Ok(state)
}

/// Validate `transactions` in order against `state`, folding each one in.
///
/// Errors carry `block_number` and the index of the failing transaction.
pub(crate) fn apply_batch(
    block_number: u64,
    transactions: &[Transaction],
    state: &LedgerState,
) -> Result<LedgerState> {
    let mut next = state.clone();
    for (index, tx) in transactions.iter().enumerate() {
        next = next
            .apply(tx)
            .map_err(|source| LedgerError::InvalidTransaction {
                block_number,
                index,
                source,
            })?;
    }
    Ok(next)
}

fn check_genesis(genesis: &Block) -> Result<LedgerState> {
    check_block_hash(genesis)?;

    if genesis.block_number() != GENESIS_BLOCK_NUMBER {
        return Err(LedgerError::Linkage {
            block_number: GENESIS_BLOCK_NUMBER,
            fault: LinkageFault::BlockNumber {
                expected: GENESIS_BLOCK_NUMBER,
                found: genesis.block_number(),
            },
        });
    }
    if let Some(found) = &genesis.contents.parent_hash {
        return Err(LedgerError::Linkage {
            block_number: GENESIS_BLOCK_NUMBER,
            fault: LinkageFault::GenesisParent {
                found: found.clone(),
            },
        });
    }
    check_transaction_count(genesis)?;

    let mut state = LedgerState::new();
    for (index, tx) in genesis.transactions().iter().enumerate() {
        state = state
            .fold(tx)
            .map_err(|source| LedgerError::InvalidTransaction {
                block_number: GENESIS_BLOCK_NUMBER,
                index,
                source,
            })?;
    }
    Ok(state)
}

fn check_linkage(block: &Block, parent: &Block) -> Result<()> {
    let expected = parent.successor_number()?;
    if block.block_number() != expected {
        return Err(LedgerError::Linkage {
            block_number: expected,
            fault: LinkageFault::BlockNumber {
                expected,
                found: block.block_number(),
            },
        });
    }

    match &block.contents.parent_hash {
        Some(declared) if *declared == parent.hash => Ok(()),
        found => Err(LedgerError::Linkage {
            block_number: expected,
            fault: LinkageFault::ParentHash {
                expected: parent.hash.clone(),
                found: found.clone(),
            },
        }),
    }
}

fn check_transaction_count(block: &Block) -> Result<()> {
    let actual = block.transactions().len();
    if block.contents.transaction_count != actual as u64 {
        return Err(LedgerError::TransactionCount {
            block_number: block.block_number(),
            declared: block.contents.transaction_count,
            actual,
        });
    }
    Ok(())
}

fn rejected(err: LedgerError) -> LedgerError {
    warn!(error = %err, "block rejected");
    err
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
