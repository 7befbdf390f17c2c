//! Appending to a chain.
//!
//! Both entry points take the current chain and state by reference and hand
//! back a new pair. On any failure nothing is returned but the error, so the
//! caller's chain and state remain the values of record.
//!
//! The flow for an append:
//!
//! 1. Validate each transaction against the running state and fold it in.
//! 2. Build a block on top of the current tip.
//! 3. Re-validate the whole candidate chain from genesis.
//! 4. Require the re-derived state to equal the incrementally folded one.
//!
//! Step 4 catches a caller passing a state that does not belong to the
//! chain; the append is refused instead of returning a mismatched pair.

use tracing::{debug, info};

use crate::block::Block;
use crate::error::{LedgerError, Result};
use crate::state::LedgerState;
use crate::transaction::Transaction;

use super::validate::{apply_batch, check_chain};
use super::Chain;

/// Append a block holding the single transaction `tx`.
///
/// # Errors
///
/// [`LedgerError::InvalidTransaction`] if `tx` is invalid against `state`,
/// tagged with the block number it would have received. Any error from
/// re-validating the extended chain, or
/// [`LedgerError::StateDivergence`] if `state` is not the chain's state.
///
/// # Example
///
/// ```
/// use tally_ledger::block::Block;
/// use tally_ledger::chain::{add_transaction, Chain};
/// use tally_ledger::state::LedgerState;
/// use tally_ledger::transaction::Transaction;
///
/// let chain = Chain::new(Block::genesis(vec![Transaction::from([("Tom", 10)])]).unwrap());
/// let state = LedgerState::from([("Tom", 10)]);
///
/// let tx = Transaction::transfer("Tom", "Medium", 1).unwrap();
/// let (state, chain) = add_transaction(&tx, &state, &chain).unwrap();
/// assert_eq!(chain.len(), 2);
/// assert_eq!(state, LedgerState::from([("Tom", 9), ("Medium", 1)]));
/// ```
pub fn add_transaction(
    tx: &Transaction,
    state: &LedgerState,
    chain: &Chain,
) -> Result<(LedgerState, Chain)> {
    add_block(vec![tx.clone()], state, chain)
}

/// Append a block holding `transactions`, applied in order.
///
/// Each transaction is checked against the state left by the ones before
/// it, so a batch may spend funds received earlier in the same batch. An
/// empty batch appends an empty block.
///
/// # Errors
///
/// As for [`add_transaction`]; the reported index is the position of the
/// first invalid transaction in the batch.
pub fn add_block(
    transactions: Vec<Transaction>,
    state: &LedgerState,
    chain: &Chain,
) -> Result<(LedgerState, Chain)> {
    let tip = chain.tip();
    let block_number = tip.successor_number()?;

    let next_state = apply_batch(block_number, &transactions, state).map_err(|err| {
        debug!(block_number, error = %err, "submission rejected");
        err
    })?;

    let block = Block::new(tip, transactions)?;
    let hash = block.hash.clone();
    let candidate = chain.appended(block);

    let derived = check_chain(&candidate)?;
    if derived != next_state {
        return Err(LedgerError::StateDivergence { block_number });
    }

    info!(
        block_number,
        transactions = candidate.tip().transactions().len(),
        hash = %hash.short(),
        "block appended"
    );
    Ok((next_state, candidate))
}
