//! # Tally Ledger
//!
//! A minimal append-only ledger: a chain of blocks, each carrying a batch of
//! balance transfers, whose validity is established by replaying every
//! transaction from genesis.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **codec**: Canonical byte encoding of anything that gets hashed.
//! - **hash**: SHA-256 content ids over that encoding.
//! - **transaction**: Account-to-delta maps.
//! - **state**: Balances, the transfer rules, and the pure fold.
//! - **block**: Block contents, construction, hash commitment.
//! - **chain**: Validation from genesis, appends, JSON load/export.
//! - **shared**: Lock-guarded handle for services that own a chain.
//! - **error**: The failure taxonomy.
//! - **config**: Constants.
//! - **logging**: `tracing` subscriber setup for embedders.
//!
//! ## Values, not places
//!
//! Chains and states are plain values. Every operation takes them by
//! reference and returns new ones, so an old chain or state is never
//! invalidated by a later append.
//!
//! ```
//! use tally_ledger::prelude::*;
//!
//! let genesis = Block::genesis(vec![Transaction::from([("Tom", 10)])])?;
//! let chain = Chain::new(genesis);
//! let state = check_chain(&chain)?;
//!
//! let tx = Transaction::from([("Tom", -1), ("Medium", 1)]);
//! let (state, chain) = add_transaction(&tx, &state, &chain)?;
//! assert_eq!(check_chain(&chain)?, state);
//! # Ok::<(), LedgerError>(())
//! ```

pub mod block;
pub mod chain;
pub mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod logging;
pub mod shared;
pub mod state;
pub mod transaction;

/// The types and functions most callers need.
pub mod prelude {
    pub use crate::block::{Block, BlockContents};
    pub use crate::chain::{
        add_block, add_transaction, check_block_hash, check_block_validity, check_chain,
        export_chain, load_and_check, load_chain, Chain,
    };
    pub use crate::error::{LedgerError, LinkageFault, TransactionError};
    pub use crate::hash::{content_id, ContentId};
    pub use crate::shared::{SharedLedger, Snapshot};
    pub use crate::state::LedgerState;
    pub use crate::transaction::{AccountId, Transaction};
}
