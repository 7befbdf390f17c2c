//! # Ledger Constants
//!
//! Every fixed parameter of the ledger lives here. The encoding constants
//! in particular are part of the hash commitment: change one and every
//! previously issued content id stops verifying.

// ---------------------------------------------------------------------------
// Content Ids
// ---------------------------------------------------------------------------

/// Digest algorithm behind every [`crate::hash::ContentId`].
pub const HASH_ALGORITHM: &str = "SHA-256";

/// Digest length in bytes.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Length of a content id once hex-encoded.
pub const CONTENT_ID_HEX_LENGTH: usize = HASH_OUTPUT_LENGTH * 2;

// ---------------------------------------------------------------------------
// Canonical Encoding
// ---------------------------------------------------------------------------

/// Written between consecutive array elements and object entries.
pub const ITEM_SEPARATOR: &[u8] = b", ";

/// Written between an object key and its value.
pub const KEY_SEPARATOR: &[u8] = b": ";

// ---------------------------------------------------------------------------
// Chain Shape
// ---------------------------------------------------------------------------

/// Block number carried by every genesis block.
pub const GENESIS_BLOCK_NUMBER: u64 = 0;

/// Upper bound on the size of a serialized chain accepted by
/// [`crate::chain::loader::load_chain`]. 64 MiB keeps a hostile input from
/// ballooning into an unbounded `serde_json::Value` tree.
pub const MAX_CHAIN_INPUT_BYTES: usize = 64 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Filter used by [`crate::logging::init_logging`] when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "tally_ledger=info";
