//! EFRN Ledger - Hash-chained outcome log (the "PLR")
//!
//! Every terminal transaction outcome is appended here as an immutable block.
//! The chain on disk is the single source of truth: each block's hash is
//! recomputed from its own stored fields and `prev_hash` during verification.
//!
//! # Key Types
//! - `LedgerBlock`: One hash-linked record
//! - `OutcomeRecord`: The transaction payload carried by a block
//! - `LedgerStore`: Single-writer JSONL store with append / recent / verify

pub mod block;
pub mod error;
pub mod hash;
pub mod store;

pub use block::{
    genesis_hash, BlockData, LedgerBlock, OutcomeRecord, OutcomeStatus, GENESIS_DATA, GENESIS_PREV_HASH,
};
pub use error::LedgerError;
pub use hash::{calculate_block_hash, verify_chain, ChainError};
pub use store::{LedgerStore, VerifyReport};
