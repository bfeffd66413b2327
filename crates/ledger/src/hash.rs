//! Hash chain utilities for ledger integrity

use crate::block::LedgerBlock;
use chrono::SecondsFormat;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Serialize a JSON value with object keys sorted at every depth.
///
/// The digest must not depend on field insertion order, so this does not
/// rely on how `serde_json::Map` happens to be ordered in the build.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Calculate the SHA256 digest of a block (excluding the hash field itself).
///
/// Covers `{index, timestamp, data, prev_hash}` in canonical form.
pub fn calculate_block_hash(block: &LedgerBlock) -> Result<String, serde_json::Error> {
    let data = serde_json::to_value(&block.data)?;
    let content = serde_json::json!({
        "index": block.index,
        "timestamp": block.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        "data": data,
        "prev_hash": block.prev_hash,
    });

    let mut hasher = Sha256::new();
    hasher.update(canonical_json(&content).as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Verify hash chain integrity.
///
/// Returns the number of blocks checked. A non-empty chain must start with
/// the fixed genesis block, which is exempt from the digest rule; every later
/// block must link to its predecessor's stored hash and match its own
/// recomputed digest.
pub fn verify_chain(blocks: &[LedgerBlock]) -> Result<usize, ChainError> {
    if let Some(first) = blocks.first() {
        if !first.is_intact_genesis() {
            return Err(ChainError::InvalidGenesis);
        }
    }

    for (position, pair) in blocks.windows(2).enumerate() {
        let (prev, block) = (&pair[0], &pair[1]);
        let expected_index = position as u64 + 1;

        if block.index != expected_index {
            return Err(ChainError::IndexMismatch {
                expected: expected_index,
                actual: block.index,
            });
        }

        if block.prev_hash != prev.hash {
            return Err(ChainError::BrokenLink {
                index: block.index,
                expected: prev.hash.clone(),
                actual: block.prev_hash.clone(),
            });
        }

        let calculated = calculate_block_hash(block).map_err(|_| ChainError::Unhashable {
            index: block.index,
        })?;
        if block.hash != calculated {
            return Err(ChainError::InvalidHash {
                index: block.index,
                expected: calculated,
                actual: block.hash.clone(),
            });
        }
    }

    Ok(blocks.len())
}

/// Errors in hash chain verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    BrokenLink {
        index: u64,
        expected: String,
        actual: String,
    },
    InvalidHash {
        index: u64,
        expected: String,
        actual: String,
    },
    IndexMismatch {
        expected: u64,
        actual: u64,
    },
    Unhashable {
        index: u64,
    },
    /// First block is not the genesis sentinel
    InvalidGenesis,
}

impl ChainError {
    /// Chain position of the first failing block
    pub fn index(&self) -> u64 {
        match self {
            ChainError::BrokenLink { index, .. }
            | ChainError::InvalidHash { index, .. }
            | ChainError::Unhashable { index } => *index,
            ChainError::IndexMismatch { expected, .. } => *expected,
            ChainError::InvalidGenesis => 0,
        }
    }
}

impl std::fmt::Display for ChainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainError::BrokenLink {
                index,
                expected,
                actual,
            } => write!(
                f,
                "Broken link at block {}: expected prev_hash '{}', got '{}'",
                index, expected, actual
            ),
            ChainError::InvalidHash {
                index,
                expected,
                actual,
            } => write!(
                f,
                "Invalid hash at block {}: expected '{}', got '{}'",
                index, expected, actual
            ),
            ChainError::IndexMismatch { expected, actual } => {
                write!(f, "Invalid index: expected {}, got {}", expected, actual)
            }
            ChainError::Unhashable { index } => {
                write!(f, "Block {} payload cannot be serialized", index)
            }
            ChainError::InvalidGenesis => write!(f, "Block 0 is not the genesis block"),
        }
    }
}

impl std::error::Error for ChainError {}
