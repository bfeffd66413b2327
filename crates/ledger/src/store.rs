//! JSONL ledger store - single-writer, append-only
//!
//! One block per line. The file is the chain: `verify` re-reads it and
//! recomputes every digest from the stored fields, never from cached state.

use crate::block::{BlockData, LedgerBlock, OutcomeRecord, OutcomeStatus};
use crate::error::LedgerError;
use crate::hash::{calculate_block_hash, verify_chain};
use efrn_core::{Clock, EmployeeId, SystemClock};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Index and hash of the last block on disk
type Tip = (u64, String);

/// Result of an integrity walk over the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    pub valid: bool,
    /// Number of blocks read from storage
    pub blocks: usize,
    /// First block that failed verification
    pub failed_index: Option<u64>,
    pub explanation: String,
}

impl VerifyReport {
    fn ok(blocks: usize) -> Self {
        Self {
            valid: true,
            blocks,
            failed_index: None,
            explanation: "Ledger verified successfully.".to_string(),
        }
    }

    fn failed(blocks: usize, index: u64) -> Self {
        Self {
            valid: false,
            blocks,
            failed_index: Some(index),
            explanation: format!("Block {} integrity check failed!", index),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Append-only hash-chained ledger backed by a JSONL file
///
/// All appends go through `tip`, so concurrent callers receive consecutive
/// indices and each new block links to the block written just before it.
pub struct LedgerStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    tip: Mutex<Option<Tip>>,
}

impl LedgerStore {
    /// Open (or prepare) a ledger at the given file path
    pub fn new(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    /// Open a ledger that stamps blocks with the given clock
    pub fn with_clock(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(Self {
            path,
            clock,
            tip: Mutex::new(None),
        })
    }

    /// Path to the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an outcome as a new block.
    ///
    /// Writes the genesis block first if the ledger is empty. The block is
    /// synced to disk before it is returned.
    pub fn append(&self, record: OutcomeRecord) -> Result<LedgerBlock, LedgerError> {
        let mut tip = self.tip.lock().map_err(|_| LedgerError::LockPoisoned)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let (last_index, last_hash) = match tip.take() {
            Some(t) => t,
            None => match self.load_tip()? {
                Some(t) => t,
                None => {
                    let genesis = LedgerBlock::genesis(self.clock.now());
                    write_block(&mut file, &genesis)?;
                    debug!(path = %self.path.display(), "Initialized ledger with genesis block");
                    (genesis.index, genesis.hash)
                }
            },
        };

        let mut block = LedgerBlock {
            index: last_index + 1,
            timestamp: self.clock.now(),
            data: BlockData::Outcome(record),
            prev_hash: last_hash,
            hash: String::new(),
        };
        block.hash = calculate_block_hash(&block)?;

        if let Err(e) = write_block(&mut file, &block) {
            // Disk state is unknown; reload the tip on the next append
            *tip = None;
            return Err(e);
        }
        *tip = Some((block.index, block.hash.clone()));

        if let Some(outcome) = block.outcome() {
            info!(
                index = block.index,
                transaction_id = %outcome.transaction_id,
                employee = %outcome.employee,
                status = %outcome.status,
                "Appended ledger block"
            );
        }

        Ok(block)
    }

    /// Read every block in file order
    pub fn read_all(&self) -> Result<Vec<LedgerBlock>, LedgerError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut blocks = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let block: LedgerBlock =
                serde_json::from_str(&line).map_err(|e| LedgerError::Corrupt {
                    line: i + 1,
                    reason: e.to_string(),
                })?;
            blocks.push(block);
        }

        Ok(blocks)
    }

    /// The last `limit` outcome blocks, most recent last.
    ///
    /// Genesis and other sentinel entries are excluded.
    pub fn recent(&self, limit: usize) -> Result<Vec<LedgerBlock>, LedgerError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut outcomes: Vec<LedgerBlock> = self
            .read_all()?
            .into_iter()
            .filter(|b| b.outcome().is_some())
            .collect();

        let skip = outcomes.len().saturating_sub(limit);
        Ok(outcomes.split_off(skip))
    }

    /// Most recent rejected outcome for an employee
    pub fn last_rejected(&self, employee: &EmployeeId) -> Result<Option<OutcomeRecord>, LedgerError> {
        let found = self.read_all()?.into_iter().rev().find_map(|b| match b.data {
            BlockData::Outcome(record)
                if record.status == OutcomeStatus::Rejected && &record.employee == employee =>
            {
                Some(record)
            }
            _ => None,
        });
        Ok(found)
    }

    /// Walk the chain from index 1 and report the first failing block.
    ///
    /// Read-only. An empty or genesis-only ledger is valid. A line that no
    /// longer parses counts as a failure at that position.
    pub fn verify(&self) -> Result<VerifyReport, LedgerError> {
        let blocks = match self.read_all() {
            Ok(blocks) => blocks,
            Err(LedgerError::Corrupt { line, .. }) => {
                let position = self.nonblank_position(line)?;
                return Ok(VerifyReport::failed(position as usize, position));
            }
            Err(e) => return Err(e),
        };

        match verify_chain(&blocks) {
            Ok(count) => Ok(VerifyReport::ok(count)),
            Err(e) => {
                debug!(error = %e, "Ledger verification failed");
                Ok(VerifyReport::failed(blocks.len(), e.index()))
            }
        }
    }

    /// Number of blocks on disk, genesis included
    pub fn block_count(&self) -> Result<usize, LedgerError> {
        Ok(self.read_all()?.len())
    }

    fn load_tip(&self) -> Result<Option<Tip>, LedgerError> {
        Ok(self.read_all()?.pop().map(|b| (b.index, b.hash)))
    }

    /// Chain position of a 1-based file line, skipping blank lines
    fn nonblank_position(&self, line: usize) -> Result<u64, LedgerError> {
        let file = File::open(&self.path)?;
        let mut position = 0u64;
        for (i, l) in BufReader::new(file).lines().enumerate() {
            if i + 1 >= line {
                break;
            }
            if !l?.trim().is_empty() {
                position += 1;
            }
        }
        Ok(position)
    }
}

fn write_block(file: &mut File, block: &LedgerBlock) -> Result<(), LedgerError> {
    let mut json = serde_json::to_string(block)?;
    json.push('\n');
    rollback_on_error(file, |f| {
        f.write_all(json.as_bytes())?;
        f.flush()?;
        f.sync_data()
    })?;
    Ok(())
}

/// Run `write`, truncating the file back to its prior length if it fails,
/// so a torn line never stays behind.
fn rollback_on_error<F>(file: &mut File, write: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let len = file.metadata()?.len();
    if let Err(e) = write(file) {
        if let Err(undo) = file.set_len(len) {
            warn!(error = %undo, len, "Could not truncate partial ledger write");
        }
        return Err(e);
    }
    Ok(())
}
