//! Mining engine for the ledger
//!
//! Wraps the proof-of-work search with timing statistics and an optional
//! cancellation flag that another thread can raise to stop a long search.

use crate::core::{Block, Blockchain, BlockchainError};
use crate::crypto::Hash;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Mining statistics
#[derive(Debug, Clone)]
pub struct MiningStats {
    /// Hash of the mined block
    pub hash: Hash,
    /// Number of hash attempts
    pub hash_attempts: u64,
    /// Time taken in milliseconds
    pub time_ms: u128,
    /// Hash rate (hashes per second)
    pub hash_rate: f64,
}

/// Miner for sealing blocks onto a chain
#[derive(Debug, Clone, Default)]
pub struct Miner {
    cancel: Arc<AtomicBool>,
}

impl Miner {
    /// Create a new miner
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a miner that stops when `cancel` is set
    pub fn with_cancel_flag(cancel: Arc<AtomicBool>) -> Self {
        Self { cancel }
    }

    /// Handle that stops any search in progress when set
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Mine `block` at the chain's difficulty and append it
    pub fn mine_block(
        &self,
        blockchain: &mut Blockchain,
        block: Block,
    ) -> Result<MiningStats, BlockchainError> {
        let start = Instant::now();

        info!(
            "Mining block {} ({} transactions) with difficulty {}...",
            blockchain.blocks.len(),
            block.tx_count(),
            blockchain.difficulty
        );

        let attempts = blockchain.add_block_with_cancel(block, &self.cancel)?;

        let elapsed = start.elapsed().as_millis();
        let hash_rate = if elapsed > 0 {
            (attempts as f64) / (elapsed as f64 / 1000.0)
        } else {
            attempts as f64
        };

        let hash = blockchain.latest_hash().to_string();

        info!(
            "Block {} mined in {}ms ({} attempts, {:.2} H/s)",
            blockchain.height(),
            elapsed,
            attempts,
            hash_rate
        );

        Ok(MiningStats {
            hash,
            hash_attempts: attempts,
            time_ms: elapsed,
            hash_rate,
        })
    }
}
