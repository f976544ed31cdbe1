//! Block implementation for the ledger
//!
//! A block commits to its transactions through a merkle root and to its
//! predecessor through `previous_hash`; its own hash is found by proof of work.

use crate::core::ledger::LedgerState;
use crate::core::transaction::{Transaction, TransactionError};
use crate::crypto::{calculate_merkle_root, meets_difficulty, sha256_hex, Hash, EMPTY_MERKLE_ROOT};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// `previous_hash` marking the first block of a chain
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Nonce attempts between checks of the cancellation flag
const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// Block errors
#[derive(Error, Debug)]
pub enum BlockError {
    #[error("Transaction rejected: {0}")]
    Rejected(#[from] TransactionError),
    #[error("Mining cancelled after {0} attempts")]
    Cancelled(u64),
}

/// A block in the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Block hash (valid once mined)
    pub hash: Hash,
    /// Hash of the previous block
    pub previous_hash: Hash,
    /// Merkle root of the transaction ids, set when mining
    pub merkle_root: Hash,
    pub transactions: Vec<Transaction>,
    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Nonce used for proof of work
    pub nonce: u64,
}

impl Block {
    /// Create a new, unmined block on top of `previous_hash`
    pub fn new(previous_hash: impl Into<Hash>) -> Self {
        let mut block = Self {
            hash: String::new(),
            previous_hash: previous_hash.into(),
            merkle_root: EMPTY_MERKLE_ROOT.to_string(),
            transactions: Vec::new(),
            timestamp: Utc::now().timestamp_millis(),
            nonce: 0,
        };
        block.hash = block.calculate_hash();
        block
    }

    /// Create the first block of a chain
    pub fn genesis() -> Self {
        Self::new(GENESIS_PREVIOUS_HASH)
    }

    pub fn is_genesis(&self) -> bool {
        self.previous_hash == GENESIS_PREVIOUS_HASH
    }

    /// Calculate the block hash from the current fields
    pub fn calculate_hash(&self) -> Hash {
        let data = format!(
            "{}{}{}{}",
            self.previous_hash, self.timestamp, self.nonce, self.merkle_root
        );
        sha256_hex(data.as_bytes())
    }

    /// Merkle root over the ids of the block's transactions
    pub fn calculate_merkle_root(&self) -> Hash {
        let ids: Vec<&str> = self
            .transactions
            .iter()
            .map(|tx| tx.id().unwrap_or_default())
            .collect();
        calculate_merkle_root(&ids)
    }

    /// Add a transaction to the block
    ///
    /// Outside the genesis block the transaction must process successfully
    /// against `ledger`; a rejected transaction is not added. Genesis
    /// transactions are appended as-is.
    pub fn add_transaction(
        &mut self,
        mut transaction: Transaction,
        ledger: &mut LedgerState,
    ) -> Result<(), BlockError> {
        if !self.is_genesis() {
            if let Err(e) = transaction.process(ledger) {
                log::warn!("Transaction failed to process: {}", e);
                return Err(e.into());
            }
        }

        self.transactions.push(transaction);
        log::info!("Transaction successfully added to block");
        Ok(())
    }

    /// Mine the block (find a nonce whose hash meets `difficulty`)
    ///
    /// Returns the number of hashes computed. The search has no upper bound.
    pub fn mine(&mut self, difficulty: usize) -> u64 {
        self.merkle_root = self.calculate_merkle_root();
        self.hash = self.calculate_hash();

        let mut attempts = 0u64;
        while !meets_difficulty(&self.hash, difficulty) {
            self.nonce += 1;
            self.hash = self.calculate_hash();
            attempts += 1;
        }

        log::info!("Block Mined!!! : {}", self.hash);
        attempts
    }

    /// Mine the block, giving up once `cancel` is set
    pub fn mine_with_cancel(
        &mut self,
        difficulty: usize,
        cancel: &AtomicBool,
    ) -> Result<u64, BlockError> {
        self.merkle_root = self.calculate_merkle_root();
        self.hash = self.calculate_hash();

        let mut attempts = 0u64;
        while !meets_difficulty(&self.hash, difficulty) {
            if attempts % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                log::info!("Mining cancelled after {} attempts", attempts);
                return Err(BlockError::Cancelled(attempts));
            }
            self.nonce += 1;
            self.hash = self.calculate_hash();
            attempts += 1;
        }

        log::info!("Block Mined!!! : {}", self.hash);
        Ok(attempts)
    }

    /// Check the stored hash against the difficulty target
    pub fn is_valid_pow(&self, difficulty: usize) -> bool {
        meets_difficulty(&self.hash, difficulty)
    }

    /// Verify the stored hash matches the block's fields
    pub fn verify_hash(&self) -> bool {
        self.hash == self.calculate_hash()
    }

    /// Verify the stored merkle root matches the transactions
    pub fn verify_merkle_root(&self) -> bool {
        self.merkle_root == self.calculate_merkle_root()
    }

    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}
