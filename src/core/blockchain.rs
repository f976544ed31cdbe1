//! Blockchain implementation
//!
//! The append-only chain of mined blocks, rooted in a genesis block that
//! carries the transaction seeding the ledger.

use crate::core::block::{Block, BlockError};
use crate::core::ledger::LedgerState;
use crate::core::transaction::{Transaction, UnspentOutput};
use crate::core::validation::{is_valid_chain, validate_chain, ValidationError};
use crate::crypto::{meets_difficulty, Hash};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use thiserror::Error;

/// Default mining difficulty (number of leading zero hex characters)
pub const DEFAULT_DIFFICULTY: usize = 3;

/// Blockchain-related errors
#[derive(Error, Debug)]
pub enum BlockchainError {
    #[error("Block error: {0}")]
    Block(#[from] BlockError),
    #[error("Genesis transaction has no output")]
    EmptyGenesis,
    #[error("Block does not extend the chain: expected previous hash {expected}, got {found}")]
    PreviousHashMismatch { expected: Hash, found: Hash },
    #[error("Block hash {0} does not meet the chain difficulty")]
    InvalidProofOfWork(Hash),
}

/// The main blockchain structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blockchain {
    /// The chain of blocks, genesis first
    pub blocks: Vec<Block>,
    /// Mining difficulty
    pub difficulty: usize,
    /// The output minted by the genesis transaction
    genesis_output: UnspentOutput,
}

impl Blockchain {
    /// Create a chain whose genesis block carries `genesis`
    ///
    /// The genesis output is seeded into `ledger` and the genesis block is
    /// mined at `difficulty`.
    pub fn new(
        difficulty: usize,
        genesis: Transaction,
        ledger: &mut LedgerState,
    ) -> Result<Self, BlockchainError> {
        let genesis_output = ledger.seed(&genesis).ok_or(BlockchainError::EmptyGenesis)?;

        let mut block = Block::genesis();
        block.add_transaction(genesis, ledger)?;
        log::info!("Mining genesis block with difficulty {}...", difficulty);
        block.mine(difficulty);

        Ok(Self {
            blocks: vec![block],
            difficulty,
            genesis_output,
        })
    }

    pub fn genesis_output(&self) -> &UnspentOutput {
        &self.genesis_output
    }

    pub fn latest_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Hash the next block must link to
    pub fn latest_hash(&self) -> &str {
        self.latest_block().map(|b| b.hash.as_str()).unwrap_or_default()
    }

    /// Get a block by index
    pub fn get_block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Number of blocks after genesis
    pub fn height(&self) -> usize {
        self.blocks.len().saturating_sub(1)
    }

    /// Start a new, empty block on top of the chain
    pub fn next_block(&self) -> Block {
        Block::new(self.latest_hash())
    }

    /// Mine `block` and append it to the chain
    pub fn add_block(&mut self, mut block: Block) -> Result<u64, BlockchainError> {
        self.check_link(&block)?;
        let attempts = block.mine(self.difficulty);
        self.blocks.push(block);
        Ok(attempts)
    }

    /// Mine `block` and append it, unless `cancel` is set first
    pub fn add_block_with_cancel(
        &mut self,
        mut block: Block,
        cancel: &AtomicBool,
    ) -> Result<u64, BlockchainError> {
        self.check_link(&block)?;
        let attempts = block.mine_with_cancel(self.difficulty, cancel)?;
        self.blocks.push(block);
        Ok(attempts)
    }

    /// Append a block that has already been mined
    pub fn append_mined(&mut self, block: Block) -> Result<(), BlockchainError> {
        self.check_link(&block)?;
        if !block.verify_hash() || !meets_difficulty(&block.hash, self.difficulty) {
            return Err(BlockchainError::InvalidProofOfWork(block.hash));
        }
        self.blocks.push(block);
        Ok(())
    }

    fn check_link(&self, block: &Block) -> Result<(), BlockchainError> {
        let expected = self.latest_hash();
        if block.previous_hash != expected {
            return Err(BlockchainError::PreviousHashMismatch {
                expected: expected.to_string(),
                found: block.previous_hash.clone(),
            });
        }
        Ok(())
    }

    /// Replay the whole chain, reporting the first violation
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_chain(&self.blocks, &self.genesis_output, self.difficulty)
    }

    /// Validate the entire chain
    pub fn is_valid(&self) -> bool {
        is_valid_chain(&self.blocks, &self.genesis_output, self.difficulty)
    }

    /// Get chain statistics
    pub fn stats(&self) -> ChainStats {
        ChainStats {
            height: self.height(),
            total_blocks: self.blocks.len(),
            total_transactions: self.blocks.iter().map(Block::tx_count).sum(),
            difficulty: self.difficulty,
            latest_hash: self.latest_hash().to_string(),
        }
    }
}

/// Chain statistics
#[derive(Debug, Clone)]
pub struct ChainStats {
    pub height: usize,
    pub total_blocks: usize,
    pub total_transactions: usize,
    pub difficulty: usize,
    pub latest_hash: Hash,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::wallet::Wallet;

    fn new_chain(difficulty: usize) -> (Blockchain, LedgerState, Wallet) {
        let coinbase = KeyPair::generate();
        let wallet = Wallet::new();
        let genesis = Transaction::genesis(&coinbase, wallet.public_key(), 100.0).unwrap();
        let mut ledger = LedgerState::new();
        let chain = Blockchain::new(difficulty, genesis, &mut ledger).unwrap();
        (chain, ledger, wallet)
    }

    #[test]
    fn test_new_blockchain() {
        let (chain, ledger, wallet) = new_chain(2);
        assert_eq!(chain.blocks.len(), 1);
        assert_eq!(chain.height(), 0);
        assert!(chain.blocks[0].is_genesis());
        assert!(chain.blocks[0].is_valid_pow(2));
        assert_eq!(ledger.balance_of(&wallet.public_key()), 100.0);
        assert!(chain.is_valid());
    }

    #[test]
    fn test_add_block() {
        let (mut chain, mut ledger, mut wallet) = new_chain(2);
        let receiver = Wallet::new();

        let mut block = chain.next_block();
        let tx = wallet.send_funds(&ledger, &receiver.public_key(), 40.0).unwrap();
        block.add_transaction(tx, &mut ledger).unwrap();
        chain.add_block(block).unwrap();

        assert_eq!(chain.height(), 1);
        assert!(chain.blocks[1].hash.starts_with("00"));
        assert_eq!(chain.blocks[1].previous_hash, chain.blocks[0].hash);
        assert!(chain.is_valid());

        let stats = chain.stats();
        assert_eq!(stats.total_blocks, 2);
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(stats.latest_hash, chain.blocks[1].hash);
    }

    #[test]
    fn test_block_with_wrong_parent_rejected() {
        let (mut chain, _, _) = new_chain(1);
        let block = Block::new("not the tip");
        assert!(matches!(
            chain.add_block(block),
            Err(BlockchainError::PreviousHashMismatch { .. })
        ));
        assert_eq!(chain.blocks.len(), 1);
    }

    #[test]
    fn test_append_mined_requires_pow() {
        let (mut chain, _, _) = new_chain(2);
        let mut unmined = chain.next_block();
        while unmined.hash.starts_with("00") {
            unmined.nonce += 1;
            unmined.hash = unmined.calculate_hash();
        }
        assert!(matches!(
            chain.append_mined(unmined),
            Err(BlockchainError::InvalidProofOfWork(_))
        ));
        assert_eq!(chain.height(), 0);

        let mut mined = chain.next_block();
        mined.mine(2);
        chain.append_mined(mined).unwrap();
        assert_eq!(chain.height(), 1);
    }

    #[test]
    fn test_add_block_with_cancel() {
        let (mut chain, _, _) = new_chain(1);
        let cancel = AtomicBool::new(false);
        chain.add_block_with_cancel(chain.next_block(), &cancel).unwrap();
        assert_eq!(chain.height(), 1);
    }
}
