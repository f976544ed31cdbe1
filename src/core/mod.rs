//! Core ledger components
//!
//! This module contains the fundamental building blocks:
//! - Ledger state (unspent outputs and transaction sequencing)
//! - Transactions (signed transfers consuming and minting outputs)
//! - Blocks (merkle commitment and proof of work)
//! - Blockchain (append-only chain rooted in a genesis block)
//! - Validation (full replay of a chain from its genesis output)

pub mod block;
pub mod blockchain;
pub mod ledger;
pub mod transaction;
pub mod validation;

pub use block::{Block, BlockError, GENESIS_PREVIOUS_HASH};
pub use blockchain::{Blockchain, BlockchainError, ChainStats, DEFAULT_DIFFICULTY};
pub use ledger::{LedgerState, SharedLedger, MINIMUM_TRANSACTION};
pub use transaction::{
    Transaction, TransactionError, TransactionInput, UnspentOutput, GENESIS_TRANSACTION_ID,
};
pub use validation::{is_valid_chain, validate_chain, ValidationError};
