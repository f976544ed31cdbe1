//! powledger: a single-node proof-of-work ledger in Rust
//!
//! This crate models the core mechanics of an unspent-output ledger:
//! - SHA-256 digests and a sliding-window merkle root over transaction ids
//! - ECDSA signatures (secp256k1) authenticating every transfer
//! - Transactions that consume unspent outputs and mint receiver/change outputs
//! - Blocks sealed by brute-force proof of work
//! - Full-replay chain validation detecting tampering and double spends
//! - Wallets tracking their spendable outputs
//!
//! # Example
//!
//! ```rust
//! use powledger::core::{Blockchain, LedgerState, Transaction};
//! use powledger::crypto::KeyPair;
//! use powledger::wallet::Wallet;
//!
//! let coinbase = KeyPair::generate();
//! let mut alice = Wallet::new();
//! let bob = Wallet::new();
//!
//! // Seed the ledger with 100 coins for alice
//! let genesis = Transaction::genesis(&coinbase, alice.public_key(), 100.0).unwrap();
//! let mut ledger = LedgerState::new();
//! let mut chain = Blockchain::new(2, genesis, &mut ledger).unwrap();
//!
//! // Alice pays bob 30 in the next block
//! let mut block = chain.next_block();
//! let tx = alice.send_funds(&ledger, &bob.public_key(), 30.0).unwrap();
//! block.add_transaction(tx, &mut ledger).unwrap();
//! chain.add_block(block).unwrap();
//!
//! assert!(chain.is_valid());
//! assert_eq!(alice.balance(&ledger), 70.0);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod mining;
pub mod wallet;

// Re-export commonly used types
pub use crate::config::LedgerConfig;
pub use crate::core::{
    Block, Blockchain, LedgerState, SharedLedger, Transaction, TransactionInput, UnspentOutput,
    ValidationError, DEFAULT_DIFFICULTY, MINIMUM_TRANSACTION,
};
pub use crate::crypto::KeyPair;
pub use crate::mining::{Miner, MiningStats};
pub use crate::wallet::Wallet;
