//! Wallet implementation for the ledger
//!
//! A wallet holds a key pair and a local cache of the outputs it believes it
//! owns. The cache is refreshed from the ledger whenever the balance is read
//! and is the pool that `send_funds` selects inputs from.

use crate::core::{LedgerState, Transaction, TransactionError, TransactionInput, UnspentOutput};
use crate::crypto::{Hash, KeyPair, SigningError};
use secp256k1::PublicKey;
use std::collections::HashSet;
use thiserror::Error;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: f64, need: f64 },
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] SigningError),
}

/// A ledger wallet for managing keys and creating transactions
pub struct Wallet {
    /// The key pair for signing transactions
    key_pair: KeyPair,
    /// Outputs this wallet tracks, in the order they were first seen
    tracked: Vec<UnspentOutput>,
    /// Ids of the entries in `tracked`
    tracked_ids: HashSet<Hash>,
    /// Optional label for the wallet
    pub label: Option<String>,
}

impl Wallet {
    /// Create a new wallet with a fresh key pair
    pub fn new() -> Self {
        Self::from_key_pair(KeyPair::generate())
    }

    /// Create a wallet with a label
    pub fn with_label(label: &str) -> Self {
        let mut wallet = Self::new();
        wallet.label = Some(label.to_string());
        wallet
    }

    pub fn from_key_pair(key_pair: KeyPair) -> Self {
        Self {
            key_pair,
            tracked: Vec::new(),
            tracked_ids: HashSet::new(),
            label: None,
        }
    }

    /// Import a wallet from a private key
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, WalletError> {
        Ok(Self::from_key_pair(KeyPair::from_private_key_hex(
            private_key_hex,
        )?))
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn public_key(&self) -> PublicKey {
        self.key_pair.public_key
    }

    /// Get the wallet's display address
    pub fn address(&self) -> String {
        self.key_pair.address()
    }

    /// Label if set, otherwise the address
    pub fn name(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.address())
    }

    /// Outputs currently tracked for spending
    pub fn tracked_outputs(&self) -> &[UnspentOutput] {
        &self.tracked
    }

    /// Sum of the ledger's unspent outputs owned by this wallet
    ///
    /// Every owned output is also added to the tracked cache if not already
    /// present, so this call is not free of side effects.
    pub fn balance(&mut self, ledger: &LedgerState) -> f64 {
        let owner = self.public_key();
        let mut total = 0.0;

        for output in ledger.outputs_owned_by(&owner) {
            if self.tracked_ids.insert(output.id.clone()) {
                self.tracked.push(output.clone());
            }
            total += output.value;
        }

        total
    }

    /// Build and sign a transaction sending `value` to `receiver`
    ///
    /// Tracked outputs are taken in order until their total exceeds `value`.
    /// They leave the tracked cache immediately; the ledger only drops them
    /// once the transaction is processed.
    pub fn send_funds(
        &mut self,
        ledger: &LedgerState,
        receiver: &PublicKey,
        value: f64,
    ) -> Result<Transaction, WalletError> {
        let balance = self.balance(ledger);
        if balance < value {
            log::warn!("Not enough funds for transaction: have {}, need {}", balance, value);
            return Err(WalletError::InsufficientFunds {
                have: balance,
                need: value,
            });
        }

        let mut selected = 0;
        let mut total = 0.0;
        for output in &self.tracked {
            total += output.value;
            selected += 1;
            if total > value {
                break;
            }
        }

        let inputs: Vec<TransactionInput> = self.tracked[..selected]
            .iter()
            .map(|output| TransactionInput::new(output.id.clone()))
            .collect();

        let mut transaction = Transaction::new(self.public_key(), *receiver, value, inputs);
        transaction.sign(&self.key_pair)?;

        for spent in self.tracked.drain(..selected) {
            self.tracked_ids.remove(&spent.id);
        }
        Ok(transaction)
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}
