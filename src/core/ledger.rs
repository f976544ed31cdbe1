//! Ledger state shared by transaction processing, wallets and mining
//!
//! `LedgerState` owns the unspent-output set and the sequence counter used to
//! derive transaction ids. It is passed explicitly to every operation that
//! reads or mutates it. [`SharedLedger`] adds a lock for callers that process
//! transactions from more than one thread.

use crate::core::transaction::{Transaction, TransactionError, UnspentOutput};
use crate::crypto::{same_key, Hash};
use parking_lot::{Mutex, MutexGuard};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Smallest input total a transaction may spend
pub const MINIMUM_TRANSACTION: f64 = 0.1;

/// Unspent outputs and transaction sequencing for a single ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerState {
    /// Unspent outputs by output id
    utxos: BTreeMap<Hash, UnspentOutput>,
    /// Number of transactions processed so far
    sequence: u64,
    /// Minimum input total accepted by `Transaction::process`
    minimum_transaction: f64,
}

impl LedgerState {
    /// Create an empty ledger with the default minimum transaction value
    pub fn new() -> Self {
        Self::with_minimum(MINIMUM_TRANSACTION)
    }

    /// Create an empty ledger with a custom minimum transaction value
    pub fn with_minimum(minimum_transaction: f64) -> Self {
        Self {
            utxos: BTreeMap::new(),
            sequence: 0,
            minimum_transaction,
        }
    }

    /// Seed the ledger with the first output of the genesis transaction
    ///
    /// Returns the seeded output, or `None` if the transaction has no outputs.
    pub fn seed(&mut self, genesis: &Transaction) -> Option<UnspentOutput> {
        let output = genesis.outputs().first()?.clone();
        log::debug!("Seeding ledger with genesis output {}", output.id);
        self.insert(output.clone());
        Some(output)
    }

    pub fn minimum_transaction(&self) -> f64 {
        self.minimum_transaction
    }

    /// Number of transaction ids handed out so far
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Advance the sequence counter and return the new value
    pub(crate) fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    pub fn get(&self, id: &str) -> Option<&UnspentOutput> {
        self.utxos.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.utxos.contains_key(id)
    }

    pub fn insert(&mut self, output: UnspentOutput) {
        self.utxos.insert(output.id.clone(), output);
    }

    pub fn remove(&mut self, id: &str) -> Option<UnspentOutput> {
        self.utxos.remove(id)
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Iterate over every unspent output, ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &UnspentOutput> {
        self.utxos.values()
    }

    /// Unspent outputs owned by `owner`
    pub fn outputs_owned_by<'a>(
        &'a self,
        owner: &'a PublicKey,
    ) -> impl Iterator<Item = &'a UnspentOutput> + 'a {
        self.utxos.values().filter(move |o| same_key(&o.owner, owner))
    }

    /// Sum of every unspent output owned by `owner`
    pub fn balance_of(&self, owner: &PublicKey) -> f64 {
        self.outputs_owned_by(owner).map(|o| o.value).sum()
    }

    /// Total value held across all unspent outputs
    pub fn total_value(&self) -> f64 {
        self.utxos.values().map(|o| o.value).sum()
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}

/// A ledger that can be shared across threads
///
/// Every mutation runs under one lock acquisition, so resolving, consuming
/// and minting outputs for a transaction is a single atomic step.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<LedgerState>>,
}

impl SharedLedger {
    pub fn new(state: LedgerState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Process a transaction against the shared state
    pub fn process(&self, transaction: &mut Transaction) -> Result<(), TransactionError> {
        transaction.process(&mut self.inner.lock())
    }

    /// Lock the state for a longer sequence of operations (e.g. assembling a block)
    pub fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.inner.lock()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> LedgerState {
        self.inner.lock().clone()
    }
}
