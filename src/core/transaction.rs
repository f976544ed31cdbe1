//! Transaction handling for the ledger
//!
//! A transaction moves `value` from `sender` to `receiver` by consuming
//! previously unspent outputs (its inputs) and minting exactly two new
//! outputs: the amount for the receiver and the change for the sender.
//! Ids are assigned when the transaction is processed against a
//! [`LedgerState`], not when it is built.

use crate::core::ledger::LedgerState;
use crate::crypto::{public_key_hex, same_key, sha256_hex, verify_signature, Hash, KeyPair, SigningError};
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Id given to the genesis transaction, which is never processed
pub const GENESIS_TRANSACTION_ID: &str = "0";

// =============================================================================
// Error Types
// =============================================================================

/// Transaction-related errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Transaction inputs too small: {value} (minimum {minimum})")]
    BelowMinimumValue { value: f64, minimum: f64 },
    #[error("Signing failed: {0}")]
    Signing(#[from] SigningError),
}

// =============================================================================
// Unspent Output
// =============================================================================

/// An output of a processed transaction, spendable by `owner`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnspentOutput {
    /// Content hash of (owner, value, parent transaction id)
    pub id: Hash,
    /// Public key allowed to spend this output
    pub owner: PublicKey,
    pub value: f64,
    /// Id of the transaction that created this output
    pub parent_transaction_id: Hash,
}

impl UnspentOutput {
    pub fn new(owner: PublicKey, value: f64, parent_transaction_id: &str) -> Self {
        let id = Self::calculate_id(&owner, value, parent_transaction_id);
        Self {
            id,
            owner,
            value,
            parent_transaction_id: parent_transaction_id.to_string(),
        }
    }

    /// Hash of the owner key, value and parent id
    pub fn calculate_id(owner: &PublicKey, value: f64, parent_transaction_id: &str) -> Hash {
        let data = format!("{}{}{}", public_key_hex(owner), value, parent_transaction_id);
        sha256_hex(data.as_bytes())
    }

    /// Check if this output belongs to the given key
    pub fn is_owned_by(&self, key: &PublicKey) -> bool {
        same_key(&self.owner, key)
    }
}

// =============================================================================
// Transaction Input
// =============================================================================

/// A claim on an unspent output, resolved when the transaction is processed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionInput {
    /// Id of the output being spent
    pub referenced_output_id: Hash,
    /// The output found in the ledger at processing time; `None` if it was
    /// already spent or never existed
    pub resolved_output: Option<UnspentOutput>,
}

impl TransactionInput {
    pub fn new(referenced_output_id: impl Into<Hash>) -> Self {
        Self {
            referenced_output_id: referenced_output_id.into(),
            resolved_output: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_output.is_some()
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A signed transfer of value between two keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Assigned by `process`
    pub id: Option<Hash>,
    pub sender: PublicKey,
    pub receiver: PublicKey,
    pub value: f64,
    /// Compact ECDSA signature by the sender
    pub signature: Option<Vec<u8>>,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<UnspentOutput>,
}

impl Transaction {
    /// Create a new unsigned, unprocessed transaction
    pub fn new(
        sender: PublicKey,
        receiver: PublicKey,
        value: f64,
        inputs: Vec<TransactionInput>,
    ) -> Self {
        Self {
            id: None,
            sender,
            receiver,
            value,
            signature: None,
            inputs,
            outputs: Vec::new(),
        }
    }

    /// Create the genesis transaction that seeds a ledger
    ///
    /// It is signed by the coinbase key, carries [`GENESIS_TRANSACTION_ID`],
    /// and mints a single output of `value` for `receiver` without consuming
    /// anything.
    pub fn genesis(
        coinbase: &KeyPair,
        receiver: PublicKey,
        value: f64,
    ) -> Result<Self, TransactionError> {
        let mut tx = Self::new(coinbase.public_key, receiver, value, Vec::new());
        tx.sign(coinbase)?;
        tx.id = Some(GENESIS_TRANSACTION_ID.to_string());
        tx.outputs
            .push(UnspentOutput::new(receiver, value, GENESIS_TRANSACTION_ID));
        Ok(tx)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn inputs(&self) -> &[TransactionInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[UnspentOutput] {
        &self.outputs
    }

    pub fn is_processed(&self) -> bool {
        self.id.is_some()
    }

    /// Canonical bytes covered by the signature
    pub fn signing_data(&self) -> Vec<u8> {
        format!(
            "{}{}{}",
            public_key_hex(&self.sender),
            public_key_hex(&self.receiver),
            self.value
        )
        .into_bytes()
    }

    /// Derive the transaction id for the given sequence number
    fn calculate_id(&self, sequence: u64) -> Hash {
        let data = format!(
            "{}{}{}{}",
            public_key_hex(&self.sender),
            public_key_hex(&self.receiver),
            self.value,
            sequence
        );
        sha256_hex(data.as_bytes())
    }

    /// Sign the transaction with the sender's key pair
    pub fn sign(&mut self, key_pair: &KeyPair) -> Result<(), TransactionError> {
        let signature = key_pair.sign(&self.signing_data())?;
        self.signature = Some(signature);
        Ok(())
    }

    /// Verify the sender's signature over the canonical data
    pub fn verify_signature(&self) -> bool {
        match &self.signature {
            Some(signature) => verify_signature(&self.sender, &self.signing_data(), signature),
            None => false,
        }
    }

    /// Apply the transaction to the ledger
    ///
    /// Inputs are resolved against the ledger; references to outputs that no
    /// longer exist stay unresolved and contribute nothing to the input total.
    /// On success the receiver and change outputs are added and every
    /// resolved input is removed from the ledger.
    pub fn process(&mut self, ledger: &mut LedgerState) -> Result<(), TransactionError> {
        if !self.verify_signature() {
            log::warn!("Transaction signature failed to verify");
            return Err(TransactionError::InvalidSignature);
        }

        for input in &mut self.inputs {
            input.resolved_output = ledger.get(&input.referenced_output_id).cloned();
            if input.resolved_output.is_none() {
                log::debug!("Input {} is not an unspent output", input.referenced_output_id);
            }
        }

        let inputs_value = self.inputs_value();
        let minimum = ledger.minimum_transaction();
        if inputs_value < minimum {
            log::warn!(
                "Transaction inputs too small: {} (minimum {})",
                inputs_value,
                minimum
            );
            return Err(TransactionError::BelowMinimumValue {
                value: inputs_value,
                minimum,
            });
        }

        let id = self.calculate_id(ledger.next_sequence());

        self.outputs = vec![
            UnspentOutput::new(self.receiver, self.value, &id),
            UnspentOutput::new(self.sender, inputs_value - self.value, &id),
        ];
        for output in &self.outputs {
            ledger.insert(output.clone());
        }

        for input in &self.inputs {
            if let Some(spent) = &input.resolved_output {
                ledger.remove(&spent.id);
            }
        }

        log::debug!("Processed transaction {}", id);
        self.id = Some(id);
        Ok(())
    }

    /// Total value of the resolved inputs
    pub fn inputs_value(&self) -> f64 {
        self.inputs
            .iter()
            .filter_map(|input| input.resolved_output.as_ref())
            .map(|output| output.value)
            .sum()
    }

    /// Total value of the outputs
    pub fn outputs_value(&self) -> f64 {
        self.outputs.iter().map(|output| output.value).sum()
    }

    /// Whether the input and output totals agree up to float rounding
    ///
    /// Change is minted as `inputs - value`, and adding `value` back does not
    /// always reproduce `inputs` exactly, so the totals are compared within a
    /// few ulps per summed term.
    pub fn is_balanced(&self) -> bool {
        let inputs = self.inputs_value();
        let outputs = self.outputs_value();
        let terms = (self.inputs.len() + self.outputs.len()).max(1) as f64;
        let scale = inputs.abs().max(outputs.abs()).max(1.0);
        (inputs - outputs).abs() <= f64::EPSILON * scale * 4.0 * terms
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        ledger: LedgerState,
        sender: KeyPair,
        receiver: KeyPair,
        genesis_output: UnspentOutput,
    }

    fn fixture(value: f64) -> Fixture {
        let coinbase = KeyPair::generate();
        let sender = KeyPair::generate();
        let receiver = KeyPair::generate();
        let genesis = Transaction::genesis(&coinbase, sender.public_key, value).unwrap();
        let mut ledger = LedgerState::new();
        let genesis_output = ledger.seed(&genesis).unwrap();
        Fixture {
            ledger,
            sender,
            receiver,
            genesis_output,
        }
    }

    fn signed_spend(f: &Fixture, value: f64) -> Transaction {
        let mut tx = Transaction::new(
            f.sender.public_key,
            f.receiver.public_key,
            value,
            vec![TransactionInput::new(f.genesis_output.id.clone())],
        );
        tx.sign(&f.sender).unwrap();
        tx
    }

    #[test]
    fn test_new_transaction_is_unprocessed() {
        let f = fixture(100.0);
        let tx = signed_spend(&f, 30.0);
        assert!(tx.id().is_none());
        assert!(!tx.is_processed());
        assert!(tx.outputs().is_empty());
        assert_eq!(tx.inputs_value(), 0.0);
    }

    #[test]
    fn test_signature_round_trip() {
        let f = fixture(100.0);
        let mut tx = Transaction::new(f.sender.public_key, f.receiver.public_key, 5.0, vec![]);
        assert!(!tx.verify_signature());

        tx.sign(&f.sender).unwrap();
        assert!(tx.verify_signature());

        tx.value = 500.0;
        assert!(!tx.verify_signature());
    }

    #[test]
    fn test_signed_by_wrong_key() {
        let f = fixture(100.0);
        let mut tx = Transaction::new(f.sender.public_key, f.receiver.public_key, 5.0, vec![]);
        tx.sign(&f.receiver).unwrap();
        assert!(!tx.verify_signature());
    }

    #[test]
    fn test_process_creates_amount_and_change() {
        let mut f = fixture(100.0);
        let mut tx = signed_spend(&f, 30.0);

        tx.process(&mut f.ledger).unwrap();

        let id = tx.id().unwrap().to_string();
        assert_eq!(tx.outputs().len(), 2);
        assert!(tx.outputs()[0].is_owned_by(&f.receiver.public_key));
        assert_eq!(tx.outputs()[0].value, 30.0);
        assert!(tx.outputs()[1].is_owned_by(&f.sender.public_key));
        assert_eq!(tx.outputs()[1].value, 70.0);
        assert!(tx.outputs().iter().all(|o| o.parent_transaction_id == id));

        assert!(f.ledger.contains(&tx.outputs()[0].id));
        assert!(f.ledger.contains(&tx.outputs()[1].id));
        assert!(!f.ledger.contains(&f.genesis_output.id));
        assert_eq!(f.ledger.len(), 2);
        assert_eq!(tx.inputs_value(), tx.outputs_value());
    }

    #[test]
    fn test_process_rejects_bad_signature() {
        let mut f = fixture(100.0);
        let mut tx = signed_spend(&f, 30.0);
        tx.signature = Some(vec![0; 64]);

        assert!(matches!(
            tx.process(&mut f.ledger),
            Err(TransactionError::InvalidSignature)
        ));
        assert!(tx.id().is_none());
        assert!(f.ledger.contains(&f.genesis_output.id));
        assert_eq!(f.ledger.sequence(), 0);
    }

    #[test]
    fn test_process_rejects_below_minimum() {
        let mut f = fixture(0.05);
        let mut tx = signed_spend(&f, 0.01);

        let err = tx.process(&mut f.ledger).unwrap_err();
        assert!(matches!(err, TransactionError::BelowMinimumValue { .. }));
        assert!(f.ledger.contains(&f.genesis_output.id));
        assert!(tx.outputs().is_empty());
    }

    #[test]
    fn test_double_spend_leaves_input_unresolved() {
        let mut f = fixture(100.0);
        let mut first = signed_spend(&f, 30.0);
        let mut second = signed_spend(&f, 30.0);

        first.process(&mut f.ledger).unwrap();
        let err = second.process(&mut f.ledger).unwrap_err();

        assert!(!second.inputs()[0].is_resolved());
        assert_eq!(second.inputs_value(), 0.0);
        assert!(matches!(err, TransactionError::BelowMinimumValue { .. }));
        assert_eq!(f.ledger.len(), 2);
    }

    #[test]
    fn test_unknown_input_is_excluded_from_sum() {
        let mut f = fixture(100.0);
        let mut tx = Transaction::new(
            f.sender.public_key,
            f.receiver.public_key,
            30.0,
            vec![
                TransactionInput::new(f.genesis_output.id.clone()),
                TransactionInput::new("no-such-output"),
            ],
        );
        tx.sign(&f.sender).unwrap();

        tx.process(&mut f.ledger).unwrap();
        assert!(tx.inputs()[0].is_resolved());
        assert!(!tx.inputs()[1].is_resolved());
        assert_eq!(tx.inputs_value(), 100.0);
        assert_eq!(tx.outputs_value(), 100.0);
    }

    #[test]
    fn test_identical_transfers_get_distinct_ids() {
        let mut f = fixture(100.0);
        let mut first = signed_spend(&f, 30.0);
        first.process(&mut f.ledger).unwrap();

        let change = first.outputs()[1].clone();
        let mut second = Transaction::new(
            f.sender.public_key,
            f.receiver.public_key,
            30.0,
            vec![TransactionInput::new(change.id)],
        );
        second.sign(&f.sender).unwrap();
        second.process(&mut f.ledger).unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(f.ledger.sequence(), 2);
    }

    #[test]
    fn test_genesis_transaction() {
        let coinbase = KeyPair::generate();
        let owner = KeyPair::generate();
        let genesis = Transaction::genesis(&coinbase, owner.public_key, 100.0).unwrap();

        assert_eq!(genesis.id(), Some(GENESIS_TRANSACTION_ID));
        assert!(genesis.verify_signature());
        assert!(genesis.inputs().is_empty());
        assert_eq!(genesis.outputs().len(), 1);
        assert_eq!(genesis.outputs()[0].value, 100.0);
        assert_eq!(
            genesis.outputs()[0].parent_transaction_id,
            GENESIS_TRANSACTION_ID
        );
    }

    #[test]
    fn test_output_id_is_content_addressed() {
        let owner = KeyPair::generate();
        let a = UnspentOutput::new(owner.public_key, 1.5, "parent");
        let b = UnspentOutput::new(owner.public_key, 1.5, "parent");
        let c = UnspentOutput::new(owner.public_key, 2.5, "parent");
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_fractional_amounts_stay_balanced() {
        // 0.9 - 0.2 + 0.2 is not 0.9 in f64
        let mut f = fixture(0.9);
        let mut tx = signed_spend(&f, 0.2);
        tx.process(&mut f.ledger).unwrap();
        assert_ne!(tx.inputs_value(), tx.outputs_value());
        assert!(tx.is_balanced());

        for genesis_tenths in 1..=60u32 {
            let genesis_value = genesis_tenths as f64 / 10.0;
            for value_tenths in 1..=genesis_tenths {
                let value = value_tenths as f64 / 10.0;
                let mut f = fixture(genesis_value);
                let mut tx = signed_spend(&f, value);
                tx.process(&mut f.ledger).unwrap();
                assert!(
                    tx.is_balanced(),
                    "{} of {} left inputs {} outputs {}",
                    value,
                    genesis_value,
                    tx.inputs_value(),
                    tx.outputs_value()
                );
            }
        }
    }

    #[test]
    fn test_small_imbalance_is_detected() {
        let mut f = fixture(0.9);
        let mut tx = signed_spend(&f, 0.2);
        tx.process(&mut f.ledger).unwrap();
        tx.outputs[1].value += 0.001;
        assert!(!tx.is_balanced());
    }
}
