//! Full-replay chain validation
//!
//! Stored hashes are self-reported, so a chain is only accepted after every
//! block hash is recomputed, every link and proof of work is checked, every
//! signature is re-verified, and the unspent-output set is rebuilt from the
//! genesis output by replaying each transaction in order.

use crate::core::block::Block;
use crate::core::transaction::UnspentOutput;
use crate::crypto::{meets_difficulty, Hash};
use std::collections::HashMap;
use thiserror::Error;

/// Reasons a chain fails validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Block {block}: stored hash does not match its contents")]
    HashMismatch { block: usize },
    #[error("Block {block}: previous hash does not match the preceding block")]
    ChainLinkBroken { block: usize },
    #[error("Block {block}: hash does not meet difficulty {difficulty}")]
    DifficultyNotMet { block: usize, difficulty: usize },
    #[error("Block {block}, transaction {tx}: signature is invalid")]
    InvalidSignature { block: usize, tx: usize },
    #[error("Block {block}, transaction {tx}: inputs ({inputs}) do not equal outputs ({outputs})")]
    ValueMismatch {
        block: usize,
        tx: usize,
        inputs: f64,
        outputs: f64,
    },
    #[error("Block {block}, transaction {tx}: input {output_id} is not unspent")]
    UnresolvedInput {
        block: usize,
        tx: usize,
        output_id: Hash,
    },
    #[error("Block {block}, transaction {tx}: input {output_id} does not match the unspent output")]
    InvalidInput {
        block: usize,
        tx: usize,
        output_id: Hash,
    },
    #[error("Block {block}, transaction {tx}: first output is not owned by the receiver")]
    ReceiverMismatch { block: usize, tx: usize },
}

/// Validate a chain, stopping at the first violation
///
/// Block 0 is the genesis block; its effects enter through `genesis_output`.
/// Chains with fewer than two blocks have nothing to replay and are valid.
pub fn validate_chain(
    blocks: &[Block],
    genesis_output: &UnspentOutput,
    difficulty: usize,
) -> Result<(), ValidationError> {
    let mut utxos: HashMap<Hash, UnspentOutput> = HashMap::new();
    utxos.insert(genesis_output.id.clone(), genesis_output.clone());

    for (index, pair) in blocks.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        let block = index + 1;

        if current.hash != current.calculate_hash() {
            return Err(ValidationError::HashMismatch { block });
        }

        if previous.hash != current.previous_hash {
            return Err(ValidationError::ChainLinkBroken { block });
        }

        if !meets_difficulty(&current.hash, difficulty) {
            return Err(ValidationError::DifficultyNotMet { block, difficulty });
        }

        replay_block(current, block, &mut utxos)?;
    }

    Ok(())
}

/// Replay one block's transactions against the rebuilt output set
fn replay_block(
    current: &Block,
    block: usize,
    utxos: &mut HashMap<Hash, UnspentOutput>,
) -> Result<(), ValidationError> {
    for (tx, transaction) in current.transactions.iter().enumerate() {
        if !transaction.verify_signature() {
            return Err(ValidationError::InvalidSignature { block, tx });
        }

        if !transaction.is_balanced() {
            return Err(ValidationError::ValueMismatch {
                block,
                tx,
                inputs: transaction.inputs_value(),
                outputs: transaction.outputs_value(),
            });
        }

        for input in transaction.inputs() {
            let output_id = &input.referenced_output_id;
            let Some(live) = utxos.get(output_id) else {
                return Err(ValidationError::UnresolvedInput {
                    block,
                    tx,
                    output_id: output_id.clone(),
                });
            };

            let matches = input
                .resolved_output
                .as_ref()
                .is_some_and(|cached| cached.value == live.value);
            if !matches {
                return Err(ValidationError::InvalidInput {
                    block,
                    tx,
                    output_id: output_id.clone(),
                });
            }

            utxos.remove(output_id);
        }

        for output in transaction.outputs() {
            utxos.insert(output.id.clone(), output.clone());
        }

        let receiver_ok = transaction
            .outputs()
            .first()
            .is_some_and(|first| first.is_owned_by(&transaction.receiver));
        if !receiver_ok {
            return Err(ValidationError::ReceiverMismatch { block, tx });
        }
    }

    Ok(())
}

/// Boolean form of [`validate_chain`]; logs the reason for a rejection
pub fn is_valid_chain(blocks: &[Block], genesis_output: &UnspentOutput, difficulty: usize) -> bool {
    match validate_chain(blocks, genesis_output, difficulty) {
        Ok(()) => {
            log::info!("Chain is valid");
            true
        }
        Err(e) => {
            log::warn!("Chain is invalid: {}", e);
            false
        }
    }
}
