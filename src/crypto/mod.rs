//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 hashing and the difficulty prefix check
//! - ECDSA key management (secp256k1)
//! - Sliding-window merkle root calculation

pub mod hash;
pub mod keys;
pub mod merkle;

pub use hash::{difficulty_target, meets_difficulty, sha256, sha256_hex, Hash};
pub use keys::{
    public_key_from_hex, public_key_hex, public_key_to_address, same_key, sign_message,
    verify_signature, KeyPair, SigningError,
};
pub use merkle::{calculate_merkle_root, reduce_layer, EMPTY_MERKLE_ROOT};
