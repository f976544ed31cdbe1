//! Cryptographic hashing utilities for the ledger
//!
//! Every identity in the ledger (transaction ids, output ids, block hashes)
//! is a lowercase hex SHA-256 digest produced here.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest
pub type Hash = String;

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> Hash {
    hex::encode(sha256(data))
}

/// Checks if a hex hash meets the difficulty target
///
/// The first `difficulty` characters must all be `'0'`.
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|c| c == b'0')
}

/// The zero-character prefix a hash must start with at `difficulty`
pub fn difficulty_target(difficulty: usize) -> String {
    "0".repeat(difficulty)
}
