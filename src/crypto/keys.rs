//! ECDSA signing capability for the ledger
//!
//! Provides key pair generation, signing, and verification using
//! the secp256k1 elliptic curve (same as Bitcoin). The rest of the crate
//! only relies on the contract exposed here: `sign_message` produces a
//! signature or a [`SigningError`], and `verify_signature` answers yes/no.

use rand::rngs::OsRng;
use ripemd::Ripemd160;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::hash::sha256;

/// Errors raised by the signing capability
///
/// These are fatal conditions (malformed keys or messages), distinct from the
/// ordinary ledger failures reported by transactions and the validator.
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, SigningError> {
        let bytes = hex::decode(hex_key).map_err(|_| SigningError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| SigningError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        public_key_hex(&self.public_key)
    }

    /// Base58Check address of the public key
    pub fn address(&self) -> String {
        public_key_to_address(&self.public_key)
    }

    /// Sign a message with the private key
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
        sign_message(&self.secret_key, message)
    }

    /// Verify a signature against this key pair's public key
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        verify_signature(&self.public_key, message, signature)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Canonical encoding of a public key: hex of the 33-byte compressed form
pub fn public_key_hex(public_key: &PublicKey) -> String {
    hex::encode(public_key.serialize())
}

/// Value equality of two public keys over their canonical byte encoding
pub fn same_key(a: &PublicKey, b: &PublicKey) -> bool {
    a.serialize() == b.serialize()
}

/// Convert a public key to a display address
pub fn public_key_to_address(public_key: &PublicKey) -> String {
    let sha256_hash = sha256(&public_key.serialize());

    let mut ripemd = Ripemd160::new();
    ripemd.update(&sha256_hash);
    let ripemd_hash = ripemd.finalize();

    // Version byte 0x00
    let mut address_bytes = vec![0x00];
    address_bytes.extend_from_slice(&ripemd_hash);

    // First 4 bytes of double SHA256
    let checksum = {
        let first_hash = Sha256::digest(&address_bytes);
        Sha256::digest(first_hash)
    };
    address_bytes.extend_from_slice(&checksum[..4]);

    bs58::encode(address_bytes).into_string()
}

/// Parse a public key from hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, SigningError> {
    let bytes = hex::decode(hex_key).map_err(|_| SigningError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| SigningError::InvalidPublicKey)
}

/// Sign a message with a secret key
///
/// The message is reduced to its SHA-256 digest before signing; the
/// signature is returned in 64-byte compact form.
pub fn sign_message(secret_key: &SecretKey, message: &[u8]) -> Result<Vec<u8>, SigningError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(&sha256(message))?;
    let signature = secp.sign_ecdsa(&message, secret_key);
    Ok(signature.serialize_compact().to_vec())
}

/// Verify a signature against a public key
///
/// Returns `false` both for a signature over different content and for bytes
/// that do not decode as a signature at all.
pub fn verify_signature(public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
    let secp = Secp256k1::new();

    let Ok(message) = Message::from_digest_slice(&sha256(message)) else {
        return false;
    };
    let Ok(sig) = Signature::from_compact(signature) else {
        log::debug!("Rejecting malformed signature ({} bytes)", signature.len());
        return false;
    };

    secp.verify_ecdsa(&message, &sig, public_key).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.public_key_hex().len(), 66);
        assert!(!kp.address().is_empty());
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::generate();
        let message = b"Hello, ledger!";

        let signature = kp.sign(message).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(kp.verify(message, &signature));
    }

    #[test]
    fn test_wrong_content_is_rejected() {
        let kp = KeyPair::generate();
        let signature = kp.sign(b"pay 30").unwrap();
        assert!(!kp.verify(b"pay 300", &signature));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let signer = KeyPair::generate();
        let other = KeyPair::generate();
        let signature = signer.sign(b"message").unwrap();
        assert!(!verify_signature(&other.public_key, b"message", &signature));
    }

    #[test]
    fn test_malformed_signature_is_rejected() {
        let kp = KeyPair::generate();
        assert!(!kp.verify(b"message", &[1, 2, 3]));
        assert!(!kp.verify(b"message", &[]));
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::from_private_key_hex(&kp1.private_key_hex()).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());
        assert!(same_key(&kp1.public_key, &kp2.public_key));
    }

    #[test]
    fn test_invalid_private_key() {
        assert!(matches!(
            KeyPair::from_private_key_hex("not hex"),
            Err(SigningError::InvalidPrivateKey)
        ));
        assert!(matches!(
            KeyPair::from_private_key_hex(&"00".repeat(32)),
            Err(SigningError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn test_public_key_round_trip() {
        let kp = KeyPair::generate();
        let parsed = public_key_from_hex(&kp.public_key_hex()).unwrap();
        assert!(same_key(&parsed, &kp.public_key));
        assert!(public_key_from_hex("02abcd").is_err());
    }

    #[test]
    fn test_address_format() {
        let kp = KeyPair::generate();
        assert!(kp.address().starts_with('1'));
    }
}
