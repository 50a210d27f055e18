//! ECDSA key management for the gatekeeper
//!
//! Provides key pair generation, recoverable signing, and signer recovery
//! using the secp256k1 elliptic curve. Signatures are 65 bytes: the 64-byte
//! compact signature followed by a 1-byte recovery id, so the signer's
//! identity can be recovered from the signature and the signed digest alone.

use rand::rngs::OsRng;
use ripemd::Ripemd160;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha2::Digest;
use thiserror::Error;

use super::hash::{double_sha256, sha256};

/// Length in bytes of a recoverable signature record
pub const SIGNATURE_LENGTH: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Signer recovery failed")]
    RecoveryFailed,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
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
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Get the owner address for this key pair
    /// Uses Bitcoin-style address generation: Base58Check(RIPEMD160(SHA256(pubkey)))
    pub fn address(&self) -> String {
        public_key_to_address(&self.public_key)
    }

    /// Sign a 32-byte digest, producing a 65-byte recoverable signature
    pub fn sign(&self, message_hash: &[u8]) -> Result<Vec<u8>, KeyError> {
        sign_recoverable(&self.secret_key, message_hash)
    }
}

/// Convert a public key to an owner address
pub fn public_key_to_address(public_key: &PublicKey) -> String {
    // SHA256 of the public key, then RIPEMD160
    let sha256_hash = sha256(&public_key.serialize());
    let mut ripemd = Ripemd160::new();
    ripemd.update(&sha256_hash);
    let ripemd_hash = ripemd.finalize();

    // Version byte (0x00) + payload
    let mut address_bytes = vec![0x00];
    address_bytes.extend_from_slice(&ripemd_hash);

    // Checksum: first 4 bytes of double SHA256
    let checksum = double_sha256(&address_bytes);
    address_bytes.extend_from_slice(&checksum[..4]);

    bs58::encode(address_bytes).into_string()
}

/// Parse a public key from hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Sign a 32-byte digest with a secret key
///
/// Returns the 64-byte compact signature with the recovery id appended.
pub fn sign_recoverable(
    secret_key: &SecretKey,
    message_hash: &[u8],
) -> Result<Vec<u8>, KeyError> {
    let secp = Secp256k1::new();

    // Non-32-byte inputs are hashed down to the digest size
    let hash = if message_hash.len() == 32 {
        message_hash.to_vec()
    } else {
        sha256(message_hash)
    };

    let message = Message::from_digest_slice(&hash)?;
    let signature = secp.sign_ecdsa_recoverable(&message, secret_key);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut bytes = compact.to_vec();
    bytes.push(recovery_id.to_i32() as u8);
    Ok(bytes)
}

/// Recover the signer's public key from a digest and a 65-byte signature
pub fn recover_signer(message_hash: &[u8], signature: &[u8]) -> Result<PublicKey, KeyError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(KeyError::InvalidSignature);
    }

    let secp = Secp256k1::new();

    let hash = if message_hash.len() == 32 {
        message_hash.to_vec()
    } else {
        sha256(message_hash)
    };

    let message = Message::from_digest_slice(&hash)?;
    let recovery_id = RecoveryId::from_i32(signature[SIGNATURE_LENGTH - 1] as i32)
        .map_err(|_| KeyError::InvalidSignature)?;
    let sig = RecoverableSignature::from_compact(&signature[..SIGNATURE_LENGTH - 1], recovery_id)
        .map_err(|_| KeyError::InvalidSignature)?;

    secp.recover_ecdsa(&message, &sig)
        .map_err(|_| KeyError::RecoveryFailed)
}

/// Recover the signer's address from a digest and a 65-byte signature
pub fn recover_address(message_hash: &[u8], signature: &[u8]) -> Result<String, KeyError> {
    let public_key = recover_signer(message_hash, signature)?;
    Ok(public_key_to_address(&public_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert!(!kp.private_key_hex().is_empty());
        assert!(!kp.public_key_hex().is_empty());
        assert!(!kp.address().is_empty());
    }

    #[test]
    fn test_sign_and_recover() {
        let kp = KeyPair::generate();
        let digest = sha256(b"authorize this action");

        let signature = kp.sign(&digest).unwrap();
        assert_eq!(signature.len(), SIGNATURE_LENGTH);

        let recovered = recover_address(&digest, &signature).unwrap();
        assert_eq!(recovered, kp.address());
    }

    #[test]
    fn test_recover_wrong_digest() {
        let kp = KeyPair::generate();
        let digest = sha256(b"authorize this action");
        let other = sha256(b"a different action");

        let signature = kp.sign(&digest).unwrap();
        // Recovery over a different digest yields some key, but not the signer's
        if let Ok(address) = recover_address(&other, &signature) {
            assert_ne!(address, kp.address());
        }
    }

    #[test]
    fn test_recover_malformed_signature() {
        let digest = sha256(b"authorize this action");
        assert!(matches!(
            recover_address(&digest, &[0u8; 10]),
            Err(KeyError::InvalidSignature)
        ));
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let private_hex = kp1.private_key_hex();

        let kp2 = KeyPair::from_private_key_hex(&private_hex).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());
    }

    #[test]
    fn test_address_format() {
        let kp = KeyPair::generate();
        let address = kp.address();
        // Version byte 0x00 produces addresses starting with 1
        assert!(address.starts_with('1'));
    }
}
