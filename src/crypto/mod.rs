//! Cryptographic utilities for the gatekeeper
//!
//! This module provides:
//! - SHA-256 hashing
//! - ECDSA key management with signer recovery (secp256k1)
//! - Deterministic action digests

pub mod digest;
pub mod hash;
pub mod keys;

pub use digest::{queue_digest, transaction_digest};
pub use hash::{double_sha256, sha256, sha256_hex};
pub use keys::{
    public_key_from_hex, public_key_to_address, recover_address, recover_signer,
    sign_recoverable, KeyError, KeyPair, SIGNATURE_LENGTH,
};
