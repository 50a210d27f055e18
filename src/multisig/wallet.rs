//! Owner-set and threshold configuration shared by both multisig variants
//!
//! An owner set and threshold are fixed at construction and immutable
//! afterwards; every authorization decision reduces to "did at least
//! `threshold` distinct owners approve this digest".

use crate::crypto::{double_sha256, sha256};
use crate::exec::CallError;
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::Digest;
use thiserror::Error;

/// Errors related to multisig configuration and signature verification
#[derive(Error, Debug)]
pub enum MultisigError {
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),
    #[error("Invalid owner count: need at least 2 owners")]
    InsufficientOwners,
    #[error("Duplicate owner address")]
    DuplicateOwner,
    #[error("Insufficient signatures: have {have}, need {need}")]
    InsufficientSignatures { have: usize, need: usize },
    #[error("Signature does not recover to a known owner")]
    InvalidSignature,
    #[error("Signature bundle has a duplicate or out-of-order owner")]
    DuplicateOrUnsortedSignature,
    #[error("Target call failed: {0}")]
    TargetCallFailed(#[from] CallError),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] crate::crypto::KeyError),
}

/// Configuration for a multisig wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MultisigConfig {
    /// Minimum approvals required (M in M-of-N)
    pub threshold: usize,
    /// Addresses of all authorized owners
    pub owners: Vec<String>,
    /// Optional human-readable label
    pub label: Option<String>,
}

impl MultisigConfig {
    /// Create a new multisig configuration
    ///
    /// # Errors
    /// Returns an error if the threshold is out of range or the owner list
    /// contains duplicates or fewer than two entries.
    pub fn new(
        threshold: usize,
        owners: Vec<String>,
        label: Option<String>,
    ) -> Result<Self, MultisigError> {
        if threshold == 0 {
            return Err(MultisigError::InvalidThreshold(
                "threshold must be at least 1".to_string(),
            ));
        }

        if owners.len() < 2 {
            return Err(MultisigError::InsufficientOwners);
        }

        if threshold > owners.len() {
            return Err(MultisigError::InvalidThreshold(format!(
                "threshold {} exceeds owner count {}",
                threshold,
                owners.len()
            )));
        }

        // Check for duplicates
        let mut sorted_owners = owners.clone();
        sorted_owners.sort();
        for i in 1..sorted_owners.len() {
            if sorted_owners[i] == sorted_owners[i - 1] {
                return Err(MultisigError::DuplicateOwner);
            }
        }

        Ok(Self {
            threshold,
            owners,
            label,
        })
    }

    /// Get the threshold (M)
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Get the total owner count (N)
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Check if an address is an authorized owner
    pub fn is_owner(&self, address: &str) -> bool {
        self.owners.iter().any(|o| o == address)
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.owners.len())
    }

    /// Deterministic wallet address for this configuration
    ///
    /// Address = Base58Check(version || RIPEMD160(SHA256(threshold || sorted_owners)))
    pub fn wallet_address(&self) -> String {
        // Sort owners so equivalent configs share an address
        let mut sorted_owners = self.owners.clone();
        sorted_owners.sort();

        let mut script_data = (self.threshold as u64).to_be_bytes().to_vec();
        for owner in &sorted_owners {
            script_data.extend_from_slice(owner.as_bytes());
        }

        let sha256_hash = sha256(&script_data);
        let mut ripemd = Ripemd160::new();
        ripemd.update(&sha256_hash);
        let ripemd_hash = ripemd.finalize();

        // P2SH-style version byte (0x05 -> addresses starting with '3')
        let mut address_bytes = vec![0x05];
        address_bytes.extend_from_slice(&ripemd_hash);

        let checksum = double_sha256(&address_bytes);
        address_bytes.extend_from_slice(&checksum[..4]);

        bs58::encode(address_bytes).into_string()
    }
}
