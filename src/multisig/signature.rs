//! Off-chain-signature multisig
//!
//! Authorizes a single action from a caller-supplied bundle of detached
//! recoverable signatures. The wallet persists no proposal state: the bundle
//! itself is the whole authorization. Each 65-byte record is recovered over
//! the transaction digest to an owner address, and the bundle must be sorted
//! strictly ascending by owner address. Sorting gives a canonical encoding of
//! "who signed" and makes duplicates detectable in one pass.

use crate::crypto::{recover_address, transaction_digest, KeyPair, SIGNATURE_LENGTH};
use crate::exec::Environment;
use crate::multisig::wallet::{MultisigConfig, MultisigError};
use log::{debug, info};

/// A stateless threshold wallet verified from detached signatures
#[derive(Clone, Debug)]
pub struct SignatureMultisig {
    /// Wallet address (holds the funds being authorized)
    address: String,
    /// Owner set and threshold, fixed at construction
    config: MultisigConfig,
}

impl SignatureMultisig {
    /// Create a wallet from a validated configuration
    pub fn new(config: MultisigConfig) -> Self {
        let address = config.wallet_address();
        Self { address, config }
    }

    /// Get the wallet address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get the required threshold
    pub fn threshold(&self) -> usize {
        self.config.threshold()
    }

    /// Get the total number of owners
    pub fn owner_count(&self) -> usize {
        self.config.owner_count()
    }

    /// Check if an address is an authorized owner
    pub fn is_owner(&self, address: &str) -> bool {
        self.config.is_owner(address)
    }

    /// Digest owners must sign to authorize `(to, value, data)`
    pub fn encode_transaction_data(&self, to: &str, value: u64, data: &[u8]) -> String {
        transaction_digest(&self.address, to, value, data)
    }

    /// Execute an action authorized by a signature bundle
    ///
    /// `signatures` is a concatenation of 65-byte recoverable signature
    /// records over [`encode_transaction_data`](Self::encode_transaction_data),
    /// sorted strictly ascending by the signer's owner address.
    ///
    /// Nothing is persisted on success: the digest carries no nonce, so the
    /// same bundle authorizes the same `(to, value, data)` again. Callers that
    /// need one-shot semantics must encode freshness into `data`.
    pub fn exec_transaction(
        &self,
        env: &mut Environment,
        to: &str,
        value: u64,
        data: &[u8],
        signatures: &[u8],
    ) -> Result<Vec<u8>, MultisigError> {
        let digest = self.encode_transaction_data(to, value, data);
        self.check_signatures(&digest, signatures)?;

        debug!(
            "multisig {} authorized tx to={} value={} ({})",
            self.address,
            to,
            value,
            self.config.description()
        );

        let returndata = env.call(&self.address, to, value, data)?;
        info!("multisig {} executed tx to={} value={}", self.address, to, value);
        Ok(returndata)
    }

    /// Verify a signature bundle against a digest and the threshold
    pub fn check_signatures(
        &self,
        digest_hex: &str,
        signatures: &[u8],
    ) -> Result<(), MultisigError> {
        if signatures.len() % SIGNATURE_LENGTH != 0 {
            return Err(MultisigError::InvalidSignature);
        }

        let have = signatures.len() / SIGNATURE_LENGTH;
        let need = self.config.threshold();
        if have < need {
            return Err(MultisigError::InsufficientSignatures { have, need });
        }

        let digest = hex::decode(digest_hex).map_err(|_| MultisigError::InvalidSignature)?;

        let mut previous: Option<String> = None;
        for record in signatures.chunks(SIGNATURE_LENGTH) {
            let signer =
                recover_address(&digest, record).map_err(|_| MultisigError::InvalidSignature)?;

            if !self.config.is_owner(&signer) {
                return Err(MultisigError::InvalidSignature);
            }

            // Strict ascending order rejects both duplicates and shuffles
            if let Some(prev) = &previous {
                if *prev >= signer {
                    return Err(MultisigError::DuplicateOrUnsortedSignature);
                }
            }
            previous = Some(signer);
        }

        Ok(())
    }
}

/// Build a canonically sorted signature bundle over a digest
///
/// Sorts the signing keys ascending by owner address before signing, so the
/// resulting bundle always satisfies the wallet's ordering rule.
pub fn collect_signatures(keys: &[KeyPair], digest_hex: &str) -> Result<Vec<u8>, MultisigError> {
    let digest = hex::decode(digest_hex).map_err(|_| MultisigError::InvalidSignature)?;

    let mut sorted: Vec<&KeyPair> = keys.iter().collect();
    sorted.sort_by_key(|k| k.address());

    let mut bundle = Vec::with_capacity(sorted.len() * SIGNATURE_LENGTH);
    for key in sorted {
        bundle.extend_from_slice(&key.sign(&digest)?);
    }
    Ok(bundle)
}
