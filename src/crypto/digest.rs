//! Deterministic action digests
//!
//! Every authorizable action is fingerprinted by a SHA-256 digest over a
//! length-prefixed encoding of its fields. Identical actions always produce
//! the same digest (content addressing for the timelock queue), and any field
//! change produces an unrelated digest. Digests are surfaced as lowercase
//! hex strings.

use super::hash::sha256_hex;

/// Domain tag for multisig transaction digests
const TRANSACTION_TAG: &[u8] = b"gatekeeper/transaction";
/// Domain tag for timelock queue digests
const QUEUE_TAG: &[u8] = b"gatekeeper/queue";

/// Append a single field as length-prefixed bytes
fn push_field(buffer: &mut Vec<u8>, field: &[u8]) {
    buffer.extend_from_slice(&(field.len() as u64).to_be_bytes());
    buffer.extend_from_slice(field);
}

/// Digest identifying a multisig transaction
///
/// The wallet's own address is mixed in so the same `(to, value, data)` tuple
/// produces different digests for different wallets, preventing a signature
/// collected for one wallet from authorizing the same action on another.
pub fn transaction_digest(wallet: &str, to: &str, value: u64, data: &[u8]) -> String {
    let mut buffer = Vec::new();
    push_field(&mut buffer, TRANSACTION_TAG);
    push_field(&mut buffer, wallet.as_bytes());
    push_field(&mut buffer, to.as_bytes());
    push_field(&mut buffer, &value.to_be_bytes());
    push_field(&mut buffer, data);
    sha256_hex(&buffer)
}

/// Digest identifying a timelock queue entry
///
/// The tuple itself is the identity: queueing the same tuple twice collapses
/// to one entry, and any field change (including `eta`) is a fresh entry.
pub fn queue_digest(target: &str, value: u64, signature: &str, data: &[u8], eta: u64) -> String {
    let mut buffer = Vec::new();
    push_field(&mut buffer, QUEUE_TAG);
    push_field(&mut buffer, target.as_bytes());
    push_field(&mut buffer, &value.to_be_bytes());
    push_field(&mut buffer, signature.as_bytes());
    push_field(&mut buffer, data);
    push_field(&mut buffer, &eta.to_be_bytes());
    sha256_hex(&buffer)
}
