//! CLI commands for the gatekeeper
//!
//! Implements the command handlers for the offline signing workflow:
//! generate keys, derive wallet addresses, compute transaction digests,
//! sign them, and verify assembled bundles.

use crate::crypto::{recover_address, transaction_digest, KeyPair};
use crate::multisig::{MultisigConfig, SignatureMultisig};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Generate a new owner key pair
pub fn cmd_keygen() -> CliResult<()> {
    let kp = KeyPair::generate();
    println!("Address:     {}", kp.address());
    println!("Public key:  {}", kp.public_key_hex());
    println!("Private key: {}", kp.private_key_hex());
    Ok(())
}

/// Derive the deterministic wallet address for an owner set and threshold
pub fn cmd_wallet_address(threshold: usize, owners: Vec<String>) -> CliResult<()> {
    let config = MultisigConfig::new(threshold, owners, None)?;
    println!("Wallet:    {}", config.wallet_address());
    println!("Threshold: {}", config.description());
    Ok(())
}

/// Compute the digest owners must sign for a transaction
pub fn cmd_digest(wallet: &str, to: &str, value: u64, data_hex: &str) -> CliResult<()> {
    let data = hex::decode(data_hex)?;
    let digest = transaction_digest(wallet, to, value, &data);
    println!("{digest}");
    Ok(())
}

/// Sign a digest with a private key
pub fn cmd_sign(private_key_hex: &str, digest_hex: &str) -> CliResult<()> {
    let kp = KeyPair::from_private_key_hex(private_key_hex)?;
    let digest = hex::decode(digest_hex)?;
    let signature = kp.sign(&digest)?;
    println!("Signer:    {}", kp.address());
    println!("Signature: {}", hex::encode(signature));
    Ok(())
}

/// Recover the signer address from a signature and digest
pub fn cmd_recover(digest_hex: &str, signature_hex: &str) -> CliResult<()> {
    let digest = hex::decode(digest_hex)?;
    let signature = hex::decode(signature_hex)?;
    let signer = recover_address(&digest, &signature)?;
    println!("{signer}");
    Ok(())
}

/// Verify a concatenated signature bundle against a wallet and digest
pub fn cmd_verify(
    threshold: usize,
    owners: Vec<String>,
    digest_hex: &str,
    bundle_hex: &str,
) -> CliResult<()> {
    let config = MultisigConfig::new(threshold, owners, None)?;
    let wallet = SignatureMultisig::new(config);
    let bundle = hex::decode(bundle_hex)?;

    // Rejections propagate to main, which reports them once
    wallet.check_signatures(digest_hex, &bundle)?;
    println!(
        "✅ Bundle authorizes the digest for wallet {}",
        wallet.address()
    );
    Ok(())
}
