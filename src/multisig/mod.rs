//! Multi-signature wallets
//!
//! Two M-of-N threshold wallet variants that authorize the same kind of
//! action through different media:
//!
//! - [`SignatureMultisig`] verifies a caller-supplied bundle of detached
//!   recoverable signatures over the transaction digest; no proposal state.
//! - [`OnChainMultisig`] keeps a proposal ledger that owners submit, confirm,
//!   revoke, and execute.
//!
//! # Example
//!
//! ```
//! use gatekeeper::crypto::KeyPair;
//! use gatekeeper::exec::Environment;
//! use gatekeeper::multisig::{collect_signatures, MultisigConfig, SignatureMultisig};
//!
//! let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
//! let owners = keys.iter().map(|k| k.address()).collect();
//! let wallet = SignatureMultisig::new(MultisigConfig::new(2, owners, None).unwrap());
//!
//! let mut env = Environment::new();
//! env.deposit(wallet.address(), 2);
//!
//! let digest = wallet.encode_transaction_data("recipient", 2, b"");
//! let bundle = collect_signatures(&keys[..2], &digest).unwrap();
//! wallet.exec_transaction(&mut env, "recipient", 2, b"", &bundle).unwrap();
//! assert_eq!(env.balance_of("recipient"), 2);
//! ```

pub mod onchain;
pub mod signature;
pub mod wallet;

pub use onchain::{OnChainError, OnChainMultisig, ProposedTransaction};
pub use signature::{collect_signatures, SignatureMultisig};
pub use wallet::{MultisigConfig, MultisigError};
