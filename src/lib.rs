//! Gatekeeper: a trusted-execution gatekeeper in Rust
//!
//! This crate answers one question three different ways: has a sufficient,
//! correctly authenticated, non-replayed set of principals approved this
//! exact action, and is it being executed in the right time window?
//!
//! - [`multisig::SignatureMultisig`] — authorizes via a bundle of detached
//!   recoverable ECDSA signatures over a deterministic transaction digest
//! - [`multisig::OnChainMultisig`] — authorizes via a stateful proposal
//!   ledger with submit/confirm/revoke/execute semantics
//! - [`timelock::Timelock`] — additionally gates *when* an authorized call
//!   may run, between a minimum delay and a grace deadline
//!
//! Authorized actions run against an [`exec::Environment`], which holds
//! native balances and pluggable call targets (such as the
//! [`token::Token`] ledger).
//!
//! # Example
//!
//! ```
//! use gatekeeper::multisig::OnChainMultisig;
//! use gatekeeper::exec::Environment;
//! use gatekeeper::crypto::KeyPair;
//!
//! let owners: Vec<String> = (0..3).map(|_| KeyPair::generate().address()).collect();
//! let mut wallet = OnChainMultisig::new(owners.clone(), 2).unwrap();
//!
//! let mut env = Environment::new();
//! env.deposit(wallet.address(), 2);
//!
//! let id = wallet.submit_transaction(&owners[0], "recipient", 2, b"").unwrap();
//! wallet.confirm_transaction(&owners[0], id).unwrap();
//! wallet.confirm_transaction(&owners[1], id).unwrap();
//! wallet.execute_transaction(&mut env, &owners[0], id).unwrap();
//!
//! assert_eq!(env.balance_of("recipient"), 2);
//! ```

pub mod cli;
pub mod crypto;
pub mod exec;
pub mod multisig;
pub mod timelock;
pub mod token;

// Re-export commonly used types
pub use crypto::{KeyPair, SIGNATURE_LENGTH};
pub use exec::{CallError, CallTarget, Environment};
pub use multisig::{
    collect_signatures, MultisigConfig, MultisigError, OnChainError, OnChainMultisig,
    SignatureMultisig,
};
pub use timelock::{Timelock, TimelockError, GRACE_PERIOD};
pub use token::{Token, TokenError};
