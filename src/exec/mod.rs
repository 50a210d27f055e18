//! Execution environment for authorized calls
//!
//! The gatekeeper components (multisig wallets, timelock) authorize actions;
//! this module models the world those actions act on. The environment holds
//! native balances per address and optional [`CallTarget`] handlers, and
//! exposes a single `call` operation: move value from the caller to the
//! target, then hand the payload to the target's handler. The gatekeepers
//! commit their own state before calling in, so a failed call never rolls
//! back an authorization.

use log::debug;
use std::collections::HashMap;
use thiserror::Error;

/// Errors surfaced by a target invocation
#[derive(Error, Debug)]
pub enum CallError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u64, need: u64 },
    #[error("Malformed calldata: {0}")]
    BadCalldata(String),
    #[error("Call reverted: {0}")]
    Reverted(String),
}

/// A callable destination registered in the environment
///
/// `caller` is the authenticated identity of the component making the call
/// (a wallet or timelock address), `value` the native amount already credited
/// to the target, and `data` the opaque payload.
pub trait CallTarget {
    fn call(&mut self, caller: &str, value: u64, data: &[u8]) -> Result<Vec<u8>, CallError>;
}

/// Native balances and registered call targets
#[derive(Default)]
pub struct Environment {
    /// Native balance per address
    balances: HashMap<String, u64>,
    /// Registered handlers per address; plain accounts have none
    targets: HashMap<String, Box<dyn CallTarget>>,
}

impl Environment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit native units to an address
    pub fn deposit(&mut self, address: &str, amount: u64) {
        *self.balances.entry(address.to_string()).or_insert(0) += amount;
    }

    /// Native balance of an address
    pub fn balance_of(&self, address: &str) -> u64 {
        *self.balances.get(address).unwrap_or(&0)
    }

    /// Register a handler at an address
    pub fn register_target(&mut self, address: &str, target: Box<dyn CallTarget>) {
        self.targets.insert(address.to_string(), target);
    }

    /// Invoke `target` with `(value, data)` on behalf of `from`
    ///
    /// Moves `value` from the caller's balance to the target, then dispatches
    /// `data` to the target's handler if one is registered. If the handler
    /// fails, the value movement is undone and the error surfaces to the
    /// caller.
    pub fn call(
        &mut self,
        from: &str,
        target: &str,
        value: u64,
        data: &[u8],
    ) -> Result<Vec<u8>, CallError> {
        if value > 0 {
            let have = self.balance_of(from);
            if have < value {
                return Err(CallError::InsufficientBalance { have, need: value });
            }
            *self.balances.entry(from.to_string()).or_insert(0) -= value;
            *self.balances.entry(target.to_string()).or_insert(0) += value;
        }

        debug!("call {} -> {} value={} data={}B", from, target, value, data.len());

        let result = match self.targets.get_mut(target) {
            Some(handler) => handler.call(from, value, data),
            None => Ok(Vec::new()),
        };

        if result.is_err() && value > 0 {
            // Undo the value movement for a reverted call
            *self.balances.entry(target.to_string()).or_insert(0) -= value;
            *self.balances.entry(from.to_string()).or_insert(0) += value;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rejecting;

    impl CallTarget for Rejecting {
        fn call(&mut self, _caller: &str, _value: u64, _data: &[u8]) -> Result<Vec<u8>, CallError> {
            Err(CallError::Reverted("always rejects".to_string()))
        }
    }

    struct Echo;

    impl CallTarget for Echo {
        fn call(&mut self, _caller: &str, _value: u64, data: &[u8]) -> Result<Vec<u8>, CallError> {
            Ok(data.to_vec())
        }
    }

    #[test]
    fn test_value_transfer_to_plain_account() {
        let mut env = Environment::new();
        env.deposit("wallet", 5);

        env.call("wallet", "recipient", 2, b"").unwrap();
        assert_eq!(env.balance_of("wallet"), 3);
        assert_eq!(env.balance_of("recipient"), 2);
    }

    #[test]
    fn test_insufficient_balance() {
        let mut env = Environment::new();
        env.deposit("wallet", 1);

        let result = env.call("wallet", "recipient", 2, b"");
        assert!(matches!(
            result,
            Err(CallError::InsufficientBalance { have: 1, need: 2 })
        ));
        assert_eq!(env.balance_of("wallet"), 1);
    }

    #[test]
    fn test_target_dispatch() {
        let mut env = Environment::new();
        env.register_target("echo", Box::new(Echo));

        let out = env.call("caller", "echo", 0, b"payload").unwrap();
        assert_eq!(out, b"payload");
    }

    #[test]
    fn test_reverted_call_rolls_back_value() {
        let mut env = Environment::new();
        env.deposit("wallet", 5);
        env.register_target("bad", Box::new(Rejecting));

        let result = env.call("wallet", "bad", 3, b"");
        assert!(matches!(result, Err(CallError::Reverted(_))));
        // Value movement undone
        assert_eq!(env.balance_of("wallet"), 5);
        assert_eq!(env.balance_of("bad"), 0);
    }
}
