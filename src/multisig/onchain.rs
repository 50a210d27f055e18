//! On-chain style proposal multisig
//!
//! A stateful proposal ledger: owners submit transactions, confirm or revoke
//! them, and execute once enough confirmations accumulate. Proposal ids are
//! sequential from 0 and never reused; a proposal is terminal once executed.
//! The executed flag is committed before the external call, so a reentrant
//! call back into `execute_transaction` is rejected by the normal guard.

use crate::exec::{CallError, Environment};
use crate::multisig::wallet::{MultisigConfig, MultisigError};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised by the proposal state machine
#[derive(Error, Debug)]
pub enum OnChainError {
    #[error("Caller is not an owner: {0}")]
    NotOwner(String),
    #[error("Transaction does not exist: {0}")]
    TxNotExist(usize),
    #[error("Transaction already executed: {0}")]
    TxAlreadyExecuted(usize),
    #[error("Transaction {id} already confirmed by {owner}")]
    TxAlreadyConfirmed { id: usize, owner: String },
    #[error("Transaction {id} not confirmed by {owner}")]
    TxNotConfirmed { id: usize, owner: String },
    #[error("Not enough confirmations: have {have}, need {need}")]
    NumRequireNotEnough { have: usize, need: usize },
    #[error("Target call failed: {0}")]
    TargetCallFailed(#[from] CallError),
    #[error("Config error: {0}")]
    ConfigError(#[from] MultisigError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A proposed transaction awaiting confirmations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposedTransaction {
    /// Destination address
    pub to: String,
    /// Native amount to send
    pub value: u64,
    /// Opaque call payload
    pub data: Vec<u8>,
    /// Terminal once true
    pub executed: bool,
    /// Owners that currently confirm this proposal
    confirmations: HashSet<String>,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
}

impl ProposedTransaction {
    fn new(to: String, value: u64, data: Vec<u8>) -> Self {
        Self {
            to,
            value,
            data,
            executed: false,
            confirmations: HashSet::new(),
            submitted_at: Utc::now(),
        }
    }

    /// Number of distinct confirming owners
    pub fn num_confirmations(&self) -> usize {
        self.confirmations.len()
    }

    /// Check if an owner currently confirms this proposal
    pub fn is_confirmed_by(&self, owner: &str) -> bool {
        self.confirmations.contains(owner)
    }
}

/// A stateful threshold wallet driven by on-chain style confirmations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OnChainMultisig {
    /// Wallet address (holds the funds being authorized)
    address: String,
    /// Owner set and threshold, fixed at construction
    config: MultisigConfig,
    /// Proposals in submission order; the index is the id
    transactions: Vec<ProposedTransaction>,
}

impl OnChainMultisig {
    /// Create a wallet requiring `num_confirmations_required` of the owners
    pub fn new(
        owners: Vec<String>,
        num_confirmations_required: usize,
    ) -> Result<Self, OnChainError> {
        let config = MultisigConfig::new(num_confirmations_required, owners, None)?;
        let address = config.wallet_address();
        Ok(Self {
            address,
            config,
            transactions: Vec::new(),
        })
    }

    /// Get the wallet address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Confirmations required to execute
    pub fn num_confirmations_required(&self) -> usize {
        self.config.threshold()
    }

    /// Check if an address is an authorized owner
    pub fn is_owner(&self, address: &str) -> bool {
        self.config.is_owner(address)
    }

    /// Owner addresses in construction order
    pub fn get_owners(&self) -> &[String] {
        &self.config.owners
    }

    /// Number of proposals ever submitted
    pub fn get_transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Get a proposal by id
    pub fn get_transaction(&self, id: usize) -> Result<&ProposedTransaction, OnChainError> {
        self.transactions.get(id).ok_or(OnChainError::TxNotExist(id))
    }

    fn require_owner(&self, caller: &str) -> Result<(), OnChainError> {
        if !self.config.is_owner(caller) {
            return Err(OnChainError::NotOwner(caller.to_string()));
        }
        Ok(())
    }

    /// Live (not yet executed) proposal by id, for mutation
    fn pending_mut(&mut self, id: usize) -> Result<&mut ProposedTransaction, OnChainError> {
        let tx = self
            .transactions
            .get_mut(id)
            .ok_or(OnChainError::TxNotExist(id))?;
        if tx.executed {
            return Err(OnChainError::TxAlreadyExecuted(id));
        }
        Ok(tx)
    }

    /// Submit a new proposal; returns its id
    pub fn submit_transaction(
        &mut self,
        caller: &str,
        to: &str,
        value: u64,
        data: &[u8],
    ) -> Result<usize, OnChainError> {
        self.require_owner(caller)?;

        let id = self.transactions.len();
        self.transactions
            .push(ProposedTransaction::new(to.to_string(), value, data.to_vec()));

        info!(
            "multisig {} tx {} submitted by {} (to={} value={})",
            self.address, id, caller, to, value
        );
        Ok(id)
    }

    /// Add the caller's confirmation to a proposal
    pub fn confirm_transaction(&mut self, caller: &str, id: usize) -> Result<(), OnChainError> {
        self.require_owner(caller)?;

        let tx = self.pending_mut(id)?;
        if !tx.confirmations.insert(caller.to_string()) {
            return Err(OnChainError::TxAlreadyConfirmed {
                id,
                owner: caller.to_string(),
            });
        }

        debug!(
            "multisig tx {} confirmed by {} ({} confirmations)",
            id,
            caller,
            tx.num_confirmations()
        );
        Ok(())
    }

    /// Withdraw the caller's prior confirmation
    pub fn revoke_confirmation(&mut self, caller: &str, id: usize) -> Result<(), OnChainError> {
        self.require_owner(caller)?;

        let tx = self.pending_mut(id)?;
        if !tx.confirmations.remove(caller) {
            return Err(OnChainError::TxNotConfirmed {
                id,
                owner: caller.to_string(),
            });
        }

        debug!("multisig tx {} confirmation revoked by {}", id, caller);
        Ok(())
    }

    /// Execute a sufficiently confirmed proposal
    ///
    /// The executed flag is set before the environment call and is not rolled
    /// back if the call fails: the authorization is consumed either way.
    pub fn execute_transaction(
        &mut self,
        env: &mut Environment,
        caller: &str,
        id: usize,
    ) -> Result<Vec<u8>, OnChainError> {
        self.require_owner(caller)?;

        let need = self.config.threshold();
        let tx = self.pending_mut(id)?;

        let have = tx.num_confirmations();
        if have < need {
            return Err(OnChainError::NumRequireNotEnough { have, need });
        }

        // Commit before the external call
        tx.executed = true;
        let (to, value, data) = (tx.to.clone(), tx.value, tx.data.clone());

        info!(
            "multisig {} executing tx {} (to={} value={})",
            self.address, id, to, value
        );
        let returndata = env.call(&self.address, &to, value, &data)?;
        Ok(returndata)
    }

    /// Persist the wallet state as JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), OnChainError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load wallet state from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, OnChainError> {
        let json = fs::read_to_string(path)?;
        let wallet = serde_json::from_str(&json)?;
        Ok(wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::exec::CallTarget;
    use crate::token::{Token, TokenCall};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn create_test_wallet(threshold: usize, count: usize) -> (OnChainMultisig, Vec<String>) {
        let owners: Vec<String> = (0..count).map(|_| KeyPair::generate().address()).collect();
        let wallet = OnChainMultisig::new(owners.clone(), threshold).unwrap();
        (wallet, owners)
    }

    /// Token handle that stays inspectable after registration in the environment
    struct SharedToken(Rc<RefCell<Token>>);

    impl CallTarget for SharedToken {
        fn call(&mut self, caller: &str, value: u64, data: &[u8]) -> Result<Vec<u8>, CallError> {
            self.0.borrow_mut().call(caller, value, data)
        }
    }

    #[test]
    fn test_constructor() {
        let (wallet, owners) = create_test_wallet(2, 4);

        assert_eq!(wallet.get_owners().len(), 4);
        assert_eq!(wallet.num_confirmations_required(), 2);
        assert_eq!(wallet.get_transaction_count(), 0);
        for owner in &owners {
            assert!(wallet.is_owner(owner));
        }
        assert!(!wallet.is_owner("stranger"));
    }

    #[test]
    fn test_submit_only_owner() {
        let (mut wallet, _) = create_test_wallet(2, 4);

        let result = wallet.submit_transaction("stranger", "recipient", 2, b"");
        assert!(matches!(result, Err(OnChainError::NotOwner(_))));
    }

    #[test]
    fn test_submit_assigns_sequential_ids() {
        let (mut wallet, owners) = create_test_wallet(2, 4);

        let id0 = wallet
            .submit_transaction(&owners[0], "recipient", 2, b"")
            .unwrap();
        let id1 = wallet
            .submit_transaction(&owners[1], "recipient", 1, b"")
            .unwrap();

        assert_eq!(id0, 0);
        assert_eq!(id1, 1);
        assert_eq!(wallet.get_transaction_count(), 2);
    }

    #[test]
    fn test_confirm_guards() {
        let (mut wallet, owners) = create_test_wallet(2, 4);
        wallet
            .submit_transaction(&owners[0], "recipient", 2, b"")
            .unwrap();

        // Not an owner
        assert!(matches!(
            wallet.confirm_transaction("stranger", 0),
            Err(OnChainError::NotOwner(_))
        ));

        // Unknown id
        assert!(matches!(
            wallet.confirm_transaction(&owners[0], 1),
            Err(OnChainError::TxNotExist(1))
        ));

        // Double confirm is rejected and does not change the count
        wallet.confirm_transaction(&owners[0], 0).unwrap();
        assert!(matches!(
            wallet.confirm_transaction(&owners[0], 0),
            Err(OnChainError::TxAlreadyConfirmed { id: 0, .. })
        ));
        assert_eq!(wallet.get_transaction(0).unwrap().num_confirmations(), 1);
    }

    #[test]
    fn test_confirm_after_execute_fails() {
        let (mut wallet, owners) = create_test_wallet(2, 4);
        let mut env = Environment::new();
        env.deposit(wallet.address(), 2);

        wallet
            .submit_transaction(&owners[0], "recipient", 2, b"")
            .unwrap();
        wallet.confirm_transaction(&owners[0], 0).unwrap();
        wallet.confirm_transaction(&owners[1], 0).unwrap();
        wallet.execute_transaction(&mut env, &owners[0], 0).unwrap();

        assert!(matches!(
            wallet.confirm_transaction(&owners[2], 0),
            Err(OnChainError::TxAlreadyExecuted(0))
        ));
    }

    #[test]
    fn test_revoke_guards() {
        let (mut wallet, owners) = create_test_wallet(2, 4);
        wallet
            .submit_transaction(&owners[0], "recipient", 2, b"")
            .unwrap();

        // Revoking without a prior confirmation
        wallet.confirm_transaction(&owners[1], 0).unwrap();
        assert!(matches!(
            wallet.revoke_confirmation(&owners[0], 0),
            Err(OnChainError::TxNotConfirmed { id: 0, .. })
        ));

        // Successful revoke drops the count
        wallet.confirm_transaction(&owners[0], 0).unwrap();
        wallet.revoke_confirmation(&owners[0], 0).unwrap();
        assert_eq!(wallet.get_transaction(0).unwrap().num_confirmations(), 1);
        assert!(!wallet.get_transaction(0).unwrap().is_confirmed_by(&owners[0]));
    }

    #[test]
    fn test_revoke_after_execute_fails() {
        let (mut wallet, owners) = create_test_wallet(2, 4);
        let mut env = Environment::new();
        env.deposit(wallet.address(), 2);

        wallet
            .submit_transaction(&owners[0], "recipient", 2, b"")
            .unwrap();
        wallet.confirm_transaction(&owners[0], 0).unwrap();
        wallet.confirm_transaction(&owners[1], 0).unwrap();
        wallet.execute_transaction(&mut env, &owners[0], 0).unwrap();

        assert!(matches!(
            wallet.revoke_confirmation(&owners[0], 0),
            Err(OnChainError::TxAlreadyExecuted(0))
        ));
    }

    #[test]
    fn test_execute_threshold_scenario() {
        // 4 owners, threshold 3: 2 confirmations fail, 3 succeed
        let (mut wallet, owners) = create_test_wallet(3, 4);
        let mut env = Environment::new();
        env.deposit(wallet.address(), 2);
        let recipient = KeyPair::generate().address();

        wallet
            .submit_transaction(&owners[0], &recipient, 2, b"")
            .unwrap();
        wallet.confirm_transaction(&owners[0], 0).unwrap();
        wallet.confirm_transaction(&owners[1], 0).unwrap();

        assert!(matches!(
            wallet.execute_transaction(&mut env, &owners[0], 0),
            Err(OnChainError::NumRequireNotEnough { have: 2, need: 3 })
        ));

        wallet.confirm_transaction(&owners[2], 0).unwrap();
        wallet.execute_transaction(&mut env, &owners[0], 0).unwrap();

        assert_eq!(env.balance_of(&recipient), 2);
        assert!(wallet.get_transaction(0).unwrap().executed);
    }

    #[test]
    fn test_execute_twice_fails() {
        let (mut wallet, owners) = create_test_wallet(2, 4);
        let mut env = Environment::new();
        env.deposit(wallet.address(), 2);

        wallet
            .submit_transaction(&owners[0], "recipient", 2, b"")
            .unwrap();
        wallet.confirm_transaction(&owners[0], 0).unwrap();
        wallet.confirm_transaction(&owners[1], 0).unwrap();
        wallet.execute_transaction(&mut env, &owners[0], 0).unwrap();

        assert!(matches!(
            wallet.execute_transaction(&mut env, &owners[0], 0),
            Err(OnChainError::TxAlreadyExecuted(0))
        ));
        assert_eq!(env.balance_of("recipient"), 2);
    }

    #[test]
    fn test_execute_only_owner() {
        let (mut wallet, owners) = create_test_wallet(2, 4);
        let mut env = Environment::new();

        wallet
            .submit_transaction(&owners[0], "recipient", 2, b"")
            .unwrap();
        wallet.confirm_transaction(&owners[0], 0).unwrap();
        wallet.confirm_transaction(&owners[1], 0).unwrap();

        assert!(matches!(
            wallet.execute_transaction(&mut env, "stranger", 0),
            Err(OnChainError::NotOwner(_))
        ));
    }

    #[test]
    fn test_failed_call_consumes_authorization() {
        // Wallet unfunded: the call fails, but executed stays true
        let (mut wallet, owners) = create_test_wallet(2, 4);
        let mut env = Environment::new();

        wallet
            .submit_transaction(&owners[0], "recipient", 2, b"")
            .unwrap();
        wallet.confirm_transaction(&owners[0], 0).unwrap();
        wallet.confirm_transaction(&owners[1], 0).unwrap();

        let result = wallet.execute_transaction(&mut env, &owners[0], 0);
        assert!(matches!(result, Err(OnChainError::TargetCallFailed(_))));
        assert!(wallet.get_transaction(0).unwrap().executed);

        // The consumed proposal can never run again
        env.deposit(wallet.address(), 2);
        assert!(matches!(
            wallet.execute_transaction(&mut env, &owners[0], 0),
            Err(OnChainError::TxAlreadyExecuted(0))
        ));
    }

    #[test]
    fn test_execute_moves_tokens_through_registered_target() {
        let (mut wallet, owners) = create_test_wallet(2, 4);
        let recipient = KeyPair::generate().address();

        let mut token = Token::new(
            "Test Token".to_string(),
            "TST".to_string(),
            18,
            "minter".to_string(),
        );
        token.mint("minter", wallet.address(), 1_000).unwrap();
        let token = Rc::new(RefCell::new(token));

        let mut env = Environment::new();
        env.register_target("token", Box::new(SharedToken(Rc::clone(&token))));

        // Proposal payload is the token's calldata
        let data = serde_json::to_vec(&TokenCall::Transfer {
            to: recipient.clone(),
            amount: 250,
        })
        .unwrap();
        let id = wallet
            .submit_transaction(&owners[0], "token", 0, &data)
            .unwrap();
        wallet.confirm_transaction(&owners[0], id).unwrap();
        wallet.confirm_transaction(&owners[1], id).unwrap();
        wallet.execute_transaction(&mut env, &owners[0], id).unwrap();

        // The ledger saw the wallet address as the authenticated caller
        assert_eq!(token.borrow().balance_of(&recipient), 250);
        assert_eq!(token.borrow().balance_of(wallet.address()), 750);
    }

    #[test]
    fn test_token_revert_surfaces_and_rolls_back_value() {
        let (mut wallet, owners) = create_test_wallet(2, 4);

        // Wallet holds no tokens, so the transfer inside the target reverts
        let token = Rc::new(RefCell::new(Token::new(
            "Test Token".to_string(),
            "TST".to_string(),
            18,
            "minter".to_string(),
        )));

        let mut env = Environment::new();
        env.deposit(wallet.address(), 5);
        env.register_target("token", Box::new(SharedToken(Rc::clone(&token))));

        let data = serde_json::to_vec(&TokenCall::Transfer {
            to: "recipient".to_string(),
            amount: 100,
        })
        .unwrap();
        let id = wallet
            .submit_transaction(&owners[0], "token", 3, &data)
            .unwrap();
        wallet.confirm_transaction(&owners[0], id).unwrap();
        wallet.confirm_transaction(&owners[1], id).unwrap();

        let result = wallet.execute_transaction(&mut env, &owners[0], id);
        assert!(matches!(result, Err(OnChainError::TargetCallFailed(_))));

        // The native value movement was undone, but the authorization is spent
        assert_eq!(env.balance_of(wallet.address()), 5);
        assert_eq!(env.balance_of("token"), 0);
        assert!(wallet.get_transaction(id).unwrap().executed);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let (mut wallet, owners) = create_test_wallet(2, 4);
        wallet
            .submit_transaction(&owners[0], "recipient", 2, b"payload")
            .unwrap();
        wallet.confirm_transaction(&owners[0], 0).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");
        wallet.save_to_file(&path).unwrap();

        let loaded = OnChainMultisig::load_from_file(&path).unwrap();
        assert_eq!(loaded.address(), wallet.address());
        assert_eq!(loaded.get_transaction_count(), 1);
        assert_eq!(loaded.get_transaction(0).unwrap().num_confirmations(), 1);
        assert!(loaded.get_transaction(0).unwrap().is_confirmed_by(&owners[0]));
    }
}
