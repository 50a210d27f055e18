//! ERC-20 style token implementation

use crate::exec::{CallError, CallTarget};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Token-related errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: u128, need: u128 },
    #[error("Invalid amount: amount must be greater than 0")]
    InvalidAmount,
    #[error("Invalid address: cannot transfer to self")]
    SelfTransfer,
    #[error("Caller is not the minter: {0}")]
    NotMinter(String),
}

/// Transfer event (recorded when tokens move)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from: String,
    pub to: String,
    pub amount: u128,
    pub timestamp: DateTime<Utc>,
}

/// Calldata accepted by the token's [`CallTarget`] impl
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TokenCall {
    Transfer { to: String, amount: u128 },
    Approve { spender: String, amount: u128 },
    Mint { to: String, amount: u128 },
}

/// An ERC-20 style fungible token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    /// Token name (e.g., "My Token")
    pub name: String,
    /// Token symbol (e.g., "MTK")
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
    /// The only address allowed to mint
    pub minter: String,
    /// Total minted supply
    total_supply: u128,
    /// Balances: address -> amount
    balances: HashMap<String, u128>,
    /// Allowances: owner -> (spender -> amount)
    allowances: HashMap<String, HashMap<String, u128>>,
    /// Transfer history (last 100)
    pub transfer_history: Vec<TransferEvent>,
}

impl Token {
    /// Create a new token with zero supply
    pub fn new(name: String, symbol: String, decimals: u8, minter: String) -> Self {
        Self {
            name,
            symbol,
            decimals,
            minter,
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            transfer_history: Vec::new(),
        }
    }

    /// Get total supply
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Get balance of an address
    pub fn balance_of(&self, address: &str) -> u128 {
        *self.balances.get(address).unwrap_or(&0)
    }

    /// Get allowance for a spender
    pub fn allowance(&self, owner: &str, spender: &str) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn record_transfer(&mut self, from: &str, to: &str, amount: u128) {
        self.transfer_history.push(TransferEvent {
            from: from.to_string(),
            to: to.to_string(),
            amount,
            timestamp: Utc::now(),
        });
        if self.transfer_history.len() > 100 {
            self.transfer_history.remove(0);
        }
    }

    /// Mint new tokens to an address (minter only)
    pub fn mint(&mut self, caller: &str, to: &str, amount: u128) -> Result<(), TokenError> {
        if caller != self.minter {
            return Err(TokenError::NotMinter(caller.to_string()));
        }
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }

        *self.balances.entry(to.to_string()).or_insert(0) += amount;
        self.total_supply += amount;
        self.record_transfer("", to, amount);
        Ok(())
    }

    /// Transfer tokens from one address to another
    pub fn transfer(&mut self, from: &str, to: &str, amount: u128) -> Result<(), TokenError> {
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }
        if from == to {
            return Err(TokenError::SelfTransfer);
        }

        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        *self.balances.entry(from.to_string()).or_insert(0) -= amount;
        *self.balances.entry(to.to_string()).or_insert(0) += amount;
        self.record_transfer(from, to, amount);
        Ok(())
    }

    /// Approve a spender to transfer tokens on behalf of owner
    pub fn approve(&mut self, owner: &str, spender: &str, amount: u128) {
        // Can be 0 to revoke
        self.allowances
            .entry(owner.to_string())
            .or_default()
            .insert(spender.to_string(), amount);
    }

    /// Transfer tokens on behalf of owner (requires prior approval)
    pub fn transfer_from(
        &mut self,
        spender: &str,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<(), TokenError> {
        let current_allowance = self.allowance(from, spender);
        if current_allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                have: current_allowance,
                need: amount,
            });
        }

        self.transfer(from, to, amount)?;

        if let Some(spenders) = self.allowances.get_mut(from) {
            if let Some(allowance) = spenders.get_mut(spender) {
                *allowance -= amount;
            }
        }
        Ok(())
    }
}

impl CallTarget for Token {
    fn call(&mut self, caller: &str, _value: u64, data: &[u8]) -> Result<Vec<u8>, CallError> {
        let call: TokenCall =
            serde_json::from_slice(data).map_err(|e| CallError::BadCalldata(e.to_string()))?;

        let result = match call {
            TokenCall::Transfer { to, amount } => self.transfer(caller, &to, amount),
            TokenCall::Approve { spender, amount } => {
                self.approve(caller, &spender, amount);
                Ok(())
            }
            TokenCall::Mint { to, amount } => self.mint(caller, &to, amount),
        };

        result.map_err(|e| CallError::Reverted(e.to_string()))?;
        Ok(Vec::new())
    }
}
