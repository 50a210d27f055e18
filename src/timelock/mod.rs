//! Time-locked execution gate
//!
//! A single-admin controller that gates arbitrary calls behind a minimum
//! delay and a maximum grace window. Queued entries are content-addressed by
//! a digest over `(target, value, signature, data, eta)`; queueing the same
//! tuple twice collapses to one entry. The queued flag is cleared before the
//! target is invoked, so a reentrant call back into `execute_transaction`
//! fails the `NotInQueue` guard.
//!
//! Admin rotation is itself gated: `change_admin` accepts only the timelock's
//! own address as caller identity, and the only code path that supplies that
//! identity is the timelock's own execution of a queued self-call. Even the
//! controller's privilege transfer is therefore delayed and auditable.
//!
//! Time is an explicit `now` argument (unix seconds against an external,
//! monotonically non-decreasing clock); the timelock never sleeps or waits.

use crate::crypto::queue_digest;
use crate::exec::{CallError, Environment};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Window after `eta` during which a queued transaction stays executable
pub const GRACE_PERIOD: u64 = 7 * 24 * 60 * 60;

/// Method selector for the admin-rotation self-call
pub const CHANGE_ADMIN_SIGNATURE: &str = "changeAdmin(address)";

/// Errors raised by the timelock guards
#[derive(Error, Debug)]
pub enum TimelockError {
    #[error("Caller is not the admin: {0}")]
    NotAdmin(String),
    #[error("Invalid eta {eta}: must be at least {earliest}")]
    InvalidEta { eta: u64, earliest: u64 },
    #[error("Transaction not in queue: {0}")]
    NotInQueue(String),
    #[error("Transaction not yet due: eta {eta}, now {now}")]
    NotYetDue { eta: u64, now: u64 },
    #[error("Transaction expired: deadline {deadline}, now {now}")]
    Expired { deadline: u64, now: u64 },
    #[error("Caller is not the timelock itself: {0}")]
    CallerNotTimelock(String),
    #[error("Target call failed: {0}")]
    TargetCallFailed(#[from] CallError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Single-admin queue of delayed transactions
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Timelock {
    /// The timelock's own address (caller identity for gated self-calls)
    address: String,
    /// Current privileged controller
    admin: String,
    /// Minimum seconds between queue time and eta
    delay: u64,
    /// Digests of currently queued transactions
    queued: HashSet<String>,
}

impl Timelock {
    /// Create a timelock at `address` controlled by `admin`
    pub fn new(address: String, admin: String, delay: u64) -> Self {
        Self {
            address,
            admin,
            delay,
            queued: HashSet::new(),
        }
    }

    /// The timelock's own address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Current admin
    pub fn admin(&self) -> &str {
        &self.admin
    }

    /// Minimum queue-to-eta delay in seconds
    pub fn delay(&self) -> u64 {
        self.delay
    }

    /// Digest identifying a queue entry
    pub fn get_tx_hash(
        target: &str,
        value: u64,
        signature: &str,
        data: &[u8],
        eta: u64,
    ) -> String {
        queue_digest(target, value, signature, data, eta)
    }

    /// Check whether a digest is currently queued
    pub fn queued_transactions(&self, digest: &str) -> bool {
        self.queued.contains(digest)
    }

    fn require_admin(&self, caller: &str) -> Result<(), TimelockError> {
        if caller != self.admin {
            return Err(TimelockError::NotAdmin(caller.to_string()));
        }
        Ok(())
    }

    /// Queue a transaction for execution at or after `eta`
    #[allow(clippy::too_many_arguments)]
    pub fn queue_transaction(
        &mut self,
        caller: &str,
        target: &str,
        value: u64,
        signature: &str,
        data: &[u8],
        eta: u64,
        now: u64,
    ) -> Result<String, TimelockError> {
        self.require_admin(caller)?;

        let earliest = now + self.delay;
        if eta < earliest {
            return Err(TimelockError::InvalidEta { eta, earliest });
        }

        let digest = Self::get_tx_hash(target, value, signature, data, eta);
        self.queued.insert(digest.clone());

        info!(
            "timelock {} queued {} (target={} eta={})",
            self.address, digest, target, eta
        );
        Ok(digest)
    }

    /// Remove a queued transaction without executing it
    pub fn cancel_transaction(
        &mut self,
        caller: &str,
        target: &str,
        value: u64,
        signature: &str,
        data: &[u8],
        eta: u64,
    ) -> Result<(), TimelockError> {
        self.require_admin(caller)?;

        let digest = Self::get_tx_hash(target, value, signature, data, eta);
        if !self.queued.remove(&digest) {
            return Err(TimelockError::NotInQueue(digest));
        }

        info!("timelock {} cancelled {}", self.address, digest);
        Ok(())
    }

    /// Execute a queued transaction inside its `[eta, eta + GRACE_PERIOD]` window
    ///
    /// The queued flag is cleared before the target is invoked and is not
    /// restored if the call fails: the authorization is consumed either way,
    /// and a retry requires re-queueing with a fresh eta.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_transaction(
        &mut self,
        env: &mut Environment,
        caller: &str,
        target: &str,
        value: u64,
        signature: &str,
        data: &[u8],
        eta: u64,
        now: u64,
    ) -> Result<Vec<u8>, TimelockError> {
        self.require_admin(caller)?;

        let digest = Self::get_tx_hash(target, value, signature, data, eta);
        if !self.queued.contains(&digest) {
            return Err(TimelockError::NotInQueue(digest));
        }
        if now < eta {
            return Err(TimelockError::NotYetDue { eta, now });
        }
        let deadline = eta + GRACE_PERIOD;
        if now > deadline {
            return Err(TimelockError::Expired { deadline, now });
        }

        // Commit before the call
        self.queued.remove(&digest);
        debug!("timelock {} executing {}", self.address, digest);

        if target == self.address {
            // Self-calls never move native value; a non-zero value here would
            // otherwise vanish without a transfer
            if value != 0 {
                return Err(TimelockError::TargetCallFailed(CallError::Reverted(
                    format!("self-call cannot carry value: {value}"),
                )));
            }
            self.dispatch_self_call(signature, data)
        } else {
            let returndata = env.call(&self.address, target, value, data)?;
            info!("timelock {} executed {} (target={})", self.address, digest, target);
            Ok(returndata)
        }
    }

    /// Handle a queued call whose target is the timelock itself
    fn dispatch_self_call(&mut self, signature: &str, data: &[u8]) -> Result<Vec<u8>, TimelockError> {
        match signature {
            CHANGE_ADMIN_SIGNATURE => {
                let new_admin = String::from_utf8(data.to_vec()).map_err(|_| {
                    TimelockError::TargetCallFailed(CallError::BadCalldata(
                        "admin address is not valid UTF-8".to_string(),
                    ))
                })?;
                let own_address = self.address.clone();
                self.change_admin(&own_address, &new_admin)?;
                Ok(Vec::new())
            }
            other => Err(TimelockError::TargetCallFailed(CallError::BadCalldata(
                format!("unknown self-call selector: {other}"),
            ))),
        }
    }

    /// Rotate the admin
    ///
    /// Callable only with the timelock's own address as caller identity, i.e.
    /// only via a queued and executed self-call. Any direct caller, including
    /// the current admin, is rejected.
    pub fn change_admin(&mut self, caller: &str, new_admin: &str) -> Result<(), TimelockError> {
        if caller != self.address {
            return Err(TimelockError::CallerNotTimelock(caller.to_string()));
        }

        info!(
            "timelock {} admin changed: {} -> {}",
            self.address, self.admin, new_admin
        );
        self.admin = new_admin.to_string();
        Ok(())
    }

    /// Persist the timelock state as JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TimelockError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load timelock state from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TimelockError> {
        let json = fs::read_to_string(path)?;
        let timelock = serde_json::from_str(&json)?;
        Ok(timelock)
    }
}
