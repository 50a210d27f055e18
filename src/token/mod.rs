//! Fungible-token collaborator
//!
//! The asset ledger the gatekeeper moves when an authorized target happens to
//! be a token rather than a plain account. The gatekeeper only ever consumes
//! the standard interface: `mint`, `transfer`, `approve`, `transfer_from`,
//! `balance_of`. The [`CallTarget`](crate::exec::CallTarget) impl lets a
//! token be registered in the environment and driven by executed proposals.

pub mod token;

pub use token::{Token, TokenCall, TokenError, TransferEvent};
