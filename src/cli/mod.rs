//! CLI command handlers

pub mod commands;

pub use commands::{
    cmd_digest, cmd_keygen, cmd_recover, cmd_sign, cmd_verify, cmd_wallet_address, CliResult,
};
