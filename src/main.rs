//! Gatekeeper CLI Application
//!
//! A command-line interface for the offline multisig signing workflow.

use clap::{Parser, Subcommand};
use gatekeeper::cli;

#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(version = "0.1.0")]
#[command(about = "Threshold multisig and timelock execution gatekeeper", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new owner key pair
    Keygen,

    /// Derive the wallet address for an owner set and threshold
    WalletAddress {
        /// Minimum approvals required (M in M-of-N)
        #[arg(short, long)]
        threshold: usize,

        /// Owner addresses (repeat for each owner)
        #[arg(short, long, required = true)]
        owner: Vec<String>,
    },

    /// Compute the digest owners must sign for a transaction
    Digest {
        /// Wallet address the signatures are scoped to
        #[arg(short, long)]
        wallet: String,

        /// Destination address
        #[arg(short, long)]
        to: String,

        /// Native amount to send
        #[arg(short, long)]
        value: u64,

        /// Call payload, hex encoded
        #[arg(short, long, default_value = "")]
        data: String,
    },

    /// Sign a digest with a private key
    Sign {
        /// Hex-encoded private key
        #[arg(short, long)]
        key: String,

        /// Hex-encoded 32-byte digest
        #[arg(short, long)]
        digest: String,
    },

    /// Recover the signer address from a signature
    Recover {
        /// Hex-encoded 32-byte digest
        #[arg(short, long)]
        digest: String,

        /// Hex-encoded 65-byte signature
        #[arg(short, long)]
        signature: String,
    },

    /// Verify a concatenated signature bundle
    Verify {
        /// Minimum approvals required (M in M-of-N)
        #[arg(short, long)]
        threshold: usize,

        /// Owner addresses (repeat for each owner)
        #[arg(short, long, required = true)]
        owner: Vec<String>,

        /// Hex-encoded 32-byte digest
        #[arg(short, long)]
        digest: String,

        /// Hex-encoded signature bundle
        #[arg(short, long)]
        bundle: String,
    },
}

fn main() {
    env_logger::init();

    let args = Cli::parse();
    let result = match args.command {
        Commands::Keygen => cli::cmd_keygen(),
        Commands::WalletAddress { threshold, owner } => cli::cmd_wallet_address(threshold, owner),
        Commands::Digest {
            wallet,
            to,
            value,
            data,
        } => cli::cmd_digest(&wallet, &to, value, &data),
        Commands::Sign { key, digest } => cli::cmd_sign(&key, &digest),
        Commands::Recover { digest, signature } => cli::cmd_recover(&digest, &signature),
        Commands::Verify {
            threshold,
            owner,
            digest,
            bundle,
        } => cli::cmd_verify(threshold, owner, &digest, &bundle),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
