//! # CLI Interface
//!
//! Command-line argument structure for the `vaultnote` binary, using
//! `clap` derive. Four subcommands: `demo`, `derive`, `fingerprint`, and
//! `version`.

use clap::{Parser, Subcommand};

/// Vaultnote operator toolkit.
///
/// Mints and redeems value-locked notes against an in-process sandbox
/// ledger, and provides offline utilities for escrow derivation and
/// fingerprint computation.
#[derive(Parser, Debug)]
#[command(
    name = "vaultnote",
    about = "Value-locked note mint/redeem toolkit",
    version,
    propagate_version = true
)]
pub struct VaultnoteCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `vaultnote` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full lifecycle against a sandbox ledger: mint a note, then
    /// redeem it, printing both receipts as JSON.
    Demo(DemoArgs),
    /// Derive an escrow authority offline from public parameters.
    Derive(DeriveArgs),
    /// Compute a note's security fingerprint offline.
    Fingerprint(FingerprintArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `demo` subcommand.
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Display name of the note to mint.
    #[arg(long, default_value = "Ticket")]
    pub name: String,

    /// Unit symbol.
    #[arg(long, default_value = "TCK")]
    pub unit: String,

    /// Amount to lock behind the note, in motes.
    #[arg(long, default_value_t = 5_000_000)]
    pub amount: u64,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "VAULTNOTE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `derive` subcommand.
#[derive(Parser, Debug)]
pub struct DeriveArgs {
    /// Creator address (bech32, `vault1...`).
    #[arg(long)]
    pub creator: String,

    /// Per-note nonce.
    #[arg(long)]
    pub nonce: u64,

    /// Locked amount in motes (the escrow's minimum payout).
    #[arg(long)]
    pub amount: u64,
}

/// Arguments for the `fingerprint` subcommand.
#[derive(Parser, Debug)]
pub struct FingerprintArgs {
    /// Creator address (bech32, `vault1...`).
    #[arg(long)]
    pub creator: String,

    /// Display name of the note.
    #[arg(long)]
    pub name: String,

    /// Unit symbol.
    #[arg(long)]
    pub unit: String,

    /// Locked amount in motes.
    #[arg(long)]
    pub amount: u64,

    /// Per-note nonce.
    #[arg(long)]
    pub nonce: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        VaultnoteCli::command().debug_assert();
    }
}
