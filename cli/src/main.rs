//! # Vaultnote CLI
//!
//! Entry point for the `vaultnote` binary. Parses arguments, initializes
//! logging, and dispatches to the subcommands:
//!
//! - `demo`        — mint and redeem a note against a sandbox ledger
//! - `derive`      — offline escrow derivation
//! - `fingerprint` — offline fingerprint computation
//! - `version`     — print build version information

mod cli;
mod logging;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde_json::json;
use std::sync::Arc;

use vaultnote_protocol::address::Address;
use vaultnote_protocol::config::ProtocolConfig;
use vaultnote_protocol::crypto::keys::VaultKeypair;
use vaultnote_protocol::escrow;
use vaultnote_protocol::ledger::InMemoryLedger;
use vaultnote_protocol::token::{Fingerprint, TokenParameters};
use vaultnote_protocol::workflow::{
    KeypairSigner, MintOrchestrator, MintRequest, RedeemOrchestrator,
};

use cli::{Commands, VaultnoteCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = VaultnoteCli::parse();

    match cli.command {
        Commands::Demo(args) => run_demo(args).await,
        Commands::Derive(args) => derive_escrow(args),
        Commands::Fingerprint(args) => compute_fingerprint(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Runs the full lifecycle against an in-process sandbox ledger: fund a
/// creator from the faucet, mint a note, then redeem it as the holder.
async fn run_demo(args: cli::DemoArgs) -> Result<()> {
    logging::init_logging(
        "vaultnote=info,vaultnote_protocol=info",
        LogFormat::from_str_lossy(&args.log_format),
    );

    let config = ProtocolConfig::default();
    let ledger = Arc::new(InMemoryLedger::new());

    let keypair = VaultKeypair::generate();
    let creator = Address::from_public_key(&keypair.public_key());
    // Faucet: enough for the escrow funding plus fees and the creator's
    // own minimum balance.
    ledger.fund(creator, config.escrow_funding(args.amount) + 1_000_000);
    tracing::info!(%creator, "sandbox creator funded");

    let signer = Arc::new(KeypairSigner::new(keypair));
    let minter = MintOrchestrator::new(ledger.clone(), signer.clone(), config.clone());
    let receipt = minter
        .mint(MintRequest {
            name: args.name,
            unit: args.unit,
            locked_amount: args.amount,
        })
        .await
        .map_err(|e| anyhow!("mint failed: {e}"))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "mint": {
                "asset_id": receipt.asset_id,
                "escrow_address": receipt.escrow_address.to_string(),
                "fingerprint": receipt.fingerprint.to_hex(),
                "nonce": receipt.nonce,
                "funded_amount": receipt.funded_amount,
                "tx_ids": receipt.tx_ids,
            }
        }))?
    );

    let redeemer = RedeemOrchestrator::new(ledger, signer, config);
    let outcome = redeemer
        .redeem(receipt.asset_id)
        .await
        .map_err(|e| anyhow!("redeem failed: {e}"))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "redeem": {
                "payout": outcome.payout,
                "tx_ids": outcome.tx_ids,
            }
        }))?
    );
    Ok(())
}

/// Derives an escrow authority from public parameters, no ledger needed.
fn derive_escrow(args: cli::DeriveArgs) -> Result<()> {
    let creator: Address = args
        .creator
        .parse()
        .with_context(|| format!("invalid creator address {:?}", args.creator))?;
    let authority = escrow::derive(creator, args.nonce, args.amount);

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "escrow_address": authority.address.to_string(),
            "program": authority.program_hex(),
            "conditions": authority.conditions,
        }))?
    );
    Ok(())
}

/// Computes a note's fingerprint from public parameters.
fn compute_fingerprint(args: cli::FingerprintArgs) -> Result<()> {
    let creator: Address = args
        .creator
        .parse()
        .with_context(|| format!("invalid creator address {:?}", args.creator))?;
    let params = TokenParameters::new(args.name, args.unit, creator, args.amount, args.nonce)
        .map_err(|e| anyhow!("invalid token parameters: {e}"))?;
    let authority = escrow::derive(creator, args.nonce, args.amount);
    let fingerprint = Fingerprint::compute(&params, &authority.program);

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "fingerprint": fingerprint.to_hex(),
            "escrow_address": authority.address.to_string(),
        }))?
    );
    Ok(())
}

fn print_version() {
    println!("vaultnote {}", env!("CARGO_PKG_VERSION"));
}
