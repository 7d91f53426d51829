//! # vaultnote-protocol
//!
//! Mint and redeem value-locked notes: non-fungible tokens each backed by a
//! per-note escrow account holding native currency. The escrow's spending
//! authority is a deterministic program derived from public parameters, so
//! a holder can verify — and later redeem — a note without trusting its
//! creator, a database, or any third party.
//!
//! ## Layer map
//!
//! - [`crypto`], [`address`] — hashing, Ed25519 keys, bech32 addresses.
//! - [`escrow`] — redemption conditions, the policy compiler, and
//!   derivation of per-note escrow authorities.
//! - [`token`] — note parameters, the security fingerprint, and the mint
//!   metadata note format.
//! - [`transaction`] — transaction bodies, canonical bytes, atomic groups,
//!   and authorization.
//! - [`ledger`] — the gateway trait plus an in-memory sandbox ledger.
//! - [`workflow`] — the mint and redeem orchestrators and the signing
//!   boundary.
//! - [`config`], [`error`] — constants, tunables, and the failure taxonomy.

pub mod address;
pub mod config;
pub mod crypto;
pub mod error;
pub mod escrow;
pub mod ledger;
pub mod token;
pub mod transaction;
pub mod workflow;

pub use address::Address;
pub use config::ProtocolConfig;
pub use error::WorkflowError;
pub use escrow::{EscrowAuthority, RedemptionConditions};
pub use ledger::{InMemoryLedger, LedgerGateway};
pub use token::{Fingerprint, MintMetadata, TokenParameters};
pub use workflow::{
    KeypairSigner, MintOrchestrator, MintReceipt, MintRequest, RedeemOrchestrator, RedeemReceipt,
};
