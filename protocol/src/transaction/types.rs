//! Core type definitions for ledger transactions.
//!
//! The body set is deliberately small: payments (with optional account
//! close-out), asset creation, asset transfer (a zero-amount self-transfer
//! doubles as an opt-in), and asset destruction. That is the complete
//! vocabulary the mint/redeem protocol needs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;

// ---------------------------------------------------------------------------
// TxBody
// ---------------------------------------------------------------------------

/// The operation a transaction performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxBody {
    /// Native currency transfer. When `close_to` is set, the sender's
    /// entire remaining balance (after `amount` and the fee) is swept to
    /// the close-to address and the account is removed from ledger state.
    Payment {
        receiver: Address,
        /// Amount in motes.
        amount: u64,
        close_to: Option<Address>,
    },

    /// Creates a new asset. The sender becomes the asset's creator and
    /// implicitly holds the entire supply.
    AssetCreate(AssetCreateParams),

    /// Moves asset units. A transfer of `amount == 0` to oneself is an
    /// opt-in: it registers the account as willing to hold the asset,
    /// which the ledger requires before any units can be received.
    AssetTransfer {
        asset_id: u64,
        receiver: Address,
        amount: u64,
    },

    /// Permanently retires an asset. Only the asset's manager may destroy
    /// it, and only while holding the entire supply.
    AssetDestroy { asset_id: u64 },
}

impl TxBody {
    /// Short tag used in IDs, logs, and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            TxBody::Payment { .. } => "payment",
            TxBody::AssetCreate(_) => "asset-create",
            TxBody::AssetTransfer { .. } => "asset-transfer",
            TxBody::AssetDestroy { .. } => "asset-destroy",
        }
    }
}

impl fmt::Display for TxBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

// ---------------------------------------------------------------------------
// AssetCreateParams
// ---------------------------------------------------------------------------

/// Parameters for an asset creation transaction.
///
/// For value-locked notes: `total == 1`, `decimals == 0`, `manager` and
/// `reserve` both set to the escrow address, `freeze` and `clawback` left
/// empty (nobody gets arbitrary seizure power), and `metadata_hash`
/// carrying the security fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCreateParams {
    /// Display name.
    pub name: String,
    /// Unit symbol.
    pub unit: String,
    /// Total supply, fixed forever at creation.
    pub total: u64,
    /// Decimal places for display. 0 makes the asset indivisible.
    pub decimals: u8,
    /// Authority allowed to destroy the asset.
    pub manager: Option<Address>,
    /// Reserve field — repurposed by this protocol to point at the
    /// controlling escrow address. The core anti-forgery check compares
    /// this against a recomputed escrow address.
    pub reserve: Option<Address>,
    /// Freeze authority. Always `None` for notes.
    pub freeze: Option<Address>,
    /// Clawback authority. Always `None` for notes.
    pub clawback: Option<Address>,
    /// 32-byte commitment slot; carries the security fingerprint.
    pub metadata_hash: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// Proof that the sender approved a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Authorization {
    /// Ed25519 signature from the key controlling the sender address.
    /// Both fields hex-encoded; the public key must hash to the sender
    /// address (checked by the ledger, preventing key substitution).
    Key {
        public_key: String,
        signature: String,
    },

    /// Escrow program bytes. Valid only when the program's derived address
    /// equals the sender and the program's redemption conditions admit the
    /// transaction in its group context. No private key exists or is
    /// needed — the authority is the program itself.
    Program { program: Vec<u8> },
}
