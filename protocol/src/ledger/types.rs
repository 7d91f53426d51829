//! Read models returned by ledger queries.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::transaction::Transaction;

/// On-chain view of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub asset_id: u64,
    pub name: String,
    pub unit: String,
    pub total: u64,
    pub decimals: u8,
    /// The account that created the asset.
    pub creator: Address,
    pub manager: Option<Address>,
    /// Repurposed by this protocol to carry the escrow address; compared
    /// against a fresh re-derivation during verification.
    pub reserve: Option<Address>,
    pub freeze: Option<Address>,
    pub clawback: Option<Address>,
    pub metadata_hash: Option<[u8; 32]>,
    /// ID of the creation transaction, whose note holds the mint metadata.
    pub creation_tx_id: String,
}

/// One asset position held by an account. An entry with `amount == 0`
/// means the account has opted in and may receive units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHolding {
    pub asset_id: u64,
    pub amount: u64,
}

/// On-chain view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: Address,
    /// Balance in motes.
    pub balance: u64,
    /// Last committed sequence number; the next transaction from this
    /// account must carry `sequence + 1`.
    pub sequence: u64,
    pub holdings: Vec<AssetHolding>,
}

impl AccountInfo {
    /// Units of `asset_id` held, or `None` when not opted in.
    pub fn holding(&self, asset_id: u64) -> Option<u64> {
        self.holdings
            .iter()
            .find(|h| h.asset_id == asset_id)
            .map(|h| h.amount)
    }
}

/// A committed transaction as read back from history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction: Transaction,
    pub confirmed_round: u64,
    /// For asset creations, the ID the ledger assigned.
    pub created_asset_id: Option<u64>,
}
