//! Transaction construction and atomic grouping.
//!
//! The [`TransactionBuilder`] produces unsigned [`Transaction`]s with
//! deterministic IDs derived from their contents. Authorization happens
//! separately (see [`super::signing`]) — construction stays testable
//! without key material.
//!
//! ## Canonical bytes
//!
//! Signing, ID computation, and group binding all operate on
//! [`Transaction::signable_bytes`]: a deterministic concatenation of fields
//! with fixed-width little-endian integers and length prefixes. Serde is
//! deliberately not involved — field ordering across serialization formats
//! is not a promise we want to depend on.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::types::{AssetCreateParams, Authorization, TxBody};
use crate::address::Address;
use crate::crypto::hash::{blake3_hash_multi, domain_separated_hash, sha256};

/// Domain separation context for atomic group IDs.
const GROUP_ID_CONTEXT: &str = "vaultnote/txgroup/v1";

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A ledger transaction.
///
/// The `id` is `hex(sha256(sha256(signable_bytes)))` — stable across
/// authorization, so it can be computed before signing and quoted in
/// receipts afterwards. The group binding *is* part of the signable bytes:
/// a signature over a grouped transaction commits to its group, which is
/// what makes the redemption swap non-splittable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID (64 hex chars).
    pub id: String,

    /// Wire format version.
    pub version: u16,

    /// The account this transaction spends from.
    pub sender: Address,

    /// Fee in motes, paid by the sender.
    pub fee: u64,

    /// Per-sender strictly increasing sequence number. The ledger rejects
    /// anything that is not exactly `account.sequence + 1`, which is the
    /// serialization point for concurrent submissions from one account.
    pub sequence: u64,

    /// Unix timestamp in milliseconds at construction.
    pub timestamp: u64,

    /// The operation.
    pub body: TxBody,

    /// Optional note payload (mint metadata rides here). Capped by the
    /// ledger at [`crate::config::MAX_NOTE_BYTES`].
    pub note: Option<Vec<u8>>,

    /// Atomic group ID (hex), set by [`assign_group`]. `None` for
    /// standalone transactions.
    pub group: Option<String>,

    /// Authorization; `None` fresh from the builder.
    pub authorization: Option<Authorization>,
}

impl Transaction {
    /// Canonical byte representation used for signing and ID computation.
    ///
    /// Includes the group binding; excludes `id` and `authorization`.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);

        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(self.sender.as_bytes());
        buf.extend_from_slice(&self.fee.to_le_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());

        // Body discriminant, then body fields.
        buf.extend_from_slice(self.body.kind().as_bytes());
        buf.push(0x00);
        match &self.body {
            TxBody::Payment {
                receiver,
                amount,
                close_to,
            } => {
                buf.extend_from_slice(receiver.as_bytes());
                buf.extend_from_slice(&amount.to_le_bytes());
                Self::push_opt_address(&mut buf, close_to);
            }
            TxBody::AssetCreate(p) => {
                Self::push_str(&mut buf, &p.name);
                Self::push_str(&mut buf, &p.unit);
                buf.extend_from_slice(&p.total.to_le_bytes());
                buf.push(p.decimals);
                Self::push_opt_address(&mut buf, &p.manager);
                Self::push_opt_address(&mut buf, &p.reserve);
                Self::push_opt_address(&mut buf, &p.freeze);
                Self::push_opt_address(&mut buf, &p.clawback);
                match &p.metadata_hash {
                    Some(h) => {
                        buf.push(0x01);
                        buf.extend_from_slice(h);
                    }
                    None => buf.push(0x00),
                }
            }
            TxBody::AssetTransfer {
                asset_id,
                receiver,
                amount,
            } => {
                buf.extend_from_slice(&asset_id.to_le_bytes());
                buf.extend_from_slice(receiver.as_bytes());
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            TxBody::AssetDestroy { asset_id } => {
                buf.extend_from_slice(&asset_id.to_le_bytes());
            }
        }

        // Note (length-prefixed if present).
        match &self.note {
            Some(note) => {
                buf.push(0x01);
                buf.extend_from_slice(&(note.len() as u32).to_le_bytes());
                buf.extend_from_slice(note);
            }
            None => buf.push(0x00),
        }

        // Group binding.
        match &self.group {
            Some(group_hex) => {
                buf.push(0x01);
                buf.extend_from_slice(group_hex.as_bytes());
            }
            None => buf.push(0x00),
        }

        buf
    }

    /// Canonical bytes with the group binding blanked.
    ///
    /// Group IDs are computed over the member transactions *before* the
    /// binding is written into them (writing it first would be circular).
    fn pregroup_bytes(&self) -> Vec<u8> {
        if self.group.is_none() {
            return self.signable_bytes();
        }
        let mut ungrouped = self.clone();
        ungrouped.group = None;
        ungrouped.signable_bytes()
    }

    /// Computes the transaction ID from the current field values.
    pub fn compute_id(&self) -> String {
        let hash = sha256(&sha256(&self.signable_bytes()));
        hex::encode(hash)
    }

    /// Returns `true` if the transaction carries an authorization.
    pub fn is_authorized(&self) -> bool {
        self.authorization.is_some()
    }

    fn push_str(buf: &mut Vec<u8>, s: &str) {
        buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
        buf.extend_from_slice(s.as_bytes());
    }

    fn push_opt_address(buf: &mut Vec<u8>, addr: &Option<Address>) {
        match addr {
            Some(a) => {
                buf.push(0x01);
                buf.extend_from_slice(a.as_bytes());
            }
            None => buf.push(0x00),
        }
    }
}

// ---------------------------------------------------------------------------
// Atomic groups
// ---------------------------------------------------------------------------

/// Binds a set of transactions into an atomic group.
///
/// The group ID is a domain-separated hash over every member's pre-group
/// canonical bytes, so it commits to each member's full contents and their
/// order. After assignment, every member's ID is recomputed (the binding
/// is part of the signable bytes) — authorize the members *after* calling
/// this, never before.
pub fn assign_group(txs: &mut [Transaction]) -> String {
    let digests: Vec<[u8; 32]> = txs
        .iter()
        .map(|tx| domain_separated_hash(GROUP_ID_CONTEXT, &tx.pregroup_bytes()))
        .collect();
    let parts: Vec<&[u8]> = digests.iter().map(|d| d.as_slice()).collect();
    let group_id = hex::encode(blake3_hash_multi(&parts));

    for tx in txs.iter_mut() {
        tx.group = Some(group_id.clone());
        tx.id = tx.compute_id();
    }
    group_id
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned [`Transaction`]s.
///
/// Defaults: current wire version, fee and sequence 0 (callers must set
/// real values before submission), timestamp set at build time.
pub struct TransactionBuilder {
    sender: Address,
    fee: u64,
    sequence: u64,
    timestamp: Option<u64>,
    body: TxBody,
    note: Option<Vec<u8>>,
}

impl TransactionBuilder {
    /// Starts a builder for the given sender and body.
    pub fn new(sender: Address, body: TxBody) -> Self {
        Self {
            sender,
            fee: 0,
            sequence: 0,
            timestamp: None,
            body,
            note: None,
        }
    }

    /// Convenience: a payment body.
    pub fn payment(sender: Address, receiver: Address, amount: u64) -> Self {
        Self::new(
            sender,
            TxBody::Payment {
                receiver,
                amount,
                close_to: None,
            },
        )
    }

    /// Convenience: a payment that also closes the sender account,
    /// sweeping any residual balance to `close_to`.
    pub fn close_out(sender: Address, close_to: Address) -> Self {
        Self::new(
            sender,
            TxBody::Payment {
                receiver: close_to,
                amount: 0,
                close_to: Some(close_to),
            },
        )
    }

    /// Convenience: an asset creation body.
    pub fn asset_create(sender: Address, params: AssetCreateParams) -> Self {
        Self::new(sender, TxBody::AssetCreate(params))
    }

    /// Convenience: an asset transfer body.
    pub fn asset_transfer(sender: Address, asset_id: u64, receiver: Address, amount: u64) -> Self {
        Self::new(
            sender,
            TxBody::AssetTransfer {
                asset_id,
                receiver,
                amount,
            },
        )
    }

    /// Convenience: an opt-in (zero-amount self transfer).
    pub fn opt_in(sender: Address, asset_id: u64) -> Self {
        Self::asset_transfer(sender, asset_id, sender, 0)
    }

    /// Convenience: an asset destroy body.
    pub fn asset_destroy(sender: Address, asset_id: u64) -> Self {
        Self::new(sender, TxBody::AssetDestroy { asset_id })
    }

    /// Sets the fee in motes.
    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    /// Sets the sender's sequence number.
    pub fn sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Sets the timestamp explicitly (Unix milliseconds). Tests use this
    /// for determinism; workflows let it default to now.
    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Attaches a note payload.
    pub fn note(mut self, note: Vec<u8>) -> Self {
        self.note = Some(note);
        self
    }

    /// Produces an unsigned [`Transaction`] with its ID computed.
    pub fn build(self) -> Transaction {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp_millis() as u64);

        let mut tx = Transaction {
            id: String::new(),
            version: crate::config::WIRE_VERSION,
            sender: self.sender,
            fee: self.fee,
            sequence: self.sequence,
            timestamp,
            body: self.body,
            note: self.note,
            group: None,
            authorization: None,
        };
        tx.id = tx.compute_id();
        tx
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
