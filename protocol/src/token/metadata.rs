//! The mint note: on-chain JSON metadata carried by the creation
//! transaction.
//!
//! This is the only persistent record of the escrow program — there is no
//! database. Redemption, possibly run years later by a different operator,
//! re-reads this note from transaction history and rebuilds everything
//! from it. The format is versioned JSON with a hard size cap, and parsing
//! is tolerant of missing optional fields so older notes stay redeemable.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{MAX_NOTE_BYTES, PROTOCOL_VERSION_TAG};
use crate::escrow::EscrowAuthority;
use crate::token::fingerprint::Fingerprint;

/// Failures encoding or decoding a mint note.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("note is {found} bytes, ledger cap is {max}")]
    TooLarge { found: usize, max: usize },

    #[error("note is not valid metadata JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("note version {found:?} is not recognized")]
    UnknownVersion { found: String },

    #[error("note field {field:?} is not valid hex")]
    BadHex { field: &'static str },
}

/// The note payload written by the mint and read back by redemption.
///
/// `locked_amount` is optional on the wire: early notes omitted it, and
/// redemption falls back to live balance inspection when it is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintMetadata {
    /// Protocol version tag, e.g. `vaultnote/v1`.
    pub version: String,

    /// The note's derivation nonce.
    pub nonce: u64,

    /// Locked value in motes. Absent on legacy notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_amount: Option<u64>,

    /// Compiled escrow program bytes, hex-encoded.
    pub program: String,

    /// Security fingerprint, hex-encoded.
    pub fingerprint: String,

    /// Mint wall-clock time, Unix milliseconds. Informational only —
    /// nothing verifies against it.
    pub created_at: u64,
}

impl MintMetadata {
    /// Builds the note for a fresh mint.
    pub fn for_mint(
        nonce: u64,
        locked_amount: u64,
        authority: &EscrowAuthority,
        fingerprint: &Fingerprint,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION_TAG.to_string(),
            nonce,
            locked_amount: Some(locked_amount),
            program: authority.program_hex(),
            fingerprint: fingerprint.to_hex(),
            created_at: Utc::now().timestamp_millis() as u64,
        }
    }

    /// Serializes to note bytes, enforcing the ledger's size cap.
    pub fn encode(&self) -> Result<Vec<u8>, MetadataError> {
        let bytes = serde_json::to_vec(self)?;
        if bytes.len() > MAX_NOTE_BYTES {
            return Err(MetadataError::TooLarge {
                found: bytes.len(),
                max: MAX_NOTE_BYTES,
            });
        }
        Ok(bytes)
    }

    /// Parses note bytes read back from transaction history.
    ///
    /// Rejects unknown version tags outright; everything downstream
    /// assumes this version's field semantics.
    pub fn decode(bytes: &[u8]) -> Result<Self, MetadataError> {
        let meta: Self = serde_json::from_slice(bytes)?;
        if meta.version != PROTOCOL_VERSION_TAG {
            return Err(MetadataError::UnknownVersion {
                found: meta.version,
            });
        }
        Ok(meta)
    }

    /// Decodes the embedded escrow program bytes.
    pub fn program_bytes(&self) -> Result<Vec<u8>, MetadataError> {
        hex::decode(&self.program).map_err(|_| MetadataError::BadHex { field: "program" })
    }

    /// Decodes the embedded fingerprint.
    pub fn fingerprint(&self) -> Result<Fingerprint, MetadataError> {
        Fingerprint::from_hex(&self.fingerprint).ok_or(MetadataError::BadHex {
            field: "fingerprint",
        })
    }
}
