//! Validated parameters for a value-locked note.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::config::{MAX_TOKEN_NAME_LEN, MAX_TOKEN_UNIT_LEN};

/// Rejections from [`TokenParameters::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenParamsError {
    #[error("token name must be 1..={MAX_TOKEN_NAME_LEN} characters, got {found}")]
    NameLength { found: usize },

    #[error("unit symbol must be 1..={MAX_TOKEN_UNIT_LEN} characters, got {found}")]
    UnitLength { found: usize },

    #[error("locked amount must be positive")]
    ZeroLockedAmount,
}

/// Immutable identity of one note, fixed at mint time.
///
/// Supply and decimals are not fields: every note is a single indivisible
/// unit by construction, so they are constants (1 and 0) wherever an asset
/// creation is built from these parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenParameters {
    /// Display name.
    pub name: String,
    /// Unit symbol.
    pub unit: String,
    /// The account minting the note.
    pub creator: Address,
    /// Value locked behind the note, in motes.
    pub locked_amount: u64,
    /// Per-note random salt, chosen before escrow derivation. A creator
    /// never reuses a nonce for two live notes; distinctness is enforced
    /// by derivation yielding a distinct escrow address per nonce rather
    /// than by an explicit registry.
    pub nonce: u64,
}

impl TokenParameters {
    pub fn new(
        name: impl Into<String>,
        unit: impl Into<String>,
        creator: Address,
        locked_amount: u64,
        nonce: u64,
    ) -> Result<Self, TokenParamsError> {
        let name = name.into();
        let unit = unit.into();

        if name.is_empty() || name.len() > MAX_TOKEN_NAME_LEN {
            return Err(TokenParamsError::NameLength { found: name.len() });
        }
        if unit.is_empty() || unit.len() > MAX_TOKEN_UNIT_LEN {
            return Err(TokenParamsError::UnitLength { found: unit.len() });
        }
        if locked_amount == 0 {
            return Err(TokenParamsError::ZeroLockedAmount);
        }

        Ok(Self {
            name,
            unit,
            creator,
            locked_amount,
            nonce,
        })
    }
}
