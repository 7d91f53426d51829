//! # Protocol Configuration & Constants
//!
//! Every magic number in the mint/redeem protocol lives here. If you're
//! hardcoding a constant somewhere else, you're doing it wrong.
//!
//! Amounts are always integers in motes, the smallest indivisible unit of
//! the ledger's native currency (1 VLT = 1_000_000 motes). No floating
//! point anywhere near money.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Version tag written into every mint note. Redemption flows parse this to
/// select the right metadata layout; unknown future tags must still parse
/// the fields they know about (the note format is append-only).
pub const PROTOCOL_VERSION_TAG: &str = "vaultnote/v1";

/// Canonical-encoding version byte pair used in fingerprints and escrow
/// programs. Bumped only on a breaking change to the byte layouts.
pub const WIRE_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Ledger Parameters
// ---------------------------------------------------------------------------

/// Minimum balance every live account must retain, in motes.
pub const ACCOUNT_MIN_BALANCE: u64 = 100_000;

/// Additional minimum balance required per asset an account has opted into.
/// An escrow that created a note therefore needs 200_000 motes of reserve
/// for as long as the asset record exists.
pub const PER_ASSET_MIN_BALANCE: u64 = 100_000;

/// Minimum transaction fee, in motes.
pub const MIN_TX_FEE: u64 = 1_000;

/// Maximum size of a transaction note field, in bytes. The mint metadata
/// (program bytes included) must fit under this cap.
pub const MAX_NOTE_BYTES: usize = 1_024;

// ---------------------------------------------------------------------------
// Token Parameters
// ---------------------------------------------------------------------------

/// Maximum display name length for a note, in bytes.
pub const MAX_TOKEN_NAME_LEN: usize = 32;

/// Maximum unit symbol length, in bytes.
pub const MAX_TOKEN_UNIT_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Funding & Redemption Buffers
// ---------------------------------------------------------------------------

/// Reserve the mint workflow funds into a fresh escrow on top of the locked
/// amount: base minimum balance plus one asset slot.
pub const ESCROW_RESERVE: u64 = ACCOUNT_MIN_BALANCE + PER_ASSET_MIN_BALANCE;

/// Fee headroom funded into the escrow at mint time. The escrow pays its
/// own fees (asset creation, transfer, redemption payout, destroy, close),
/// so this must cover five transactions with room to spare.
pub const MINT_FEE_BUFFER: u64 = 5_000;

// ---------------------------------------------------------------------------
// Confirmation
// ---------------------------------------------------------------------------

/// How long a workflow waits for a single transaction to confirm before
/// surfacing a timeout.
pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval while waiting for confirmation.
pub const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// Redemption Policy
// ---------------------------------------------------------------------------

/// Constants governing the *fallback* payout computation used when a legacy
/// note carries no explicit locked amount.
///
/// These are a policy choice, not a protocol invariant: the fallback pays
/// `escrow_balance - min_reserve - fee_buffer` (clamped to zero), which
/// reflects the escrow's current balance rather than the originally locked
/// amount. Deployments with different ledger reserve rules should override
/// the defaults rather than patch the constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionPolicy {
    /// Balance the escrow must retain through the redemption swap. The
    /// default accounts for the asset record still held at swap time.
    pub min_reserve: u64,
    /// Fee headroom left in the escrow for the destroy and close-out
    /// transactions that follow the swap.
    pub fee_buffer: u64,
}

impl Default for RedemptionPolicy {
    fn default() -> Self {
        Self {
            min_reserve: ESCROW_RESERVE,
            fee_buffer: 3_000,
        }
    }
}

// ---------------------------------------------------------------------------
// ProtocolConfig
// ---------------------------------------------------------------------------

/// Tunable knobs for the mint and redeem workflows.
///
/// The defaults match the constants above; embedders override fields rather
/// than fork the crate.
#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    /// Reserve funded into a fresh escrow beyond the locked amount.
    pub escrow_reserve: u64,
    /// Fee headroom funded into a fresh escrow.
    pub mint_fee_buffer: u64,
    /// Per-transaction confirmation wait bound.
    pub confirm_timeout: Duration,
    /// Fallback payout policy for legacy notes.
    pub redemption_policy: RedemptionPolicy,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            escrow_reserve: ESCROW_RESERVE,
            mint_fee_buffer: MINT_FEE_BUFFER,
            confirm_timeout: CONFIRM_TIMEOUT,
            redemption_policy: RedemptionPolicy::default(),
        }
    }
}

impl ProtocolConfig {
    /// Total amount the mint workflow sends to a fresh escrow for a given
    /// locked amount.
    pub fn escrow_funding(&self, locked_amount: u64) -> u64 {
        locked_amount
            .saturating_add(self.escrow_reserve)
            .saturating_add(self.mint_fee_buffer)
    }
}
