//! Redemption conditions and their compiled program form.
//!
//! A [`RedemptionConditions`] value describes everything an escrow is
//! allowed to do. [`RedemptionConditions::compile`] turns it into canonical
//! program bytes; the program's hash is the escrow address, so two escrows
//! with the same creator but different nonces live at different addresses
//! and can never be confused for one another.
//!
//! Evaluation is pure: [`RedemptionConditions::admits`] looks only at the
//! transaction and its group, never at ledger state. Balance, sequence, and
//! holding checks stay the ledger's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::transaction::{Transaction, TxBody};

/// Program magic; identifies the bytes as a compiled redemption policy.
const PROGRAM_MAGIC: &[u8; 4] = b"VNEP";

/// Compiled program length: magic + version + creator + nonce + min payout.
const PROGRAM_LEN: usize = 4 + 2 + 32 + 8 + 8;

/// Policy version this build compiles and accepts.
pub const POLICY_VERSION: u16 = 1;

/// Largest fee the program will authorize on any escrow transaction.
/// Stops a third party from draining the escrow through fee inflation,
/// since program bytes are public and anyone can attach them.
const MAX_AUTHORIZED_FEE: u64 = 2_000;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures decoding compiled program bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("program is {found} bytes, expected {expected}")]
    BadLength { found: usize, expected: usize },

    #[error("program magic mismatch, not a redemption policy")]
    BadMagic,

    #[error("unsupported policy version {found}")]
    UnsupportedVersion { found: u16 },
}

// ---------------------------------------------------------------------------
// RedemptionConditions
// ---------------------------------------------------------------------------

/// The spending rules compiled into an escrow program.
///
/// `nonce` exists purely to separate escrows: a creator minting two notes
/// with identical amounts still gets two distinct programs and therefore
/// two distinct escrow addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionConditions {
    /// Policy version the program was compiled under.
    pub version: u16,

    /// The account that minted the note. The post-mint hand-off clause
    /// only releases the fresh note to this address.
    pub creator: Address,

    /// Uniqueness salt chosen at mint time.
    pub nonce: u64,

    /// Minimum payment, in motes, the redemption swap must deliver to the
    /// note holder.
    pub min_payout: u64,
}

impl RedemptionConditions {
    /// Builds current-version conditions.
    pub fn new(creator: Address, nonce: u64, min_payout: u64) -> Self {
        Self {
            version: POLICY_VERSION,
            creator,
            nonce,
            min_payout,
        }
    }

    /// Compiles the conditions to canonical program bytes.
    ///
    /// Layout: `"VNEP"` magic, version (u16 LE), creator (32 bytes), nonce
    /// (u64 LE), minimum payout (u64 LE). Fixed width, no framing — the
    /// encoding must be injective because the program hash is an address.
    pub fn compile(&self) -> Vec<u8> {
        let mut program = Vec::with_capacity(PROGRAM_LEN);
        program.extend_from_slice(PROGRAM_MAGIC);
        program.extend_from_slice(&self.version.to_le_bytes());
        program.extend_from_slice(self.creator.as_bytes());
        program.extend_from_slice(&self.nonce.to_le_bytes());
        program.extend_from_slice(&self.min_payout.to_le_bytes());
        program
    }

    /// Decodes program bytes back into conditions.
    pub fn decode(program: &[u8]) -> Result<Self, PolicyError> {
        if program.len() != PROGRAM_LEN {
            return Err(PolicyError::BadLength {
                found: program.len(),
                expected: PROGRAM_LEN,
            });
        }
        if &program[..4] != PROGRAM_MAGIC {
            return Err(PolicyError::BadMagic);
        }
        let version = u16::from_le_bytes([program[4], program[5]]);
        if version != POLICY_VERSION {
            return Err(PolicyError::UnsupportedVersion { found: version });
        }

        let mut creator = [0u8; 32];
        creator.copy_from_slice(&program[6..38]);
        let nonce = u64::from_le_bytes(program[38..46].try_into().expect("8-byte slice"));
        let min_payout = u64::from_le_bytes(program[46..54].try_into().expect("8-byte slice"));

        Ok(Self {
            version,
            creator: Address::from_hash(creator),
            nonce,
            min_payout,
        })
    }

    /// Decides whether the conditions authorize `group[index]`.
    ///
    /// The admitted shapes, and nothing else:
    ///
    /// - **Mint** (standalone): asset creation of an indivisible
    ///   single-unit asset whose manager and reserve are both the escrow
    ///   itself, with a metadata commitment present.
    /// - **Hand-off** (standalone): transfer of the single unit to the
    ///   creator recorded in the conditions.
    /// - **Redemption swap** (two-transaction group, escrow at index 1):
    ///   payment of at least the minimum payout to whoever sends the note
    ///   back to the escrow in the group's first slot.
    /// - **Destroy** (any context): retiring the asset after it returned.
    /// - **Close-out** (any context): zero-amount payment sweeping the
    ///   residual balance. The ledger refuses this while the escrow still
    ///   has asset holdings, so it only fires after destroy.
    pub fn admits(&self, group: &[Transaction], index: usize) -> bool {
        let Some(tx) = group.get(index) else {
            return false;
        };
        if tx.fee > MAX_AUTHORIZED_FEE {
            return false;
        }

        match &tx.body {
            TxBody::AssetCreate(params) => {
                group.len() == 1
                    && params.total == 1
                    && params.decimals == 0
                    && params.manager == Some(tx.sender)
                    && params.reserve == Some(tx.sender)
                    && params.freeze.is_none()
                    && params.clawback.is_none()
                    && params.metadata_hash.is_some()
            }

            TxBody::AssetTransfer {
                receiver, amount, ..
            } => group.len() == 1 && *amount == 1 && *receiver == self.creator,

            TxBody::AssetDestroy { .. } => true,

            TxBody::Payment {
                receiver,
                amount,
                close_to,
            } => {
                // Close-out: sweep only, no payment leg.
                if close_to.is_some() {
                    return *amount == 0;
                }
                // Redemption swap: second slot of a two-transaction group
                // whose first slot returns the note to this escrow.
                if group.len() != 2 || index != 1 {
                    return false;
                }
                let counterpart = &group[0];
                let TxBody::AssetTransfer {
                    receiver: note_receiver,
                    amount: note_amount,
                    ..
                } = &counterpart.body
                else {
                    return false;
                };
                *note_receiver == tx.sender
                    && *note_amount == 1
                    && *receiver == counterpart.sender
                    && *amount >= self.min_payout
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{assign_group, AssetCreateParams, TransactionBuilder};

    fn addr(tag: &[u8]) -> Address {
        Address::from_program(tag)
    }

    fn conditions() -> RedemptionConditions {
        RedemptionConditions::new(addr(b"creator"), 42, 5_000_000)
    }

    fn escrow_addr(c: &RedemptionConditions) -> Address {
        Address::from_program(&c.compile())
    }

    fn swap_group(
        escrow: Address,
        holder: Address,
        receiver: Address,
        payout: u64,
    ) -> Vec<Transaction> {
        let mut txs = vec![
            TransactionBuilder::asset_transfer(holder, 1, escrow, 1)
                .fee(1_000)
                .sequence(1)
                .timestamp(1_700_000_000_000)
                .build(),
            TransactionBuilder::payment(escrow, receiver, payout)
                .fee(1_000)
                .sequence(3)
                .timestamp(1_700_000_000_000)
                .build(),
        ];
        assign_group(&mut txs);
        txs
    }

    #[test]
    fn compile_decode_roundtrip() {
        let c = conditions();
        let program = c.compile();
        assert_eq!(program.len(), PROGRAM_LEN);
        assert_eq!(RedemptionConditions::decode(&program).unwrap(), c);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(
            RedemptionConditions::decode(b"short"),
            Err(PolicyError::BadLength {
                found: 5,
                expected: PROGRAM_LEN
            })
        );

        let mut wrong_magic = conditions().compile();
        wrong_magic[0] = b'X';
        assert_eq!(
            RedemptionConditions::decode(&wrong_magic),
            Err(PolicyError::BadMagic)
        );

        let mut future_version = conditions().compile();
        future_version[4] = 0xff;
        assert!(matches!(
            RedemptionConditions::decode(&future_version),
            Err(PolicyError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn distinct_nonces_compile_to_distinct_programs() {
        let a = RedemptionConditions::new(addr(b"creator"), 1, 5_000_000);
        let b = RedemptionConditions::new(addr(b"creator"), 2, 5_000_000);
        assert_ne!(a.compile(), b.compile());
    }

    #[test]
    fn admits_well_formed_mint() {
        let c = conditions();
        let escrow = escrow_addr(&c);
        let tx = TransactionBuilder::asset_create(
            escrow,
            AssetCreateParams {
                name: "Ticket".into(),
                unit: "TCK".into(),
                total: 1,
                decimals: 0,
                manager: Some(escrow),
                reserve: Some(escrow),
                freeze: None,
                clawback: None,
                metadata_hash: Some([9u8; 32]),
            },
        )
        .fee(1_000)
        .sequence(1)
        .timestamp(1_700_000_000_000)
        .build();
        assert!(c.admits(&[tx], 0));
    }

    #[test]
    fn rejects_mint_with_divisible_supply_or_foreign_reserve() {
        let c = conditions();
        let escrow = escrow_addr(&c);
        let base = AssetCreateParams {
            name: "Ticket".into(),
            unit: "TCK".into(),
            total: 1,
            decimals: 0,
            manager: Some(escrow),
            reserve: Some(escrow),
            freeze: None,
            clawback: None,
            metadata_hash: Some([9u8; 32]),
        };

        let mut divisible = base.clone();
        divisible.total = 100;
        let tx = TransactionBuilder::asset_create(escrow, divisible)
            .fee(1_000)
            .build();
        assert!(!c.admits(&[tx], 0));

        let mut foreign_reserve = base.clone();
        foreign_reserve.reserve = Some(addr(b"attacker"));
        let tx = TransactionBuilder::asset_create(escrow, foreign_reserve)
            .fee(1_000)
            .build();
        assert!(!c.admits(&[tx], 0));

        let mut with_clawback = base;
        with_clawback.clawback = Some(escrow);
        let tx = TransactionBuilder::asset_create(escrow, with_clawback)
            .fee(1_000)
            .build();
        assert!(!c.admits(&[tx], 0));
    }

    #[test]
    fn hand_off_only_to_creator() {
        let c = conditions();
        let escrow = escrow_addr(&c);

        let to_creator = TransactionBuilder::asset_transfer(escrow, 1, c.creator, 1)
            .fee(1_000)
            .build();
        assert!(c.admits(&[to_creator], 0));

        let to_stranger = TransactionBuilder::asset_transfer(escrow, 1, addr(b"stranger"), 1)
            .fee(1_000)
            .build();
        assert!(!c.admits(&[to_stranger], 0));
    }

    #[test]
    fn admits_redemption_swap() {
        let c = conditions();
        let escrow = escrow_addr(&c);
        let holder = addr(b"holder");
        let group = swap_group(escrow, holder, holder, 5_000_000);
        assert!(c.admits(&group, 1));
    }

    #[test]
    fn rejects_underpaying_swap() {
        let c = conditions();
        let escrow = escrow_addr(&c);
        let holder = addr(b"holder");
        let group = swap_group(escrow, holder, holder, 4_999_999);
        assert!(!c.admits(&group, 1));
    }

    #[test]
    fn rejects_swap_paying_someone_other_than_note_sender() {
        let c = conditions();
        let escrow = escrow_addr(&c);
        let group = swap_group(escrow, addr(b"holder"), addr(b"thief"), 5_000_000);
        assert!(!c.admits(&group, 1));
    }

    #[test]
    fn rejects_standalone_payment() {
        let c = conditions();
        let escrow = escrow_addr(&c);
        let tx = TransactionBuilder::payment(escrow, addr(b"anyone"), 5_000_000)
            .fee(1_000)
            .build();
        assert!(!c.admits(&[tx], 0));
    }

    #[test]
    fn rejects_fee_inflation() {
        let c = conditions();
        let escrow = escrow_addr(&c);
        let tx = TransactionBuilder::asset_destroy(escrow, 1).fee(50_000).build();
        assert!(!c.admits(&[tx], 0));
    }

    #[test]
    fn close_out_must_carry_zero_amount() {
        let c = conditions();
        let escrow = escrow_addr(&c);

        let close = TransactionBuilder::close_out(escrow, addr(b"redeemer"))
            .fee(1_000)
            .build();
        assert!(c.admits(&[close], 0));

        let paying_close = TransactionBuilder::new(
            escrow,
            TxBody::Payment {
                receiver: addr(b"redeemer"),
                amount: 10,
                close_to: Some(addr(b"redeemer")),
            },
        )
        .fee(1_000)
        .build();
        assert!(!c.admits(&[paying_close], 0));
    }
}
