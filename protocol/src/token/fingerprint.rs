//! The security fingerprint binding a note to its escrow.
//!
//! The fingerprint is a SHA-256 digest over a canonical encoding of every
//! field a forger would need to fake: creator, name, unit, locked amount,
//! nonce, the compiled escrow program, and the protocol version tag. It is
//! written into the asset's metadata commitment and into the mint note, and
//! recomputed from on-chain data at redemption time. A single flipped bit
//! anywhere in the bound fields produces a different digest.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::PROTOCOL_VERSION_TAG;
use crate::crypto::hash::sha256_array;
use crate::token::params::TokenParameters;

/// A computed note fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Canonical encoding of the bound fields.
    ///
    /// Fixed-width little-endian integers, length-prefixed variable fields,
    /// fixed field order. Stable across processes and releases — the same
    /// bytes mint-side and redeem-side, possibly years apart.
    pub fn encode(params: &TokenParameters, program: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128 + program.len());

        push_bytes(&mut buf, PROTOCOL_VERSION_TAG.as_bytes());
        buf.extend_from_slice(params.creator.as_bytes());
        push_bytes(&mut buf, params.name.as_bytes());
        push_bytes(&mut buf, params.unit.as_bytes());
        buf.extend_from_slice(&params.locked_amount.to_le_bytes());
        buf.extend_from_slice(&params.nonce.to_le_bytes());
        push_bytes(&mut buf, program);

        buf
    }

    /// Computes the fingerprint for a note and its escrow program.
    pub fn compute(params: &TokenParameters, program: &[u8]) -> Self {
        Self(sha256_array(&Self::encode(params, program)))
    }

    /// Recomputes and compares. Returns `false` on mismatch — a forged or
    /// corrupted note is a data condition, not a programming error.
    pub fn verify(expected: &Fingerprint, params: &TokenParameters, program: &[u8]) -> bool {
        Self::compute(params, program) == *expected
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parses a 64-character hex digest.
    pub fn from_hex(hex_str: &str) -> Option<Self> {
        let bytes = hex::decode(hex_str).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

fn push_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}
