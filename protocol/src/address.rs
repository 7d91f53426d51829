//! # Vault Addresses
//!
//! An address is the on-ledger identity of an account. Derivation is a
//! one-way hash followed by Bech32 encoding:
//!
//! ```text
//! key account:     Bech32("vault", BLAKE3(public_key))
//! escrow account:  Bech32("vault", BLAKE3_derive_key("vaultnote/program-address/v1", program))
//! ```
//!
//! The two derivation paths are domain-separated, so a public key can never
//! alias an escrow program's address. Program addressing is the foundation
//! of trustless verification: anyone holding a note's public parameters can
//! recompute its escrow program and therefore its escrow address, and
//! compare that against the asset's on-chain reserve field.
//!
//! Bech32 gives built-in error detection (up to 4 character errors), which
//! matters when addresses travel through copy-paste.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::crypto::hash::{blake3_hash, domain_separated_hash};
use crate::crypto::keys::VaultPublicKey;

/// The human-readable prefix for all vault addresses.
const VAULT_HRP: &str = "vault";

/// Domain separation context for program-controlled (escrow) addresses.
const PROGRAM_ADDRESS_CONTEXT: &str = "vaultnote/program-address/v1";

/// Errors that can occur while parsing an address.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The Bech32 string could not be decoded.
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    /// The decoded address has an unexpected human-readable prefix.
    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp { expected: String, got: String },

    /// The decoded data has an unexpected length.
    #[error("invalid address data length: expected {expected} bytes, got {got}")]
    InvalidDataLength { expected: usize, got: usize },
}

/// A 32-byte account address, displayed as `vault1...` Bech32.
///
/// `Ord` is derived so addresses can key `BTreeMap`s in the ledger state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    hash: [u8; 32],
}

impl Address {
    /// Derives the address of a key-based account from its public key.
    pub fn from_public_key(public_key: &VaultPublicKey) -> Self {
        Self {
            hash: blake3_hash(public_key.as_bytes()),
        }
    }

    /// Derives the address of a program-controlled account from its program
    /// bytes.
    ///
    /// This is the one-way mapping from an escrow authority's program to
    /// its on-ledger address. Deterministic: identical program bytes always
    /// yield the identical address, which is what lets two independent
    /// parties recompute and compare escrow addresses.
    pub fn from_program(program: &[u8]) -> Self {
        Self {
            hash: domain_separated_hash(PROGRAM_ADDRESS_CONTEXT, program),
        }
    }

    /// Constructs an address directly from its 32-byte hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self { hash }
    }

    /// Returns the raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    /// Encodes the address as a Bech32 string (`vault1...`).
    pub fn encode(&self) -> String {
        let hrp = Hrp::parse(VAULT_HRP).expect("static HRP is valid");
        bech32::encode::<Bech32>(hrp, &self.hash).expect("32 bytes always encode")
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hrp, data) =
            bech32::decode(s).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;
        if hrp.as_str() != VAULT_HRP {
            return Err(AddressError::InvalidHrp {
                expected: VAULT_HRP.to_string(),
                got: hrp.as_str().to_string(),
            });
        }
        let hash: [u8; 32] = data
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidDataLength {
                expected: 32,
                got: data.len(),
            })?;
        Ok(Self { hash })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.encode())
    }
}

// Addresses serialize as their Bech32 string so they are readable in JSON
// notes, logs, and API payloads.
impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::VaultKeypair;

    #[test]
    fn key_address_roundtrip() {
        let kp = VaultKeypair::generate();
        let addr = Address::from_public_key(&kp.public_key());
        let encoded = addr.encode();
        assert!(encoded.starts_with("vault1"));
        let recovered: Address = encoded.parse().unwrap();
        assert_eq!(addr, recovered);
    }

    #[test]
    fn program_address_is_deterministic() {
        let program = b"escrow program bytes";
        let a = Address::from_program(program);
        let b = Address::from_program(program);
        assert_eq!(a, b);
    }

    #[test]
    fn program_and_key_derivations_never_alias() {
        // Even if someone uses a public key as "program bytes", the domain
        // separation keeps the two address spaces disjoint.
        let kp = VaultKeypair::generate();
        let as_key = Address::from_public_key(&kp.public_key());
        let as_program = Address::from_program(kp.public_key().as_bytes());
        assert_ne!(as_key, as_program);
    }

    #[test]
    fn rejects_foreign_hrp() {
        let kp = VaultKeypair::generate();
        let addr = Address::from_public_key(&kp.public_key());
        // Re-encode under a different HRP and try to parse it back.
        let hrp = Hrp::parse("other").unwrap();
        let foreign = bech32::encode::<Bech32>(hrp, addr.as_bytes()).unwrap();
        assert!(matches!(
            foreign.parse::<Address>(),
            Err(AddressError::InvalidHrp { .. })
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!("not-an-address".parse::<Address>().is_err());
        assert!("vault1qqqq".parse::<Address>().is_err());
    }

    #[test]
    fn serde_roundtrip_as_string() {
        let addr = Address::from_program(b"p");
        let json = serde_json::to_string(&addr).unwrap();
        assert!(json.contains("vault1"));
        let recovered: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, recovered);
    }
}
