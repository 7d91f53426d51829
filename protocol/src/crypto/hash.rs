//! # Hashing Utilities
//!
//! Two hash functions, two jobs, no exceptions:
//!
//! - **SHA-256** — the security fingerprint digest. The fingerprint is the
//!   externally verifiable binding between a note and its escrow, so it uses
//!   the hash every wallet and block explorer on the planet can recompute.
//!
//! - **BLAKE3** — everything internal: transaction IDs, atomic group IDs,
//!   and address derivation. Faster than SHA-256 on every platform that
//!   matters, and its `derive_key` mode gives us proper domain separation
//!   for free.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// Returns a 32-byte digest as a `Vec<u8>`. Most callers immediately pass
/// the result to something wanting `&[u8]`, so the heap allocation is noise.
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Compute the SHA-256 hash and return a fixed-size array.
///
/// Same as [`sha256`] but for callers that want `[u8; 32]` without the
/// allocation — the fingerprint codec, mostly.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the BLAKE3 hash of the input data.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute a domain-separated hash using BLAKE3 with a context string.
///
/// Domain separation prevents collisions across protocol contexts: a
/// transaction ID and an escrow address computed over the same bytes can
/// never collide, because the context string is mixed into the hash via
/// BLAKE3's `derive_key` mode. Don't prepend tags manually — that's what
/// amateurs do.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Hash multiple byte slices together without concatenation overhead.
///
/// Feeds the parts sequentially into the hasher — same result as hashing
/// the concatenation, less allocation. Used for group ID computation over
/// per-transaction digests.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}
