//! Body digests for minipack entries.
//!
//! The hash function is supplied explicitly at call time through the
//! [`Digest`] trait; the codec never reaches for a process-wide instance.
//! [`Sha256`] is the only digest the wire format defines and is what
//! [`crate::encode`] / [`crate::decode`] use.

use sha2::Digest as _;

use crate::header::HASH_SIZE;

/// A 32-byte digest over an entry body.
///
/// Implementations must be deterministic and reentrant: the same input
/// always yields the same output, and concurrent calls do not interfere.
pub trait Digest: Send + Sync {
    fn digest(&self, data: &[u8]) -> [u8; HASH_SIZE];

    /// Short label for diagnostics.
    fn name(&self) -> &'static str;
}

/// SHA-256 (FIPS 180-4), backed by the `sha2` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256;

impl Digest for Sha256 {
    fn digest(&self, data: &[u8]) -> [u8; HASH_SIZE] {
        sha2::Sha256::digest(data).into()
    }

    fn name(&self) -> &'static str { "sha256" }
}

/// Hex-encode a digest for display.
pub fn to_hex(hash: &[u8; HASH_SIZE]) -> String {
    hex::encode(hash)
}
