//! Encode and decode minipack archives.
//!
//! An archive is a flat run of entries, each a [`EntryHeader`] followed by
//! the entry's name and body.  See [`crate::header`] for the byte layout.
//!
//! # Guarantees
//!   - `decode(&encode(&x)?)? == x` for every list within the field limits.
//!   - The output size is computed before anything is written and the buffer
//!     is allocated exactly once.
//!   - A failed call returns no partial output.
//!
//! Nothing here logs; every failure carries the offending entry's index and,
//! where one could be read, its name.

use std::fmt;
use thiserror::Error;

use crate::digest::{Digest, Sha256};
use crate::entry::Entry;
use crate::header::{EntryHeader, HASH_SIZE, HEADER_SIZE, MAX_BODY_LEN, MAX_NAME_LEN};
use crate::reader::Reader;

// ── Error types ──────────────────────────────────────────────────────────────

/// Which length a value did not fit into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeField {
    Name,
    Body,
    /// Running archive total; only reachable where `usize` is 32 bits.
    Archive,
}

impl fmt::Display for SizeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SizeField::Name => "name",
            SizeField::Body => "body",
            SizeField::Archive => "archive",
        })
    }
}

/// Why an archive could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    #[error("header truncated: {remaining} byte(s) left, {HEADER_SIZE} needed")]
    TruncatedHeader { remaining: usize },
    #[error("entry truncated: header declares {needed} byte(s), {remaining} left")]
    TruncatedEntry { needed: u64, remaining: usize },
    #[error("name is not valid UTF-8")]
    InvalidName,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MinipackError {
    #[error("entry #{index} ({name:?}): {field} length {len} exceeds maximum {max}")]
    SizeExceeded {
        index: usize,
        name:  String,
        field: SizeField,
        len:   u64,
        max:   u64,
    },
    #[error("entry #{index} ({name:?}): body hash mismatch (stored {}, computed {})",
            hex::encode(.expected), hex::encode(.actual))]
    IntegrityError {
        index:    usize,
        name:     String,
        expected: [u8; HASH_SIZE],
        actual:   [u8; HASH_SIZE],
    },
    #[error("malformed archive at entry #{index} (offset {offset}): {reason}")]
    MalformedArchive {
        index:  usize,
        offset: usize,
        reason: Malformed,
    },
}

// ── Encode ───────────────────────────────────────────────────────────────────

/// Encode `entries` with the SHA-256 body hash.
pub fn encode(entries: &[Entry]) -> Result<Vec<u8>, MinipackError> {
    encode_with(entries, &Sha256)
}

/// Encode `entries`, hashing each body with `digest`.
pub fn encode_with(entries: &[Entry], digest: &dyn Digest) -> Result<Vec<u8>, MinipackError> {
    let total = encoded_len(entries)?;
    let mut out = Vec::with_capacity(total);

    for entry in entries {
        // Lengths were validated by `encoded_len`.
        let header = EntryHeader {
            hash:     digest.digest(&entry.body),
            name_len: entry.name.len() as u8,
            body_len: entry.body.len() as u32,
        };
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&entry.body);
    }

    debug_assert_eq!(out.len(), total);
    debug_assert_eq!(out.capacity(), total);
    Ok(out)
}

/// Exact byte length `encode(entries)` will produce.
///
/// Fails with [`MinipackError::SizeExceeded`] on the first entry whose name
/// or body does not fit its length field, or whose size would push the
/// archive total past `usize::MAX`.
pub fn encoded_len(entries: &[Entry]) -> Result<usize, MinipackError> {
    entries.iter().enumerate().try_fold(0usize, |total, (index, entry)| {
        add_entry_len(total, index, &entry.name, entry.body.len())
    })
}

fn add_entry_len(total: usize, index: usize, name: &str, body_len: usize) -> Result<usize, MinipackError> {
    check_lengths(index, name, body_len)?;
    let entry_len = HEADER_SIZE as u64 + name.len() as u64 + body_len as u64;
    usize::try_from(entry_len)
        .ok()
        .and_then(|len| total.checked_add(len))
        .ok_or_else(|| MinipackError::SizeExceeded {
            index,
            name:  name.to_owned(),
            field: SizeField::Archive,
            len:   (total as u64).saturating_add(entry_len),
            max:   usize::MAX as u64,
        })
}

fn check_lengths(index: usize, name: &str, body_len: usize) -> Result<(), MinipackError> {
    let exceeded = |field, len, max| MinipackError::SizeExceeded {
        index,
        name: name.to_owned(),
        field,
        len,
        max,
    };

    let name_len = name.len() as u64;
    if name_len > MAX_NAME_LEN {
        return Err(exceeded(SizeField::Name, name_len, MAX_NAME_LEN));
    }
    let body_len = body_len as u64;
    if body_len > MAX_BODY_LEN {
        return Err(exceeded(SizeField::Body, body_len, MAX_BODY_LEN));
    }
    Ok(())
}

// ── Decode ───────────────────────────────────────────────────────────────────

/// Decode an archive, verifying every SHA-256 body hash.
pub fn decode(archive: &[u8]) -> Result<Vec<Entry>, MinipackError> {
    decode_with(archive, &Sha256)
}

/// Decode an archive, verifying every body hash with `digest`.
///
/// The first bad entry aborts the whole call.
pub fn decode_with(archive: &[u8], digest: &dyn Digest) -> Result<Vec<Entry>, MinipackError> {
    Reader::with_digest(archive, digest)
        .map(|entry| entry.map(Entry::from))
        .collect()
}

/// Walk and verify the whole archive without copying any bodies.
/// Returns the number of entries.
pub fn verify(archive: &[u8]) -> Result<usize, MinipackError> {
    verify_with(archive, &Sha256)
}

pub fn verify_with(archive: &[u8], digest: &dyn Digest) -> Result<usize, MinipackError> {
    Reader::with_digest(archive, digest).try_fold(0, |count, entry| entry.map(|_| count + 1))
}
