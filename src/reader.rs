//! Forward-only, zero-copy walk over an archive buffer.
//!
//! [`Reader`] parses one entry per step, checks its body hash and yields a
//! borrowed [`EntryRef`].  Every read is bounds-checked against the remaining
//! bytes first, so a truncated or trailing-garbage archive surfaces as
//! [`MinipackError::MalformedArchive`] rather than a slice panic.  After the
//! first error the reader is exhausted.

use std::iter::FusedIterator;

use crate::codec::{Malformed, MinipackError};
use crate::digest::{Digest, Sha256};
use crate::entry::EntryRef;
use crate::header::{EntryHeader, HEADER_SIZE};

pub struct Reader<'a> {
    archive: &'a [u8],
    digest:  &'a dyn Digest,
    offset:  usize,
    index:   usize,
    failed:  bool,
}

impl<'a> Reader<'a> {
    pub fn new(archive: &'a [u8]) -> Self {
        Self::with_digest(archive, &Sha256)
    }

    pub fn with_digest(archive: &'a [u8], digest: &'a dyn Digest) -> Self {
        Self { archive, digest, offset: 0, index: 0, failed: false }
    }

    /// Byte offset of the next entry to be read.
    pub fn offset(&self) -> usize { self.offset }

    /// Number of entries read successfully so far.
    pub fn entries_read(&self) -> usize { self.index }

    fn malformed(&self, reason: Malformed) -> MinipackError {
        MinipackError::MalformedArchive { index: self.index, offset: self.offset, reason }
    }

    fn read_entry(&mut self) -> Result<EntryRef<'a>, MinipackError> {
        let archive = self.archive;
        let rest = &archive[self.offset..];

        if rest.len() < HEADER_SIZE {
            return Err(self.malformed(Malformed::TruncatedHeader { remaining: rest.len() }));
        }
        let header = EntryHeader::read(&rest[..HEADER_SIZE])
            .map_err(|_| self.malformed(Malformed::TruncatedHeader { remaining: rest.len() }))?;

        let rest = &rest[HEADER_SIZE..];
        let needed = header.payload_size();
        if needed > rest.len() as u64 {
            return Err(self.malformed(Malformed::TruncatedEntry { needed, remaining: rest.len() }));
        }

        let (name, rest) = rest.split_at(header.name_len as usize);
        let body = &rest[..header.body_len as usize];
        let name = std::str::from_utf8(name).map_err(|_| self.malformed(Malformed::InvalidName))?;

        let actual = self.digest.digest(body);
        if actual != header.hash {
            return Err(MinipackError::IntegrityError {
                index:    self.index,
                name:     name.to_owned(),
                expected: header.hash,
                actual,
            });
        }

        self.offset += HEADER_SIZE + needed as usize;
        self.index += 1;
        Ok(EntryRef { name, body, hash: header.hash })
    }
}

impl<'a> Iterator for Reader<'a> {
    type Item = Result<EntryRef<'a>, MinipackError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.archive.len() {
            return None;
        }
        let result = self.read_entry();
        self.failed = result.is_err();
        Some(result)
    }
}

impl FusedIterator for Reader<'_> {}
