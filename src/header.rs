//! Per-entry header.
//!
//! ```text
//! [ sha256 (32 B) | name_len (u8) | body_len (u32 BE) | name | body ]
//! ```
//!
//! All integers are big-endian.  The header is immediately followed by
//! `name_len` bytes of UTF-8 name and `body_len` bytes of body; entries are
//! packed back to back with no padding, directory or footer.

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use std::io::{self, Read};

pub const HASH_SIZE:     usize = 32;
pub const NAME_LEN_SIZE: usize = 1;
pub const BODY_LEN_SIZE: usize = 4;
/// Fixed header width: 32 + 1 + 4.
pub const HEADER_SIZE:   usize = HASH_SIZE + NAME_LEN_SIZE + BODY_LEN_SIZE;

/// Largest name the 1-byte length field can describe.
pub const MAX_NAME_LEN: u64 = u8::MAX as u64;
/// Largest body the 4-byte length field can describe.
pub const MAX_BODY_LEN: u64 = u32::MAX as u64;

const NAME_LEN_AT: usize = HASH_SIZE;
const BODY_LEN_AT: usize = HASH_SIZE + NAME_LEN_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHeader {
    pub hash:     [u8; HASH_SIZE],
    pub name_len: u8,
    pub body_len: u32,
}

impl EntryHeader {
    /// Serialize into the fixed 37-byte wire form.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[..HASH_SIZE].copy_from_slice(&self.hash);
        buf[NAME_LEN_AT] = self.name_len;
        BigEndian::write_u32(&mut buf[BODY_LEN_AT..], self.body_len);
        buf
    }

    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hash = [0u8; HASH_SIZE];
        reader.read_exact(&mut hash)?;
        Ok(Self {
            hash,
            name_len: reader.read_u8()?,
            body_len: reader.read_u32::<BigEndian>()?,
        })
    }

    /// Bytes this entry occupies on the wire, header included.
    #[inline]
    pub fn entry_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.payload_size()
    }

    /// Bytes that follow the fixed header (name + body).
    #[inline]
    pub fn payload_size(&self) -> u64 {
        self.name_len as u64 + self.body_len as u64
    }
}
