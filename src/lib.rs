pub mod header;
pub mod digest;
pub mod entry;
pub mod codec;
pub mod reader;
pub mod archive;

pub use header::{EntryHeader, HEADER_SIZE, MAX_BODY_LEN, MAX_NAME_LEN};
pub use digest::{Digest, Sha256};
pub use entry::{Entry, EntryRef};
pub use codec::{
    decode, decode_with, encode, encode_with, encoded_len, verify, verify_with, Malformed,
    MinipackError, SizeField,
};
pub use reader::Reader;
