use crate::header::HASH_SIZE;

/// One named blob stored in an archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub name: String,
    pub body: Vec<u8>,
}

impl Entry {
    pub fn new(name: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), body: body.into() }
    }
}

impl<S: Into<String>, B: Into<Vec<u8>>> From<(S, B)> for Entry {
    fn from((name, body): (S, B)) -> Self {
        Entry::new(name, body)
    }
}

/// Borrowed view of an entry inside an archive buffer.
///
/// Produced by [`crate::reader::Reader`] only after the body hash has been
/// checked against `hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRef<'a> {
    pub name: &'a str,
    pub body: &'a [u8],
    pub hash: [u8; HASH_SIZE],
}

impl EntryRef<'_> {
    pub fn to_owned_entry(&self) -> Entry {
        Entry { name: self.name.to_owned(), body: self.body.to_vec() }
    }
}

impl From<EntryRef<'_>> for Entry {
    fn from(r: EntryRef<'_>) -> Self {
        r.to_owned_entry()
    }
}
