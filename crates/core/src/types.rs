//! Key/value pair type and printable-byte helpers

use std::borrow::Cow;
use std::fmt;

/// Lowest byte of the printable ASCII alphabet (space)
pub const PRINTABLE_MIN: u8 = 0x20;

/// Highest byte of the printable ASCII alphabet (`~`)
pub const PRINTABLE_MAX: u8 = 0x7E;

/// Number of distinct printable ASCII bytes
pub const PRINTABLE_ALPHABET_SIZE: u64 = (PRINTABLE_MAX - PRINTABLE_MIN + 1) as u64;

/// A generated key/value pair
///
/// Fields are private so a pair cannot be altered after generation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct KvPair {
    key: Vec<u8>,
    value: Vec<u8>,
}

impl KvPair {
    /// Create a pair from owned key and value bytes
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }

    /// The key bytes
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The value bytes
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Consume the pair, returning `(key, value)`
    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.key, self.value)
    }

    /// True when every byte of key and value is printable ASCII
    pub fn is_printable(&self) -> bool {
        is_printable(&self.key) && is_printable(&self.value)
    }
}

impl fmt::Debug for KvPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KvPair")
            .field("key", &display_bytes(&self.key))
            .field("value_len", &self.value.len())
            .finish()
    }
}

/// True when every byte lies in `PRINTABLE_MIN..=PRINTABLE_MAX`
pub fn is_printable(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|b| (PRINTABLE_MIN..=PRINTABLE_MAX).contains(b))
}

/// Render bytes for a diagnostic; non-UTF-8 sequences are replaced
pub fn display_bytes(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
