//! RowKey - opaque, byte-ordered row identity

use std::fmt;

use super::errors::{ModelError, ModelResult};

/// An opaque row identifier.
///
/// Ordering is byte-wise lexicographic, which is exactly the order rows
/// are stored in and produced by scans. An empty key is a valid scan
/// bound but never a valid write target.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey(Vec<u8>);

impl RowKey {
    /// Creates a row key from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Creates a row key, rejecting the empty key.
    pub fn for_write(bytes: impl Into<Vec<u8>>) -> ModelResult<Self> {
        let key = Self::new(bytes);
        key.require_non_empty()?;
        Ok(key)
    }

    /// Fails with `EmptyRowKey` when this key cannot be written to.
    pub fn require_non_empty(&self) -> ModelResult<()> {
        if self.0.is_empty() {
            return Err(ModelError::EmptyRowKey);
        }
        Ok(())
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns true if this key starts with `prefix`.
    pub fn has_prefix(&self, prefix: &[u8]) -> bool {
        self.0.starts_with(prefix)
    }
}

impl From<&str> for RowKey {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for RowKey {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&[u8]> for RowKey {
    fn from(b: &[u8]) -> Self {
        Self(b.to_vec())
    }
}

impl From<Vec<u8>> for RowKey {
    fn from(b: Vec<u8>) -> Self {
        Self(b)
    }
}

impl AsRef<[u8]> for RowKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&escape_binary(&self.0))
    }
}

/// Printable punctuation kept verbatim by `escape_binary`.
const PRINTABLE_PUNCT: &[u8] = b" `~!@#$%^&*()-_=+[]{}|;:'\",.<>/?";

/// Renders bytes as a printable string, escaping everything else as `\xNN`.
///
/// Alphanumerics and common punctuation pass through; the backslash itself
/// is escaped so the output can be parsed back unambiguously.
pub(crate) fn escape_binary(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b.is_ascii_alphanumeric() || PRINTABLE_PUNCT.contains(&b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\x{:02X}", b));
        }
    }
    out
}
