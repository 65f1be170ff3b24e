//! TableName - validated table identity

use std::fmt;

use super::errors::{ModelError, ModelResult};

/// A validated table name, optionally qualified as `namespace:table`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> ModelResult<Self> {
        let name = name.into();
        let (namespace, table) = match name.split_once(':') {
            Some((ns, t)) => (Some(ns), t),
            None => (None, name.as_str()),
        };

        let part_ok = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        };

        if !part_ok(table) || namespace.is_some_and(|ns| !part_ok(ns)) {
            return Err(ModelError::InvalidTableName(name));
        }
        Ok(Self(name))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(TableName::new("users").is_ok());
        assert!(TableName::new("ns:users_v2.archive-1").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        for bad in ["", "ns:", ":t", "has space", "a:b:c", "tab\t"] {
            assert!(TableName::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
