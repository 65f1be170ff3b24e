//! Column - (family, qualifier) identity

use std::fmt;

use super::errors::{ModelError, ModelResult};
use super::row_key::escape_binary;

/// A column identity: the pair of family and qualifier.
///
/// Families group qualifiers but carry no data of their own. Columns
/// order by family, then qualifier, both byte-wise.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Column {
    family: Vec<u8>,
    qualifier: Vec<u8>,
}

impl Column {
    /// Creates a column without validation.
    ///
    /// Writes validate through [`Column::validate`]; filters may use any bytes.
    pub fn new(family: impl Into<Vec<u8>>, qualifier: impl Into<Vec<u8>>) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
        }
    }

    /// Parses `family:qualifier`, splitting on the first colon.
    ///
    /// The qualifier may itself contain colons.
    pub fn parse(spec: &str) -> ModelResult<Self> {
        match spec.split_once(':') {
            Some((family, qualifier)) if !family.is_empty() && !qualifier.is_empty() => {
                Ok(Self::new(family, qualifier))
            }
            _ => Err(ModelError::InvalidColumnSpec(spec.to_string())),
        }
    }

    #[inline]
    pub fn family(&self) -> &[u8] {
        &self.family
    }

    #[inline]
    pub fn qualifier(&self) -> &[u8] {
        &self.qualifier
    }

    /// Rejects empty families or qualifiers.
    pub fn validate(&self) -> ModelResult<()> {
        if self.family.is_empty() {
            return Err(ModelError::EmptyFamily);
        }
        if self.qualifier.is_empty() {
            return Err(ModelError::EmptyQualifier);
        }
        Ok(())
    }

    /// Returns true if this column is `(family, qualifier)`.
    pub fn is(&self, family: &[u8], qualifier: &[u8]) -> bool {
        self.family == family && self.qualifier == qualifier
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            escape_binary(&self.family),
            escape_binary(&self.qualifier)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_on_first_colon() {
        let col = Column::parse("cf:a:b").unwrap();
        assert_eq!(col.family(), b"cf");
        assert_eq!(col.qualifier(), b"a:b");
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        assert!(Column::parse("cf").is_err());
        assert!(Column::parse(":q").is_err());
        assert!(Column::parse("cf:").is_err());
    }

    #[test]
    fn test_validate() {
        assert_eq!(Column::new("", "q").validate(), Err(ModelError::EmptyFamily));
        assert_eq!(Column::new("f", "").validate(), Err(ModelError::EmptyQualifier));
        assert!(Column::new("f", "q").validate().is_ok());
    }

    #[test]
    fn test_ordering_family_then_qualifier() {
        let mut cols = vec![
            Column::new("b", "a"),
            Column::new("a", "z"),
            Column::new("a", "b"),
        ];
        cols.sort();
        assert_eq!(cols[0], Column::new("a", "b"));
        assert_eq!(cols[1], Column::new("a", "z"));
        assert_eq!(cols[2], Column::new("b", "a"));
    }
}
