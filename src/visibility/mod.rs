//! Visibility labels
//!
//! Cells may carry a visibility expression at write time. A scan supplies
//! a set of granted labels (`Authorizations`); a labelled cell is returned
//! only when its expression evaluates to true under those labels.
//!
//! Rules:
//! - A cell without an expression is always visible
//! - A labelled cell is hidden from scans that supply no authorizations
//! - Expressions are parsed once on write; reads evaluate the parsed form

mod errors;
mod expr;

use std::collections::BTreeSet;

pub use errors::{ExprError, ExprResult};
pub use expr::VisibilityExpr;

/// The set of labels granted to a reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authorizations {
    labels: BTreeSet<String>,
}

impl Authorizations {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

/// Decides whether a cell carrying `expression` is readable with `auths`.
pub fn is_visible(expression: Option<&VisibilityExpr>, auths: Option<&Authorizations>) -> bool {
    match (expression, auths) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(expr), Some(auths)) => expr.evaluate(auths),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlabelled_always_visible() {
        assert!(is_visible(None, None));
        assert!(is_visible(None, Some(&Authorizations::default())));
    }

    #[test]
    fn test_labelled_hidden_without_authorizations() {
        let expr = VisibilityExpr::parse("secret").unwrap();
        assert!(!is_visible(Some(&expr), None));
        assert!(!is_visible(Some(&expr), Some(&Authorizations::default())));
        assert!(is_visible(Some(&expr), Some(&Authorizations::new(["secret"]))));
    }
}
