//! Visibility expressions
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or      := and ('|' and)*
//! and     := unary ('&' unary)*
//! unary   := '!' unary | primary
//! primary := label | '(' or ')'
//! label   := [A-Za-z0-9_.:/-]+
//! ```
//!
//! Whitespace between tokens is ignored. Nesting of `!` and `(` is capped
//! at [`MAX_DEPTH`] levels.

use std::collections::BTreeSet;

use super::errors::{ExprError, ExprResult};
use super::Authorizations;

/// Deepest allowed nesting of `!` and parentheses.
pub const MAX_DEPTH: usize = 64;

/// A parsed visibility expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityExpr {
    Label(String),
    Not(Box<VisibilityExpr>),
    And(Vec<VisibilityExpr>),
    Or(Vec<VisibilityExpr>),
}

impl VisibilityExpr {
    pub fn parse(input: &str) -> ExprResult<Self> {
        let mut parser = Parser {
            chars: input.char_indices().collect(),
            pos: 0,
            depth: 0,
        };
        parser.skip_ws();
        if parser.peek().is_none() {
            return Err(ExprError::Empty);
        }
        let expr = parser.parse_or()?;
        parser.skip_ws();
        match parser.peek() {
            None => Ok(expr),
            Some((position, ')')) => Err(ExprError::UnbalancedParen(position)),
            Some((position, found)) => Err(ExprError::UnexpectedChar { found, position }),
        }
    }

    /// Evaluates the expression against a set of granted labels.
    pub fn evaluate(&self, auths: &Authorizations) -> bool {
        match self {
            VisibilityExpr::Label(label) => auths.contains(label),
            VisibilityExpr::Not(inner) => !inner.evaluate(auths),
            VisibilityExpr::And(terms) => terms.iter().all(|t| t.evaluate(auths)),
            VisibilityExpr::Or(terms) => terms.iter().any(|t| t.evaluate(auths)),
        }
    }

    /// Every label mentioned anywhere in the expression.
    pub fn labels(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_labels(&mut out);
        out
    }

    fn collect_labels<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            VisibilityExpr::Label(label) => {
                out.insert(label.as_str());
            }
            VisibilityExpr::Not(inner) => inner.collect_labels(out),
            VisibilityExpr::And(terms) | VisibilityExpr::Or(terms) => {
                for t in terms {
                    t.collect_labels(out);
                }
            }
        }
    }
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '/' | '-')
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<(usize, char)> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some((_, c)) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if matches!(self.peek(), Some((_, c)) if c == expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> ExprResult<VisibilityExpr> {
        let mut terms = vec![self.parse_and()?];
        while self.eat('|') {
            terms.push(self.parse_and()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            VisibilityExpr::Or(terms)
        })
    }

    fn parse_and(&mut self) -> ExprResult<VisibilityExpr> {
        let mut terms = vec![self.parse_unary()?];
        while self.eat('&') {
            terms.push(self.parse_unary()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            VisibilityExpr::And(terms)
        })
    }

    fn descend(&mut self, position: usize) -> ExprResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep(position));
        }
        Ok(())
    }

    fn parse_unary(&mut self) -> ExprResult<VisibilityExpr> {
        self.skip_ws();
        if let Some((at, '!')) = self.peek() {
            self.pos += 1;
            self.descend(at)?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(VisibilityExpr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ExprResult<VisibilityExpr> {
        self.skip_ws();
        match self.peek() {
            None => Err(ExprError::UnexpectedEnd),
            Some((open_at, '(')) => {
                self.pos += 1;
                self.descend(open_at)?;
                let inner = self.parse_or()?;
                if !self.eat(')') {
                    return Err(ExprError::UnbalancedParen(open_at));
                }
                self.depth -= 1;
                Ok(inner)
            }
            Some((_, c)) if is_label_char(c) => {
                let mut label = String::new();
                while let Some((_, c)) = self.peek() {
                    if !is_label_char(c) {
                        break;
                    }
                    label.push(c);
                    self.pos += 1;
                }
                Ok(VisibilityExpr::Label(label))
            }
            Some((position, found)) => Err(ExprError::UnexpectedChar { found, position }),
        }
    }
}
