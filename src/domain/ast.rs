//! Abstract syntax of a domain expression.
//!
//! A [`Domain`] is the prefix-notation token sequence of the wire format,
//! validated to reduce to at most one expression. [`Expr`] is the reduced,
//! nested form the tree builder walks and the serializer emits.

use std::fmt;

use crate::domain::value::{write_quoted, Value};

/// Logical connective of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
    Not,
}

impl Connective {
    /// Wire symbol of the connective.
    pub fn symbol(self) -> &'static str {
        match self {
            Connective::And => "&",
            Connective::Or => "|",
            Connective::Not => "!",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "&" => Some(Connective::And),
            "|" => Some(Connective::Or),
            "!" => Some(Connective::Not),
            _ => None,
        }
    }

    /// Number of operands the connective consumes in prefix notation.
    pub fn arity(self) -> usize {
        match self {
            Connective::Not => 1,
            Connective::And | Connective::Or => 2,
        }
    }

    /// AND for OR and OR for AND; NOT has no opposite.
    pub fn opposite(self) -> Self {
        match self {
            Connective::And => Connective::Or,
            Connective::Or => Connective::And,
            Connective::Not => Connective::Not,
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Connective::And => "AND",
            Connective::Or => "OR",
            Connective::Not => "NOT",
        };
        write!(f, "{label}")
    }
}

/// Left-hand side of a leaf.
///
/// `Constant` covers the `(1, "=", 1)` / `(0, "=", 1)` shorthands for the
/// always-true and always-false leaves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldPath {
    Path(String),
    Constant(i64),
}

impl FieldPath {
    pub fn as_path(&self) -> Option<&str> {
        match self {
            FieldPath::Path(p) => Some(p),
            FieldPath::Constant(_) => None,
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Path(p) => write_quoted(f, p),
            FieldPath::Constant(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for FieldPath {
    fn from(p: &str) -> Self {
        FieldPath::Path(p.to_string())
    }
}

/// A leaf triple `(path, operator, value)` as written in the expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub path: FieldPath,
    pub operator: String,
    pub value: Value,
}

impl Condition {
    pub fn new(path: impl Into<FieldPath>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, ", self.path)?;
        write_quoted(f, &self.operator)?;
        write!(f, ", {})", self.value)
    }
}

/// One element of the flat prefix sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Connective(Connective),
    Condition(Condition),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Connective(c) => write!(f, "\"{}\"", c.symbol()),
            Token::Condition(cond) => write!(f, "{cond}"),
        }
    }
}

/// Reduced expression.
///
/// `Branch` operands: AND/OR hold two or more, NOT holds exactly one.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Condition(Condition),
    Branch {
        connective: Connective,
        operands: Vec<Expr>,
    },
}

impl Expr {
    pub fn and(operands: Vec<Expr>) -> Self {
        Expr::Branch {
            connective: Connective::And,
            operands,
        }
    }

    pub fn or(operands: Vec<Expr>) -> Self {
        Expr::Branch {
            connective: Connective::Or,
            operands,
        }
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Branch {
            connective: Connective::Not,
            operands: vec![operand],
        }
    }

    /// Flatten into prefix tokens.
    ///
    /// An n-ary AND/OR right-folds: `AND(a, b, c)` becomes `&, a, &, b, c`.
    pub fn push_tokens(&self, out: &mut Vec<Token>) {
        match self {
            Expr::Condition(cond) => out.push(Token::Condition(cond.clone())),
            Expr::Branch {
                connective,
                operands,
            } => {
                if *connective == Connective::Not {
                    out.push(Token::Connective(Connective::Not));
                    for operand in operands {
                        operand.push_tokens(out);
                    }
                    return;
                }
                let last = operands.len().saturating_sub(1);
                for (i, operand) in operands.iter().enumerate() {
                    if i < last {
                        out.push(Token::Connective(*connective));
                    }
                    operand.push_tokens(out);
                }
            }
        }
    }

    /// Distinct named field paths, in order of first appearance.
    pub fn field_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths<'a>(&'a self, paths: &mut Vec<&'a str>) {
        match self {
            Expr::Condition(cond) => {
                if let Some(p) = cond.path.as_path() {
                    if !paths.contains(&p) {
                        paths.push(p);
                    }
                }
            }
            Expr::Branch { operands, .. } => {
                for operand in operands {
                    operand.collect_paths(paths);
                }
            }
        }
    }
}

/// A structurally valid domain: empty, or exactly one reduced expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Domain {
    root: Option<Expr>,
}

impl Domain {
    pub fn new(root: Option<Expr>) -> Self {
        Self { root }
    }

    /// The empty domain, matching every record.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<&Expr> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The prefix token sequence of the wire format.
    pub fn tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        if let Some(root) = &self.root {
            root.push_tokens(&mut tokens);
        }
        tokens
    }

    pub fn field_paths(&self) -> Vec<&str> {
        self.root.as_ref().map(Expr::field_paths).unwrap_or_default()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, token) in self.tokens().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{token}")?;
        }
        write!(f, "]")
    }
}
