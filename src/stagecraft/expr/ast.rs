// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for when-expressions

use serde_json::Value;

/// A parsed when-expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `true`, `false`, `null`, a number or a string
    Literal(Value),
    /// `data.a.b`, `node.props.x`, ...
    Path { root: Root, segments: Vec<String> },
    /// `left op right`
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    /// `a && b && ...`, yields the deciding operand. Chains are kept flat
    /// so tree depth only grows with `(` and `!`.
    And(Vec<Expr>),
    /// `a || b || ...`, yields the deciding operand
    Or(Vec<Expr>),
    /// Logical NOT
    Not(Box<Expr>),
}

/// First segment of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Root {
    Data,
    Node,
    Project,
    /// Any other identifier. Accepted by the parser, always resolves to
    /// undefined.
    Unknown(String),
}

impl Root {
    pub fn from_ident(ident: &str) -> Self {
        match ident {
            "data" => Root::Data,
            "node" => Root::Node,
            "project" => Root::Project,
            other => Root::Unknown(other.to_string()),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// ==
    Eq,
    /// !=
    NotEq,
    /// >
    Gt,
    /// >=
    Gte,
    /// <
    Lt,
    /// <=
    Lte,
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}
