// SPDX-License-Identifier: MIT

//! Safe when-expression language
//!
//! Expressions are small boolean formulas over the `{data, node, project}`
//! scope:
//! - `data.user == 'admin'`
//! - `node.props.count > 3 && !data.readonly`
//! - `(data.step || 0) >= 2`

mod ast;
mod evaluator;
mod lexer;
mod parser;
mod scope;

pub use ast::{CompareOp, Expr, Root};
pub use evaluator::{evaluate, evaluate_expr, is_truthy, strict_equals};
pub use parser::{parse, MAX_DEPTH};
pub use scope::BindingScope;
