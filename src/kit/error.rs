// SPDX-License-Identifier: MIT

//! Typed error handling for stagecraft-rs
//!
//! Errors in this crate are recovered close to where they happen: a broken
//! expression evaluates to `false`, a failing action step is logged and
//! skipped. The types below are what the fallible building blocks return
//! before that recovery kicks in.

use thiserror::Error;

/// Top-level error type for stagecraft-rs
#[derive(Debug, Error)]
pub enum StageError {
    /// Expression could not be parsed
    #[error("Expression error: {0}")]
    Expr(#[from] ExprError),

    /// Policy data is missing or rejects a value
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    /// A command could not be applied to the snapshot
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A side effect (alert, http, navigate, ...) failed
    #[error("Effect '{kind}' failed: {message}")]
    Effect { kind: String, message: String },

    /// Configuration errors (bad env vars, unreadable policy file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Expression syntax errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    /// A token appeared where the grammar does not allow it
    #[error("Unexpected token {found} at position {position}")]
    UnexpectedToken { found: String, position: usize },

    /// Input ended in the middle of an expression
    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    /// Parentheses or negations nested past the supported depth
    #[error("Expression nested deeper than {0} levels")]
    TooDeep(usize),

    /// A complete expression was followed by more tokens
    #[error("Trailing input at position {0}")]
    TrailingInput(usize),
}

/// Policy lookup and validation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolicyError {
    /// A component lists a tag the registry has no policy for
    #[error("Component '{component}' references unknown tag '{tag}'")]
    UnknownTag { component: String, tag: String },

    /// A component policy targets a component type with no capabilities
    #[error("Policy for unknown component: {0}")]
    UnknownComponent(String),

    /// A style value does not satisfy the key's metadata
    #[error("Invalid value for style '{key}': {reason}")]
    InvalidStyleValue { key: String, reason: String },
}

/// Command application errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// Command targets a node that is not in the project
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Command targets a page that is not in the project
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Fragment not found: {0}")]
    FragmentNotFound(String),

    /// Data path is empty or malformed
    #[error("Invalid data path: '{0}'")]
    InvalidPath(String),

    /// Viewport is not configured for the project
    #[error("Unknown viewport: {0}")]
    UnknownViewport(String),
}

impl StageError {
    /// Create an effect error
    pub fn effect(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Effect {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
