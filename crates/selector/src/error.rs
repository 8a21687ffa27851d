//! Error types for selector queries
//!
//! Malformed selectors are the only hard failure. Unknown pseudo-classes are
//! rejected only under [`PseudoPolicy::Strict`](crate::config::PseudoPolicy).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SelectorError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("Unclosed '{open}' at byte {position} in {selector:?}")]
    Unbalanced {
        selector: String,
        open: char,
        position: usize,
    },

    #[error("Unexpected '{found}' at byte {position} in {selector:?}")]
    UnexpectedChar {
        selector: String,
        found: char,
        position: usize,
    },

    #[error("Expected a name at byte {position} in {selector:?}")]
    MissingName { selector: String, position: usize },

    #[error("Invalid attribute selector in {selector:?}: {reason}")]
    InvalidAttribute { selector: String, reason: String },

    #[error("Invalid nth-child formula: {0:?}")]
    InvalidNth(String),

    #[error("Pseudo-class :{0} requires an argument")]
    MissingArgument(String),

    #[error("Unknown pseudo-class :{0}")]
    UnknownPseudoClass(String),
}

/// Raised by a host's native selector engine for selectors it cannot run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Native engine rejected {selector:?}: {reason}")]
pub struct UnsupportedSelector {
    pub selector: String,
    pub reason: String,
}

impl UnsupportedSelector {
    pub fn new(selector: &str, reason: impl Into<String>) -> Self {
        Self {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}
