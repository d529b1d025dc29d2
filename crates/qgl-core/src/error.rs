//! Error types for the QGL core
//!
//! Only lexical and construction-time failures are errors. An inadmissible
//! structure or a rejected inversion is an ordinary return value
//! (`Verdict`, `InversionOutcome`), never an `Err`.

use crate::parser::tokenizer::Span;

/// QGL core error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A denylisted word or symbol appears outside a comment
    #[error(
        "FORBIDDEN SYNTAX at {span}: '{word}' ({category}) cannot appear in QGL. \
         QGL is structural, not procedural"
    )]
    ForbiddenSyntax {
        word: String,
        category: String,
        span: Span,
    },

    /// No lexical pattern matches at the current position
    #[error("Invalid character '{found}' at {span}. Context: '{context}'")]
    UnexpectedCharacter {
        found: char,
        span: Span,
        context: String,
    },

    /// Grammar violation while parsing the token stream
    #[error("Syntax error at {span}: expected {expected}, found {found}")]
    Syntax {
        expected: String,
        found: String,
        span: Span,
    },

    /// A boundary lists itself among its members
    #[error("STRUCTURAL VIOLATION: Boundary '{boundary}' cannot contain itself")]
    StructuralViolation { boundary: String },

    /// Invalid qubit collapse request
    #[error("Collapse error: {0}")]
    Collapse(String),

    /// Configuration could not be decoded
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request dispatcher is not accepting work
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// JSON encoding failure at an outer surface
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Malformed or disallowed source text
    pub fn is_lexical(&self) -> bool {
        matches!(
            self,
            Error::ForbiddenSyntax { .. } | Error::UnexpectedCharacter { .. } | Error::Syntax { .. }
        )
    }

    /// A local invariant violated at construction time
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::StructuralViolation { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Result type alias for QGL operations
pub type Result<T> = std::result::Result<T, Error>;
