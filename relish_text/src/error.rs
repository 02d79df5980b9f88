use thiserror::Error;

/// Errors produced while parsing or rendering RTR documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TextError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unknown type name `{0}`")]
    UnknownType(String),

    #[error("unknown field alias `{0}`")]
    UnknownAlias(String),

    #[error("duplicate alias `{0}`")]
    DuplicateAlias(String),

    #[error("duplicate field id {0}")]
    DuplicateFieldId(u8),

    #[error("id {0} out of range (0..=127)")]
    IdRange(i64),

    #[error("ambiguous integer literal; add a type suffix or a cast")]
    AmbiguousInteger,

    #[error("integer literal out of range for {0}")]
    IntRange(&'static str),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("mixed element types: expected {expected}, found {found}")]
    MixedElements {
        expected: &'static str,
        found: &'static str,
    },

    #[error(transparent)]
    Codec(#[from] relish::Error),
}
