use std::fmt;

use thiserror::Error;

use crate::TypeId;

/// Classification of encoding and decoding failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    #[error("invalid type id {0:#04x}")]
    InvalidTypeId(u8),

    #[error("invalid field id {0:#04x} (reserved bit set)")]
    InvalidFieldId(u8),

    #[error("invalid element type {0:#04x} (zero-size content)")]
    InvalidElementType(u8),

    #[error("field ids must be strictly increasing: got {current} after {previous}")]
    FieldOrder { previous: u8, current: u8 },

    #[error("duplicate map key")]
    DuplicateMapKey,

    #[error("string content is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid bool byte {0:#04x} (must be 0x00 or 0xFF)")]
    InvalidBool(u8),

    #[error("length {0} exceeds the encodable range")]
    LengthOverflow(u64),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("type mismatch: expected {expected:?}, found type id {found:#04x}")]
    TypeMismatch { expected: TypeId, found: u8 },

    #[error("enum payload leaves {0} byte(s) unconsumed in the frame")]
    EnumLengthMismatch(usize),

    #[error("unknown enum variant {0}")]
    UnknownVariant(u8),

    #[error("missing required field {0}")]
    MissingField(u8),

    #[error("{0} trailing byte(s) after value")]
    TrailingBytes(usize),

    #[error("timestamp out of representable range")]
    TimestampRange,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error produced by any Relish encode or decode operation.
///
/// Carries the [`ErrorKind`] classification and, when the failure happened
/// while reading, the absolute byte offset in the input where it was
/// detected.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    offset: Option<u64>,
}

impl Error {
    /// Creates an error with no position information.
    pub fn new(kind: ErrorKind) -> Self {
        Error { kind, offset: None }
    }

    /// Creates an error anchored at a byte offset in the input.
    pub fn at(kind: ErrorKind, offset: u64) -> Self {
        Error {
            kind,
            offset: Some(offset),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Byte offset in the input where the error was detected, if known.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "relish: {} at offset {offset}", self.kind),
            None => write!(f, "relish: {}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(err))
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
