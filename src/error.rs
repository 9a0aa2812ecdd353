use thiserror::Error;

/// Error encountered while parsing data as Structured Field Values.
///
/// `index` is the 0-based position in the logical input (all field
/// lines joined by `,`) at which parsing failed.  It might be the
/// length of the input if the data ends prematurely.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at position {index}")]
pub struct ParseError {
    message: String,
    index: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, index: usize) -> ParseError {
        ParseError {
            message: message.into(),
            index,
        }
    }

    /// Returns the diagnostic without the position suffix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the position in the logical input that caused the
    /// error.
    pub fn position(&self) -> usize {
        self.index
    }
}

/// Errors returned when a value is constructed from data that
/// cannot be represented as a Structured Field Value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("Integer out of range: {0}")]
    IntegerOutOfRange(i64),

    #[error("Decimal out of range: {0}")]
    DecimalOutOfRange(String),

    #[error("Decimal must be finite")]
    NonFiniteDecimal,

    #[error("Invalid character in String at position {index}: {byte:#04x}")]
    InvalidStringChar { index: usize, byte: u8 },

    #[error("Token must not be empty")]
    EmptyToken,

    #[error("Invalid character in Token at position {index}: {byte:#04x}")]
    InvalidTokenChar { index: usize, byte: u8 },

    #[error("Key must not be empty")]
    EmptyKey,

    #[error("Invalid character in Key at position {index}: {byte:#04x}")]
    InvalidKeyChar { index: usize, byte: u8 },
}
