//! [RFC 9651](https://datatracker.ietf.org/doc/html/rfc9651)
//! Structured Field Values parser and serializer.
//!
//! Parses HTTP field values into an [Item], a [List] or a
//! [Dictionary], and serializes them back in canonical form.  Parsing
//! errors carry the position in the input at which parsing failed.
//!
//! This is an example of parsing [RFC
//! 9218](https://datatracker.ietf.org/doc/html/rfc9218) Priority
//! header field:
//!
//! ```
//! let dict = structured_fields::parse_dictionary("u=2, i").unwrap();
//!
//! let urgency = dict
//!     .get("u")
//!     .and_then(|v| v.as_item())
//!     .and_then(|v| v.bare_item().as_integer())
//!     .filter(|v| (0..=7).contains(v))
//!     .unwrap_or(3);
//! let incremental = dict
//!     .get("i")
//!     .and_then(|v| v.as_item())
//!     .and_then(|v| v.bare_item().as_bool())
//!     .unwrap_or(false);
//!
//! assert_eq!(2, urgency);
//! assert!(incremental);
//! assert_eq!("u=2, i", dict.serialize());
//! ```
//!
//! Errors report where parsing stopped:
//!
//! ```
//! let err = structured_fields::parse_item("?").unwrap_err();
//!
//! assert_eq!("Missing data in Boolean", err.message());
//! assert_eq!(1, err.position());
//! ```
mod cursor;
mod error;
mod parser;
mod serializer;
mod value;

pub use crate::error::{ParseError, ValueError};
pub use crate::parser::Parser;
pub use crate::value::{
    BareItem, Decimal, Dictionary, InnerList, Integer, Item, Key, List, ListEntry, Parameters,
    SfString, Token,
};

/// Parses a single field line as an Item.
pub fn parse_item(input: &str) -> Result<Item, ParseError> {
    Parser::new(input)?.parse_item()
}

/// Parses a single field line as a List.
pub fn parse_list(input: &str) -> Result<List, ParseError> {
    Parser::new(input)?.parse_list()
}

/// Parses a single field line as a Dictionary.
pub fn parse_dictionary(input: &str) -> Result<Dictionary, ParseError> {
    Parser::new(input)?.parse_dictionary()
}
