use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use log::{debug, trace};

use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::value::{
    is_key_char, is_key_start, is_string_char, is_tchar, is_token_start, BareItem, Decimal,
    Dictionary, InnerList, Integer, Item, Key, List, ListEntry, Parameters, SfString, Token,
};

// Padding is optional and non-zero pad bits are tolerated.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Parser is a Structured Field Values parser.  It turns one or more
/// field lines into an [Item], a [List] or a [Dictionary].
///
/// Field lines are joined by `,`, and positions reported by
/// [ParseError] are offsets into the joined text.
///
/// ```
/// use structured_fields::Parser;
///
/// let list = Parser::from_field_lines(["foo;a=1", "(bar baz)"])
///     .unwrap()
///     .parse_list()
///     .unwrap();
///
/// assert_eq!(2, list.len());
/// assert_eq!("foo;a=1, (bar baz)", list.serialize());
/// ```
pub struct Parser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Parser<'a> {
    /// Creates new Parser for a single field line.  Fails if the input
    /// contains non-ASCII characters.
    pub fn new(input: &'a str) -> Result<Parser<'a>, ParseError> {
        Parser::from_field_lines([input])
    }

    /// Creates new Parser for the given field lines.  Fails if there
    /// is no field line, or if any of them contains non-ASCII
    /// characters.
    pub fn from_field_lines<I>(field_lines: I) -> Result<Parser<'a>, ParseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        Ok(Parser {
            cursor: Cursor::new(field_lines)?,
        })
    }

    /// Parses the input as an Item.  Leading and trailing SP are
    /// discarded.
    ///
    /// ```
    /// use structured_fields::Parser;
    ///
    /// let item = Parser::new("12.445;foo=bar").unwrap().parse_item().unwrap();
    ///
    /// assert_eq!(Some(12445), item.bare_item().as_decimal().map(|v| v.scaled()));
    /// assert_eq!(Some("bar"), item.params().get("foo").and_then(|v| v.as_token()));
    /// ```
    pub fn parse_item(mut self) -> Result<Item, ParseError> {
        self.run("Item", true, Parser::read_item)
    }

    /// Parses the input as a List.  Leading and trailing SP are
    /// discarded.  Empty input yields an empty List.
    pub fn parse_list(mut self) -> Result<List, ParseError> {
        self.run("List", true, Parser::read_list)
    }

    /// Parses the input as a Dictionary.  Leading and trailing SP are
    /// discarded.  Empty input yields an empty Dictionary.
    ///
    /// This does not reject duplicated keys.  The last value wins,
    /// and the key stays where it first appeared.
    pub fn parse_dictionary(mut self) -> Result<Dictionary, ParseError> {
        self.run("Dictionary", true, Parser::read_dictionary)
    }

    /// Parses the whole input as a Bare Item.
    pub fn parse_bare_item(mut self) -> Result<BareItem, ParseError> {
        self.run("Bare Item", false, Parser::read_bare_item)
    }

    /// Parses the whole input as Parameters, e.g. `;a=1;b`.
    pub fn parse_parameters(mut self) -> Result<Parameters, ParseError> {
        self.run("Parameters", false, Parser::read_parameters)
    }

    /// Parses the whole input as a Key.
    pub fn parse_key(mut self) -> Result<Key, ParseError> {
        self.run("Key", false, Parser::read_key)
    }

    /// Parses the whole input as an Inner List and its parameters.
    pub fn parse_inner_list(mut self) -> Result<InnerList, ParseError> {
        self.run("Inner List", false, Parser::read_inner_list)
    }

    /// Parses the whole input as either an Item or an Inner List.
    pub fn parse_item_or_inner_list(mut self) -> Result<ListEntry, ParseError> {
        self.run(
            "Item or Inner List",
            false,
            Parser::read_item_or_inner_list,
        )
    }
}

impl Parser<'_> {
    fn run<T>(
        &mut self,
        kind: &str,
        discard_sp: bool,
        read: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        trace!(
            "parsing {kind}: {} bytes in {} field line(s)",
            self.cursor.len(),
            self.cursor.field_lines()
        );

        if discard_sp {
            self.cursor.discard_sp();
        }

        let res = read(&mut *self).and_then(|v| {
            if discard_sp {
                self.cursor.discard_sp();
            }

            if self.cursor.has_remaining() {
                return Err(self
                    .cursor
                    .error(format!("Extra characters in string parsed as {kind}")));
            }

            Ok(v)
        });

        if let Err(err) = &res {
            debug!("rejected {kind}: {err}");
        }

        res
    }

    fn read_list(&mut self) -> Result<List, ParseError> {
        let mut entries = Vec::new();

        while self.cursor.has_remaining() {
            entries.push(self.read_item_or_inner_list()?);

            self.cursor.discard_ows();

            let Some(c) = self.cursor.next_byte() else {
                break;
            };

            if c != b',' {
                self.cursor.backout();
                return Err(self
                    .cursor
                    .error(format!("Expected COMMA in List, got: {}", describe(c))));
            }

            self.cursor.discard_ows();

            if self.cursor.eof() {
                return Err(self.cursor.error("Found trailing COMMA in List"));
            }
        }

        Ok(List::new(entries))
    }

    fn read_dictionary(&mut self) -> Result<Dictionary, ParseError> {
        let mut dict = Dictionary::new();

        while self.cursor.has_remaining() {
            let key = self.read_key()?;

            let member = if self.cursor.peek_is(b'=') {
                self.cursor.advance();
                self.read_item_or_inner_list()?
            } else {
                ListEntry::Item(Item::with_params(true, self.read_parameters()?))
            };

            dict.insert(key, member);

            self.cursor.discard_ows();

            let Some(c) = self.cursor.next_byte() else {
                break;
            };

            if c != b',' {
                self.cursor.backout();
                return Err(self
                    .cursor
                    .error(format!("Expected COMMA in Dictionary, found: {}", describe(c))));
            }

            self.cursor.discard_ows();

            if self.cursor.eof() {
                return Err(self.cursor.error("Found trailing COMMA in Dictionary"));
            }
        }

        Ok(dict)
    }

    fn read_item_or_inner_list(&mut self) -> Result<ListEntry, ParseError> {
        if self.cursor.peek_is(b'(') {
            return Ok(ListEntry::InnerList(self.read_inner_list()?));
        }

        Ok(ListEntry::Item(self.read_item()?))
    }

    fn read_inner_list(&mut self) -> Result<InnerList, ParseError> {
        if !self.cursor.peek_is(b'(') {
            return Err(self.cursor.error("Inner List must start with '('"));
        }

        self.cursor.advance();

        let mut items = Vec::new();

        while self.cursor.has_remaining() {
            self.cursor.discard_sp();

            if self.cursor.peek_is(b')') {
                self.cursor.advance();

                let params = self.read_parameters()?;

                return Ok(InnerList::with_params(items, params));
            }

            items.push(self.read_item()?);

            match self.cursor.peek() {
                None => return Err(self.cursor.error("Missing data in Inner List")),
                Some(b' ' | b')') => (),
                Some(c) => {
                    return Err(self.cursor.error(format!(
                        "Expected SP or ')' in Inner List, got: {}",
                        describe(c)
                    )))
                }
            }
        }

        Err(self.cursor.error("Inner List must end with ')'"))
    }

    fn read_item(&mut self) -> Result<Item, ParseError> {
        let bare_item = self.read_bare_item()?;
        let params = self.read_parameters()?;

        Ok(Item::with_params(bare_item, params))
    }

    fn read_parameters(&mut self) -> Result<Parameters, ParseError> {
        let mut params = Parameters::new();

        while self.cursor.peek_is(b';') {
            self.cursor.advance();
            self.cursor.discard_sp();

            let key = self.read_key()?;

            let value = if self.cursor.peek_is(b'=') {
                self.cursor.advance();
                self.read_bare_item()?
            } else {
                BareItem::Boolean(true)
            };

            params.insert(key, value);
        }

        Ok(params)
    }

    fn read_key(&mut self) -> Result<Key, ParseError> {
        match self.cursor.peek() {
            None => return Err(self.cursor.error("Missing data in Key")),
            Some(c) if !is_key_start(c) => {
                return Err(self.cursor.error(format!(
                    "Key must start with LCALPHA or '*': {}",
                    describe(c)
                )))
            }
            _ => (),
        }

        Ok(Key::new_unchecked(
            self.cursor.take_while(is_key_char).to_owned(),
        ))
    }

    fn read_bare_item(&mut self) -> Result<BareItem, ParseError> {
        let Some(c) = self.cursor.peek() else {
            return Err(self
                .cursor
                .error("Empty string found when parsing Bare Item"));
        };

        match c {
            b'-' | b'0'..=b'9' => self.read_number(),
            b'"' => self.read_string(),
            b'?' => self.read_boolean(),
            b':' => self.read_byte_seq(),
            c if is_token_start(c) => self.read_token(),
            _ => Err(self.cursor.error(format!(
                "Unexpected start character in Bare Item: {}",
                describe(c)
            ))),
        }
    }

    fn read_number(&mut self) -> Result<BareItem, ParseError> {
        let mut sign = 1;

        if self.cursor.peek_is(b'-') {
            self.cursor.advance();
            sign = -1;
        }

        if !matches!(self.cursor.peek(), Some(b'0'..=b'9')) {
            return Err(self.cursor.error("Illegal start for Integer or Decimal"));
        }

        let base = self.cursor.pos();
        let mut value: i64 = 0;
        // Number of characters consumed, including the decimal point.
        let mut len: usize = 0;
        // Number of integer digits, once the decimal point was seen.
        let mut dot = None;

        while let Some(c) = self.cursor.peek() {
            match c {
                b'0'..=b'9' => {
                    value *= 10;
                    value += (c - b'0') as i64;
                }
                b'.' if dot.is_none() => {
                    if len > 12 {
                        return Err(self.cursor.error(format!(
                            "Illegal position for decimal point in Decimal after '{}'",
                            self.cursor.since(base)
                        )));
                    }

                    dot = Some(len);
                }
                _ => break,
            }

            self.cursor.advance();
            len += 1;

            let max_len = if dot.is_some() { 16 } else { 15 };
            if len > max_len {
                self.cursor.backout();

                let kind = if dot.is_some() { "Decimal" } else { "Integer" };
                return Err(self
                    .cursor
                    .error(format!("{kind} too long: {len} characters")));
            }
        }

        let Some(dot) = dot else {
            return Ok(BareItem::Integer(Integer::new_unchecked(sign * value)));
        };

        let frac_len = len - dot - 1;

        match frac_len {
            0 => {
                self.cursor.backout();
                Err(self.cursor.error("Decimal must not end in '.'"))
            }
            1..=3 => {
                let scaled = value * 10i64.pow(3 - frac_len as u32);
                Ok(BareItem::Decimal(Decimal::new_unchecked(sign * scaled)))
            }
            _ => {
                let text = self.cursor.since(base).to_owned();
                self.cursor.backout();
                Err(self.cursor.error(format!(
                    "Maximum number of fractional digits is 3, found: {frac_len}, in: {text}"
                )))
            }
        }
    }

    fn read_string(&mut self) -> Result<BareItem, ParseError> {
        self.cursor.advance();

        let mut s = String::new();

        loop {
            if self.cursor.at_boundary() {
                return Err(self.cursor.error(format!(
                    "String crosses field line boundary at position {}",
                    self.cursor.pos()
                )));
            }

            let Some(c) = self.cursor.next_byte() else {
                break;
            };

            match c {
                b'\\' => match self.cursor.next_byte() {
                    None => {
                        return Err(self.cursor.error(format!(
                            "Incomplete escape sequence at position {}",
                            self.cursor.pos()
                        )))
                    }
                    Some(c @ (b'"' | b'\\')) => s.push(c as char),
                    Some(c) => {
                        self.cursor.backout();
                        return Err(self.cursor.error(format!(
                            "Invalid escape sequence character '{}' at position {}",
                            c as char,
                            self.cursor.pos()
                        )));
                    }
                },
                b'"' => return Ok(BareItem::String(SfString::new_unchecked(s))),
                c if is_string_char(c) => s.push(c as char),
                _ => {
                    return Err(self.cursor.error(format!(
                        "Invalid character in String at position {}",
                        self.cursor.pos()
                    )))
                }
            }
        }

        Err(self.cursor.error("Closing DQUOTE missing"))
    }

    fn read_token(&mut self) -> Result<BareItem, ParseError> {
        // The first character was already checked by read_bare_item,
        // and every token start character is also a tchar.
        let s = self.cursor.take_while(is_tchar).to_owned();

        Ok(BareItem::Token(Token::new_unchecked(s)))
    }

    fn read_byte_seq(&mut self) -> Result<BareItem, ParseError> {
        self.cursor.advance();

        let base = self.cursor.pos();

        loop {
            match self.cursor.next_byte() {
                None => {
                    return Err(self.cursor.error(format!(
                        "Byte Sequence must end with COLON: '{}'",
                        self.cursor.since(base)
                    )))
                }
                Some(b':') => break,
                Some(c) if is_base64_char(c) => (),
                Some(c) => {
                    return Err(self.cursor.error(format!(
                        "Invalid Byte Sequence Character '{}' at position {}",
                        c as char,
                        self.cursor.pos()
                    )))
                }
            }
        }

        let encoded = self.cursor.since(base);

        BASE64
            .decode(&encoded[..encoded.len() - 1])
            .map(BareItem::ByteSeq)
            .map_err(|err| {
                self.cursor
                    .error(format!("Invalid base64 in Byte Sequence: {err}"))
            })
    }

    fn read_boolean(&mut self) -> Result<BareItem, ParseError> {
        self.cursor.advance();

        match self.cursor.next_byte() {
            None => Err(self.cursor.error("Missing data in Boolean")),
            Some(b'0') => Ok(BareItem::Boolean(false)),
            Some(b'1') => Ok(BareItem::Boolean(true)),
            Some(c) => {
                self.cursor.backout();
                Err(self.cursor.error(format!(
                    "Expected '0' or '1' in Boolean, found '{}'",
                    c as char
                )))
            }
        }
    }
}

fn is_base64_char(c: u8) -> bool {
    matches!(c, b'+' | b'/' | b'=' | b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z')
}

fn describe(c: u8) -> String {
    if c == b'\t' {
        return String::from("HTAB (\\u0009)");
    }

    format!("'{}' (\\u{:04x})", c as char, c)
}
