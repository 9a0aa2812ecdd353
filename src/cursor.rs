use std::borrow::Cow;

use crate::error::ParseError;

/// Cursor is a position-aware view over one or more field lines.
/// Field lines are joined by a single `,`, and every position it
/// reports is an offset into that joined text.
pub(crate) struct Cursor<'a> {
    data: Cow<'a, str>,
    pos: usize,
    // Offsets of the `,` inserted between two field lines.
    boundaries: Vec<usize>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new<I>(field_lines: I) -> Result<Cursor<'a>, ParseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lines = field_lines.into_iter();

        let Some(first) = lines.next() else {
            return Err(ParseError::new("Empty input", 0));
        };

        check_ascii(first, 0)?;

        let mut data = Cow::Borrowed(first);
        let mut boundaries = Vec::new();

        for line in lines {
            let joined = data.to_mut();

            boundaries.push(joined.len());
            joined.push(',');

            check_ascii(line, joined.len())?;
            joined.push_str(line);
        }

        Ok(Cursor {
            data,
            pos: 0,
            boundaries,
        })
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn field_lines(&self) -> usize {
        self.boundaries.len() + 1
    }

    /// Returns the text between start and the current position.
    pub(crate) fn since(&self, start: usize) -> &str {
        &self.data[start..self.pos]
    }

    pub(crate) fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub(crate) fn has_remaining(&self) -> bool {
        !self.eof()
    }

    /// Returns the current byte without consuming it.
    pub(crate) fn peek(&self) -> Option<u8> {
        self.data.as_bytes().get(self.pos).copied()
    }

    /// Consumes and returns the current byte.  Position does not move
    /// past the end of the input.
    pub(crate) fn next_byte(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    pub(crate) fn advance(&mut self) {
        if self.has_remaining() {
            self.pos += 1;
        }
    }

    /// Steps back over the byte consumed last.
    pub(crate) fn backout(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }

    pub(crate) fn peek_is(&self, c: u8) -> bool {
        self.peek() == Some(c)
    }

    /// Returns true if the current position is the `,` that joins two
    /// field lines.
    pub(crate) fn at_boundary(&self) -> bool {
        self.boundaries.binary_search(&self.pos).is_ok()
    }

    /// Discards SP.  HTAB is not discarded.
    pub(crate) fn discard_sp(&mut self) {
        self.discard_while(|c| c == b' ');
    }

    /// Discards OWS, that is SP and HTAB.
    pub(crate) fn discard_ows(&mut self) {
        self.discard_while(|c| c == b' ' || c == b'\t');
    }

    /// Consumes bytes as long as `pred` holds and returns the consumed
    /// text.
    pub(crate) fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &str {
        let base = self.pos;
        self.discard_while(pred);
        &self.data[base..self.pos]
    }

    fn discard_while(&mut self, pred: impl Fn(u8) -> bool) {
        match self.data.as_bytes()[self.pos..]
            .iter()
            .position(|&x| !pred(x))
        {
            Some(pos) => self.pos += pos,
            None => self.pos = self.data.len(),
        }
    }

    /// Returns a ParseError at the current position.
    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.pos)
    }
}

fn check_ascii(line: &str, base: usize) -> Result<(), ParseError> {
    let Some(index) = line.bytes().position(|b| !b.is_ascii()) else {
        return Ok(());
    };

    // Everything before index is ASCII, so index is a char boundary.
    let c = line[index..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);

    Err(ParseError::new(
        format!(
            "Invalid character in field line at position {index}: '{c}' (0x{:04x})",
            c as u32
        ),
        base + index,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn joins_field_lines() {
        let mut c = Cursor::new(["a=1", "b=2", ""]).unwrap();

        assert_eq!("a=1,b=2,", c.take_while(|_| true));
        assert_eq!(8, c.pos());
        assert!(c.eof());
        assert_eq!(vec![3, 7], c.boundaries);
    }

    #[test]
    fn single_field_line_is_borrowed() {
        let c = Cursor::new(["foo"]).unwrap();

        assert!(matches!(c.data, Cow::Borrowed("foo")));
        assert!(c.boundaries.is_empty());
    }

    #[test]
    fn empty_input() {
        let err = Cursor::new(Vec::<&str>::new()).err().unwrap();

        assert_eq!("Empty input", err.message());
        assert_eq!(0, err.position());
    }

    #[test]
    fn non_ascii() {
        let err = Cursor::new(["abc", "dé"]).err().unwrap();

        assert_eq!(5, err.position());
        assert_eq!(
            "Invalid character in field line at position 1: 'é' (0x00e9)",
            err.message()
        );
    }

    #[test]
    fn boundaries() {
        let mut c = Cursor::new(["a", "b"]).unwrap();

        assert!(!c.at_boundary());
        c.advance();
        assert!(c.at_boundary());
        assert_eq!(Some(b','), c.next_byte());
        assert!(!c.at_boundary());
    }

    #[test]
    fn whitespace() {
        let mut c = Cursor::new([" \t x"]).unwrap();

        c.discard_sp();
        assert_eq!(1, c.pos());
        c.discard_sp();
        assert_eq!(Some(b'\t'), c.peek());
        c.discard_ows();
        assert_eq!(Some(b'x'), c.peek());
        c.advance();
        c.advance();
        assert_eq!(4, c.pos());
        c.backout();
        assert_eq!(3, c.pos());
    }
}
