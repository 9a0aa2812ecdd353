use std::fmt::{self, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::value::{
    BareItem, Decimal, Dictionary, InnerList, Integer, Item, Key, List, ListEntry, Parameters,
    SfString, Token,
};

// Canonical serialization.  Every function is total over the value
// model, so the only possible error comes from the writer.

fn write_bare_item(w: &mut impl Write, v: &BareItem) -> fmt::Result {
    match v {
        BareItem::Integer(v) => write!(w, "{}", v.get()),
        BareItem::Decimal(v) => write_decimal(w, *v),
        BareItem::String(v) => write_string(w, v.as_str()),
        BareItem::Token(v) => w.write_str(v.as_str()),
        BareItem::ByteSeq(v) => write!(w, ":{}:", STANDARD.encode(v)),
        BareItem::Boolean(v) => w.write_str(if *v { "?1" } else { "?0" }),
    }
}

fn write_decimal(w: &mut impl Write, v: Decimal) -> fmt::Result {
    let scaled = v.scaled();
    if scaled < 0 {
        w.write_char('-')?;
    }

    let abs = scaled.unsigned_abs();
    let scale = Decimal::SCALE as u64;

    write!(w, "{}.", abs / scale)?;

    let frac = abs % scale;
    if frac == 0 {
        return w.write_char('0');
    }

    w.write_str(format!("{frac:03}").trim_end_matches('0'))
}

fn write_string(w: &mut impl Write, s: &str) -> fmt::Result {
    w.write_char('"')?;

    for c in s.chars() {
        if c == '"' || c == '\\' {
            w.write_char('\\')?;
        }
        w.write_char(c)?;
    }

    w.write_char('"')
}

fn write_parameters(w: &mut impl Write, params: &Parameters) -> fmt::Result {
    for (k, v) in params {
        w.write_char(';')?;
        w.write_str(k.as_str())?;

        if let BareItem::Boolean(true) = v {
            continue;
        }

        w.write_char('=')?;
        write_bare_item(w, v)?;
    }

    Ok(())
}

fn write_item(w: &mut impl Write, item: &Item) -> fmt::Result {
    write_bare_item(w, item.bare_item())?;
    write_parameters(w, item.params())
}

fn write_inner_list(w: &mut impl Write, inner_list: &InnerList) -> fmt::Result {
    w.write_char('(')?;

    for (i, item) in inner_list.items().iter().enumerate() {
        if i > 0 {
            w.write_char(' ')?;
        }
        write_item(w, item)?;
    }

    w.write_char(')')?;
    write_parameters(w, inner_list.params())
}

fn write_list_entry(w: &mut impl Write, entry: &ListEntry) -> fmt::Result {
    match entry {
        ListEntry::Item(v) => write_item(w, v),
        ListEntry::InnerList(v) => write_inner_list(w, v),
    }
}

fn write_list(w: &mut impl Write, list: &List) -> fmt::Result {
    for (i, entry) in list.iter().enumerate() {
        if i > 0 {
            w.write_str(", ")?;
        }
        write_list_entry(w, entry)?;
    }

    Ok(())
}

fn write_dictionary(w: &mut impl Write, dict: &Dictionary) -> fmt::Result {
    for (i, (k, v)) in dict.iter().enumerate() {
        if i > 0 {
            w.write_str(", ")?;
        }

        w.write_str(k.as_str())?;

        match v {
            ListEntry::Item(item) if *item.bare_item() == BareItem::Boolean(true) => {
                write_parameters(w, item.params())?
            }
            _ => {
                w.write_char('=')?;
                write_list_entry(w, v)?;
            }
        }
    }

    Ok(())
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_decimal(f, *self)
    }
}

impl fmt::Display for SfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_string(f, self.as_str())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BareItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_bare_item(f, self)
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_parameters(f, self)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_item(f, self)
    }
}

impl fmt::Display for InnerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_inner_list(f, self)
    }
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list_entry(f, self)
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, self)
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_dictionary(f, self)
    }
}

impl BareItem {
    /// Returns the canonical serialization.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl Parameters {
    /// Returns the canonical serialization, e.g. `;a=1;b`.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl Item {
    /// Returns the canonical serialization.
    ///
    /// ```
    /// use structured_fields::{Item, Token};
    ///
    /// let item = Item::new(Token::new("foo").unwrap());
    /// assert_eq!("foo", item.serialize());
    /// ```
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl InnerList {
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl ListEntry {
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl List {
    /// Returns the canonical serialization.  Members are separated by
    /// `, `.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl Dictionary {
    /// Returns the canonical serialization.  A member whose value is
    /// Boolean true is written as its key followed by parameters.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}
