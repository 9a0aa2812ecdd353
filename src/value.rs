use std::borrow::Borrow;

use indexmap::IndexMap;

use crate::error::ValueError;

/// Integer represents Integers.  Its absolute value never exceeds
/// 999,999,999,999,999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Integer(i64);

impl Integer {
    pub const MIN: Integer = Integer(-999_999_999_999_999);
    pub const MAX: Integer = Integer(999_999_999_999_999);

    pub fn new(v: i64) -> Result<Integer, ValueError> {
        if !(Self::MIN.0..=Self::MAX.0).contains(&v) {
            return Err(ValueError::IntegerOutOfRange(v));
        }

        Ok(Integer(v))
    }

    pub(crate) fn new_unchecked(v: i64) -> Integer {
        Integer(v)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Integer {
    type Error = ValueError;

    fn try_from(v: i64) -> Result<Integer, ValueError> {
        Integer::new(v)
    }
}

impl From<Integer> for i64 {
    fn from(v: Integer) -> i64 {
        v.0
    }
}

/// Decimal represents Decimals.  The value is kept as an integer
/// scaled by 1000, so it carries at most 3 fractional digits and at
/// most 12 integer digits without any floating point error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(i64);

impl Decimal {
    /// The divisor applied to the scaled representation.
    pub const SCALE: i64 = 1000;
    pub const MIN: Decimal = Decimal(-999_999_999_999_999);
    pub const MAX: Decimal = Decimal(999_999_999_999_999);

    /// Creates Decimal from a value multiplied by [Decimal::SCALE].
    ///
    /// ```
    /// use structured_fields::Decimal;
    ///
    /// let d = Decimal::from_scaled(-1500).unwrap();
    /// assert_eq!("-1.5", d.to_string());
    /// ```
    pub fn from_scaled(scaled: i64) -> Result<Decimal, ValueError> {
        if !(Self::MIN.0..=Self::MAX.0).contains(&scaled) {
            return Err(ValueError::DecimalOutOfRange(format!(
                "{scaled}/{}",
                Self::SCALE
            )));
        }

        Ok(Decimal(scaled))
    }

    pub(crate) fn new_unchecked(scaled: i64) -> Decimal {
        Decimal(scaled)
    }

    /// Returns the value multiplied by [Decimal::SCALE].
    pub fn scaled(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }
}

/// Rounds to 3 fractional digits, ties to even.
impl TryFrom<f64> for Decimal {
    type Error = ValueError;

    fn try_from(v: f64) -> Result<Decimal, ValueError> {
        if !v.is_finite() {
            return Err(ValueError::NonFiniteDecimal);
        }

        let scaled = (v * Self::SCALE as f64).round_ties_even();
        if scaled.abs() > Self::MAX.0 as f64 {
            return Err(ValueError::DecimalOutOfRange(v.to_string()));
        }

        Ok(Decimal(scaled as i64))
    }
}

/// SfString represents Strings.  It only contains visible ASCII
/// characters and SP.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SfString(String);

impl SfString {
    pub fn new(s: impl Into<String>) -> Result<SfString, ValueError> {
        let s = s.into();

        if let Some(index) = s.bytes().position(|c| !is_string_char(c)) {
            return Err(ValueError::InvalidStringChar {
                index,
                byte: s.as_bytes()[index],
            });
        }

        Ok(SfString(s))
    }

    pub(crate) fn new_unchecked(s: String) -> SfString {
        SfString(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Token represents Tokens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(String);

impl Token {
    /// ```
    /// use structured_fields::Token;
    ///
    /// assert!(Token::new("text/html").is_ok());
    /// assert!(Token::new("1foo").is_err());
    /// ```
    pub fn new(s: impl Into<String>) -> Result<Token, ValueError> {
        let s = s.into();

        match s.as_bytes().first() {
            None => return Err(ValueError::EmptyToken),
            Some(&c) if !is_token_start(c) => {
                return Err(ValueError::InvalidTokenChar { index: 0, byte: c })
            }
            _ => (),
        }

        if let Some(index) = s.bytes().position(|c| !is_tchar(c)) {
            return Err(ValueError::InvalidTokenChar {
                index,
                byte: s.as_bytes()[index],
            });
        }

        Ok(Token(s))
    }

    pub(crate) fn new_unchecked(s: String) -> Token {
        Token(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Key is the name of a parameter or a dictionary member.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(String);

impl Key {
    pub fn new(s: impl Into<String>) -> Result<Key, ValueError> {
        let s = s.into();

        match s.as_bytes().first() {
            None => return Err(ValueError::EmptyKey),
            Some(&c) if !is_key_start(c) => {
                return Err(ValueError::InvalidKeyChar { index: 0, byte: c })
            }
            _ => (),
        }

        if let Some(index) = s.bytes().position(|c| !is_key_char(c)) {
            return Err(ValueError::InvalidKeyChar {
                index,
                byte: s.as_bytes()[index],
            });
        }

        Ok(Key(s))
    }

    pub(crate) fn new_unchecked(s: String) -> Key {
        Key(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Key {
    type Error = ValueError;

    fn try_from(s: &str) -> Result<Key, ValueError> {
        Key::new(s)
    }
}

/// Represents Structured Field Value bare item types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BareItem {
    Integer(Integer),
    Decimal(Decimal),
    String(SfString),
    Token(Token),
    /// ByteSeq represents Byte Sequences.  It contains the decoded
    /// bytes.
    ByteSeq(Vec<u8>),
    Boolean(bool),
}

impl BareItem {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            BareItem::Integer(v) => Some(v.get()),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            BareItem::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the content of a String.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BareItem::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&str> {
        match self {
            BareItem::Token(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_byte_seq(&self) -> Option<&[u8]> {
        match self {
            BareItem::ByteSeq(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BareItem::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, BareItem::Integer(_))
    }

    pub fn is_decimal(&self) -> bool {
        matches!(self, BareItem::Decimal(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, BareItem::String(_))
    }

    pub fn is_token(&self) -> bool {
        matches!(self, BareItem::Token(_))
    }

    pub fn is_byte_seq(&self) -> bool {
        matches!(self, BareItem::ByteSeq(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, BareItem::Boolean(_))
    }
}

impl From<Integer> for BareItem {
    fn from(v: Integer) -> BareItem {
        BareItem::Integer(v)
    }
}

impl From<Decimal> for BareItem {
    fn from(v: Decimal) -> BareItem {
        BareItem::Decimal(v)
    }
}

impl From<SfString> for BareItem {
    fn from(v: SfString) -> BareItem {
        BareItem::String(v)
    }
}

impl From<Token> for BareItem {
    fn from(v: Token) -> BareItem {
        BareItem::Token(v)
    }
}

impl From<Vec<u8>> for BareItem {
    fn from(v: Vec<u8>) -> BareItem {
        BareItem::ByteSeq(v)
    }
}

impl From<&[u8]> for BareItem {
    fn from(v: &[u8]) -> BareItem {
        BareItem::ByteSeq(v.to_vec())
    }
}

impl From<bool> for BareItem {
    fn from(v: bool) -> BareItem {
        BareItem::Boolean(v)
    }
}

impl TryFrom<i64> for BareItem {
    type Error = ValueError;

    fn try_from(v: i64) -> Result<BareItem, ValueError> {
        Ok(BareItem::Integer(Integer::new(v)?))
    }
}

/// Parameters is an ordered map of keys to bare items.  Inserting a
/// key that is already present replaces its value and keeps its
/// position.
#[derive(Debug, Clone, Default)]
pub struct Parameters(IndexMap<Key, BareItem>);

impl Parameters {
    pub fn new() -> Parameters {
        Parameters::default()
    }

    pub(crate) fn insert(&mut self, key: Key, value: BareItem) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&BareItem> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(Key::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, BareItem> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Equality is order sensitive.
impl PartialEq for Parameters {
    fn eq(&self, other: &Parameters) -> bool {
        self.0.len() == other.0.len() && self.0.iter().eq(other.0.iter())
    }
}

impl Eq for Parameters {}

impl FromIterator<(Key, BareItem)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (Key, BareItem)>>(iter: T) -> Parameters {
        Parameters(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = (&'a Key, &'a BareItem);
    type IntoIter = indexmap::map::Iter<'a, Key, BareItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Item is a bare item and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    bare_item: BareItem,
    params: Parameters,
}

impl Item {
    pub fn new(bare_item: impl Into<BareItem>) -> Item {
        Item::with_params(bare_item, Parameters::new())
    }

    pub fn with_params(bare_item: impl Into<BareItem>, params: Parameters) -> Item {
        Item {
            bare_item: bare_item.into(),
            params,
        }
    }

    pub fn bare_item(&self) -> &BareItem {
        &self.bare_item
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }
}

/// InnerList is a sequence of items with its own parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InnerList {
    items: Vec<Item>,
    params: Parameters,
}

impl InnerList {
    pub fn new(items: Vec<Item>) -> InnerList {
        InnerList::with_params(items, Parameters::new())
    }

    pub fn with_params(items: Vec<Item>, params: Parameters) -> InnerList {
        InnerList { items, params }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }
}

/// ListEntry is a member of a List or a value of a Dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntry {
    Item(Item),
    InnerList(InnerList),
}

impl ListEntry {
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            ListEntry::Item(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_inner_list(&self) -> Option<&InnerList> {
        match self {
            ListEntry::InnerList(v) => Some(v),
            _ => None,
        }
    }

    pub fn params(&self) -> &Parameters {
        match self {
            ListEntry::Item(v) => v.params(),
            ListEntry::InnerList(v) => v.params(),
        }
    }
}

impl From<Item> for ListEntry {
    fn from(v: Item) -> ListEntry {
        ListEntry::Item(v)
    }
}

impl From<InnerList> for ListEntry {
    fn from(v: InnerList) -> ListEntry {
        ListEntry::InnerList(v)
    }
}

/// List is the top-level sequence of items and inner lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct List(Vec<ListEntry>);

impl List {
    pub fn new(entries: Vec<ListEntry>) -> List {
        List(entries)
    }

    pub fn get(&self, index: usize) -> Option<&ListEntry> {
        self.0.get(index)
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ListEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ListEntry> for List {
    fn from_iter<T: IntoIterator<Item = ListEntry>>(iter: T) -> List {
        List(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a ListEntry;
    type IntoIter = std::slice::Iter<'a, ListEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Dictionary is an ordered map of keys to items or inner lists.
/// Like [Parameters], a repeated key keeps its first position and
/// takes the last value.
#[derive(Debug, Clone, Default)]
pub struct Dictionary(IndexMap<Key, ListEntry>);

impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary::default()
    }

    pub(crate) fn insert(&mut self, key: Key, value: ListEntry) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&ListEntry> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(Key::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, ListEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Dictionary) -> bool {
        self.0.len() == other.0.len() && self.0.iter().eq(other.0.iter())
    }
}

impl Eq for Dictionary {}

impl FromIterator<(Key, ListEntry)> for Dictionary {
    fn from_iter<T: IntoIterator<Item = (Key, ListEntry)>>(iter: T) -> Dictionary {
        Dictionary(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a Key, &'a ListEntry);
    type IntoIter = indexmap::map::Iter<'a, Key, ListEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

pub(crate) fn is_string_char(c: u8) -> bool {
    matches!(c, 0x20..=0x7e)
}

pub(crate) fn is_token_start(c: u8) -> bool {
    matches!(c, b'*' | b'A'..=b'Z' | b'a'..=b'z')
}

pub(crate) fn is_tchar(c: u8) -> bool {
    matches!(
        c,
        b'!' | b'#'
            | b'$'
            | b'%'
            | b'&'
            | b'\''
            | b'*'
            | b'+'
            | b'-'
            | b'.'
            | b'/'
            | b'0'..=b'9'
            | b':'
            | b'A'..=b'Z'
            | b'^'
            | b'_'
            | b'`'
            | b'a'..=b'z'
            | b'|'
            | b'~'
    )
}

pub(crate) fn is_key_start(c: u8) -> bool {
    matches!(c, b'*' | b'a'..=b'z')
}

pub(crate) fn is_key_char(c: u8) -> bool {
    matches!(c, b'_' | b'-' | b'.' | b'*' | b'0'..=b'9' | b'a'..=b'z')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(s: &str) -> Key {
        Key::new(s).unwrap()
    }

    #[test]
    fn integer_range() {
        assert_eq!(999_999_999_999_999, Integer::new(999_999_999_999_999).unwrap().get());
        assert_eq!(-999_999_999_999_999, Integer::MIN.get());
        assert_eq!(
            Err(ValueError::IntegerOutOfRange(1_000_000_000_000_000)),
            Integer::new(1_000_000_000_000_000)
        );
        assert!(Integer::try_from(-1_000_000_000_000_000i64).is_err());
    }

    #[test]
    fn decimal_from_f64() {
        [
            (1.5f64, 1500),
            (-0.25, -250),
            (12.34566, 12346),
            (2.0625, 2062),
            (0.1875, 188),
        ]
        .iter()
        .for_each(|&(v, scaled)| {
            assert_eq!(scaled, Decimal::try_from(v).unwrap().scaled(), "{v}");
        });

        assert_eq!(Err(ValueError::NonFiniteDecimal), Decimal::try_from(f64::NAN));
        assert_eq!(
            Err(ValueError::NonFiniteDecimal),
            Decimal::try_from(f64::INFINITY)
        );
        assert!(Decimal::try_from(1e12f64).is_err());
        assert!(Decimal::from_scaled(1_000_000_000_000_000).is_err());
        assert_eq!(-1.5, Decimal::from_scaled(-1500).unwrap().as_f64());
    }

    #[test]
    fn string_chars() {
        assert!(SfString::new("foo \"bar\" \\ baz").is_ok());
        assert!(SfString::new("").is_ok());
        assert_eq!(
            Err(ValueError::InvalidStringChar {
                index: 3,
                byte: b'\t'
            }),
            SfString::new("foo\tbar")
        );
        assert!(SfString::new("füü").is_err());
    }

    #[test]
    fn token_chars() {
        assert!(Token::new("*").is_ok());
        assert!(Token::new("a_b-c.d3:f%00/*").is_ok());
        assert!(Token::new("FooBar").is_ok());
        assert_eq!(Err(ValueError::EmptyToken), Token::new(""));
        assert_eq!(
            Err(ValueError::InvalidTokenChar { index: 0, byte: b'1' }),
            Token::new("1abc")
        );
        assert_eq!(
            Err(ValueError::InvalidTokenChar { index: 1, byte: b' ' }),
            Token::new("a b")
        );
    }

    #[test]
    fn key_chars() {
        assert!(Key::new("*").is_ok());
        assert!(Key::new("a_b-c.d3*").is_ok());
        assert_eq!(Err(ValueError::EmptyKey), Key::new(""));
        assert_eq!(
            Err(ValueError::InvalidKeyChar { index: 0, byte: b'A' }),
            Key::new("Abc")
        );
        assert_eq!(
            Err(ValueError::InvalidKeyChar { index: 1, byte: b'B' }),
            Key::new("aBc")
        );
        assert!(Key::try_from("_a").is_err());
    }

    #[test]
    fn bare_item_accessors() {
        let v = BareItem::try_from(42i64).unwrap();

        assert_eq!(Some(42), v.as_integer());
        assert!(v.is_integer());
        assert_eq!(None, v.as_decimal());
        assert_eq!(None, v.as_str());
        assert_eq!(None, v.as_token());
        assert_eq!(None, v.as_byte_seq());
        assert_eq!(None, v.as_bool());

        let v = BareItem::from(Token::new("foo").unwrap());
        assert_eq!(Some("foo"), v.as_token());
        assert_eq!(None, v.as_str());
        assert!(v.is_token());
        assert!(!v.is_string());

        let v = BareItem::from(SfString::new("foo").unwrap());
        assert_eq!(Some("foo"), v.as_str());
        assert!(v.is_string());

        let v = BareItem::from(&b"hello"[..]);
        assert_eq!(Some(&b"hello"[..]), v.as_byte_seq());
        assert!(v.is_byte_seq());

        let v = BareItem::from(false);
        assert_eq!(Some(false), v.as_bool());
        assert!(v.is_bool());

        let v = BareItem::from(Decimal::from_scaled(1230).unwrap());
        assert_eq!(Some(1230), v.as_decimal().map(Decimal::scaled));
        assert!(v.is_decimal());
    }

    #[test]
    fn parameters_overwrite_keeps_position() {
        let params: Parameters = [
            (key("a"), BareItem::try_from(1i64).unwrap()),
            (key("b"), BareItem::try_from(2i64).unwrap()),
            (key("a"), BareItem::try_from(3i64).unwrap()),
        ]
        .into_iter()
        .collect();

        assert_eq!(vec!["a", "b"], params.keys().collect::<Vec<_>>());
        assert_eq!(Some(3), params.get("a").and_then(BareItem::as_integer));
        assert_eq!(2, params.len());
        assert!(params.contains_key("b"));
        assert!(!params.contains_key("c"));
    }

    #[test]
    fn parameters_equality_is_ordered() {
        let ab: Parameters = [
            (key("a"), BareItem::from(true)),
            (key("b"), BareItem::from(false)),
        ]
        .into_iter()
        .collect();
        let ba: Parameters = [
            (key("b"), BareItem::from(false)),
            (key("a"), BareItem::from(true)),
        ]
        .into_iter()
        .collect();

        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn dictionary_overwrite_keeps_position() {
        let dict: Dictionary = [
            (key("x"), ListEntry::from(Item::new(true))),
            (key("y"), InnerList::default().into()),
            (key("x"), Item::new(false).into()),
        ]
        .into_iter()
        .collect();

        assert_eq!(vec!["x", "y"], dict.keys().collect::<Vec<_>>());
        assert_eq!(
            Some(false),
            dict.get("x")
                .and_then(ListEntry::as_item)
                .and_then(|v| v.bare_item().as_bool())
        );
        assert!(dict.get("y").and_then(ListEntry::as_inner_list).is_some());
    }

    #[test]
    fn list_entry_params() {
        let params: Parameters = [(key("q"), BareItem::from(true))].into_iter().collect();
        let entry = ListEntry::from(InnerList::with_params(
            vec![Item::new(true)],
            params.clone(),
        ));

        assert_eq!(&params, entry.params());
        assert_eq!(None, entry.as_item());
        assert_eq!(1, entry.as_inner_list().map_or(0, |v| v.items().len()));
    }
}
