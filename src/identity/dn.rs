//! X.500 distinguished name strings as sent in identity headers.
//!
//! Accepts the RFC 4514 string form (`CN=alice,O=example`) with the RFC 1779
//! leniencies upstream terminators emit: `;` as an RDN separator, spaces
//! around separators, quoted values and `OID.` prefixed types. Attribute
//! keywords are limited to the ones X.500 name parsers commonly recognise, so
//! a bare hostname or `FOO=bar` is not a valid name.

use thiserror::Error;

/// Attribute keywords accepted in the string form.
const KNOWN_KEYWORDS: &[&str] = &[
    "CN",
    "C",
    "L",
    "S",
    "ST",
    "O",
    "OU",
    "T",
    "IP",
    "STREET",
    "DC",
    "DNQUALIFIER",
    "DNQ",
    "EMAILADDRESS",
    "EMAIL",
    "GENERATION",
    "GIVENNAME",
    "INITIALS",
    "SERIALNUMBER",
    "SURNAME",
    "UID",
];

/// Why a DN string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnError {
    /// Input was empty or whitespace
    #[error("empty distinguished name")]
    Empty,
    /// An RDN did not contain `type=value`
    #[error("missing '=' in attribute at offset {0}")]
    MissingEquals(usize),
    /// Attribute type is neither a known keyword nor an OID
    #[error("invalid attribute type '{0}'")]
    InvalidType(String),
    /// Malformed escape, quote or hex value
    #[error("invalid attribute value at offset {0}")]
    InvalidValue(usize),
    /// Unescaped value bytes are not UTF-8
    #[error("attribute value is not valid UTF-8")]
    Utf8,
}

/// A single `type=value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Upper-cased keyword or dotted OID
    pub kind: String,
    /// Unescaped value
    pub value: String,
}

/// A parsed distinguished name, RDNs in string order (most specific first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinguishedName {
    rdns: Vec<Vec<Attribute>>,
}

impl DistinguishedName {
    /// Parse a DN string.
    pub fn parse(input: &str) -> Result<Self, DnError> {
        if input.trim().is_empty() {
            return Err(DnError::Empty);
        }
        Parser::new(input).parse()
    }

    /// The first (most specific) CN value.
    #[must_use]
    pub fn common_name(&self) -> Option<&str> {
        self.attributes()
            .find(|a| a.kind == "CN" || a.kind == "2.5.4.3")
            .map(|a| a.value.as_str())
    }

    /// All attributes in string order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.rdns.iter().flatten()
    }
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<DistinguishedName, DnError> {
        let mut rdns = Vec::new();
        let mut current = Vec::new();
        loop {
            current.push(self.attribute()?);
            self.skip_spaces();
            match self.peek() {
                None => {
                    rdns.push(current);
                    break;
                }
                Some(b'+') => {
                    self.pos += 1;
                }
                Some(b',' | b';') => {
                    self.pos += 1;
                    rdns.push(std::mem::take(&mut current));
                }
                Some(_) => return Err(DnError::InvalidValue(self.pos)),
            }
        }
        Ok(DistinguishedName { rdns })
    }

    fn attribute(&mut self) -> Result<Attribute, DnError> {
        self.skip_spaces();
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'=' || b == b',' || b == b';' || b == b'+' {
                break;
            }
            self.pos += 1;
        }
        if self.peek() != Some(b'=') {
            return Err(DnError::MissingEquals(start));
        }
        let raw_type = String::from_utf8_lossy(&self.bytes[start..self.pos]);
        let kind = attribute_type(raw_type.trim())?;
        self.pos += 1;
        self.skip_spaces();
        let value = self.value()?;
        Ok(Attribute { kind, value })
    }

    fn value(&mut self) -> Result<String, DnError> {
        match self.peek() {
            Some(b'#') => self.hex_value(),
            Some(b'"') => self.quoted_value(),
            _ => self.plain_value(),
        }
    }

    fn hex_value(&mut self) -> Result<String, DnError> {
        let start = self.pos;
        self.pos += 1;
        let digits_start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        let digits = &self.bytes[digits_start..self.pos];
        if digits.is_empty() || digits.len() % 2 != 0 {
            return Err(DnError::InvalidValue(start));
        }
        // BER-encoded value, kept in its string form
        Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    fn quoted_value(&mut self) -> Result<String, DnError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None => return Err(DnError::InvalidValue(start)),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => out.push(self.escape()?),
                Some(b) => {
                    out.push(b);
                    self.pos += 1;
                }
            }
        }
        String::from_utf8(out).map_err(|_| DnError::Utf8)
    }

    fn plain_value(&mut self) -> Result<String, DnError> {
        let mut out = Vec::new();
        // length of `out` up to the last escaped or non-space byte
        let mut significant = 0;
        while let Some(b) = self.peek() {
            match b {
                b',' | b';' | b'+' => break,
                b'"' | b'<' | b'>' => return Err(DnError::InvalidValue(self.pos)),
                b'\\' => {
                    out.push(self.escape()?);
                    significant = out.len();
                }
                _ => {
                    out.push(b);
                    self.pos += 1;
                    if b != b' ' {
                        significant = out.len();
                    }
                }
            }
        }
        out.truncate(significant);
        String::from_utf8(out).map_err(|_| DnError::Utf8)
    }

    /// Consume `\X` or `\HH` and return the byte it stands for.
    fn escape(&mut self) -> Result<u8, DnError> {
        let start = self.pos;
        self.pos += 1;
        match self.peek() {
            Some(h) if h.is_ascii_hexdigit() => {
                let lo = self
                    .bytes
                    .get(self.pos + 1)
                    .copied()
                    .filter(u8::is_ascii_hexdigit)
                    .ok_or(DnError::InvalidValue(start))?;
                self.pos += 2;
                Ok((hex_nibble(h) << 4) | hex_nibble(lo))
            }
            Some(b @ (b',' | b'=' | b'+' | b'<' | b'>' | b'#' | b';' | b'\\' | b'"' | b' ')) => {
                self.pos += 1;
                Ok(b)
            }
            _ => Err(DnError::InvalidValue(start)),
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }
}

fn attribute_type(raw: &str) -> Result<String, DnError> {
    let oid = raw
        .strip_prefix("OID.")
        .or_else(|| raw.strip_prefix("oid."))
        .unwrap_or(raw);
    if is_oid(oid) {
        return Ok(oid.to_string());
    }
    let upper = raw.to_ascii_uppercase();
    if KNOWN_KEYWORDS.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(DnError::InvalidType(raw.to_string()))
    }
}

fn is_oid(s: &str) -> bool {
    !s.is_empty()
        && s.split('.')
            .all(|arc| !arc.is_empty() && arc.bytes().all(|b| b.is_ascii_digit()))
        && s.contains('.')
}

fn hex_nibble(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}
