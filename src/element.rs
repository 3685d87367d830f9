//! A small owned XML element tree and the typed lookups the ENI reader
//! needs on top of it.
//!
//! Paths are `/`-separated sequences of child element names relative to the
//! element they are looked up from, e.g. `Info/VendorId`. Names are matched on
//! their local part; namespace prefixes are ignored.

use std::io;

use xml::attribute::OwnedAttribute;
use xml::name::OwnedName;
use xml::reader::{ParserConfig, XmlEvent};

use crate::error::EniError;

/// One parsed XML element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Character data found before the first child element, if any.
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    /// Read a complete document and return its root element.
    pub fn parse<R: io::Read>(fin: R) -> Result<Element, EniError> {
        let parser = ParserConfig::new()
            .whitespace_to_characters(true)
            .cdata_to_characters(true)
            .ignore_comments(true)
            .create_reader(fin);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        for e in parser {
            match e? {
                XmlEvent::StartElement { name, attributes, .. } => {
                    let OwnedName { local_name, .. } = name;
                    let attributes = attributes
                        .into_iter()
                        .map(|OwnedAttribute { name, value }| (name.local_name, value))
                        .collect();
                    stack.push(Element {
                        name: local_name,
                        attributes,
                        text: None,
                        children: Vec::new(),
                    });
                }
                XmlEvent::Characters(data) => {
                    if let Some(current) = stack.last_mut() {
                        if current.children.is_empty() {
                            current.text.get_or_insert_with(String::new).push_str(&data);
                        }
                    }
                }
                XmlEvent::EndElement { .. } => {
                    let done = stack
                        .pop()
                        .ok_or_else(|| EniError::schema("Unbalanced end element"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(done),
                        None => root = Some(done),
                    }
                }
                _ => {}
            }
        }

        root.ok_or_else(|| EniError::schema("Document has no root element"))
    }

    /// Value of the attribute called `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Element text, or the empty string for an element without text.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// All elements matching `path`, in document order.
    ///
    /// If `min` is given, fewer matches than `min` is a schema error; if `max`
    /// is given, more matches than `max` is one too.
    pub fn find(
        &self,
        path: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Result<Vec<&Element>, EniError> {
        let mut found: Vec<&Element> = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            found = found
                .into_iter()
                .flat_map(|e| e.children.iter().filter(move |c| c.name == step))
                .collect();
        }

        if let Some(max) = max {
            if found.len() > max {
                return Err(EniError::schema(format!("Too many {} elements", path)));
            }
        }
        if let Some(min) = min {
            if found.len() < min {
                return Err(EniError::schema(format!("Too few {} elements", path)));
            }
        }
        Ok(found)
    }

    /// The single element matching `path`.
    pub fn find_one(&self, path: &str) -> Result<&Element, EniError> {
        let found = self.find(path, Some(1), Some(1))?;
        Ok(found[0])
    }

    /// The element matching `path`, if there is one; more than one is an error.
    pub fn find_optional(&self, path: &str) -> Result<Option<&Element>, EniError> {
        let found = self.find(path, Some(0), Some(1))?;
        Ok(found.first().copied())
    }

    pub fn read_int(&self, path: &str) -> Result<i128, EniError> {
        parse_int(self.find_one(path)?.text(), path)
    }

    pub fn read_optional_int(&self, path: &str, default: i128) -> Result<i128, EniError> {
        match self.find_optional(path)? {
            Some(e) => parse_int(e.text(), path),
            None => Ok(default),
        }
    }

    pub fn read_text(&self, path: &str) -> Result<&str, EniError> {
        Ok(self.find_one(path)?.text())
    }

    pub fn read_optional_text<'a>(
        &'a self,
        path: &str,
        default: &'a str,
    ) -> Result<&'a str, EniError> {
        Ok(self.find_optional(path)?.map_or(default, |e| e.text()))
    }
}

/// Parse an integer literal in decimal, `0x` hex, `0o` octal or `0b` binary
/// notation. Surrounding whitespace, a leading sign and single underscores
/// between digits are accepted; `path` only names the element in errors.
///
/// Literals wider than 128 bits wrap around, so the low 128 bits of the
/// value are always exact and callers can mask them to the field width.
pub fn parse_int(literal: &str, path: &str) -> Result<i128, EniError> {
    let invalid = || {
        EniError::value(format!("Invalid integer literal '{}' in {}", literal, path))
    };

    let s = literal.trim();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let lower = s.get(..2).map(|p| p.to_ascii_lowercase());
    let (radix, digits) = match lower.as_deref() {
        Some("0x") => (16, &s[2..]),
        Some("0o") => (8, &s[2..]),
        Some("0b") => (2, &s[2..]),
        _ => (10, s),
    };
    // The prefix may be followed by an underscore, e.g. 0x_FF.
    let digits = if radix != 10 { digits.strip_prefix('_').unwrap_or(digits) } else { digits };

    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return Err(invalid());
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if radix == 10 && cleaned.starts_with('0') && cleaned.chars().any(|c| c != '0') {
        return Err(invalid());
    }

    let mut acc: u128 = 0;
    for c in cleaned.chars() {
        let d = c.to_digit(radix).ok_or_else(invalid)?;
        acc = acc.wrapping_mul(u128::from(radix)).wrapping_add(u128::from(d));
    }
    let acc = if negative { acc.wrapping_neg() } else { acc };
    Ok(acc as i128)
}
