//! XML name syntax and `QName` handling.
//!
//! Names supplied by callers are checked here before any tree mutation:
//! the XML 1.0 `Name` production for plain names, plus the Namespaces in
//! XML 1.0 `QName`/`NCName` rules whenever a name is namespace-qualified.
//!
//! See <https://www.w3.org/TR/xml/#NT-Name> and
//! <https://www.w3.org/TR/xml-names/#NT-QName>

use crate::error::{Error, Result};

/// The namespace URI permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace URI of `xmlns` declarations themselves.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2.
#[must_use]
pub fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// Returns `true` if `c` is a valid `NameStartChar` per XML 1.0 §2.3.
#[must_use]
pub fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a valid `NameChar` per XML 1.0 §2.3.
#[must_use]
pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Checks `name` against the XML `Name` production.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] describing the first violated rule.
pub fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(Error::invalid_name(name, "name is empty"));
    };
    if first.is_ascii_digit() {
        return Err(Error::invalid_name(name, "name must not start with a digit"));
    }
    if !is_name_start_char(first) {
        return Err(Error::invalid_name(name, "invalid name start character"));
    }
    if chars.any(char::is_whitespace) {
        return Err(Error::invalid_name(name, "name contains whitespace"));
    }
    if !name.chars().skip(1).all(is_name_char) {
        return Err(Error::invalid_name(name, "invalid name character"));
    }
    Ok(())
}

/// Checks `name` against the `NCName` production (a `Name` without colons).
///
/// # Errors
///
/// Returns [`Error::InvalidName`] if the name is not an `NCName`.
pub fn validate_ncname(name: &str) -> Result<()> {
    validate_name(name)?;
    if name.contains(':') {
        return Err(Error::invalid_name(name, "name must not contain a colon"));
    }
    Ok(())
}

/// Checks `name` as a `QName` and splits it into prefix and local part.
///
/// # Errors
///
/// Returns [`Error::InvalidName`] if either part is not an `NCName`.
pub fn validate_qname(name: &str) -> Result<(Option<&str>, &str)> {
    validate_name(name)?;
    let (prefix, local) = split_qname(name);
    if let Some(prefix) = prefix {
        if prefix.is_empty() || local.is_empty() {
            return Err(Error::invalid_name(
                name,
                "qualified name has an empty prefix or local part",
            ));
        }
        if local.contains(':') {
            return Err(Error::invalid_name(
                name,
                "qualified name contains multiple colons",
            ));
        }
    }
    Ok((prefix, local))
}

/// Splits a `QName` into its prefix and local name parts.
///
/// Returns `(Some(prefix), localname)` if the name contains a colon,
/// or `(None, localname)` if it does not.
///
/// # Examples
///
/// ```
/// use xmldom::util::qname::split_qname;
///
/// assert_eq!(split_qname("svg:rect"), (Some("svg"), "rect"));
/// assert_eq!(split_qname("div"), (None, "div"));
/// ```
#[must_use]
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.find(':') {
        Some(pos) => (Some(&qname[..pos]), &qname[pos + 1..]),
        None => (None, qname),
    }
}
