//! Character encoding detection and conversion.
//!
//! Documents are held in memory as UTF-8. This module bridges raw bytes in
//! other encodings to that representation (and back for output) using
//! `encoding_rs`.
//!
//! Detection follows XML 1.0 §4.3.3 and Appendix F:
//!
//! 1. A byte order mark wins and is stripped.
//! 2. Otherwise the `encoding` pseudo-attribute of the XML declaration is
//!    read from the ASCII-compatible prefix of the input.
//! 3. Otherwise the input is UTF-8.

use std::fmt;

/// An error that occurs during encoding detection or conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingError {
    /// A human-readable description of the problem.
    pub message: String,
}

impl EncodingError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding error: {}", self.message)
    }
}

impl std::error::Error for EncodingError {}

/// Input decoded to UTF-8 together with the encoding it was read as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// The document text, without any byte order mark.
    pub text: String,
    /// Canonical name of the source encoding.
    pub encoding: &'static str,
}

/// Detects the encoding of a byte stream from its byte order mark.
///
/// Returns the encoding name and the number of BOM bytes to skip. Without a
/// BOM the result is `("UTF-8", 0)`.
///
/// # Examples
///
/// ```
/// use xmldom::encoding::detect_encoding;
///
/// assert_eq!(detect_encoding(b"\xEF\xBB\xBF<a/>"), ("UTF-8", 3));
/// assert_eq!(detect_encoding(b"\xFF\xFE<\0"), ("UTF-16LE", 2));
/// assert_eq!(detect_encoding(b"<a/>"), ("UTF-8", 0));
/// ```
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static str, usize) {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => ("UTF-8", 3),
        [0xFE, 0xFF, ..] => ("UTF-16BE", 2),
        [0xFF, 0xFE, ..] => ("UTF-16LE", 2),
        _ => ("UTF-8", 0),
    }
}

/// Decodes `bytes` from the encoding named by `label` into a `String`.
///
/// # Errors
///
/// Returns `EncodingError` if the label is unknown or the input contains
/// malformed sequences.
///
/// # Examples
///
/// ```
/// use xmldom::encoding::transcode;
///
/// assert_eq!(transcode(b"caf\xE9", "ISO-8859-1").unwrap(), "café");
/// ```
pub fn transcode(bytes: &[u8], label: &str) -> Result<String, EncodingError> {
    let encoding = lookup(label)?;
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::new(format!(
            "malformed byte sequence for encoding {label}"
        )));
    }
    Ok(text.into_owned())
}

/// Encodes UTF-8 text into the encoding named by `label`.
///
/// # Errors
///
/// Returns `EncodingError` if the label is unknown or the text contains
/// characters the target encoding cannot represent.
pub fn encode(text: &str, label: &str) -> Result<Vec<u8>, EncodingError> {
    let encoding = lookup(label)?;
    if encoding == encoding_rs::UTF_16LE {
        return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == encoding_rs::UTF_16BE {
        return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(EncodingError::new(format!(
            "text is not representable in {label}"
        )));
    }
    Ok(bytes.into_owned())
}

/// Decodes raw XML bytes to UTF-8, detecting the encoding.
///
/// # Errors
///
/// Returns `EncodingError` if the declared encoding is unsupported or the
/// bytes are malformed for the detected encoding.
///
/// # Examples
///
/// ```
/// use xmldom::encoding::decode_to_utf8;
///
/// let decoded = decode_to_utf8(b"<?xml version=\"1.0\" encoding=\"latin1\"?><a>\xE9</a>").unwrap();
/// assert!(decoded.text.ends_with("<a>é</a>"));
/// assert_eq!(decoded.encoding, "windows-1252");
/// ```
pub fn decode_to_utf8(bytes: &[u8]) -> Result<Decoded, EncodingError> {
    let (bom_encoding, skip) = detect_encoding(bytes);
    let content = &bytes[skip..];

    let label = if skip > 0 {
        bom_encoding.to_string()
    } else {
        declared_encoding(content).unwrap_or_else(|| bom_encoding.to_string())
    };

    let encoding = lookup(&label)?;
    if encoding == encoding_rs::UTF_8 {
        let text = std::str::from_utf8(content)
            .map_err(|e| EncodingError::new(format!("input is not valid UTF-8: {e}")))?;
        return Ok(Decoded {
            text: text.to_string(),
            encoding: encoding.name(),
        });
    }
    if skip == 0 && (encoding == encoding_rs::UTF_16LE || encoding == encoding_rs::UTF_16BE) {
        return Err(EncodingError::new(format!(
            "document declares {label} but has no byte order mark"
        )));
    }
    Ok(Decoded {
        text: transcode(content, &label)?,
        encoding: encoding.name(),
    })
}

/// Returns `true` if `label` names UTF-8. Unknown labels are not UTF-8.
///
/// # Examples
///
/// ```
/// use xmldom::encoding::is_utf8_label;
///
/// assert!(is_utf8_label("utf-8"));
/// assert!(is_utf8_label("UTF8"));
/// assert!(!is_utf8_label("ISO-8859-1"));
/// assert!(!is_utf8_label("no-such-charset"));
/// ```
#[must_use]
pub fn is_utf8_label(label: &str) -> bool {
    lookup(label).is_ok_and(|encoding| encoding == encoding_rs::UTF_8)
}

fn lookup(label: &str) -> Result<&'static encoding_rs::Encoding, EncodingError> {
    encoding_rs::Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {label}")))
}

/// Reads the `encoding` pseudo-attribute from an XML declaration at the
/// start of `bytes`, treating the declaration as ASCII.
pub(crate) fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(256)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..end];
    let pos = decl.windows(8).position(|w| w == b"encoding")?;
    let rest = trim_ascii_start(&decl[pos + 8..]);
    let rest = trim_ascii_start(rest.strip_prefix(b"=")?);
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value = &rest[..rest.iter().position(|&b| b == quote)?];
    value
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        .then(|| String::from_utf8_lossy(value).into_owned())
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    &bytes[skip..]
}
