//! Content checks for values stored in the tree.
//!
//! The writer emits comments and processing instructions verbatim and can
//! only escape characters the XML `Char` production allows, so values that
//! break these rules are refused before the tree is touched.
//!
//! See <https://www.w3.org/TR/xml/#NT-Char>, [15] Comment and [16] PI.

use super::qname::is_xml_char;
use crate::error::{Error, Result};

/// Checks text, CDATA or an attribute value against the XML `Char`
/// production. `what` names the content in the error.
///
/// # Errors
///
/// Returns [`Error::InvalidContent`] if a character is not an XML `Char`.
pub fn validate_char_data(what: &'static str, text: &str) -> Result<()> {
    if text.chars().all(is_xml_char) {
        Ok(())
    } else {
        Err(Error::invalid_content(what, "character outside the XML Char range"))
    }
}

/// Checks comment text: XML characters only, no `--`, no trailing `-`.
///
/// # Errors
///
/// Returns [`Error::InvalidContent`] describing the first violated rule.
///
/// # Examples
///
/// ```
/// use xmldom::util::content::validate_comment;
///
/// assert!(validate_comment(" note ").is_ok());
/// assert!(validate_comment("a--b").is_err());
/// assert!(validate_comment("dash-").is_err());
/// ```
pub fn validate_comment(text: &str) -> Result<()> {
    validate_char_data("comment", text)?;
    if text.contains("--") {
        return Err(Error::invalid_content("comment", "'--' not allowed in comments"));
    }
    if text.ends_with('-') {
        return Err(Error::invalid_content("comment", "comment must not end with '-'"));
    }
    Ok(())
}

/// Checks processing instruction data: XML characters only and no `?>`.
///
/// # Errors
///
/// Returns [`Error::InvalidContent`] describing the first violated rule.
pub fn validate_pi_data(data: &str) -> Result<()> {
    validate_char_data("processing instruction", data)?;
    if data.contains("?>") {
        return Err(Error::invalid_content(
            "processing instruction",
            "'?>' not allowed in processing instruction data",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_data_rejects_control_characters() {
        assert!(validate_char_data("text", "tab\tand\r\nnewlines").is_ok());
        assert!(validate_char_data("text", "ünïcode \u{10000}").is_ok());
        assert!(matches!(
            validate_char_data("text", "a\u{1}b"),
            Err(Error::InvalidContent { what: "text", .. })
        ));
        assert!(validate_char_data("attribute", "\u{FFFE}").is_err());
    }

    #[test]
    fn test_comment_rules() {
        assert!(validate_comment("").is_ok());
        assert!(validate_comment("a - b").is_ok());
        assert!(validate_comment("--").is_err());
        assert!(validate_comment("-").is_err());
        assert!(validate_comment("bell\u{7}").is_err());
    }

    #[test]
    fn test_pi_data_rules() {
        assert!(validate_pi_data("href=\"a.css\" ?").is_ok());
        assert!(matches!(
            validate_pi_data("x?>y"),
            Err(Error::InvalidContent {
                what: "processing instruction",
                ..
            })
        ));
    }
}
