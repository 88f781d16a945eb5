//! Utility modules.
//!
//! Contains XML name syntax checks, `QName` handling and the content rules
//! applied to character data, comments and processing instructions.

pub mod content;
pub mod qname;
