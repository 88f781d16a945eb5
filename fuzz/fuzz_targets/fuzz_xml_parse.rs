#![no_main]
use libfuzzer_sys::fuzz_target;
use xmldom::parser::{parse_str_with_options, ParseOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_str_with_options(s, &ParseOptions::default());
        if let Ok(doc) = parse_str_with_options(s, &ParseOptions::default().recover(true)) {
            // Every parsed node must wrap and walk cleanly.
            let _ = doc.walk(|node| doc.wrap(node).map(|_| ()));
        }
    }
});
