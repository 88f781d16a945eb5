#![no_main]
use libfuzzer_sys::fuzz_target;
use xmldom::parser::{parse_str_with_options, ParseOptions};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let opts = ParseOptions::default().recover(true);
        if let Ok(doc) = parse_str_with_options(s, &opts) {
            // Dumped output must reparse to the same canonical form.
            let dumped = doc.dump(false);
            if let Ok(reparsed) = parse_str_with_options(&dumped, &ParseOptions::default()) {
                for exclusive in [false, true] {
                    assert_eq!(
                        doc.to_string_c14n(exclusive).ok(),
                        reparsed.to_string_c14n(exclusive).ok()
                    );
                }
            }
        }
    }
});
