#![no_main]
use libfuzzer_sys::fuzz_target;
use xmldom::Document;

fuzz_target!(|data: &[u8]| {
    if let Ok(expr) = std::str::from_utf8(data) {
        if let Ok(doc) = Document::parse_str(
            "<root xmlns:p=\"urn:p\"><child attr=\"val\">text</child><p:item/><!--c--></root>",
        ) {
            let _ = doc.find_nodes(expr);
        }
    }
});
