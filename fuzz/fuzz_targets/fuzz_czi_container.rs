#![no_main]

use libfuzzer_sys::fuzz_target;
use scimeta::formats::czi::{CziExtractor, SegmentScanner};

fuzz_target!(|data: &[u8]| {
    // Walking the segments must stop on its own, whatever the headers claim
    let mut scanner = SegmentScanner::new(data);
    let mut count = 0usize;
    for segment in scanner.by_ref() {
        let _ = segment.payload();
        count += 1;
    }
    assert!(count <= data.len() / 32 + 1);
    let _ = scanner.stop();

    // Full decode: errors are fine, panics are not
    let _ = CziExtractor::new(None).decode_container(data, "fuzz.czi");
});
