#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use paperharvest::extractor::TextExtractor;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must come back as a document or an error, never a panic.
    let extractor = TextExtractor::with_lopdf(6, 3);
    if let Ok(content) = extractor.extract(Bytes::copy_from_slice(data)) {
        let _ = content.title();
    }
});
