#![no_main]

use kurenai::app::parse_dropped_paths;
use kurenai::sniff::sniff_mime;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = sniff_mime(data);
    if let Ok(text) = std::str::from_utf8(data) {
        for path in parse_dropped_paths(text) {
            assert!(!path.as_os_str().is_empty());
        }
    }
});
