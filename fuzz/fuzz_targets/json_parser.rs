#![no_main]

use libfuzzer_sys::fuzz_target;
use officer_log_pipeline::parser::JsonLogParser;

fuzz_target!(|data: &[u8]| {
    let parser = JsonLogParser::default();
    let line = String::from_utf8_lossy(data);
    let _ = parser.parse(&line);
});
