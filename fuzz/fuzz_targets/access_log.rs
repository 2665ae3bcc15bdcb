#![no_main]

use libfuzzer_sys::fuzz_target;
use officer_log_pipeline::parser::AccessLogParser;

fuzz_target!(|data: &[u8]| {
    let Ok(parser) = AccessLogParser::new() else {
        return;
    };
    // 라인은 항상 UTF-8 문자열로 들어옴
    if let Ok(line) = std::str::from_utf8(data) {
        let _ = parser.parse(line);
    }
});
