#![no_main]

use officer_log_pipeline::rule::{RuleLoader, RuleSet};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // YAML 파서는 &str을 받으므로 UTF-8 변환 필요
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        if let Ok(config) = RuleLoader::parse_yaml(yaml_str, "fuzz-input.yml") {
            // 잘못된 정규식이 섞여 있어도 컴파일은 실패하지 않음
            let _ = RuleSet::compile(&config);
        }
    }
});
