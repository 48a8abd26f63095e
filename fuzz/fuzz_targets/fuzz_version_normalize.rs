#![no_main]

use libfuzzer_sys::fuzz_target;
use ostinato_semver::VersionParser;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = VersionParser::parse_stability(s);
        if let Ok(version) = VersionParser::normalize(s) {
            // Normalized output normalizes to itself.
            let rendered = version.to_string();
            let again = VersionParser::normalize(&rendered).expect("normalized version");
            assert_eq!(version, again, "{s} -> {rendered}");
        }
    }
});
