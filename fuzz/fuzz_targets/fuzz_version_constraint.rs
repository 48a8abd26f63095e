#![no_main]

use libfuzzer_sys::fuzz_target;
use ostinato_semver::{Version, VersionParser};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let parser = VersionParser::new();
        let Ok(constraint) = parser.parse_constraints(s) else {
            return;
        };

        let probes = [
            Version::new([0, 0, 0, 0]),
            Version::new([1, 0, 0, 0]),
            Version::new([1, 2, 3, 0]),
            Version::new([99, 99, 99, 99]),
            Version::default_branch(),
            Version::branch("feature"),
        ];
        for version in &probes {
            let _ = constraint.matches(version);
        }

        // Cached parse returns the same tree.
        let again = parser.parse_constraints(s).expect("cached constraint");
        assert_eq!(constraint.to_string(), again.to_string());
    }
});
