//! Stability flags and minimum-stability filtering.

use ahash::AHashMap;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::parser::{VersionParser, split_terms};
use crate::version::{Stability, Version};

static EXPLICIT_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[^@]*?@(stable|RC|beta|alpha|dev)$").expect("valid stability regex")
});

static BARE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^,\s@]+$").expect("valid stability regex"));

/// The stability flag a requirement asks for.
///
/// Explicit `@flag` suffixes win, the most unstable one across all terms.
/// Without any, the flag is inferred from bare versions that are not stable
/// (`1.0.0-beta2`, `dev-master`). Returns `None` when neither applies.
#[must_use]
pub fn extract_stability_flag(raw: &str) -> Option<Stability> {
    let terms = split_terms(raw)?;

    let explicit = terms
        .iter()
        .filter_map(|term| EXPLICIT_FLAG.captures(term))
        .filter_map(|caps| caps.get(1).and_then(|m| VersionParser::normalize_stability(m.as_str())))
        .min();
    if explicit.is_some() {
        return explicit;
    }

    terms
        .iter()
        .map(|term| term.split_once(" as ").map_or(term.as_str(), |(head, _)| head))
        .filter(|term| BARE_VERSION.is_match(term))
        .map(VersionParser::parse_stability)
        .filter(|stability| *stability != Stability::Stable)
        .min()
}

/// Decides whether a version is stable enough for a package.
///
/// Per-package flags override the minimum stability.
#[derive(Debug, Clone, Default)]
pub struct StabilityFilter {
    minimum: Stability,
    flags: AHashMap<String, Stability>,
}

impl StabilityFilter {
    /// Create a filter with no per-package flags.
    #[must_use]
    pub fn new(minimum: Stability) -> Self {
        Self {
            minimum,
            flags: AHashMap::new(),
        }
    }

    /// Build a filter from `(package, constraint)` requirements.
    ///
    /// Explicit flags are always recorded; inferred ones only when they are
    /// at least as unstable as the minimum.
    #[must_use]
    pub fn from_requirements<'a>(
        minimum: Stability,
        requirements: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut filter = Self::new(minimum);
        for (name, constraint) in requirements {
            let Some(terms) = split_terms(constraint) else {
                continue;
            };
            let explicit = terms.iter().any(|term| EXPLICIT_FLAG.is_match(term));
            let Some(flag) = extract_stability_flag(constraint) else {
                continue;
            };
            if explicit || flag <= minimum {
                filter.record(name, flag);
            }
        }
        filter
    }

    /// Add or tighten a per-package flag; the most unstable flag wins.
    #[must_use]
    pub fn with_flag(mut self, name: &str, stability: Stability) -> Self {
        self.record(name, stability);
        self
    }

    fn record(&mut self, name: &str, stability: Stability) {
        let slot = self
            .flags
            .entry(name.to_ascii_lowercase())
            .or_insert(stability);
        if stability < *slot {
            *slot = stability;
        }
        debug!(package = name, %stability, "stability flag");
    }

    /// The minimum stability.
    #[must_use]
    pub const fn minimum(&self) -> Stability {
        self.minimum
    }

    /// The flag recorded for a package.
    #[must_use]
    pub fn flag(&self, name: &str) -> Option<Stability> {
        self.flags.get(&name.to_ascii_lowercase()).copied()
    }

    /// Whether `version` of package `name` passes the filter.
    #[must_use]
    pub fn is_acceptable(&self, name: &str, version: &Version) -> bool {
        let threshold = self.flag(name).unwrap_or(self.minimum);
        version.stability().satisfies_minimum(threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("^1.0@dev", Some(Stability::Dev) ; "explicit")]
    #[test_case(">=1.0@beta <2.0@alpha", Some(Stability::Alpha) ; "most unstable explicit")]
    #[test_case("1.0.0-beta2 || 1.0.0@RC", Some(Stability::RC) ; "explicit beats inferred")]
    #[test_case("1.0.0-beta2", Some(Stability::Beta) ; "inferred")]
    #[test_case("dev-master", Some(Stability::Dev) ; "inferred branch")]
    #[test_case("1.0.0-RC1 as 1.0.0", Some(Stability::RC) ; "alias stripped")]
    #[test_case(">=1.0-beta", Some(Stability::Beta) ; "operator terms are inferred")]
    #[test_case("^1.0", None ; "stable")]
    #[test_case("@stable", Some(Stability::Stable) ; "explicit stable")]
    #[test_case("(1.0", None ; "unbalanced input")]
    fn extracts(raw: &str, expected: Option<Stability>) {
        assert_eq!(extract_stability_flag(raw), expected);
    }

    #[test]
    fn filter_uses_flags_over_minimum() {
        let filter = StabilityFilter::new(Stability::Stable).with_flag("Acme/Foo", Stability::Beta);
        let beta = VersionParser::normalize("1.0.0-beta1").unwrap();
        let alpha = VersionParser::normalize("1.0.0-alpha1").unwrap();
        assert!(filter.is_acceptable("acme/foo", &beta));
        assert!(!filter.is_acceptable("acme/foo", &alpha));
        assert!(!filter.is_acceptable("acme/bar", &beta));
    }

    #[test]
    fn from_requirements_skips_redundant_inferred_flags() {
        let filter = StabilityFilter::from_requirements(
            Stability::Beta,
            [
                ("a/explicit", "^1.0@stable"),
                ("b/inferred", "1.0.0-alpha1"),
                ("c/redundant", "1.0.0-RC1"),
                ("d/plain", "^2.0"),
            ],
        );
        assert_eq!(filter.flag("a/explicit"), Some(Stability::Stable));
        assert_eq!(filter.flag("b/inferred"), Some(Stability::Alpha));
        assert_eq!(filter.flag("c/redundant"), None);
        assert_eq!(filter.flag("d/plain"), None);
        assert_eq!(filter.minimum(), Stability::Beta);
    }
}
