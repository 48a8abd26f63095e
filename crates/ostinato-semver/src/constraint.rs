//! Constraint trees and matching.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, VersionError};
use crate::parser::parse_expression;
use crate::stability::extract_stability_flag;
use crate::version::{Stability, Version};

/// Comparison operator of a [`Constraint::Range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `!=` (also written `<>`)
    Ne,
}

impl Operator {
    /// Operator token as printed in normalized constraints.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Ne => "!=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed constraint tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// Matches every version.
    Any,
    /// Matches nothing.
    MatchNone,
    /// Matches exactly one version.
    Exact(Version),
    /// Matches versions on one side of a bound.
    Range(Operator, Version),
    /// Matches if any member matches (OR).
    Union(Vec<Constraint>),
    /// Matches if every member matches (AND).
    Intersection(Vec<Constraint>),
}

impl Constraint {
    /// Build an OR node. A single member is returned as-is and `Any`
    /// absorbs the whole union.
    #[must_use]
    pub fn union(members: Vec<Self>) -> Self {
        let mut kept = Vec::with_capacity(members.len());
        for member in members {
            match member {
                Self::Any => return Self::Any,
                Self::MatchNone => {}
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Self::MatchNone,
            1 => kept.swap_remove(0),
            _ => Self::Union(kept),
        }
    }

    /// Build an AND node. A single member is returned as-is, `Any` members
    /// are dropped and `MatchNone` wins.
    #[must_use]
    pub fn intersection(members: Vec<Self>) -> Self {
        let mut kept = Vec::with_capacity(members.len());
        for member in members {
            match member {
                Self::Any => {}
                Self::MatchNone => return Self::MatchNone,
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Self::Any,
            1 => kept.swap_remove(0),
            _ => Self::Intersection(kept),
        }
    }

    /// Check a version against this tree.
    ///
    /// Named branches only take part in `==` and `!=` comparisons; ordered
    /// comparisons involving a named branch never match.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::MatchNone => false,
            Self::Exact(expected) => expected == version,
            Self::Range(Operator::Ne, bound) => bound != version,
            Self::Range(op, bound) => {
                if bound.is_branch() || version.is_branch() {
                    return false;
                }
                match op {
                    Operator::Lt => version < bound,
                    Operator::Le => version <= bound,
                    Operator::Gt => version > bound,
                    Operator::Ge => version >= bound,
                    Operator::Ne => version != bound,
                }
            }
            Self::Union(members) => members.iter().any(|c| c.matches(version)),
            Self::Intersection(members) => members.iter().all(|c| c.matches(version)),
        }
    }

    /// Whether this tree is the match-all constraint.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, members: &[Constraint], sep: &str) -> fmt::Result {
    f.write_str("[")?;
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{member}")?;
    }
    f.write_str("]")
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::MatchNone => f.write_str("[]"),
            Self::Exact(version) => write!(f, "== {version}"),
            Self::Range(op, version) => write!(f, "{op} {version}"),
            Self::Union(members) => write_list(f, members, " || "),
            Self::Intersection(members) => write_list(f, members, " "),
        }
    }
}

/// A parsed constraint expression together with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    pretty: Arc<str>,
    constraint: Constraint,
    stability_flag: Option<Stability>,
}

impl VersionConstraint {
    /// Parse without going through a cache.
    ///
    /// # Errors
    /// Returns [`VersionError::InvalidConstraint`] for malformed expressions.
    pub fn parse(raw: &str) -> Result<Self> {
        let constraint = parse_expression(raw)?;
        Ok(Self {
            pretty: Arc::from(raw),
            constraint,
            stability_flag: extract_stability_flag(raw),
        })
    }

    /// A constraint matching everything.
    #[must_use]
    pub fn any() -> Self {
        Self {
            pretty: Arc::from("*"),
            constraint: Constraint::Any,
            stability_flag: None,
        }
    }

    /// Check if a version matches.
    ///
    /// Stability flags do not take part here; see
    /// [`StabilityFilter`](crate::StabilityFilter).
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.constraint.matches(version)
    }

    /// The source text.
    #[must_use]
    pub fn pretty(&self) -> &str {
        &self.pretty
    }

    /// The parsed tree.
    #[must_use]
    pub const fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// The explicit or inferred stability flag, if any.
    #[must_use]
    pub const fn stability_flag(&self) -> Option<Stability> {
        self.stability_flag
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.constraint)
    }
}

impl FromStr for VersionConstraint {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for VersionConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.pretty)
    }
}

impl<'de> Deserialize<'de> for VersionConstraint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VersionParser;
    use proptest::prelude::*;
    use test_case::test_case;

    fn v(s: &str) -> Version {
        VersionParser::normalize(s).unwrap()
    }

    fn c(s: &str) -> VersionConstraint {
        VersionConstraint::parse(s).unwrap()
    }

    #[test_case("^1.2.3", "1.2.3", true)]
    #[test_case("^1.2.3", "1.9.9", true)]
    #[test_case("^1.2.3", "2.0.0", false)]
    #[test_case("^1.2.3", "1.2.2", false)]
    #[test_case("^1.2.3", "2.0.0-beta1", false)]
    #[test_case("^1.2.3", "1.3.0-beta1", true)]
    #[test_case("^0.1.2", "0.1.9", true)]
    #[test_case("^0.1.2", "0.2.0", false)]
    #[test_case("^0.0.3", "0.0.3", true)]
    #[test_case("^0.0.3", "0.0.4", false)]
    #[test_case("~2.2", "2.2.0", true)]
    #[test_case("~2.2", "2.2.9999", true)]
    #[test_case("~2.2", "2.3.0", false)]
    #[test_case("~1.2.3", "1.2.9", true)]
    #[test_case("~1.2.3", "1.3.0", false)]
    #[test_case("~1", "1.9.0", true)]
    #[test_case("1.2.*", "1.2.99", true)]
    #[test_case("1.2.*", "1.3.0", false)]
    #[test_case(">=1.0 <2.0", "1.5.0", true)]
    #[test_case(">=1.0 <2.0", "2.0.0-RC1", false)]
    #[test_case("<1.0", "1.0.0-beta", false)]
    #[test_case("<=1.0", "1.0.0", true)]
    #[test_case("1.0 || 2.0", "2.0.0", true)]
    #[test_case("1.0 || 2.0", "1.5.0", false)]
    #[test_case("!=1.5", "1.5.0", false)]
    #[test_case("!=1.5", "dev-foo", true)]
    #[test_case("1.0 - 2.0", "2.0.5", true)]
    #[test_case("1.0 - 2.0", "2.1.0", false)]
    #[test_case("*", "dev-foo", true)]
    #[test_case("dev-foo", "dev-foo", true)]
    #[test_case("dev-foo", "dev-bar", false)]
    #[test_case(">=1.0", "dev-foo", false)]
    #[test_case("<dev-foo", "1.0.0", false)]
    #[test_case("dev-master", "dev-master", true)]
    #[test_case("dev-master", "master", true)]
    #[test_case("2.x-dev", "2.x-dev", true)]
    fn matching(constraint: &str, version: &str, expected: bool) {
        assert_eq!(c(constraint).matches(&v(version)), expected);
    }

    #[test]
    fn match_none_and_any() {
        assert!(!Constraint::MatchNone.matches(&v("1.0")));
        assert_eq!(Constraint::union(vec![]).to_string(), "[]");
        assert!(Constraint::intersection(vec![]).is_any());
        assert_eq!(
            Constraint::intersection(vec![Constraint::MatchNone, Constraint::Exact(v("1.0"))]),
            Constraint::MatchNone
        );
    }

    #[test]
    fn keeps_pretty_string() {
        let parsed = c(" ^1.0 @dev ");
        assert_eq!(parsed.pretty(), " ^1.0 @dev ");
        assert_eq!(parsed.to_string(), "[>= 1.0.0.0-dev < 2.0.0.0-dev]");
        assert_eq!(parsed.stability_flag(), Some(Stability::Dev));
    }

    #[test]
    fn serde_roundtrip_uses_pretty_string() {
        let json = sonic_rs::to_string(&c("^1.0 || ^2.0")).unwrap();
        assert_eq!(json, "\"^1.0 || ^2.0\"");
        let back: VersionConstraint = sonic_rs::from_str(&json).unwrap();
        assert_eq!(back, c("^1.0 || ^2.0"));
    }

    fn version_strategy() -> impl Strategy<Value = String> {
        (
            0u64..20,
            0u64..20,
            0u64..20,
            prop::option::of(prop::sample::select(vec!["alpha", "beta", "RC", "patch"])),
            0u64..5,
            any::<bool>(),
        )
            .prop_map(|(major, minor, patch, modifier, n, dev)| {
                let mut s = format!("{major}.{minor}.{patch}");
                if let Some(m) = modifier {
                    s.push_str(&format!("-{m}{n}"));
                }
                if dev {
                    s.push_str("-dev");
                }
                s
            })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in version_strategy()) {
            let once = VersionParser::normalize(&raw).unwrap();
            let twice = VersionParser::normalize(&once.to_string()).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn parsing_is_deterministic(raw in version_strategy(), op in prop::sample::select(vec!["^", "~", ">=", "<", "!=", ""])) {
            let expr = format!("{op}{raw}");
            prop_assert_eq!(c(&expr), c(&expr));
        }

        #[test]
        fn caret_matches_its_own_lower_bound(major in 1u64..50, minor in 0u64..50, patch in 0u64..50) {
            let base = format!("{major}.{minor}.{patch}");
            let caret = c(&format!("^{base}"));
            prop_assert!(caret.matches(&v(&base)));
            let next_major = format!("{}.0.0", major + 1);
            prop_assert!(!caret.matches(&v(&next_major)));
        }
    }
}
