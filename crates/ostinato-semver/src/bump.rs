//! Raising requirement lower bounds to the installed version.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::constraint::Constraint;
use crate::parser::VersionParser;
use crate::version::Version;

static TRAILING_ZEROS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\.(?:0|9999999))+(-dev)?$").expect("valid bump regex"));

static SIMPLE_CARET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\^\d+(\.\d+)*$").expect("valid bump regex"));

fn is_separator(c: char) -> bool {
    matches!(c, ',' | ' ' | '|' | '(' | ')')
}

fn has_branch(constraint: &Constraint) -> bool {
    match constraint {
        Constraint::Any | Constraint::MatchNone => false,
        Constraint::Exact(version) | Constraint::Range(_, version) => version.is_branch(),
        Constraint::Union(members) | Constraint::Intersection(members) => {
            members.iter().any(has_branch)
        }
    }
}

/// Rewrites requirements so their lower bound is the installed version.
///
/// `^1.2` with 1.4.5 installed becomes `^1.4.5`; `*` becomes `>=1.4.5`.
/// Requirements that cannot be bumped are returned unchanged.
#[derive(Debug, Clone, Default)]
pub struct VersionBumper {
    parser: VersionParser,
}

impl VersionBumper {
    /// Create a bumper with its own constraint cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bumper that parses through an existing parser.
    #[must_use]
    pub const fn with_parser(parser: VersionParser) -> Self {
        Self { parser }
    }

    /// Bump `pretty` so it requires at least `installed`.
    ///
    /// For branch installs pass the branch's numeric alias (see
    /// [`VersionParser::normalize_branch`]).
    #[must_use]
    pub fn bump_requirement(&self, pretty: &str, installed: &Version) -> String {
        if pretty.starts_with("dev-") || installed.is_branch() || installed.is_default_branch() {
            return pretty.to_string();
        }
        let Ok(original) = self.parser.parse_constraints(pretty) else {
            return pretty.to_string();
        };
        if has_branch(original.constraint()) {
            return pretty.to_string();
        }

        let version = installed.to_string();
        let major = installed.major();
        let trimmed = TRAILING_ZEROS.replace(&version, "").into_owned();
        if !SIMPLE_CARET.is_match(&format!("^{trimmed}")) {
            return pretty.to_string();
        }

        let pattern = format!(
            r"^(?:\^v?{major}(?:\.\d+)*|~v?{major}(?:\.\d+){{1,3}}|v?{major}(?:\.[*x])+|>=v?\d+(?:\.\d+)*|\*)$"
        );
        let Ok(bumpable) = Regex::new(&pattern) else {
            return pretty.to_string();
        };

        let mut modified = String::with_capacity(pretty.len() + trimmed.len());
        let mut rest = pretty;
        while !rest.is_empty() {
            let split = rest.find(|c: char| !is_separator(c)).unwrap_or(rest.len());
            modified.push_str(&rest[..split]);
            rest = &rest[split..];

            let end = rest.find(is_separator).unwrap_or(rest.len());
            let word = &rest[..end];
            rest = &rest[end..];

            let (head, flag) = word.split_at(word.find('@').unwrap_or(word.len()));
            if bumpable.is_match(head) {
                modified.push_str(&replacement(head, &trimmed));
            } else {
                modified.push_str(head);
            }
            modified.push_str(flag);
        }

        if modified == pretty {
            return modified;
        }
        match self.parser.parse_constraints(&modified) {
            Ok(bumped) if bumped.constraint() != original.constraint() => {
                debug!(from = pretty, to = %modified, "bumped requirement");
                modified
            }
            _ => pretty.to_string(),
        }
    }
}

fn replacement(term: &str, trimmed: &str) -> String {
    let term_dots = term.matches('.').count();
    let suffix = if term_dots == 2 && trimmed.matches('.').count() == 1 {
        ".0"
    } else {
        ""
    };

    if term.starts_with('~') {
        let mut bits: Vec<&str> = trimmed.split('.').collect();
        bits.resize(bits.len().max(term_dots + 1), "0");
        return format!("~{}", bits[..=term_dots].join("."));
    }
    if term == "*" || term.starts_with(">=") {
        return format!(">={trimmed}{suffix}");
    }
    format!("^{trimmed}{suffix}")
}
