//! Version normalization and constraint parsing.
//!
//! The grammar follows Composer: OR-groups separated by `||` (or `|`),
//! AND-terms separated by whitespace or commas, plus parenthesized
//! sub-expressions. Terms cover plain comparisons, caret and tilde ranges,
//! wildcards, hyphen ranges and `X as Y` aliases.

use regex::{Captures, Regex};
use smallvec::SmallVec;
use std::sync::{Arc, LazyLock};
use tracing::trace;

use crate::cache::ConstraintCache;
use crate::constraint::{Constraint, Operator, VersionConstraint};
use crate::error::{Result, VersionError};
use crate::version::{BRANCH_SEGMENT, Modifier, ModifierKind, Stability, Version};

/// Pre-release modifier grammar shared by every version regex.
/// Captures: kind, numeric suffix, dev suffix.
const MODIFIER: &str =
    r"[._-]?(?:(stable|beta|b|RC|alpha|a|patch|pl|p)((?:[.-]?\d+)*)?)?([.-]?dev)?";

/// A version inside a constraint term. Captures 1-4 are the segments,
/// 5-7 the modifier parts.
static TERM_VERSION: LazyLock<String> =
    LazyLock::new(|| format!(r"v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.(\d+))?{MODIFIER}(?:\+\S+)?"));

static CLASSICAL: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)^v?(\d+)(\.\d+)?(\.\d+)?(\.\d+)?{MODIFIER}$"
    ))
});

static ALIAS: LazyLock<Regex> = LazyLock::new(|| compile(r"^([^,\s]+) +as +([^,\s]+)$"));

static STABILITY_FLAG: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)@(?:stable|RC|beta|alpha|dev)$"));

static TERM_FLAG: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^([^,\s]*?)@(stable|RC|beta|alpha|dev)$"));

static DEFAULT_BRANCH: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^(?:dev-)?(?:master|trunk|default)$"));

static BUILD_METADATA: LazyLock<Regex> = LazyLock::new(|| compile(r"^([^,\s+]+)\+\S+$"));

static DEV_SUFFIX: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)^(.*?)[.-]?dev$"));

static NUMERIC_BRANCH: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^v?(\d+)(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?$")
});

static STABILITY_PROBE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"(?i){MODIFIER}(?:\+.*)?$")));

static REF_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^(dev-[^,\s@]+?|[^,\s@]+?\.x-dev)#.+$"));

static ANY_VERSION: LazyLock<Regex> = LazyLock::new(|| compile(r"^(v)?[xX*](\.[xX*])*$"));

static TILDE: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"(?i)^~>?{}$", *TERM_VERSION)));

static CARET: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"(?i)^\^{}$", *TERM_VERSION)));

static WILDCARD: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.[xX*])+$"));

static HYPHEN: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(
        r"(?i)^(?P<from>{v}) +- +(?P<to>{w})$",
        v = *TERM_VERSION,
        w = *TERM_VERSION
    ))
});

static COMPARATOR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(<>|!=|>=?|<=?|==?)?\s*(.*)$"));

static ENDS_WITH_MODIFIER: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!(r"(?i)-{MODIFIER}$")));

static OPERATOR_ONLY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?:<>|!=|>=?|<=?|==?|~>?|\^)$"));

static DEV_NAME: LazyLock<Regex> = LazyLock::new(|| compile(r"^[0-9a-zA-Z./-]+$"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid version regex")
}

/// Normalizes versions and parses constraint expressions.
///
/// Constraint parsing goes through a [`ConstraintCache`] owned by the parser;
/// clones share the same cache.
#[derive(Debug, Clone, Default)]
pub struct VersionParser {
    cache: Arc<ConstraintCache>,
}

impl VersionParser {
    /// Create a parser with a fresh cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser sharing an existing cache.
    #[must_use]
    pub const fn with_cache(cache: Arc<ConstraintCache>) -> Self {
        Self { cache }
    }

    /// The constraint cache backing this parser.
    #[must_use]
    pub const fn cache(&self) -> &Arc<ConstraintCache> {
        &self.cache
    }

    /// Parse a constraint expression, reusing a previous parse of the same
    /// input when available.
    ///
    /// # Errors
    /// Returns [`VersionError::InvalidConstraint`] for malformed expressions.
    pub fn parse_constraints(&self, raw: &str) -> Result<Arc<VersionConstraint>> {
        self.cache.get_or_parse(raw)
    }

    /// Normalize a version string.
    ///
    /// # Errors
    /// Returns [`VersionError::InvalidVersion`] if the input is not a version.
    pub fn normalize(raw: &str) -> Result<Version> {
        let trimmed = raw.trim();
        let mut version = trimmed;

        if let Some(caps) = ALIAS.captures(version) {
            version = caps.get(1).map_or(version, |m| m.as_str());
        }

        if let Some(flag) = STABILITY_FLAG.find(version) {
            version = &version[..flag.start()];
        }
        version = version.trim_end();

        if DEFAULT_BRANCH.is_match(version) {
            return Ok(Version::default_branch());
        }

        if version.get(..4).is_some_and(|prefix| prefix.eq_ignore_ascii_case("dev-")) {
            let name = &version[4..];
            if name.is_empty() {
                return Err(VersionError::invalid_version(raw, "empty branch name"));
            }
            return Ok(Version::branch(name));
        }

        if let Some(caps) = BUILD_METADATA.captures(version) {
            version = caps.get(1).map_or(version, |m| m.as_str());
        }

        if let Some(caps) = CLASSICAL.captures(version) {
            return classical_version(raw, &caps);
        }

        if let Some(caps) = DEV_SUFFIX.captures(version) {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let branch = Self::normalize_branch(name);
            if !branch.is_branch() {
                return Ok(branch);
            }
        }

        if trimmed.is_empty() {
            return Err(VersionError::invalid_version(raw, "empty version"));
        }
        Err(VersionError::invalid_version(
            raw,
            "expected a numeric version, a `dev-` branch or a `<branch>-dev` alias",
        ))
    }

    /// Normalize a branch name to a version.
    ///
    /// Numeric branches (`2.3`, `v2.x`) become 9999999-filled dev versions;
    /// anything else becomes a named `dev-` branch.
    #[must_use]
    pub fn normalize_branch(name: &str) -> Version {
        let name = name.trim();
        if matches!(name, "master" | "trunk" | "default") {
            return Version::default_branch();
        }

        if let Some(caps) = NUMERIC_BRANCH.captures(name) {
            let mut segments = [BRANCH_SEGMENT; 4];
            let mut numeric = true;
            for (i, slot) in segments.iter_mut().enumerate() {
                let Some(part) = caps.get(i + 1) else { continue };
                let digits = part.as_str().trim_start_matches('.');
                if digits.eq_ignore_ascii_case("x") || digits == "*" {
                    continue;
                }
                match digits.parse() {
                    Ok(n) => *slot = n,
                    Err(_) => numeric = false,
                }
            }
            if numeric {
                return Version::numeric(segments, None, true);
            }
        }

        Version::branch(name)
    }

    /// Stability of a version string, without full normalization.
    #[must_use]
    pub fn parse_stability(raw: &str) -> Stability {
        let version = raw.split_once('#').map_or(raw, |(head, _)| head);
        if version.starts_with("dev-") || version.ends_with("-dev") {
            return Stability::Dev;
        }

        let lower = version.to_ascii_lowercase();
        let Some(caps) = STABILITY_PROBE.captures(&lower) else {
            return Stability::Stable;
        };
        if caps.get(3).is_some_and(|m| !m.as_str().is_empty()) {
            return Stability::Dev;
        }
        match caps.get(1).map(|m| m.as_str()) {
            Some("beta" | "b") => Stability::Beta,
            Some("alpha" | "a") => Stability::Alpha,
            Some("rc") => Stability::RC,
            _ => Stability::Stable,
        }
    }

    /// Canonicalize a stability name (`rc` becomes `RC`).
    ///
    /// Only the five stability names are accepted; modifier aliases are not.
    #[must_use]
    pub fn normalize_stability(raw: &str) -> Option<Stability> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stable" => Some(Stability::Stable),
            "rc" => Some(Stability::RC),
            "beta" => Some(Stability::Beta),
            "alpha" => Some(Stability::Alpha),
            "dev" => Some(Stability::Dev),
            _ => None,
        }
    }
}

fn parse_number(raw: &str, digits: &str) -> Result<u64> {
    digits
        .parse()
        .map_err(|_| VersionError::invalid_version(raw, format!("segment `{digits}` is out of range")))
}

fn classical_version(raw: &str, caps: &Captures<'_>) -> Result<Version> {
    let mut segments = [0; 4];
    for (i, slot) in segments.iter_mut().enumerate() {
        if let Some(part) = caps.get(i + 1) {
            *slot = parse_number(raw, part.as_str().trim_start_matches('.'))?;
        }
    }

    let kind = caps.get(5).map(|m| m.as_str());
    if kind.is_some_and(|k| k.eq_ignore_ascii_case("stable")) {
        return Ok(Version::new(segments));
    }

    let modifier = match kind.and_then(ModifierKind::parse) {
        Some(kind) => {
            let mut numbers = SmallVec::<[u64; 2]>::new();
            if let Some(suffix) = caps.get(6) {
                for part in suffix.as_str().split(['.', '-']).filter(|p| !p.is_empty()) {
                    numbers.push(parse_number(raw, part)?);
                }
            }
            Some(Modifier { kind, numbers })
        }
        None => None,
    };
    let dev = caps.get(7).is_some_and(|m| !m.as_str().is_empty());
    Ok(Version::numeric(segments, modifier, dev))
}

// ---------------------------------------------------------------------------
// Constraint expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Or,
    Comma,
    Open,
    Close,
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'|' => {
                i += if bytes.get(i + 1) == Some(&b'|') { 2 } else { 1 };
                tokens.push(Token::Or);
            }
            b',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            b'(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            _ => {
                let start = i;
                while i < bytes.len() && !matches!(bytes[i], b' ' | b'\t' | b'\n' | b'\r' | b'|' | b',' | b'(' | b')') {
                    i += 1;
                }
                tokens.push(Token::Word(&input[start..i]));
            }
        }
    }
    tokens
}

/// Assemble a run of adjacent words into terms: a bare operator is joined to
/// the following word, `a - b` becomes a hyphen range and `a as b` an alias.
///
/// On failure, returns the dangling word.
fn join_words<'a>(words: &[&'a str]) -> std::result::Result<Vec<String>, &'a str> {
    let mut terms = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        let word = words[i];
        if OPERATOR_ONLY.is_match(word) {
            let Some(next) = words.get(i + 1) else {
                return Err(word);
            };
            terms.push(format!("{word}{next}"));
            i += 2;
            continue;
        }
        match (words.get(i + 1), words.get(i + 2)) {
            (Some(&"-"), Some(to)) => {
                terms.push(format!("{word} - {to}"));
                i += 3;
            }
            (Some(&"as"), Some(alias)) => {
                terms.push(format!("{word} as {alias}"));
                i += 3;
            }
            _ => {
                terms.push(word.to_string());
                i += 1;
            }
        }
    }
    Ok(terms)
}

/// Every term of a constraint expression, ignoring its structure.
/// Returns `None` if the expression cannot be split.
pub(crate) fn split_terms(input: &str) -> Option<Vec<String>> {
    let mut terms = Vec::new();
    let mut run = Vec::new();
    for token in tokenize(input) {
        if let Token::Word(word) = token {
            run.push(word);
        } else {
            terms.extend(join_words(&run).ok()?);
            run.clear();
        }
    }
    terms.extend(join_words(&run).ok()?);
    Some(terms)
}

struct ExprParser<'a> {
    input: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn error(&self, fragment: &str, reason: &str) -> VersionError {
        VersionError::invalid_constraint(self.input, fragment, reason)
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn expression(&mut self) -> Result<Constraint> {
        let mut groups = vec![self.group()?];
        while self.peek() == Some(Token::Or) {
            self.pos += 1;
            groups.push(self.group()?);
        }
        Ok(Constraint::union(groups))
    }

    fn group(&mut self) -> Result<Constraint> {
        let mut parts = Vec::new();
        let mut run: Vec<&'a str> = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Word(word)) => {
                    run.push(word);
                    self.pos += 1;
                }
                Some(Token::Comma) => {
                    self.flush(&mut run, &mut parts)?;
                    self.pos += 1;
                }
                Some(Token::Open) => {
                    self.flush(&mut run, &mut parts)?;
                    self.pos += 1;
                    let inner = self.expression()?;
                    if self.peek() != Some(Token::Close) {
                        return Err(self.error("(", "unbalanced parentheses"));
                    }
                    self.pos += 1;
                    parts.push(inner);
                }
                Some(Token::Or | Token::Close) | None => break,
            }
        }
        self.flush(&mut run, &mut parts)?;

        if parts.is_empty() {
            let fragment = match self.peek() {
                Some(Token::Close) => ")",
                Some(Token::Or) => "|",
                _ => self.input,
            };
            return Err(self.error(fragment, "empty constraint group"));
        }
        Ok(Constraint::intersection(parts))
    }

    fn flush(&self, run: &mut Vec<&'a str>, parts: &mut Vec<Constraint>) -> Result<()> {
        if run.is_empty() {
            return Ok(());
        }
        let terms = join_words(run)
            .map_err(|word| self.error(word, "operator is not followed by a version"))?;
        for term in terms {
            parts.extend(parse_term(&term).map_err(|reason| self.error(&term, &reason))?);
        }
        run.clear();
        Ok(())
    }
}

/// Parse a full constraint expression into its tree.
pub(crate) fn parse_expression(input: &str) -> Result<Constraint> {
    let mut parser = ExprParser {
        input,
        tokens: tokenize(input),
        pos: 0,
    };
    let constraint = parser.expression()?;
    match parser.peek() {
        None => Ok(constraint),
        Some(Token::Close) => Err(parser.error(")", "unbalanced parentheses")),
        Some(_) => Err(parser.error(input, "unexpected trailing input")),
    }
}

fn is_set(caps: &Captures<'_>, group: usize) -> bool {
    caps.get(group).is_some_and(|m| !m.as_str().is_empty())
}

fn captured_segments(caps: &Captures<'_>, first: usize) -> std::result::Result<[u64; 4], String> {
    let mut segments = [0; 4];
    for (i, slot) in segments.iter_mut().enumerate() {
        if let Some(m) = caps.get(first + i) {
            *slot = m
                .as_str()
                .parse()
                .map_err(|_| format!("segment `{}` is out of range", m.as_str()))?;
        }
    }
    Ok(segments)
}

fn upper_bound(segments: [u64; 4], position: usize) -> std::result::Result<Version, String> {
    Version::bump_at(segments, position)
        .ok_or_else(|| format!("segment {position} is too large for an upper bound"))
}

fn describe(err: VersionError) -> String {
    match err {
        VersionError::InvalidVersion { reason, .. } => format!("invalid version: {reason}"),
        VersionError::InvalidConstraint { reason, .. } => reason,
    }
}

fn normalize_term(raw: &str) -> std::result::Result<Version, String> {
    VersionParser::normalize(raw).map_err(describe)
}

/// Lower bound of a caret/tilde/hyphen range; includes pre-releases of the
/// bound unless the term names a stability itself.
fn lower_bound(caps: &Captures<'_>, text: &str, modifier_group: usize) -> std::result::Result<Version, String> {
    let low = normalize_term(text)?;
    if is_set(caps, modifier_group) || is_set(caps, modifier_group + 2) {
        Ok(low)
    } else {
        Ok(low.into_dev())
    }
}

type Terms = SmallVec<[Constraint; 2]>;

/// Parse one term into one or two constraints.
fn parse_term(term: &str) -> std::result::Result<Terms, String> {
    let mut term = term;
    if let Some(caps) = ALIAS.captures(term) {
        term = caps.get(1).map_or(term, |m| m.as_str());
    }

    let mut flag = None;
    if let Some(caps) = TERM_FLAG.captures(term) {
        let head = caps.get(1).map_or("", |m| m.as_str());
        term = if head.is_empty() { "*" } else { head };
        flag = caps
            .get(2)
            .and_then(|m| VersionParser::normalize_stability(m.as_str()))
            .filter(|s| *s != Stability::Stable);
    }

    if let Some(caps) = REF_SUFFIX.captures(term) {
        term = caps.get(1).map_or(term, |m| m.as_str());
    }

    if let Some(caps) = ANY_VERSION.captures(term) {
        if caps.get(1).is_some() || caps.get(2).is_some() {
            let floor = Version::numeric([0; 4], None, true);
            return Ok(SmallVec::from_iter([Constraint::Range(Operator::Ge, floor)]));
        }
        return Ok(SmallVec::from_iter([Constraint::Any]));
    }

    if let Some(caps) = TILDE.captures(term) {
        let position = (1..=4).rev().find(|&i| caps.get(i).is_some()).unwrap_or(1);
        let offset = if term.starts_with("~>") { 2 } else { 1 };
        let low = lower_bound(&caps, &term[offset..], 5)?;
        let high_position = position.min(2).max(position - 1);
        let high = upper_bound(captured_segments(&caps, 1)?, high_position)?;
        trace!(term, position, high_position, "tilde range");
        return Ok(range(low, high));
    }

    if let Some(caps) = CARET.captures(term) {
        let segment = |i: usize| caps.get(i).map(|m| m.as_str());
        let position = if segment(1) != Some("0") || segment(2).is_none() {
            1
        } else if segment(2) != Some("0") || segment(3).is_none() {
            2
        } else {
            3
        };
        let low = lower_bound(&caps, &term[1..], 5)?;
        let high = upper_bound(captured_segments(&caps, 1)?, position)?;
        return Ok(range(low, high));
    }

    if let Some(caps) = WILDCARD.captures(term) {
        let position = (1..=3).rev().find(|&i| caps.get(i).is_some()).unwrap_or(1);
        let segments = captured_segments(&caps, 1)?;
        let low = Version::numeric(segments, None, true);
        let high = upper_bound(segments, position)?;
        if segments == [0; 4] {
            return Ok(SmallVec::from_iter([Constraint::Range(Operator::Lt, high)]));
        }
        return Ok(range(low, high));
    }

    if let Some(caps) = HYPHEN.captures(term) {
        let from = caps.name("from").map_or("", |m| m.as_str());
        let to = caps.name("to").map_or("", |m| m.as_str());
        // `from` is group 1 (segments 2..=5, modifier 6..=8),
        // `to` is group 9 (segments 10..=13, modifier 14..=16).
        let low = lower_bound(&caps, from, 6)?;
        let high_version = normalize_term(to)?;
        let upper = if is_set(&caps, 12) || is_set(&caps, 14) || is_set(&caps, 16) {
            Constraint::Range(Operator::Le, high_version)
        } else {
            let position = if is_set(&caps, 11) { 2 } else { 1 };
            Constraint::Range(Operator::Lt, upper_bound(captured_segments(&caps, 10)?, position)?)
        };
        return Ok(SmallVec::from_iter([Constraint::Range(Operator::Ge, low), upper]));
    }

    let caps = COMPARATOR
        .captures(term)
        .ok_or_else(|| "unrecognized constraint".to_string())?;
    let op = caps.get(1).map_or("", |m| m.as_str());
    let target = caps.get(2).map_or("", |m| m.as_str());
    if target.is_empty() {
        return Err("operator is not followed by a version".to_string());
    }

    let mut version = match VersionParser::normalize(target) {
        Ok(version) => version,
        Err(_) if target.ends_with("-dev") && DEV_NAME.is_match(target) => {
            Version::branch(&target[..target.len() - 4])
        }
        Err(err) => return Err(describe(err)),
    };

    let operator = match op {
        "" | "=" | "==" => None,
        "<" => Some(Operator::Lt),
        "<=" => Some(Operator::Le),
        ">" => Some(Operator::Gt),
        ">=" => Some(Operator::Ge),
        "!=" | "<>" => Some(Operator::Ne),
        other => return Err(format!("unknown operator `{other}`")),
    };

    match (operator, flag) {
        (Some(_), Some(stability)) if version.stability() == Stability::Stable => {
            version = version.with_stability(stability);
        }
        (Some(Operator::Lt | Operator::Ge), _)
            if !ENDS_WITH_MODIFIER.is_match(target) && !target.starts_with("dev-") =>
        {
            version = version.into_dev();
        }
        _ => {}
    }

    let constraint = match operator {
        None => Constraint::Exact(version),
        Some(op) => Constraint::Range(op, version),
    };
    Ok(SmallVec::from_iter([constraint]))
}

fn range(low: Version, high: Version) -> Terms {
    SmallVec::from_iter([
        Constraint::Range(Operator::Ge, low),
        Constraint::Range(Operator::Lt, high),
    ])
}
