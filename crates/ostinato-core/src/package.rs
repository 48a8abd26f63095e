//! Package nodes of the installed graph.

use ostinato_semver::{
    Stability, StabilityFilter, Version, VersionConstraint, VersionParser,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::autoload::AutoloadRules;
use crate::error::Result;

/// Constraint placeholder resolved to the owning package's version.
const SELF_VERSION: &str = "self.version";

/// Relationship a [`Link`] expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// `require`
    Require,
    /// `require-dev`
    RequireDev,
    /// `replace`
    Replace,
    /// `provide`
    Provide,
    /// `conflict`
    Conflict,
}

impl LinkKind {
    /// Key used in `composer.json`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Require => "require",
            Self::RequireDev => "require-dev",
            Self::Replace => "replace",
            Self::Provide => "provide",
            Self::Conflict => "conflict",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link from one package to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Lowercase name of the declaring package.
    pub source: String,
    /// Lowercase name of the target package.
    pub target: String,
    /// Raw constraint, with `self.version` already substituted.
    pub constraint: String,
    /// Relationship kind.
    pub kind: LinkKind,
}

impl Link {
    /// Create a link; names are lowercased.
    #[must_use]
    pub fn new(source: &str, target: &str, constraint: impl Into<String>, kind: LinkKind) -> Self {
        Self {
            source: source.to_ascii_lowercase(),
            target: target.to_ascii_lowercase(),
            constraint: constraint.into(),
            kind,
        }
    }

    /// Parse the link constraint through `parser`'s cache.
    ///
    /// # Errors
    /// Returns an error if the constraint is malformed.
    pub fn parsed_constraint(&self, parser: &VersionParser) -> Result<Arc<VersionConstraint>> {
        Ok(parser.parse_constraints(&self.constraint)?)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} ({})", self.source, self.kind, self.target, self.constraint)
    }
}

/// A package in the installed graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNode {
    /// Lowercase unique name.
    pub name: String,
    /// Name as declared.
    pub pretty_name: String,
    /// Version as declared.
    pub pretty_version: String,
    /// Normalized version.
    pub version: Version,
    /// `require` links.
    pub requires: Vec<Link>,
    /// `require-dev` links.
    pub dev_requires: Vec<Link>,
    /// `replace` links.
    pub replaces: Vec<Link>,
    /// `provide` links.
    pub provides: Vec<Link>,
    /// `conflict` links.
    pub conflicts: Vec<Link>,
    /// Package type (`library`, `composer-plugin`, ...).
    pub package_type: String,
    /// Legacy PSR-0 `target-dir`.
    pub target_dir: Option<String>,
    /// `autoload` rules.
    pub autoload: AutoloadRules,
    /// `autoload-dev` rules.
    pub dev_autoload: AutoloadRules,
    /// For alias packages, the version of the aliased package.
    pub alias_of: Option<Version>,
    /// `extra.branch-alias`: branch version to alias.
    pub branch_aliases: BTreeMap<String, String>,
}

impl PackageNode {
    /// Create a `library` package with no links.
    ///
    /// # Errors
    /// Returns an error if `pretty_version` is not a valid version.
    pub fn new(pretty_name: &str, pretty_version: &str) -> Result<Self> {
        let version = VersionParser::normalize(pretty_version)?;
        Ok(Self {
            name: pretty_name.to_ascii_lowercase(),
            pretty_name: pretty_name.to_string(),
            pretty_version: pretty_version.to_string(),
            version,
            requires: Vec::new(),
            dev_requires: Vec::new(),
            replaces: Vec::new(),
            provides: Vec::new(),
            conflicts: Vec::new(),
            package_type: "library".to_string(),
            target_dir: None,
            autoload: AutoloadRules::new(),
            dev_autoload: AutoloadRules::new(),
            alias_of: None,
            branch_aliases: BTreeMap::new(),
        })
    }

    /// Build a link from this package, substituting `self.version`.
    #[must_use]
    pub fn link(&self, target: &str, constraint: &str, kind: LinkKind) -> Link {
        let constraint = if constraint.trim() == SELF_VERSION {
            self.pretty_version.as_str()
        } else {
            constraint
        };
        Link::new(&self.name, target, constraint, kind)
    }

    /// Add a link of the given kind.
    pub fn add_link(&mut self, target: &str, constraint: &str, kind: LinkKind) {
        let link = self.link(target, constraint, kind);
        match kind {
            LinkKind::Require => self.requires.push(link),
            LinkKind::RequireDev => self.dev_requires.push(link),
            LinkKind::Replace => self.replaces.push(link),
            LinkKind::Provide => self.provides.push(link),
            LinkKind::Conflict => self.conflicts.push(link),
        }
    }

    /// Add a `require` link.
    #[must_use]
    pub fn with_require(mut self, target: &str, constraint: &str) -> Self {
        self.add_link(target, constraint, LinkKind::Require);
        self
    }

    /// Add a `require-dev` link.
    #[must_use]
    pub fn with_dev_require(mut self, target: &str, constraint: &str) -> Self {
        self.add_link(target, constraint, LinkKind::RequireDev);
        self
    }

    /// Add a `replace` link.
    #[must_use]
    pub fn with_replace(mut self, target: &str, constraint: &str) -> Self {
        self.add_link(target, constraint, LinkKind::Replace);
        self
    }

    /// Add a `provide` link.
    #[must_use]
    pub fn with_provide(mut self, target: &str, constraint: &str) -> Self {
        self.add_link(target, constraint, LinkKind::Provide);
        self
    }

    /// Set the package type.
    #[must_use]
    pub fn with_type(mut self, package_type: &str) -> Self {
        self.package_type = package_type.to_string();
        self
    }

    /// Set the `target-dir`.
    #[must_use]
    pub fn with_target_dir(mut self, target_dir: &str) -> Self {
        self.target_dir = Some(target_dir.to_string());
        self
    }

    /// Set the `autoload` rules.
    #[must_use]
    pub fn with_autoload(mut self, rules: AutoloadRules) -> Self {
        self.autoload = rules;
        self
    }

    /// Set the `autoload-dev` rules.
    #[must_use]
    pub fn with_dev_autoload(mut self, rules: AutoloadRules) -> Self {
        self.dev_autoload = rules;
        self
    }

    /// Add an `extra.branch-alias` entry.
    #[must_use]
    pub fn with_branch_alias(mut self, branch: &str, alias: &str) -> Self {
        self.branch_aliases.insert(branch.to_string(), alias.to_string());
        self
    }

    /// An alias package of this one at `alias_version`.
    ///
    /// # Errors
    /// Returns an error if `alias_version` is not a valid version.
    pub fn alias(&self, alias_version: &str) -> Result<Self> {
        let mut alias = self.clone();
        alias.version = VersionParser::normalize(alias_version)?;
        alias.pretty_version = alias_version.to_string();
        alias.alias_of = Some(self.version.clone());
        Ok(alias)
    }

    /// Whether this is an alias package.
    #[must_use]
    pub const fn is_alias(&self) -> bool {
        self.alias_of.is_some()
    }

    /// Names this package answers to: its own, then replaced and provided.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.replaces.iter().map(|l| l.target.as_str()))
            .chain(self.provides.iter().map(|l| l.target.as_str()))
    }

    /// `require` links, followed by `require-dev` when `dev` is set.
    pub fn dependency_links(&self, dev: bool) -> impl Iterator<Item = &Link> {
        let dev_links: &[Link] = if dev { &self.dev_requires } else { &[] };
        self.requires.iter().chain(dev_links)
    }

    /// The numeric version a branch install stands for, from
    /// `extra.branch-alias`. `None` for non-branch versions or branches
    /// without a usable alias.
    #[must_use]
    pub fn branch_alias_version(&self) -> Option<Version> {
        if !self.version.is_dev() {
            return None;
        }
        let alias = self.branch_aliases.get(&self.pretty_version)?;
        let branch = alias.strip_suffix("-dev")?;
        let version = VersionParser::normalize_branch(branch);
        (!version.is_branch() && !version.is_default_branch()).then_some(version)
    }

    /// Stability filter for this package's requirements, as a root package
    /// would apply it.
    #[must_use]
    pub fn stability_filter(&self, minimum: Stability) -> StabilityFilter {
        StabilityFilter::from_requirements(
            minimum,
            self.dependency_links(true)
                .map(|link| (link.target.as_str(), link.constraint.as_str())),
        )
    }
}

impl fmt::Display for PackageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.pretty_name, self.pretty_version)
    }
}
