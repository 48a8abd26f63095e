//! Normalized package versions.
//!
//! A [`Version`] is either a four-segment numeric version with an optional
//! pre-release modifier and dev flag (`1.2.0.0-beta2`, `2.3.9999999.9999999-dev`)
//! or a named development branch (`dev-feature/foo`).
//!
//! Ordering follows Composer: numeric segments first, then
//! `-dev` < `-alpha` < `-beta` < `-RC` < stable < `-patch`. Named branches
//! sort above every numeric version.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::parser::VersionParser;

/// Segment value used for the open end of branch versions (`2.x-dev`).
pub const BRANCH_SEGMENT: u64 = 9_999_999;

/// Stability level for package versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Stability {
    /// Development version (lowest stability).
    Dev = 0,
    /// Alpha release.
    Alpha = 1,
    /// Beta release.
    Beta = 2,
    /// Release candidate.
    RC = 3,
    /// Stable release (highest stability).
    #[default]
    Stable = 4,
}

impl Stability {
    /// All stabilities from least to most stable.
    pub const ALL: [Self; 5] = [Self::Dev, Self::Alpha, Self::Beta, Self::RC, Self::Stable];

    /// Parse a stability name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Some(Self::Dev),
            "alpha" | "a" => Some(Self::Alpha),
            "beta" | "b" => Some(Self::Beta),
            "rc" => Some(Self::RC),
            "stable" | "patch" | "pl" | "p" => Some(Self::Stable),
            _ => None,
        }
    }

    /// Canonical token for this stability.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Alpha => "alpha",
            Self::Beta => "beta",
            Self::RC => "RC",
            Self::Stable => "stable",
        }
    }

    /// Check if this stability is at least as stable as the minimum.
    #[must_use]
    #[inline]
    pub fn satisfies_minimum(&self, minimum: Self) -> bool {
        *self >= minimum
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Stability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Stability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid stability: {s}")))
    }
}

/// Kind of pre-release (or post-release) modifier.
///
/// Declaration order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModifierKind {
    /// `-alpha`, `-a`
    Alpha,
    /// `-beta`, `-b`
    Beta,
    /// `-RC`
    RC,
    /// `-patch`, `-pl`, `-p`; sorts after the plain release.
    Patch,
}

impl ModifierKind {
    /// Expand a modifier alias (`a`, `b`, `pl`, ...) to its kind.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "alpha" | "a" => Some(Self::Alpha),
            "beta" | "b" => Some(Self::Beta),
            "rc" => Some(Self::RC),
            "patch" | "pl" | "p" => Some(Self::Patch),
            _ => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Beta => "beta",
            Self::RC => "RC",
            Self::Patch => "patch",
        }
    }

    const fn stability(self) -> Stability {
        match self {
            Self::Alpha => Stability::Alpha,
            Self::Beta => Stability::Beta,
            Self::RC => Stability::RC,
            Self::Patch => Stability::Stable,
        }
    }
}

/// A pre-release modifier such as `beta2` or `RC1.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Modifier {
    /// Modifier kind.
    pub kind: ModifierKind,
    /// Numeric suffix parts (`beta1.2` has `[1, 2]`).
    pub numbers: SmallVec<[u64; 2]>,
}

impl Modifier {
    /// Create a modifier without a numeric suffix.
    #[must_use]
    pub fn new(kind: ModifierKind) -> Self {
        Self {
            kind,
            numbers: SmallVec::new(),
        }
    }

    /// Create a modifier with numeric suffix parts.
    #[must_use]
    pub fn with_numbers(kind: ModifierKind, numbers: &[u64]) -> Self {
        Self {
            kind,
            numbers: SmallVec::from_slice(numbers),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())?;
        for (i, n) in self.numbers.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{n}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr {
    Numeric {
        segments: [u64; 4],
        modifier: Option<Modifier>,
        dev: bool,
    },
    Branch(Arc<str>),
}

/// A normalized, comparable version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    repr: Repr,
}

impl Version {
    /// A stable numeric version.
    #[must_use]
    pub const fn new(segments: [u64; 4]) -> Self {
        Self {
            repr: Repr::Numeric {
                segments,
                modifier: None,
                dev: false,
            },
        }
    }

    /// A numeric version with an optional modifier and dev flag.
    #[must_use]
    pub const fn numeric(segments: [u64; 4], modifier: Option<Modifier>, dev: bool) -> Self {
        Self {
            repr: Repr::Numeric {
                segments,
                modifier,
                dev,
            },
        }
    }

    /// A named development branch (`dev-<name>`).
    #[must_use]
    pub fn branch(name: impl Into<Arc<str>>) -> Self {
        Self {
            repr: Repr::Branch(name.into()),
        }
    }

    /// The sentinel that the default branch (`dev-master`, `dev-trunk`, ...)
    /// normalizes to; it compares above every released version.
    #[must_use]
    pub const fn default_branch() -> Self {
        Self::numeric([BRANCH_SEGMENT; 4], None, true)
    }

    /// Numeric segments, or `None` for named branches.
    #[must_use]
    pub const fn segments(&self) -> Option<[u64; 4]> {
        match &self.repr {
            Repr::Numeric { segments, .. } => Some(*segments),
            Repr::Branch(_) => None,
        }
    }

    /// Major segment (0 for named branches).
    #[must_use]
    pub const fn major(&self) -> u64 {
        match &self.repr {
            Repr::Numeric { segments, .. } => segments[0],
            Repr::Branch(_) => 0,
        }
    }

    /// Pre-release modifier, if any.
    #[must_use]
    pub const fn modifier(&self) -> Option<&Modifier> {
        match &self.repr {
            Repr::Numeric { modifier, .. } => modifier.as_ref(),
            Repr::Branch(_) => None,
        }
    }

    /// Whether this is a named development branch.
    #[must_use]
    pub const fn is_branch(&self) -> bool {
        matches!(self.repr, Repr::Branch(_))
    }

    /// Branch name for named branches.
    #[must_use]
    pub fn branch_name(&self) -> Option<&str> {
        match &self.repr {
            Repr::Branch(name) => Some(name),
            Repr::Numeric { .. } => None,
        }
    }

    /// Whether this is the default-branch sentinel.
    #[must_use]
    pub fn is_default_branch(&self) -> bool {
        *self == Self::default_branch()
    }

    /// Whether this version is a development version (branch or `-dev`).
    #[must_use]
    pub const fn is_dev(&self) -> bool {
        match &self.repr {
            Repr::Numeric { dev, .. } => *dev,
            Repr::Branch(_) => true,
        }
    }

    /// Stability classification.
    #[must_use]
    pub fn stability(&self) -> Stability {
        match &self.repr {
            Repr::Branch(_) | Repr::Numeric { dev: true, .. } => Stability::Dev,
            Repr::Numeric {
                modifier: Some(m), ..
            } => m.kind.stability(),
            Repr::Numeric { .. } => Stability::Stable,
        }
    }

    /// Attach a stability to a stable numeric version; other versions are
    /// returned unchanged.
    #[must_use]
    pub fn with_stability(&self, stability: Stability) -> Self {
        let Repr::Numeric {
            segments,
            modifier: None,
            dev: false,
        } = &self.repr
        else {
            return self.clone();
        };
        match stability {
            Stability::Stable => self.clone(),
            Stability::Dev => Self::numeric(*segments, None, true),
            Stability::Alpha => Self::numeric(*segments, Some(Modifier::new(ModifierKind::Alpha)), false),
            Stability::Beta => Self::numeric(*segments, Some(Modifier::new(ModifierKind::Beta)), false),
            Stability::RC => Self::numeric(*segments, Some(Modifier::new(ModifierKind::RC)), false),
        }
    }

    /// The same numeric version with the `-dev` flag set.
    pub(crate) fn into_dev(self) -> Self {
        match self.repr {
            Repr::Numeric {
                segments, modifier, ..
            } => Self::numeric(segments, modifier, true),
            Repr::Branch(_) => self,
        }
    }

    /// Increment the segment at `position` (1-based), zero the lower
    /// segments and mark the result `-dev`. Used for exclusive upper bounds.
    /// `None` when the segment is already `u64::MAX`.
    pub(crate) fn bump_at(segments: [u64; 4], position: usize) -> Option<Self> {
        let mut bumped = [0; 4];
        for (i, slot) in bumped.iter_mut().enumerate() {
            match (i + 1).cmp(&position) {
                Ordering::Less => *slot = segments[i],
                Ordering::Equal => *slot = segments[i].checked_add(1)?,
                Ordering::Greater => {}
            }
        }
        Some(Self::numeric(bumped, None, true))
    }

    /// Sort rank of the modifier part; `(rank, numbers, released)`.
    fn modifier_key(modifier: Option<&Modifier>, dev: bool) -> (u8, &[u64], bool) {
        match modifier {
            None if dev => (0, &[], false),
            None => (4, &[], true),
            Some(m) => {
                let rank = match m.kind {
                    ModifierKind::Alpha => 1,
                    ModifierKind::Beta => 2,
                    ModifierKind::RC => 3,
                    ModifierKind::Patch => 5,
                };
                (rank, &m.numbers, !dev)
            }
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.repr, &other.repr) {
            (Repr::Branch(a), Repr::Branch(b)) => a.cmp(b),
            (Repr::Branch(_), Repr::Numeric { .. }) => Ordering::Greater,
            (Repr::Numeric { .. }, Repr::Branch(_)) => Ordering::Less,
            (
                Repr::Numeric {
                    segments: sa,
                    modifier: ma,
                    dev: da,
                },
                Repr::Numeric {
                    segments: sb,
                    modifier: mb,
                    dev: db,
                },
            ) => sa.cmp(sb).then_with(|| {
                Self::modifier_key(ma.as_ref(), *da).cmp(&Self::modifier_key(mb.as_ref(), *db))
            }),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Branch(name) => write!(f, "dev-{name}"),
            Repr::Numeric {
                segments,
                modifier,
                dev,
            } => {
                write!(
                    f,
                    "{}.{}.{}.{}",
                    segments[0], segments[1], segments[2], segments[3]
                )?;
                if let Some(modifier) = modifier {
                    write!(f, "-{modifier}")?;
                }
                if *dev {
                    f.write_str("-dev")?;
                }
                Ok(())
            }
        }
    }
}

impl std::str::FromStr for Version {
    type Err = crate::VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionParser::normalize(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        VersionParser::normalize(&s).map_err(serde::de::Error::custom)
    }
}
