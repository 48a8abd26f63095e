//! Autoload declarations (`autoload` / `autoload-dev` sections).

use serde::{Deserialize, Serialize};
use sonic_rs::{JsonContainerTrait, JsonValueTrait, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Kind of autoload rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutoloadType {
    /// PSR-0 namespace prefixes.
    #[serde(rename = "psr-0")]
    Psr0,
    /// PSR-4 namespace prefixes.
    #[serde(rename = "psr-4")]
    Psr4,
    /// Directories and files to scan for classes.
    Classmap,
    /// Files included on every request.
    Files,
    /// Classmap exclusion patterns.
    ExcludeFromClassmap,
}

impl AutoloadType {
    /// Every autoload type.
    pub const ALL: [Self; 5] = [
        Self::Psr0,
        Self::Psr4,
        Self::Classmap,
        Self::Files,
        Self::ExcludeFromClassmap,
    ];

    /// Key used in `composer.json`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Psr0 => "psr-0",
            Self::Psr4 => "psr-4",
            Self::Classmap => "classmap",
            Self::Files => "files",
            Self::ExcludeFromClassmap => "exclude-from-classmap",
        }
    }

    /// Parse a `composer.json` key.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.as_str() == key)
    }

    /// Whether entries are namespace maps rather than path lists.
    #[must_use]
    pub const fn is_namespaced(self) -> bool {
        matches!(self, Self::Psr0 | Self::Psr4)
    }
}

impl fmt::Display for AutoloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared entry for one autoload type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoloadEntry {
    /// Namespace prefix to paths, in declaration order.
    Namespaces(Vec<(String, Vec<String>)>),
    /// Plain list of paths.
    Paths(Vec<String>),
    /// A value of the wrong shape; kept so consumers can report it.
    Malformed {
        /// JSON kind that was found instead.
        found: String,
    },
}

impl AutoloadEntry {
    fn merged_with(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Namespaces(base), Self::Namespaces(extra)) => {
                let mut merged = base.clone();
                for (prefix, paths) in extra {
                    match merged.iter_mut().find(|(p, _)| p == prefix) {
                        Some((_, existing)) => existing.extend(paths.iter().cloned()),
                        None => merged.push((prefix.clone(), paths.clone())),
                    }
                }
                Self::Namespaces(merged)
            }
            (Self::Paths(base), Self::Paths(extra)) => {
                Self::Paths(base.iter().chain(extra).cloned().collect())
            }
            (Self::Malformed { .. }, valid) | (valid, Self::Malformed { .. }) => valid.clone(),
            (base, _) => base.clone(),
        }
    }
}

/// All autoload rules of one package section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoloadRules {
    entries: BTreeMap<AutoloadType, AutoloadEntry>,
}

fn json_kind(value: &Value) -> &'static str {
    if value.as_str().is_some() {
        "string"
    } else if value.as_array().is_some() {
        "array"
    } else if value.as_object().is_some() {
        "object"
    } else if value.as_bool().is_some() {
        "boolean"
    } else if value.as_i64().is_some() || value.as_u64().is_some() || value.as_f64().is_some() {
        "number"
    } else {
        "null"
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    if let Some(s) = value.as_str() {
        return Some(vec![s.to_string()]);
    }
    let arr = value.as_array()?;
    Some(arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
}

impl AutoloadRules {
    /// Empty rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `autoload` object. Unknown keys are ignored and values of
    /// the wrong shape are recorded as [`AutoloadEntry::Malformed`].
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let mut rules = Self::new();
        let Some(object) = value.as_object() else {
            debug!(found = json_kind(value), "autoload section is not an object");
            return rules;
        };

        for (key, entry) in object {
            let Some(ty) = AutoloadType::parse(key) else {
                debug!(key, "ignoring unknown autoload type");
                continue;
            };
            let decoded = if ty.is_namespaced() {
                entry.as_object().map(|prefixes| {
                    AutoloadEntry::Namespaces(
                        prefixes
                            .iter()
                            .map(|(prefix, paths)| (prefix.to_string(), string_list(paths).unwrap_or_default()))
                            .collect(),
                    )
                })
            } else if let Some(arr) = entry.as_array() {
                Some(AutoloadEntry::Paths(
                    arr.iter().filter_map(|v| v.as_str().map(String::from)).collect(),
                ))
            } else {
                entry.as_object().map(|map| {
                    AutoloadEntry::Paths(
                        map.iter()
                            .filter_map(|(_, v)| v.as_str().map(String::from))
                            .collect(),
                    )
                })
            };
            let decoded = decoded.unwrap_or_else(|| AutoloadEntry::Malformed {
                found: json_kind(entry).to_string(),
            });
            rules.entries.insert(ty, decoded);
        }
        rules
    }

    /// Add paths for a namespace prefix.
    #[must_use]
    pub fn with_namespace<I, S>(mut self, ty: AutoloadType, prefix: &str, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        let addition = AutoloadEntry::Namespaces(vec![(prefix.to_string(), paths)]);
        self.merge_entry(ty, addition);
        self
    }

    /// Add plain paths.
    #[must_use]
    pub fn with_paths<I, S>(mut self, ty: AutoloadType, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let addition = AutoloadEntry::Paths(paths.into_iter().map(Into::into).collect());
        self.merge_entry(ty, addition);
        self
    }

    /// Replace the entry for a type.
    pub fn insert(&mut self, ty: AutoloadType, entry: AutoloadEntry) {
        self.entries.insert(ty, entry);
    }

    fn merge_entry(&mut self, ty: AutoloadType, addition: AutoloadEntry) {
        let merged = match self.entries.get(&ty) {
            Some(existing) => existing.merged_with(&addition),
            None => addition,
        };
        self.entries.insert(ty, merged);
    }

    /// The entry for a type.
    #[must_use]
    pub fn get(&self, ty: AutoloadType) -> Option<&AutoloadEntry> {
        self.entries.get(&ty)
    }

    /// Iterate entries in type order.
    pub fn iter(&self) -> impl Iterator<Item = (AutoloadType, &AutoloadEntry)> {
        self.entries.iter().map(|(ty, entry)| (*ty, entry))
    }

    /// Whether no rules are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recursive merge: namespace paths and path lists are concatenated,
    /// `self` first.
    #[must_use]
    pub fn merged_with(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (ty, entry) in &other.entries {
            merged.merge_entry(*ty, entry.clone());
        }
        merged
    }
}
