//! Parsed-constraint cache shared by a resolution session.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::trace;

use crate::constraint::VersionConstraint;
use crate::error::Result;

/// Append-only cache of parsed constraints keyed by their exact input.
///
/// Concurrent callers asking for the same input parse it once: the shard
/// holding the key stays locked while the first caller parses. Failed parses
/// are not cached.
#[derive(Debug, Default)]
pub struct ConstraintCache {
    entries: DashMap<Arc<str>, Arc<VersionConstraint>, ahash::RandomState>,
}

impl ConstraintCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached parse of `raw`, parsing and inserting it if absent.
    ///
    /// # Errors
    /// Returns the parse error for malformed expressions.
    pub fn get_or_parse(&self, raw: &str) -> Result<Arc<VersionConstraint>> {
        if let Some(hit) = self.entries.get(raw) {
            trace!(constraint = raw, "constraint cache hit");
            return Ok(Arc::clone(hit.value()));
        }

        match self.entries.entry(Arc::from(raw)) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let parsed = Arc::new(VersionConstraint::parse(raw)?);
                entry.insert(Arc::clone(&parsed));
                trace!(constraint = raw, "constraint cached");
                Ok(parsed)
            }
        }
    }

    /// Whether `raw` has been parsed successfully before.
    #[must_use]
    pub fn contains(&self, raw: &str) -> bool {
        self.entries.contains_key(raw)
    }

    /// Number of cached constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn same_input_yields_same_entry() {
        let cache = ConstraintCache::new();
        let first = cache.get_or_parse("^1.0 || ^2.0").unwrap();
        let second = cache.get_or_parse("^1.0 || ^2.0").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_are_exact_input() {
        let cache = ConstraintCache::new();
        let a = cache.get_or_parse("^1.0").unwrap();
        let b = cache.get_or_parse(" ^1.0").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.constraint(), b.constraint());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = ConstraintCache::new();
        assert!(cache.get_or_parse("(1.0").is_err());
        assert!(!cache.contains("(1.0"));
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_callers_share_one_parse() {
        let cache = Arc::new(ConstraintCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_or_parse(">=1.0 <2.0").unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for result in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], result));
        }
        assert_eq!(cache.len(), 1);
    }
}
