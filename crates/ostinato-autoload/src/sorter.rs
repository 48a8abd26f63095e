//! Dependency ordering of installed packages.
//!
//! Every package starts at its input index (or its external weight). Each
//! `require`/`require-dev` edge A→B whose target is positioned after A pulls
//! the target to just before A, shifting the entries ahead of A down by one
//! to make room. Positions are re-sorted stably after every move, so equal
//! positions keep their input order. Cycles never fail: the last edge
//! processed decides the relative order.

use ahash::AHashMap;
use ostinato_core::PackageNode;
use std::borrow::Borrow;
use tracing::trace;

/// Weights are clamped to this magnitude so every move has room to shift
/// positions down.
const WEIGHT_LIMIT: i64 = i64::MAX / 2;

/// Orders packages so that dependencies precede their dependents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageSorter;

#[derive(Debug, Clone, Copy)]
struct Slot {
    index: usize,
    position: i64,
}

impl PackageSorter {
    /// Sort packages for installation/loading. `weights` forces the initial
    /// position of the named packages; lower loads first.
    #[must_use]
    pub fn sort_packages<'a>(
        nodes: &'a [PackageNode],
        weights: &AHashMap<String, i64>,
    ) -> Vec<&'a PackageNode> {
        Self::sorted_indices(nodes, weights)
            .into_iter()
            .map(|idx| &nodes[idx])
            .collect()
    }

    /// Reverse of [`Self::sort_packages`]: dependents are unloaded first.
    #[must_use]
    pub fn deactivation_order<'a>(
        nodes: &'a [PackageNode],
        weights: &AHashMap<String, i64>,
    ) -> Vec<&'a PackageNode> {
        let mut order = Self::sort_packages(nodes, weights);
        order.reverse();
        order
    }

    /// Indices into `nodes` in sorted order.
    #[must_use]
    pub fn sorted_indices<N: Borrow<PackageNode>>(
        nodes: &[N],
        weights: &AHashMap<String, i64>,
    ) -> Vec<usize> {
        let nodes: Vec<&PackageNode> = nodes.iter().map(Borrow::borrow).collect();

        // Own names take precedence over replaced/provided ones.
        let mut providers: AHashMap<&str, usize> = AHashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            providers.insert(node.name.as_str(), idx);
        }
        for (idx, node) in nodes.iter().enumerate() {
            for name in node.names().skip(1) {
                providers.entry(name).or_insert(idx);
            }
        }

        let mut slots: Vec<Slot> = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| Slot {
                index,
                position: weights
                    .get(&node.name)
                    .map_or(index as i64, |w| (*w).clamp(-WEIGHT_LIMIT, WEIGHT_LIMIT)),
            })
            .collect();
        slots.sort_by_key(|slot| slot.position);

        for (source, node) in nodes.iter().enumerate() {
            for link in node.dependency_links(true) {
                let Some(&target) = providers.get(link.target.as_str()) else {
                    continue;
                };
                if target == source {
                    continue;
                }
                Self::pull_before(&mut slots, source, target, &nodes);
            }
        }

        slots.into_iter().map(|slot| slot.index).collect()
    }

    fn pull_before(slots: &mut [Slot], source: usize, target: usize, nodes: &[&PackageNode]) {
        let Some(at) = slots.iter().position(|slot| slot.index == source) else {
            return;
        };
        let source_position = slots[at].position;
        let Some(target_slot) = slots.iter().position(|slot| slot.index == target) else {
            return;
        };
        if target_slot < at {
            return;
        }

        for slot in &mut slots[..at] {
            slot.position = slot.position.saturating_sub(1);
        }
        slots[target_slot].position = source_position.saturating_sub(1);
        slots.sort_by_key(|slot| slot.position);

        trace!(
            package = %nodes[target].name,
            dependent = %nodes[source].name,
            position = source_position.saturating_sub(1),
            "moved dependency before dependent"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pkg(name: &str) -> PackageNode {
        PackageNode::new(name, "1.0.0").unwrap()
    }

    fn names(sorted: &[&PackageNode]) -> Vec<String> {
        sorted.iter().map(|p| p.name.clone()).collect()
    }

    fn sort(nodes: &[PackageNode]) -> Vec<String> {
        names(&PackageSorter::sort_packages(nodes, &AHashMap::new()))
    }

    #[test]
    fn dependency_moves_before_dependent() {
        let nodes = [pkg("c/c"), pkg("a/a").with_require("b/b", "*"), pkg("b/b")];
        assert_eq!(sort(&nodes), ["c/c", "b/b", "a/a"]);
    }

    #[test]
    fn already_ordered_input_is_unchanged() {
        let nodes = [pkg("b/b"), pkg("a/a").with_require("b/b", "*"), pkg("c/c")];
        assert_eq!(sort(&nodes), ["b/b", "a/a", "c/c"]);
    }

    #[test]
    fn chains_are_resolved() {
        let nodes = [
            pkg("a/a").with_require("b/b", "*"),
            pkg("b/b").with_require("c/c", "*"),
            pkg("c/c"),
        ];
        assert_eq!(sort(&nodes), ["c/c", "b/b", "a/a"]);
    }

    #[test]
    fn dev_requirements_count() {
        let nodes = [pkg("a/a").with_dev_require("b/b", "*"), pkg("b/b")];
        assert_eq!(sort(&nodes), ["b/b", "a/a"]);
    }

    #[test]
    fn replaced_names_resolve_to_the_replacer() {
        let nodes = [
            pkg("a/a").with_require("psr/log-implementation", "1.0"),
            pkg("monolog/monolog").with_provide("psr/log-implementation", "1.0"),
        ];
        assert_eq!(sort(&nodes), ["monolog/monolog", "a/a"]);
    }

    #[test]
    fn missing_targets_are_ignored() {
        let nodes = [pkg("a/a").with_require("php", ">=8.1"), pkg("b/b")];
        assert_eq!(sort(&nodes), ["a/a", "b/b"]);
    }

    #[test]
    fn cycles_terminate() {
        let nodes = [
            pkg("a/a").with_require("b/b", "*"),
            pkg("b/b").with_require("a/a", "*"),
            pkg("c/c"),
        ];
        let sorted = sort(&nodes);
        assert_eq!(sorted.len(), 3);
        assert_eq!(sorted[2], "c/c");
    }

    #[test]
    fn weights_force_initial_positions() {
        let nodes = [pkg("a/a"), pkg("b/b"), pkg("plugin/p")];
        let mut weights = AHashMap::new();
        weights.insert("plugin/p".to_string(), -100);
        assert_eq!(
            names(&PackageSorter::sort_packages(&nodes, &weights)),
            ["plugin/p", "a/a", "b/b"]
        );
    }

    #[test]
    fn extreme_weights_do_not_overflow() {
        let nodes = [pkg("a/a"), pkg("b/b").with_require("c/c", "*"), pkg("c/c")];
        let mut weights = AHashMap::new();
        weights.insert("a/a".to_string(), i64::MIN);
        weights.insert("b/b".to_string(), i64::MIN + 1);
        assert_eq!(
            names(&PackageSorter::sort_packages(&nodes, &weights)),
            ["a/a", "c/c", "b/b"]
        );
    }

    #[test]
    fn weighted_package_still_gets_its_dependencies_first() {
        let nodes = [
            pkg("a/a"),
            pkg("lib/l"),
            pkg("plugin/p").with_require("lib/l", "*"),
        ];
        let mut weights = AHashMap::new();
        weights.insert("plugin/p".to_string(), -100);
        assert_eq!(
            names(&PackageSorter::sort_packages(&nodes, &weights)),
            ["lib/l", "plugin/p", "a/a"]
        );
    }

    #[test]
    fn deactivation_reverses_install_order() {
        let nodes = [pkg("c/c"), pkg("a/a").with_require("b/b", "*"), pkg("b/b")];
        assert_eq!(
            names(&PackageSorter::deactivation_order(&nodes, &AHashMap::new())),
            ["a/a", "b/b", "c/c"]
        );
    }
}
