//! Property tests for the package sorter.

use ahash::AHashMap;
use ostinato_autoload::PackageSorter;
use ostinato_core::PackageNode;
use ostinato_test_utils::prelude::*;

/// `n` packages, each requiring a subset of the packages listed before it
/// (`backward`) or after it (`!backward`).
fn graph(n: usize, edges: &[(usize, usize)], backward: bool) -> Vec<PackageNode> {
    let name = |i: usize| format!("pkg/p{i}");
    (0..n)
        .map(|i| {
            edges
                .iter()
                .filter(|(from, to)| *from == i && if backward { to < from } else { to > from })
                .fold(package(&name(i), "1.0.0"), |pkg, (_, to)| {
                    pkg.with_require(&name(*to), "*")
                })
        })
        .collect()
}

fn edges_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..12).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..24)))
}

fn weight_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![
        Just(i64::MIN),
        Just(i64::MIN + 1),
        Just(i64::MAX),
        Just(0),
        any::<i64>(),
    ]
}

fn weights_for(nodes: &[PackageNode], weights: &[Option<i64>]) -> AHashMap<String, i64> {
    nodes
        .iter()
        .zip(weights)
        .filter_map(|(node, weight)| weight.map(|w| (node.name.clone(), w)))
        .collect()
}

proptest! {
    #[test]
    fn output_is_a_permutation((n, edges) in edges_strategy()) {
        let mut nodes = graph(n, &edges, true);
        nodes.extend(graph(n, &edges, false).into_iter().map(|p| {
            let name = format!("other/{}", p.name.trim_start_matches("pkg/"));
            let mut renamed = package(&name, "1.0.0");
            renamed.requires = p.requires;
            renamed
        }));
        let mut indices = PackageSorter::sorted_indices(&nodes, &AHashMap::new());
        indices.sort_unstable();
        prop_assert_eq!(indices, (0..nodes.len()).collect::<Vec<_>>());
    }

    #[test]
    fn topologically_ordered_input_is_kept((n, edges) in edges_strategy()) {
        let nodes = graph(n, &edges, true);
        let sorted = PackageSorter::sorted_indices(&nodes, &AHashMap::new());
        prop_assert_eq!(sorted, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn sorting_is_deterministic((n, edges) in edges_strategy()) {
        let nodes = graph(n, &edges, false);
        let first = PackageSorter::sorted_indices(&nodes, &AHashMap::new());
        let second = PackageSorter::sorted_indices(&nodes, &AHashMap::new());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn single_forward_edge_is_honored(n in 2usize..12, from in 0usize..12, to in 0usize..12) {
        let (from, to) = (from % n, to % n);
        prop_assume!(from != to);
        let nodes = graph(n, &[(from, to)], from > to);
        let sorted = PackageSorter::sorted_indices(&nodes, &AHashMap::new());
        let pos = |i: usize| sorted.iter().position(|x| *x == i).unwrap();
        prop_assert!(pos(to) < pos(from));
    }

    #[test]
    fn extreme_weights_never_panic(
        (n, edges) in edges_strategy(),
        weights in prop::collection::vec(prop::option::of(weight_strategy()), 12),
    ) {
        let nodes = graph(n, &edges, false);
        let weights = weights_for(&nodes, &weights);
        let mut indices = PackageSorter::sorted_indices(&nodes, &weights);
        indices.sort_unstable();
        prop_assert_eq!(indices, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn single_edge_honored_under_any_weights(
        n in 2usize..12,
        from in 0usize..12,
        to in 0usize..12,
        weights in prop::collection::vec(prop::option::of(weight_strategy()), 12),
    ) {
        let (from, to) = (from % n, to % n);
        prop_assume!(from != to);
        let nodes = graph(n, &[(from, to)], from > to);
        let weights = weights_for(&nodes, &weights);
        let sorted = PackageSorter::sorted_indices(&nodes, &weights);
        let pos = |i: usize| sorted.iter().position(|x| *x == i).unwrap();
        prop_assert!(pos(to) < pos(from));
    }
}
