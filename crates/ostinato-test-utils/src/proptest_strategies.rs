//! Proptest strategies for Ostinato types.

use proptest::prelude::*;

/// Strategy for generating valid package names (vendor/package).
pub fn package_name_strategy() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9-]{1,12}", "[a-z][a-z0-9-]{1,16}")
        .prop_map(|(vendor, package)| format!("{vendor}/{package}"))
}

/// Strategy for generating release versions with one to four segments.
pub fn release_version_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(0u64..200, 1..=4).prop_map(|segments| {
        segments
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".")
    })
}

/// Strategy for generating versions with a pre-release or patch modifier.
pub fn modified_version_strategy() -> impl Strategy<Value = String> {
    let modifier = prop_oneof![
        Just("alpha"),
        Just("beta"),
        Just("RC"),
        Just("rc"),
        Just("a"),
        Just("b"),
        Just("p"),
        Just("patch"),
    ];
    (
        release_version_strategy(),
        modifier,
        prop::option::of(1u64..20),
        any::<bool>(),
    )
        .prop_map(|(release, modifier, number, dev)| {
            let number = number.map(|n| n.to_string()).unwrap_or_default();
            let dev = if dev { "-dev" } else { "" };
            format!("{release}-{modifier}{number}{dev}")
        })
}

/// Strategy for generating branch versions.
pub fn branch_version_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("dev-main".to_string()),
        Just("dev-master".to_string()),
        Just("1.x-dev".to_string()),
        "[a-z][a-z0-9-]{2,15}".prop_map(|s| format!("dev-{s}")),
        (0u64..20, 0u64..20).prop_map(|(major, minor)| format!("{major}.{minor}.x-dev")),
    ]
}

/// Strategy for generating any valid version string.
pub fn version_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => release_version_strategy(),
        3 => modified_version_strategy(),
        1 => branch_version_strategy(),
    ]
}

/// Strategy for generating single constraint terms.
pub fn constraint_term_strategy() -> impl Strategy<Value = String> {
    let operator = prop_oneof![
        Just(""),
        Just("^"),
        Just("~"),
        Just(">="),
        Just(">"),
        Just("<"),
        Just("<="),
        Just("!="),
        Just("=="),
    ];
    prop_oneof![
        8 => (operator, release_version_strategy()).prop_map(|(op, v)| format!("{op}{v}")),
        1 => Just("*".to_string()),
        1 => (0u64..10, 0u64..10).prop_map(|(major, minor)| format!("{major}.{minor}.*")),
    ]
}

/// Strategy for generating constraint expressions: OR-groups of AND-terms.
pub fn constraint_strategy() -> impl Strategy<Value = String> {
    let group = prop::collection::vec(constraint_term_strategy(), 1..=3).prop_map(|terms| terms.join(" "));
    prop::collection::vec(group, 1..=3).prop_map(|groups| groups.join(" || "))
}
