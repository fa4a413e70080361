//! Property-based tests for expected-exception matching.
//!
//! A thrown error is described by its type hierarchy, most derived first. These tests generate hierarchies and check
//! that exact matches always count, ancestors count only when derived types are allowed, and strangers never count.

use attrun::discovery::ExpectedException;
use attrun::engine::invoke::matches_expected;
use attrun::metadata::ThrownError;
use proptest::prelude::*;

/// Distinct dotted type names, most derived first, always ending in the root exception type.
fn hierarchy_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[A-Z][a-z]{1,6}\\.[A-Z][a-z]{1,8}Exception", 1..6).prop_map(|names| {
        let mut chain: Vec<String> = names.into_iter().collect();
        chain.push("System.Exception".to_string());
        chain
    })
}

fn expected(type_name: &str, allow_derived: bool) -> ExpectedException {
    ExpectedException {
        type_name: type_name.to_string(),
        allow_derived,
    }
}

proptest! {
    /// Property: the thrown type itself always matches
    #[test]
    fn exact_type_always_matches(chain in hierarchy_strategy(), allow_derived in any::<bool>()) {
        let thrown = ThrownError::with_hierarchy(chain.clone(), "boom");
        prop_assert!(matches_expected(&expected(&chain[0], allow_derived), &thrown));
    }

    /// Property: an ancestor matches exactly when derived types are allowed
    #[test]
    fn ancestors_match_only_when_allowed(
        chain in hierarchy_strategy(),
        pick in any::<prop::sample::Index>(),
        allow_derived in any::<bool>(),
    ) {
        let ancestor = &chain[1 + pick.index(chain.len() - 1)];
        let thrown = ThrownError::with_hierarchy(chain.clone(), "boom");
        prop_assert_eq!(matches_expected(&expected(ancestor, allow_derived), &thrown), allow_derived);
    }

    /// Property: a type outside the hierarchy never matches
    #[test]
    fn unrelated_types_never_match(chain in hierarchy_strategy(), allow_derived in any::<bool>()) {
        let thrown = ThrownError::with_hierarchy(chain, "boom");
        prop_assert!(!matches_expected(&expected("Unrelated.NotInTheChainError", allow_derived), &thrown));
    }
}
