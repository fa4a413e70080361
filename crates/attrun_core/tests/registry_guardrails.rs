use std::collections::HashMap;

use attrun_core::layouts::{self, CONTEXT_MEMBERS, SupportLayout};
use attrun_core::markers::{self, LifecycleRole, MARKER_NAMESPACE};

#[test]
fn marker_names_unique_and_resolvable() {
    let mut seen: HashMap<&'static str, markers::MarkerId> = HashMap::new();

    for info in markers::MARKERS {
        assert_eq!(
            markers::from_str(info.canonical),
            Some(info.id),
            "marker name not resolvable: {}",
            info.canonical
        );
        assert_eq!(markers::as_str(info.id), info.canonical, "as_str mismatch for {:?}", info.id);
        assert!(
            info.canonical.starts_with(MARKER_NAMESPACE),
            "marker {} outside the convention namespace",
            info.canonical
        );
        assert!(info.canonical.ends_with("Attribute"));

        if let Some(prev) = seen.insert(info.canonical, info.id) {
            panic!("duplicate marker name {:?}: {:?} and {:?}", info.canonical, prev, info.id);
        }
    }
}

#[test]
fn every_role_has_a_registered_marker() {
    for role in LifecycleRole::ALL {
        let name = markers::as_str(role.marker());
        assert_eq!(markers::from_str(name), Some(role.marker()));
    }
}

#[test]
fn context_members_are_unique() {
    for (i, a) in CONTEXT_MEMBERS.iter().enumerate() {
        for b in &CONTEXT_MEMBERS[i + 1..] {
            assert_ne!(a, b, "duplicate context member {}", a.name);
        }
    }
}

#[test]
fn both_layouts_expose_the_outcome() {
    for layout in SupportLayout::ALL {
        let outcome = layout
            .interop_members()
            .iter()
            .find(|m| m.name == "CurrentTestOutcome")
            .expect("layout without CurrentTestOutcome");
        assert!(layouts::is_served(outcome));
    }
}

#[test]
fn known_context_modules_cover_both_layouts() {
    let modules: Vec<_> = layouts::known_context_modules().collect();
    assert_eq!(modules.len(), 2);
    assert!(modules.contains(&"Microsoft.VisualStudio.QualityTools.UnitTestFramework"));
}
