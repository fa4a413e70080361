//! Marker vocabulary registry.
//!
//! This module is the single source of truth for the fully-qualified names of the convention's markers: a stable
//! identifier ([`MarkerId`]) plus a const metadata table ([`MARKERS`]).
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive** and exact. Both the legacy single-module and the split-module
//!   layouts of the support library declare their markers in the same namespace, so one spelling covers both.
//! - Lifecycle roles ([`LifecycleRole`]) are the subset of markers that give a method a singular job in the
//!   run. A method may carry at most one role.
//!
//! ## Examples
//! ```rust
//! use attrun_core::markers::{self, MarkerId};
//!
//! let name = "Microsoft.VisualStudio.TestTools.UnitTesting.TestMethodAttribute";
//! assert_eq!(markers::from_str(name), Some(MarkerId::TestMethod));
//! assert_eq!(markers::as_str(MarkerId::TestMethod), name);
//! ```

/// Namespace shared by every marker of the convention.
pub const MARKER_NAMESPACE: &str = "Microsoft.VisualStudio.TestTools.UnitTesting";

/// Named argument of the expected-exception marker carrying the expected type name.
pub const EXPECTED_EXCEPTION_TYPE_ARG: &str = "exceptionType";

/// Named argument of the expected-exception marker allowing derived exception types.
pub const ALLOW_DERIVED_TYPES_ARG: &str = "allowDerivedTypes";

/// Base type of every exception thrown by the convention's assertions.
pub const UNIT_TEST_ASSERT_EXCEPTION: &str = "Microsoft.VisualStudio.TestTools.UnitTesting.UnitTestAssertException";

/// Exception type thrown by a failed assertion.
pub const ASSERT_FAILED_EXCEPTION: &str = "Microsoft.VisualStudio.TestTools.UnitTesting.AssertFailedException";

/// Stable identifier for every recognized marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerId {
    // Containers and entry points
    TestClass,
    TestMethod,

    // Lifecycle hooks
    AssemblyInitialize,
    AssemblyCleanup,
    ClassInitialize,
    ClassCleanup,
    TestInitialize,
    TestCleanup,

    // Modifiers
    Ignore,
    ExpectedException,
}

/// Metadata entry for a marker.
#[derive(Debug, Clone, Copy)]
pub struct MarkerInfo {
    pub id: MarkerId,
    /// Fully-qualified type name, as reported by the metadata provider.
    pub canonical: &'static str,
    pub description: &'static str,
}

/// Registry of recognized markers.
pub const MARKERS: &[MarkerInfo] = &[
    info(
        MarkerId::TestClass,
        "Microsoft.VisualStudio.TestTools.UnitTesting.TestClassAttribute",
        "Mark a type as a test container.",
    ),
    info(
        MarkerId::TestMethod,
        "Microsoft.VisualStudio.TestTools.UnitTesting.TestMethodAttribute",
        "Mark an instance method as a test entry point.",
    ),
    info(
        MarkerId::AssemblyInitialize,
        "Microsoft.VisualStudio.TestTools.UnitTesting.AssemblyInitializeAttribute",
        "Run a static method once before the first test of the unit.",
    ),
    info(
        MarkerId::AssemblyCleanup,
        "Microsoft.VisualStudio.TestTools.UnitTesting.AssemblyCleanupAttribute",
        "Run a static method once after the last class of the unit.",
    ),
    info(
        MarkerId::ClassInitialize,
        "Microsoft.VisualStudio.TestTools.UnitTesting.ClassInitializeAttribute",
        "Run a static method once before the first test of its class.",
    ),
    info(
        MarkerId::ClassCleanup,
        "Microsoft.VisualStudio.TestTools.UnitTesting.ClassCleanupAttribute",
        "Run a static method once after the last test of its class.",
    ),
    info(
        MarkerId::TestInitialize,
        "Microsoft.VisualStudio.TestTools.UnitTesting.TestInitializeAttribute",
        "Run an instance method before every test of its class.",
    ),
    info(
        MarkerId::TestCleanup,
        "Microsoft.VisualStudio.TestTools.UnitTesting.TestCleanupAttribute",
        "Run an instance method after every test of its class.",
    ),
    info(
        MarkerId::Ignore,
        "Microsoft.VisualStudio.TestTools.UnitTesting.IgnoreAttribute",
        "Suppress execution of a class or method while still reporting it.",
    ),
    info(
        MarkerId::ExpectedException,
        "Microsoft.VisualStudio.TestTools.UnitTesting.ExpectedExceptionAttribute",
        "Declare that a test passes by throwing a specific exception type.",
    ),
];

/// Resolve a fully-qualified marker name to its stable id.
pub fn from_str(name: &str) -> Option<MarkerId> {
    MARKERS.iter().find(|m| m.canonical == name).map(|m| m.id)
}

/// Return the fully-qualified name for a marker.
pub fn as_str(id: MarkerId) -> &'static str {
    info_for(id).canonical
}

/// Return the metadata entry for a marker.
pub fn info_for(id: MarkerId) -> &'static MarkerInfo {
    // Every variant has exactly one row; `registry_guardrails` keeps it that way.
    match MARKERS.iter().find(|m| m.id == id) {
        Some(info) => info,
        None => unreachable!("marker info missing for {id:?}"),
    }
}

const fn info(id: MarkerId, canonical: &'static str, description: &'static str) -> MarkerInfo {
    MarkerInfo {
        id,
        canonical,
        description,
    }
}

/// A singular job a method can have in the run.
///
/// Hook roles allow at most one method per scope. `TestMethod` is the only role allowing many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleRole {
    TestMethod,
    AssemblyInitialize,
    AssemblyCleanup,
    ClassInitialize,
    ClassCleanup,
    TestInitialize,
    TestCleanup,
}

impl LifecycleRole {
    pub const ALL: [LifecycleRole; 7] = [
        LifecycleRole::TestMethod,
        LifecycleRole::AssemblyInitialize,
        LifecycleRole::AssemblyCleanup,
        LifecycleRole::ClassInitialize,
        LifecycleRole::ClassCleanup,
        LifecycleRole::TestInitialize,
        LifecycleRole::TestCleanup,
    ];

    /// The marker that assigns this role.
    pub fn marker(self) -> MarkerId {
        match self {
            LifecycleRole::TestMethod => MarkerId::TestMethod,
            LifecycleRole::AssemblyInitialize => MarkerId::AssemblyInitialize,
            LifecycleRole::AssemblyCleanup => MarkerId::AssemblyCleanup,
            LifecycleRole::ClassInitialize => MarkerId::ClassInitialize,
            LifecycleRole::ClassCleanup => MarkerId::ClassCleanup,
            LifecycleRole::TestInitialize => MarkerId::TestInitialize,
            LifecycleRole::TestCleanup => MarkerId::TestCleanup,
        }
    }

    /// The role assigned by `marker`, if it assigns one.
    pub fn from_marker(marker: MarkerId) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.marker() == marker)
    }

    /// Whether a method with this role must be static.
    pub fn is_static(self) -> bool {
        matches!(
            self,
            LifecycleRole::AssemblyInitialize
                | LifecycleRole::AssemblyCleanup
                | LifecycleRole::ClassInitialize
                | LifecycleRole::ClassCleanup
        )
    }
}

impl std::fmt::Display for LifecycleRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleRole::TestMethod => "TestMethod",
            LifecycleRole::AssemblyInitialize => "AssemblyInitialize",
            LifecycleRole::AssemblyCleanup => "AssemblyCleanup",
            LifecycleRole::ClassInitialize => "ClassInitialize",
            LifecycleRole::ClassCleanup => "ClassCleanup",
            LifecycleRole::TestInitialize => "TestInitialize",
            LifecycleRole::TestCleanup => "TestCleanup",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_back_to_their_markers() {
        for role in LifecycleRole::ALL {
            assert_eq!(LifecycleRole::from_marker(role.marker()), Some(role));
        }
        assert_eq!(LifecycleRole::from_marker(MarkerId::Ignore), None);
        assert_eq!(LifecycleRole::from_marker(MarkerId::TestClass), None);
    }

    #[test]
    fn only_outer_hooks_are_static() {
        assert!(LifecycleRole::ClassInitialize.is_static());
        assert!(LifecycleRole::AssemblyCleanup.is_static());
        assert!(!LifecycleRole::TestInitialize.is_static());
        assert!(!LifecycleRole::TestMethod.is_static());
    }

    #[test]
    fn lookup_is_exact() {
        assert_eq!(from_str("TestMethodAttribute"), None);
        assert_eq!(
            from_str("microsoft.visualstudio.testtools.unittesting.TestMethodAttribute"),
            None
        );
    }
}
