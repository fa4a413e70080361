//! Support-library layouts and the interop `TestContext` surface.
//!
//! Test code is compiled against one of two incompatible layouts of the convention's support library. Both expose a
//! `TestContext` type under the same name but with different member sets. The tables here describe:
//! - which module names identify each layout ([`SupportLayout::modules`]),
//! - which members each layout's interop type declares ([`SupportLayout::interop_members`]), and
//! - which members the runner's own context state can serve ([`CONTEXT_MEMBERS`]).
//!
//! The context bridge forwards the intersection of an interop table and [`CONTEXT_MEMBERS`], matched on name, kind
//! and signature.

/// Fully-qualified name of the interop context type in both layouts.
pub const INTEROP_CONTEXT_TYPE: &str = "Microsoft.VisualStudio.TestTools.UnitTesting.TestContext";

/// Property or method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemberKind {
    Property,
    Method,
}

/// A member of a context surface, described by name and signature.
///
/// Property signatures are the property type. Method signatures are `(<params>)-><return>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticMember {
    pub name: &'static str,
    pub kind: MemberKind,
    pub signature: &'static str,
}

const STRING: &str = "System.String";
const OUTCOME: &str = "Microsoft.VisualStudio.TestTools.UnitTesting.UnitTestOutcome";
const DICTIONARY: &str = "System.Collections.IDictionary";

const fn property(name: &'static str, signature: &'static str) -> StaticMember {
    StaticMember {
        name,
        kind: MemberKind::Property,
        signature,
    }
}

const fn method(name: &'static str, signature: &'static str) -> StaticMember {
    StaticMember {
        name,
        kind: MemberKind::Method,
        signature,
    }
}

/// Members served by the runner's context state.
pub const CONTEXT_MEMBERS: &[StaticMember] = &[
    property("Properties", DICTIONARY),
    property("CurrentTestOutcome", OUTCOME),
    property("FullyQualifiedTestClassName", STRING),
    property("TestName", STRING),
    property("TestRunDirectory", STRING),
    property("DeploymentDirectory", STRING),
    property("ResultsDirectory", STRING),
    property("TestRunResultsDirectory", STRING),
    property("TestResultsDirectory", STRING),
    property("TestDeploymentDir", STRING),
    property("TestDir", STRING),
    property("TestLogsDir", STRING),
    method("WriteLine", "(System.String)->System.Void"),
    method("WriteLine", "(System.String,System.Object[])->System.Void"),
    method("AddResultFile", "(System.String)->System.Void"),
];

const LEGACY_MEMBERS: &[StaticMember] = &[
    property("Properties", DICTIONARY),
    property("CurrentTestOutcome", OUTCOME),
    property("FullyQualifiedTestClassName", STRING),
    property("TestName", STRING),
    property("TestRunDirectory", STRING),
    property("DeploymentDirectory", STRING),
    property("ResultsDirectory", STRING),
    property("TestRunResultsDirectory", STRING),
    property("TestResultsDirectory", STRING),
    property("TestDeploymentDir", STRING),
    property("TestDir", STRING),
    property("TestLogsDir", STRING),
    property("DataRow", "System.Data.DataRow"),
    property("DataConnection", "System.Data.Common.DbConnection"),
    method("WriteLine", "(System.String,System.Object[])->System.Void"),
    method("AddResultFile", "(System.String)->System.Void"),
    method("BeginTimer", "(System.String)->System.Void"),
    method("EndTimer", "(System.String)->System.Void"),
];

const SPLIT_MEMBERS: &[StaticMember] = &[
    property("Properties", DICTIONARY),
    property("CurrentTestOutcome", OUTCOME),
    property("FullyQualifiedTestClassName", STRING),
    property("TestName", STRING),
    property("TestRunDirectory", STRING),
    property("DeploymentDirectory", STRING),
    property("ResultsDirectory", STRING),
    property("TestRunResultsDirectory", STRING),
    property("TestResultsDirectory", STRING),
    property("TestDeploymentDir", STRING),
    property("TestDir", STRING),
    property("TestLogsDir", STRING),
    method("WriteLine", "(System.String)->System.Void"),
    method("WriteLine", "(System.String,System.Object[])->System.Void"),
    method("Write", "(System.String)->System.Void"),
    method("Write", "(System.String,System.Object[])->System.Void"),
    method("AddResultFile", "(System.String)->System.Void"),
];

/// On-disk layout of the convention's support library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportLayout {
    /// Single-module layout.
    Legacy,
    /// Newer layout split into a framework module and an extensions module.
    Split,
}

impl SupportLayout {
    pub const ALL: [SupportLayout; 2] = [SupportLayout::Legacy, SupportLayout::Split];

    /// Module names belonging to this layout.
    pub fn modules(self) -> &'static [&'static str] {
        match self {
            SupportLayout::Legacy => &["Microsoft.VisualStudio.QualityTools.UnitTestFramework"],
            SupportLayout::Split => &[
                "Microsoft.VisualStudio.TestPlatform.TestFramework",
                "Microsoft.VisualStudio.TestPlatform.TestFramework.Extensions",
            ],
        }
    }

    /// The module of this layout that declares the interop context type.
    pub fn context_module(self) -> &'static str {
        match self {
            SupportLayout::Legacy => "Microsoft.VisualStudio.QualityTools.UnitTestFramework",
            SupportLayout::Split => "Microsoft.VisualStudio.TestPlatform.TestFramework.Extensions",
        }
    }

    /// Members declared by this layout's interop context type.
    pub fn interop_members(self) -> &'static [StaticMember] {
        match self {
            SupportLayout::Legacy => LEGACY_MEMBERS,
            SupportLayout::Split => SPLIT_MEMBERS,
        }
    }

    /// The layout a module name belongs to, if any.
    pub fn from_module_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|layout| layout.modules().contains(&name))
    }
}

/// Every module name that may declare the interop context type.
pub fn known_context_modules() -> impl Iterator<Item = &'static str> {
    SupportLayout::ALL.into_iter().map(SupportLayout::context_module)
}

/// Whether the runner's context state serves `member`.
pub fn is_served(member: &StaticMember) -> bool {
    CONTEXT_MEMBERS.contains(member)
}
