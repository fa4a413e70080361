//! Context bridge.
//!
//! Test code expects a context object of an interop type that belongs to whichever support-library layout it was
//! built against. The runner has no compile-time reference to that type. Instead, [`ContextBridge::build`] locates
//! the interop type in the loaded modules, compares its members with what the run's [`ContextScope`] can serve, and
//! remembers the intersection. [`TestContextProxy`] is the statically defined adapter handed to test code:
//! - typed accessors for the members the engine itself relies on, and
//! - a dynamic `get`/`call` surface that only answers for bridged members, so members missing from the linked layout
//!   are simply absent.

use std::collections::BTreeMap;
use std::rc::Rc;

use attrun_core::layouts::{self, INTEROP_CONTEXT_TYPE};
use attrun_core::{MemberKind, UnitTestOutcome};
use miette::Diagnostic;
use thiserror::Error;

use super::context::ContextScope;
use crate::metadata::{InteropMember, MetadataProvider};

const WRITE_LINE: &str = "WriteLine";
const WRITE_LINE_TEXT: &str = "(System.String)->System.Void";
const WRITE_LINE_FORMAT: &str = "(System.String,System.Object[])->System.Void";
const ADD_RESULT_FILE: &str = "AddResultFile";

#[derive(Debug, Error, Diagnostic)]
pub enum BridgeError {
    #[error("unit '{assembly}' is not linked against a supported test framework: no loaded module declares {}", INTEROP_CONTEXT_TYPE)]
    #[diagnostic(
        code(attrun::bridge::interop_type_not_found),
        help("reference Microsoft.VisualStudio.QualityTools.UnitTestFramework or Microsoft.VisualStudio.TestPlatform.TestFramework.Extensions")
    )]
    InteropTypeNotFound { assembly: String },
}

/// The interop members that can be forwarded to the run's context state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBridge {
    module: String,
    bridged: Vec<InteropMember>,
    omitted: Vec<InteropMember>,
}

impl ContextBridge {
    /// Locate the interop context type and decide which of its members to forward.
    ///
    /// `assembly` only names the unit in the error.
    pub fn build(provider: &dyn MetadataProvider, assembly: &str) -> Result<Self, BridgeError> {
        let known: Vec<&str> = layouts::known_context_modules().collect();

        let interop = provider
            .loaded_modules()
            .into_iter()
            .filter(|module| known.contains(&module.name.as_str()))
            .find_map(|module| provider.find_type(&module, INTEROP_CONTEXT_TYPE))
            .ok_or_else(|| BridgeError::InteropTypeNotFound {
                assembly: assembly.to_string(),
            })?;

        let (bridged, omitted): (Vec<_>, Vec<_>) = interop.members.into_iter().partition(is_served);
        for member in &omitted {
            tracing::debug!(module = %interop.module, member = %member.name, "context member not bridged");
        }

        Ok(Self {
            module: interop.module,
            bridged,
            omitted,
        })
    }

    /// Module the interop type was found in.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn bridged(&self) -> &[InteropMember] {
        &self.bridged
    }

    pub fn omitted(&self) -> &[InteropMember] {
        &self.omitted
    }

    fn has(&self, name: &str, kind: MemberKind, signature: Option<&str>) -> bool {
        self.bridged
            .iter()
            .any(|m| m.name == name && m.kind == kind && signature.is_none_or(|s| m.signature == s))
    }
}

fn is_served(member: &InteropMember) -> bool {
    layouts::CONTEXT_MEMBERS
        .iter()
        .any(|served| served.name == member.name && served.kind == member.kind && served.signature == member.signature)
}

/// Value of a bridged context property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextValue {
    Text(String),
    Outcome(UnitTestOutcome),
    Properties(BTreeMap<String, String>),
}

/// Adapter object handed to test code in place of the interop context type.
#[derive(Debug, Clone)]
pub struct TestContextProxy {
    scope: ContextScope,
    bridge: Rc<ContextBridge>,
}

impl TestContextProxy {
    pub fn new(scope: ContextScope, bridge: Rc<ContextBridge>) -> Self {
        Self { scope, bridge }
    }

    pub fn outcome(&self) -> UnitTestOutcome {
        self.scope.outcome()
    }

    pub fn fully_qualified_test_class_name(&self) -> String {
        self.scope.read(|f| f.class_full_name.clone()).unwrap_or_default()
    }

    pub fn test_name(&self) -> String {
        self.scope.read(|f| f.test_name.clone()).unwrap_or_default()
    }

    pub fn test_run_directory(&self) -> String {
        self.scope.directories().test_run
    }

    pub fn deployment_directory(&self) -> String {
        self.scope.directories().deployment
    }

    pub fn results_directory(&self) -> String {
        self.scope.directories().results
    }

    pub fn properties(&self) -> BTreeMap<String, String> {
        self.scope.read(|f| f.properties.clone()).unwrap_or_default()
    }

    pub fn set_property(&self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        self.scope.write(|f| {
            f.properties.insert(key, value);
        });
    }

    pub fn write_line(&self, message: impl Into<String>) {
        self.scope.trace(message);
    }

    pub fn add_result_file(&self, path: impl Into<String>) {
        let path = path.into();
        self.scope.write(|f| f.result_files.push(path));
    }

    /// Whether the linked layout's context type has a bridged member called `name`.
    pub fn supports(&self, name: &str) -> bool {
        self.bridge.bridged.iter().any(|m| m.name == name)
    }

    /// Read a bridged property by its interop name.
    pub fn get(&self, name: &str) -> Option<ContextValue> {
        if !self.bridge.has(name, MemberKind::Property, None) {
            return None;
        }
        let dirs = || self.scope.directories();
        let value = match name {
            "CurrentTestOutcome" => ContextValue::Outcome(self.outcome()),
            "FullyQualifiedTestClassName" => ContextValue::Text(self.fully_qualified_test_class_name()),
            "TestName" => ContextValue::Text(self.test_name()),
            "Properties" => ContextValue::Properties(self.properties()),
            "TestRunDirectory" | "TestDir" => ContextValue::Text(dirs().test_run),
            "DeploymentDirectory" | "TestDeploymentDir" => ContextValue::Text(dirs().deployment),
            "ResultsDirectory" | "TestRunResultsDirectory" | "TestResultsDirectory" | "TestLogsDir" => {
                ContextValue::Text(dirs().results)
            }
            _ => return None,
        };
        Some(value)
    }

    /// Call a bridged method by its interop name. Returns `None` if no bridged overload accepts `args`.
    pub fn call(&self, name: &str, args: &[String]) -> Option<()> {
        match (name, args) {
            (WRITE_LINE, [text]) if self.bridge.has(WRITE_LINE, MemberKind::Method, Some(WRITE_LINE_TEXT)) => {
                self.write_line(text.clone());
            }
            (WRITE_LINE, [format, rest @ ..])
                if self.bridge.has(WRITE_LINE, MemberKind::Method, Some(WRITE_LINE_FORMAT)) =>
            {
                self.write_line(format_placeholders(format, rest));
            }
            (ADD_RESULT_FILE, [path]) if self.bridge.has(ADD_RESULT_FILE, MemberKind::Method, None) => {
                self.add_result_file(path.clone());
            }
            _ => return None,
        }
        Some(())
    }
}

/// Substitute `{0}`, `{1}`, ... in `format` with `args`.
fn format_placeholders(format: &str, args: &[String]) -> String {
    args.iter()
        .enumerate()
        .fold(format.to_string(), |text, (i, arg)| text.replace(&format!("{{{i}}}"), arg))
}
