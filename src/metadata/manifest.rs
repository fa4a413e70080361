//! Reference metadata provider reading JSON unit manifests.
//!
//! A unit manifest describes the test-facing surface of a compiled unit: the support modules it references, its
//! exception types and its types with their markers, properties and methods. Method bodies are short action lists
//! that the provider interprets when the runner invokes them.
//!
//! ```json
//! {
//!   "format": "attrun-unit/1",
//!   "name": "Sample.Tests",
//!   "references": ["Microsoft.VisualStudio.TestPlatform.TestFramework.Extensions"],
//!   "types": [{
//!     "name": "Sample.MathTests",
//!     "markers": ["Microsoft.VisualStudio.TestTools.UnitTesting.TestClassAttribute"],
//!     "methods": [{
//!       "name": "Adds",
//!       "markers": ["Microsoft.VisualStudio.TestTools.UnitTesting.TestMethodAttribute"],
//!       "body": [{ "print": "adding" }]
//!     }]
//!   }]
//! }
//! ```
//!
//! Files that are not manifests at all are reported as [`LoadError::BadImageFormat`]; manifests that cannot be
//! decoded are [`LoadError::Malformed`].

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use attrun_core::layouts::INTEROP_CONTEXT_TYPE;
use attrun_core::markers::{ASSERT_FAILED_EXCEPTION, UNIT_TEST_ASSERT_EXCEPTION};
use attrun_core::{SupportLayout, UnitTestOutcome};
use serde::Deserialize;

use super::{
    Argument, BASE_EXCEPTION, Instance, InteropMember, InteropTypeDef, LoadError, Marker, MarkerArg, MetadataProvider,
    MethodDef, ModuleDef, ParameterDef, PropertyDef, Staticness, ThrownError, Token, TypeDef, Visibility,
};
use crate::engine::bridge::{ContextValue, TestContextProxy};
use crate::unit_config;

/// Value of the `format` field every manifest must carry.
pub const MANIFEST_FORMAT: &str = "attrun-unit/1";

/// Name of the method run by [`MetadataProvider::construct`], if declared.
pub const CONSTRUCTOR: &str = ".ctor";

const NULL_TEXT: &str = "(null)";

/// Exception types every unit can throw without declaring them, with their base types.
const BUILTIN_EXCEPTIONS: &[(&str, &str)] = &[
    ("System.SystemException", BASE_EXCEPTION),
    ("System.ApplicationException", BASE_EXCEPTION),
    ("System.InvalidOperationException", "System.SystemException"),
    ("System.ArgumentException", "System.SystemException"),
    ("System.ArgumentNullException", "System.ArgumentException"),
    ("System.ArgumentOutOfRangeException", "System.ArgumentException"),
    ("System.NotImplementedException", "System.SystemException"),
    ("System.NotSupportedException", "System.SystemException"),
    ("System.NullReferenceException", "System.SystemException"),
    ("System.InvalidCastException", "System.SystemException"),
    ("System.MemberAccessException", "System.SystemException"),
    ("System.MissingMemberException", "System.MemberAccessException"),
    ("System.MissingMethodException", "System.MissingMemberException"),
    (UNIT_TEST_ASSERT_EXCEPTION, BASE_EXCEPTION),
    (ASSERT_FAILED_EXCEPTION, UNIT_TEST_ASSERT_EXCEPTION),
];

/// Upper bound on base-type chains, so cyclic declarations terminate.
const MAX_HIERARCHY_DEPTH: usize = 32;

// ============================================================================
// Manifest format
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitManifest {
    pub format: String,
    /// Module name; defaults to the file stem.
    #[serde(default)]
    pub name: Option<String>,
    /// Names of the support modules the unit links against.
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub exception_types: Vec<ExceptionTypeDecl>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExceptionTypeDecl {
    pub name: String,
    #[serde(default = "base_exception")]
    pub base: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub markers: Vec<MarkerDecl>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    /// Simulates a type whose definition cannot be loaded.
    #[serde(default)]
    pub load_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MarkerDecl {
    Name(String),
    WithArgs {
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default)]
        args: BTreeMap<String, MarkerArg>,
    },
}

impl MarkerDecl {
    fn to_marker(&self) -> Marker {
        match self {
            MarkerDecl::Name(name) => Marker::new(name.clone()),
            MarkerDecl::WithArgs { type_name, args } => args
                .iter()
                .fold(Marker::new(type_name.clone()), |marker, (name, value)| {
                    marker.with_arg(name.clone(), value.clone())
                }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default = "yes")]
    pub public: bool,
    #[serde(default = "yes")]
    pub public_setter: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParameterDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default = "yes")]
    pub public: bool,
    #[serde(default)]
    pub markers: Vec<MarkerDecl>,
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
    #[serde(default)]
    pub body: Vec<Action>,
}

/// One or more strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Texts {
    One(String),
    Many(Vec<String>),
}

impl Texts {
    fn to_vec(&self) -> Vec<String> {
        match self {
            Texts::One(text) => vec![text.clone()],
            Texts::Many(texts) => texts.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrowDecl {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub help_link: Option<String>,
    #[serde(default)]
    pub inner: Option<Box<ThrowDecl>>,
}

/// A statement in a method body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Throw(ThrowDecl),
    /// `TestContext.WriteLine`; a single string or a format string followed by its arguments.
    WriteLine(Texts),
    /// Write a line to standard output.
    Print(String),
    /// Write a line to standard error.
    Eprint(String),
    SetField {
        name: String,
        value: String,
    },
    /// Fails unless the instance field equals `equals`; a missing `equals` requires the field to be unset.
    AssertField {
        name: String,
        #[serde(default)]
        equals: Option<String>,
    },
    AssertOutcome(UnitTestOutcome),
    /// Fails unless the active unit configuration has the app setting.
    AssertSetting {
        key: String,
        #[serde(default)]
        equals: Option<String>,
    },
    /// Fails unless the context member reads as `equals`.
    AssertContext {
        member: String,
        equals: String,
    },
    SetContextProperty {
        name: String,
        value: String,
    },
    /// Abort with a provider-level panic.
    Panic(String),
}

fn base_exception() -> String {
    BASE_EXCEPTION.to_string()
}

fn yes() -> bool {
    true
}

// ============================================================================
// Provider
// ============================================================================

/// State of an instance constructed by [`ManifestProvider`].
#[derive(Debug, Default)]
pub struct ManifestInstance {
    pub fields: BTreeMap<String, String>,
    pub context: Option<TestContextProxy>,
}

#[derive(Debug)]
enum LoadedModule {
    Unit(UnitManifest),
    Support,
}

#[derive(Debug, Default)]
struct ProviderState {
    modules: Vec<(ModuleDef, LoadedModule)>,
}

impl ProviderState {
    fn unit(&self, module: u32) -> Option<(&ModuleDef, &UnitManifest)> {
        match self.modules.get(module as usize)? {
            (def, LoadedModule::Unit(manifest)) => Some((def, manifest)),
            (_, LoadedModule::Support) => None,
        }
    }

    fn type_decl(&self, token: Token) -> Option<&TypeDecl> {
        self.unit(token.module)?.1.types.get(token.item as usize)
    }

    fn method_decl(&self, token: Token) -> Option<&MethodDecl> {
        self.type_decl(token)?.methods.get(token.member as usize)
    }

    fn by_path(&self, path: &Path) -> Option<&ModuleDef> {
        self.modules.iter().map(|(def, _)| def).find(|def| def.path == path)
    }

    fn has_module(&self, name: &str) -> bool {
        self.modules.iter().any(|(def, _)| def.name == name)
    }

    fn push(&mut self, name: String, path: PathBuf, module: LoadedModule) -> ModuleDef {
        let def = ModuleDef {
            token: Token {
                module: self.modules.len() as u32,
                item: 0,
                member: 0,
            },
            name,
            path,
        };
        self.modules.push((def.clone(), module));
        def
    }
}

/// [`MetadataProvider`] over JSON unit manifests read from disk or registered in memory.
#[derive(Debug, Default)]
pub struct ManifestProvider {
    registered: RefCell<HashMap<PathBuf, String>>,
    state: RefCell<ProviderState>,
}

impl ManifestProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `manifest` for `path` instead of reading the file system.
    pub fn register(&self, path: impl Into<PathBuf>, manifest: impl Into<String>) {
        self.registered.borrow_mut().insert(path.into(), manifest.into());
    }

    fn read(&self, path: &Path) -> Result<String, LoadError> {
        if let Some(text) = self.registered.borrow().get(path) {
            return Ok(text.clone());
        }
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        fs::read_to_string(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::InvalidData => LoadError::BadImageFormat {
                path: path.to_path_buf(),
                reason: "not a text file".to_string(),
            },
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })
    }

    fn method_body(&self, method: &MethodDef) -> Option<(String, Vec<Action>, Vec<ExceptionTypeDecl>)> {
        let state = self.state.borrow();
        let (module, manifest) = state.unit(method.token.module)?;
        let decl = state.method_decl(method.token)?;
        Some((module.name.clone(), decl.body.clone(), manifest.exception_types.clone()))
    }
}

/// Parse manifest text, separating "not a manifest" from "broken manifest".
pub fn parse_manifest(path: &Path, text: &str) -> Result<UnitManifest, LoadError> {
    let bad_format = |reason: String| LoadError::BadImageFormat {
        path: path.to_path_buf(),
        reason,
    };
    let value: serde_json::Value = serde_json::from_str(text).map_err(|_| bad_format("not a JSON document".into()))?;
    match value.get("format").and_then(serde_json::Value::as_str) {
        Some(MANIFEST_FORMAT) => {}
        Some(other) => return Err(bad_format(format!("unsupported manifest format '{other}'"))),
        None => return Err(bad_format(format!("missing \"format\": \"{MANIFEST_FORMAT}\""))),
    }
    serde_json::from_value(value).map_err(|err| LoadError::Malformed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

impl MetadataProvider for ManifestProvider {
    fn load_module(&self, path: &Path) -> Result<ModuleDef, LoadError> {
        if let Some(loaded) = self.state.borrow().by_path(path) {
            return Ok(loaded.clone());
        }

        let text = self.read(path)?;
        let manifest = parse_manifest(path, &text)?;
        let name = manifest.name.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        let mut state = self.state.borrow_mut();
        for reference in &manifest.references {
            if !state.has_module(reference) {
                tracing::trace!(module = %reference, "loading referenced support module");
                state.push(reference.clone(), PathBuf::from(reference), LoadedModule::Support);
            }
        }
        tracing::debug!(module = %name, types = manifest.types.len(), "loaded unit manifest");
        Ok(state.push(name, path.to_path_buf(), LoadedModule::Unit(manifest)))
    }

    fn enumerate_types(&self, module: &ModuleDef) -> Result<Vec<TypeDef>, LoadError> {
        let state = self.state.borrow();
        let Some((def, manifest)) = state.unit(module.token.module) else {
            return Ok(Vec::new());
        };
        manifest
            .types
            .iter()
            .enumerate()
            .map(|(item, ty)| match &ty.load_error {
                Some(reason) => Err(LoadError::TypeLoad {
                    module: def.name.clone(),
                    type_name: ty.name.clone(),
                    reason: reason.clone(),
                }),
                None => Ok(TypeDef {
                    token: Token {
                        module: module.token.module,
                        item: item as u32,
                        member: 0,
                    },
                    full_name: ty.name.clone(),
                }),
            })
            .collect()
    }

    fn enumerate_methods(&self, ty: &TypeDef, visibility: Visibility, staticness: Staticness) -> Vec<MethodDef> {
        let state = self.state.borrow();
        let Some(decl) = state.type_decl(ty.token) else {
            return Vec::new();
        };
        decl.methods
            .iter()
            .enumerate()
            .filter(|(_, m)| m.name != CONSTRUCTOR && visibility.admits(m.public) && staticness.admits(m.is_static))
            .map(|(member, m)| MethodDef {
                token: Token {
                    member: member as u32,
                    ..ty.token
                },
                declaring_type: ty.full_name.clone(),
                name: m.name.clone(),
                is_static: m.is_static,
                is_public: m.public,
                parameters: m
                    .parameters
                    .iter()
                    .map(|p| ParameterDef {
                        name: p.name.clone(),
                        type_name: p.type_name.clone(),
                    })
                    .collect(),
            })
            .collect()
    }

    fn enumerate_properties(&self, ty: &TypeDef) -> Vec<PropertyDef> {
        let state = self.state.borrow();
        let Some(decl) = state.type_decl(ty.token) else {
            return Vec::new();
        };
        decl.properties
            .iter()
            .enumerate()
            .map(|(member, p)| PropertyDef {
                token: Token {
                    member: member as u32,
                    ..ty.token
                },
                declaring_type: ty.full_name.clone(),
                name: p.name.clone(),
                type_name: p.type_name.clone(),
                is_static: p.is_static,
                is_public: p.public,
                has_public_setter: p.public_setter,
            })
            .collect()
    }

    fn type_markers(&self, ty: &TypeDef) -> Vec<Marker> {
        let state = self.state.borrow();
        state
            .type_decl(ty.token)
            .map(|decl| decl.markers.iter().map(MarkerDecl::to_marker).collect())
            .unwrap_or_default()
    }

    fn method_markers(&self, method: &MethodDef) -> Vec<Marker> {
        let state = self.state.borrow();
        state
            .method_decl(method.token)
            .map(|decl| decl.markers.iter().map(MarkerDecl::to_marker).collect())
            .unwrap_or_default()
    }

    fn loaded_modules(&self) -> Vec<ModuleDef> {
        self.state.borrow().modules.iter().map(|(def, _)| def.clone()).collect()
    }

    fn find_type(&self, module: &ModuleDef, full_name: &str) -> Option<InteropTypeDef> {
        let state = self.state.borrow();
        let (def, LoadedModule::Support) = state.modules.get(module.token.module as usize)? else {
            return None;
        };
        let layout = SupportLayout::from_module_name(&def.name)?;
        if full_name != INTEROP_CONTEXT_TYPE || layout.context_module() != def.name {
            return None;
        }
        Some(InteropTypeDef {
            module: def.name.clone(),
            full_name: full_name.to_string(),
            members: layout
                .interop_members()
                .iter()
                .map(|m| InteropMember {
                    name: m.name.to_string(),
                    kind: m.kind,
                    signature: m.signature.to_string(),
                })
                .collect(),
        })
    }

    fn construct(&self, ty: &TypeDef) -> Result<Instance, ThrownError> {
        let constructor = {
            let state = self.state.borrow();
            state.type_decl(ty.token).and_then(|decl| {
                decl.methods
                    .iter()
                    .position(|m| m.name == CONSTRUCTOR && !m.is_static)
                    .map(|member| MethodDef {
                        token: Token {
                            member: member as u32,
                            ..ty.token
                        },
                        declaring_type: ty.full_name.clone(),
                        name: CONSTRUCTOR.to_string(),
                        is_static: false,
                        is_public: true,
                        parameters: Vec::new(),
                    })
            })
        };

        let mut instance = Instance::new(ManifestInstance::default());
        if let Some(constructor) = constructor {
            self.invoke(&constructor, Some(&mut instance), &[])?;
        }
        Ok(instance)
    }

    fn set_property(
        &self,
        instance: &mut Instance,
        property: &PropertyDef,
        value: Argument,
    ) -> Result<(), ThrownError> {
        let state = instance
            .downcast_mut::<ManifestInstance>()
            .ok_or_else(|| ThrownError::new("System.InvalidCastException", "instance was not created by this unit"))?;
        if property.type_name != INTEROP_CONTEXT_TYPE {
            return Err(ThrownError::new(
                "System.NotSupportedException",
                format!("property '{}' cannot be set by the runner", property.name),
            ));
        }
        state.context = match value {
            Argument::Context(proxy) => Some(proxy),
            Argument::Null => None,
        };
        Ok(())
    }

    fn invoke(&self, method: &MethodDef, instance: Option<&mut Instance>, args: &[Argument]) -> Result<(), ThrownError> {
        let Some((module, body, exception_types)) = self.method_body(method) else {
            return Err(ThrownError::new(
                "System.MissingMethodException",
                format!("Method not found: {}.{}", method.declaring_type, method.name),
            ));
        };

        let mut state = instance.and_then(|i| i.downcast_mut::<ManifestInstance>());
        let context = args
            .iter()
            .find_map(|arg| match arg {
                Argument::Context(proxy) => Some(proxy.clone()),
                Argument::Null => None,
            })
            .or_else(|| state.as_ref().and_then(|s| s.context.clone()));

        let frame = Frame {
            module: &module,
            method,
            exception_types: &exception_types,
        };
        for (index, action) in body.iter().enumerate() {
            frame
                .run(action, state.as_deref_mut(), context.as_ref())
                .map_err(|thrown| frame.locate(thrown, index))?;
        }
        Ok(())
    }
}

// ============================================================================
// Interpreter
// ============================================================================

struct Frame<'a> {
    module: &'a str,
    method: &'a MethodDef,
    exception_types: &'a [ExceptionTypeDecl],
}

impl Frame<'_> {
    fn run(
        &self,
        action: &Action,
        instance: Option<&mut ManifestInstance>,
        context: Option<&TestContextProxy>,
    ) -> Result<(), ThrownError> {
        match action {
            Action::Throw(decl) => Err(self.thrown(decl)),
            Action::WriteLine(texts) => {
                let context = require_context(context)?;
                context.call("WriteLine", &texts.to_vec()).ok_or_else(|| {
                    ThrownError::new(
                        "System.MissingMethodException",
                        format!("Method not found: {INTEROP_CONTEXT_TYPE}.WriteLine"),
                    )
                })
            }
            Action::Print(text) => {
                println!("{text}");
                Ok(())
            }
            Action::Eprint(text) => {
                eprintln!("{text}");
                Ok(())
            }
            Action::SetField { name, value } => {
                require_instance(instance)?.fields.insert(name.clone(), value.clone());
                Ok(())
            }
            Action::AssertField { name, equals } => {
                let actual = require_instance(instance)?.fields.get(name).cloned();
                assert_equal(equals.as_deref(), actual.as_deref())
            }
            Action::AssertOutcome(expected) => {
                let actual = require_context(context)?.outcome();
                assert_equal(Some(expected.to_string().as_str()), Some(actual.to_string().as_str()))
            }
            Action::AssertSetting { key, equals } => assert_equal(equals.as_deref(), unit_config::app_setting(key)),
            Action::AssertContext { member, equals } => {
                let actual = match require_context(context)?.get(member) {
                    Some(ContextValue::Text(text)) => Some(text),
                    Some(ContextValue::Outcome(outcome)) => Some(outcome.to_string()),
                    Some(ContextValue::Properties(properties)) => Some(format!("{properties:?}")),
                    None => None,
                };
                assert_equal(Some(equals.as_str()), actual.as_deref())
            }
            Action::SetContextProperty { name, value } => {
                require_context(context)?.set_property(name.clone(), value.clone());
                Ok(())
            }
            Action::Panic(message) => panic!("{message}"),
        }
    }

    fn thrown(&self, decl: &ThrowDecl) -> ThrownError {
        let mut thrown = ThrownError::with_hierarchy(self.hierarchy(&decl.type_name), decl.message.clone());
        thrown.data = decl.data.clone();
        thrown.stack_trace = decl.stack_trace.clone();
        thrown.source = decl.source.clone();
        thrown.help_link = decl.help_link.clone();
        thrown.inner = decl.inner.as_ref().map(|inner| Box::new(self.thrown(inner)));
        thrown
    }

    /// `type_name` followed by its base types, ending at [`BASE_EXCEPTION`].
    fn hierarchy(&self, type_name: &str) -> Vec<String> {
        let mut hierarchy = vec![type_name.to_string()];
        let mut current = type_name.to_string();
        while current != BASE_EXCEPTION && hierarchy.len() < MAX_HIERARCHY_DEPTH {
            let base = self
                .exception_types
                .iter()
                .find(|decl| decl.name == current)
                .map(|decl| decl.base.clone())
                .or_else(|| {
                    BUILTIN_EXCEPTIONS
                        .iter()
                        .find(|(name, _)| *name == current)
                        .map(|(_, base)| base.to_string())
                })
                .unwrap_or_else(base_exception);
            if hierarchy.contains(&base) {
                break;
            }
            hierarchy.push(base.clone());
            current = base;
        }
        if hierarchy.last().map(String::as_str) != Some(BASE_EXCEPTION) {
            hierarchy.push(base_exception());
        }
        hierarchy
    }

    /// Fill in where the error was thrown, unless it says so itself.
    fn locate(&self, mut thrown: ThrownError, index: usize) -> ThrownError {
        if thrown.stack_trace.is_none() {
            thrown.stack_trace = Some(format!(
                "   at {}.{}() in {}:line {}",
                self.method.declaring_type,
                self.method.name,
                self.module,
                index + 1
            ));
        }
        if thrown.source.is_none() {
            thrown.source = Some(self.module.to_string());
        }
        thrown
    }
}

fn require_context(context: Option<&TestContextProxy>) -> Result<&TestContextProxy, ThrownError> {
    context.ok_or_else(|| {
        ThrownError::with_hierarchy(
            vec![
                "System.NullReferenceException".into(),
                "System.SystemException".into(),
                BASE_EXCEPTION.into(),
            ],
            "Object reference not set to an instance of an object. (TestContext)",
        )
    })
}

fn require_instance(instance: Option<&mut ManifestInstance>) -> Result<&mut ManifestInstance, ThrownError> {
    instance.ok_or_else(|| {
        ThrownError::with_hierarchy(
            vec![
                "System.InvalidOperationException".into(),
                "System.SystemException".into(),
                BASE_EXCEPTION.into(),
            ],
            "instance fields are not available in a static method",
        )
    })
}

fn assert_equal(expected: Option<&str>, actual: Option<&str>) -> Result<(), ThrownError> {
    if expected == actual {
        return Ok(());
    }
    Err(ThrownError::with_hierarchy(
        vec![
            ASSERT_FAILED_EXCEPTION.into(),
            UNIT_TEST_ASSERT_EXCEPTION.into(),
            BASE_EXCEPTION.into(),
        ],
        format!(
            "Assert.AreEqual failed. Expected:<{}>. Actual:<{}>.",
            expected.unwrap_or(NULL_TEXT),
            actual.unwrap_or(NULL_TEXT)
        ),
    ))
}
