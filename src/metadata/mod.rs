//! Metadata provider boundary.
//!
//! The runner never binds to the types of the code under test. Everything it knows about a unit (its types,
//! methods, properties and markers) and everything it does to it (constructing instances, setting properties,
//! invoking methods) goes through the [`MetadataProvider`] trait defined here.
//!
//! Items handed out by a provider are plain descriptors carrying a provider-issued [`Token`]. The runner only passes
//! tokens back to the provider that issued them.
//!
//! ## Modules
//!
//! - `manifest` - reference provider reading JSON unit manifests

pub mod manifest;

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use attrun_core::MemberKind;
use attrun_events::{ExceptionInfo, StackFrameInfo};
use thiserror::Error;

use crate::engine::bridge::TestContextProxy;

/// Root of every exception hierarchy.
pub const BASE_EXCEPTION: &str = "System.Exception";

/// Provider-issued identity of a metadata item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token {
    pub module: u32,
    pub item: u32,
    pub member: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    NonPublic,
    Any,
}

impl Visibility {
    pub fn admits(self, is_public: bool) -> bool {
        match self {
            Visibility::Public => is_public,
            Visibility::NonPublic => !is_public,
            Visibility::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staticness {
    Static,
    Instance,
    Any,
}

impl Staticness {
    pub fn admits(self, is_static: bool) -> bool {
        match self {
            Staticness::Static => is_static,
            Staticness::Instance => !is_static,
            Staticness::Any => true,
        }
    }
}

/// A loaded module: either a unit under test or a module it links against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDef {
    pub token: Token,
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub token: Token,
    /// Namespace-qualified name, e.g. `Sample.Tests.MathTests`.
    pub full_name: String,
}

impl TypeDef {
    /// The name without its namespace.
    pub fn name(&self) -> &str {
        self.full_name.rsplit('.').next().unwrap_or(&self.full_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDef {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
    pub token: Token,
    pub declaring_type: String,
    pub name: String,
    pub is_static: bool,
    pub is_public: bool,
    pub parameters: Vec<ParameterDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub token: Token,
    pub declaring_type: String,
    pub name: String,
    pub type_name: String,
    pub is_static: bool,
    pub is_public: bool,
    pub has_public_setter: bool,
}

/// Named argument value of a marker.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(untagged)]
pub enum MarkerArg {
    Bool(bool),
    Text(String),
}

/// A marker instance attached to a type or method.
///
/// Opaque to the runner apart from its fully-qualified type name and its named arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    type_name: String,
    args: BTreeMap<String, MarkerArg>,
}

impl Marker {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            args: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: MarkerArg) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn text_arg(&self, name: &str) -> Option<&str> {
        match self.args.get(name) {
            Some(MarkerArg::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn bool_arg(&self, name: &str) -> Option<bool> {
        match self.args.get(name) {
            Some(MarkerArg::Bool(value)) => Some(*value),
            _ => None,
        }
    }
}

/// A member of an interop type found in a loaded module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteropMember {
    pub name: String,
    pub kind: MemberKind,
    pub signature: String,
}

/// An externally-defined type located by name in a loaded module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteropTypeDef {
    pub module: String,
    pub full_name: String,
    pub members: Vec<InteropMember>,
}

/// Value passed to a method parameter or a property setter.
#[derive(Clone)]
pub enum Argument {
    Null,
    Context(TestContextProxy),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Null => f.write_str("Null"),
            Argument::Context(_) => f.write_str("Context(..)"),
        }
    }
}

/// An instance of a type under test, owned by the runner and interpreted by its provider.
pub struct Instance(Box<dyn Any>);

impl Instance {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.downcast_mut()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Instance(..)")
    }
}

/// An error thrown by code under test.
///
/// `type_hierarchy` lists the thrown type first and its base types after it, so subtype checks don't need the
/// provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrownError {
    pub type_hierarchy: Vec<String>,
    pub message: String,
    pub source: Option<String>,
    pub help_link: Option<String>,
    pub data: BTreeMap<String, String>,
    pub stack_trace: Option<String>,
    pub inner: Option<Box<ThrownError>>,
}

impl ThrownError {
    /// A thrown error of `type_name` deriving directly from [`BASE_EXCEPTION`].
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let mut type_hierarchy = vec![type_name];
        if type_hierarchy[0] != BASE_EXCEPTION {
            type_hierarchy.push(BASE_EXCEPTION.to_string());
        }
        Self::with_hierarchy(type_hierarchy, message)
    }

    pub fn with_hierarchy(type_hierarchy: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            type_hierarchy,
            message: message.into(),
            source: None,
            help_link: None,
            data: BTreeMap::new(),
            stack_trace: None,
            inner: None,
        }
    }

    pub fn full_name(&self) -> &str {
        self.type_hierarchy.first().map(String::as_str).unwrap_or(BASE_EXCEPTION)
    }

    /// Whether the thrown type is `type_name` or derives from it.
    pub fn is_a(&self, type_name: &str) -> bool {
        self.type_hierarchy.iter().any(|t| t == type_name)
    }

    /// Detach a portable snapshot, recursively including inner errors.
    pub fn snapshot(&self) -> ExceptionInfo {
        ExceptionInfo {
            full_name: self.full_name().to_string(),
            message: self.message.clone(),
            source: self.source.clone(),
            help_link: self.help_link.clone(),
            data: self.data.clone(),
            stack_trace: self
                .stack_trace
                .as_deref()
                .map(StackFrameInfo::parse_trace)
                .unwrap_or_default(),
            inner: self.inner.as_ref().map(|inner| Box::new(inner.snapshot())),
        }
    }
}

impl fmt::Display for ThrownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.full_name(), self.message)
    }
}

/// Errors that occur while loading a unit.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unit '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    /// Not a binary of the kind this provider reads.
    #[error("'{}' is not a test unit: {reason}", path.display())]
    BadImageFormat { path: PathBuf, reason: String },

    /// Claims to be a unit but cannot be read as one.
    #[error("unit '{}' is malformed: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("type '{type_name}' in module '{module}' failed to load: {reason}")]
    TypeLoad {
        module: String,
        type_name: String,
        reason: String,
    },

    #[error("I/O error reading '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Introspection and invocation facility over loaded units.
///
/// Implementations typically use interior mutability to track what they have loaded; the runner only ever holds a
/// shared reference and drives everything from a single thread.
pub trait MetadataProvider {
    /// Load the unit at `path`.
    fn load_module(&self, path: &Path) -> Result<ModuleDef, LoadError>;

    /// All types declared by `module`. Fails if any type cannot be fully loaded.
    fn enumerate_types(&self, module: &ModuleDef) -> Result<Vec<TypeDef>, LoadError>;

    fn enumerate_methods(&self, ty: &TypeDef, visibility: Visibility, staticness: Staticness) -> Vec<MethodDef>;

    fn enumerate_properties(&self, ty: &TypeDef) -> Vec<PropertyDef>;

    fn type_markers(&self, ty: &TypeDef) -> Vec<Marker>;

    fn method_markers(&self, method: &MethodDef) -> Vec<Marker>;

    /// Fully-qualified type name of a marker instance.
    fn fully_qualified_name<'m>(&self, marker: &'m Marker) -> &'m str {
        marker.type_name()
    }

    /// Every module currently loaded, including modules the units link against.
    fn loaded_modules(&self) -> Vec<ModuleDef>;

    /// Locate a type by name in `module`, describing its public members.
    fn find_type(&self, module: &ModuleDef, full_name: &str) -> Option<InteropTypeDef>;

    fn construct(&self, ty: &TypeDef) -> Result<Instance, ThrownError>;

    fn set_property(&self, instance: &mut Instance, property: &PropertyDef, value: Argument)
    -> Result<(), ThrownError>;

    /// Invoke `method`. `instance` is `None` for static methods.
    fn invoke(&self, method: &MethodDef, instance: Option<&mut Instance>, args: &[Argument]) -> Result<(), ThrownError>;
}
