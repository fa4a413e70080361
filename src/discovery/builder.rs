//! Test model builder.
//!
//! Walks a loaded module through the metadata provider and the recognizer and produces a [`TestAssembly`]. Types
//! that are not test containers, and containers without a single test method, are left out of the model entirely.
//!
//! ## Ordering
//!
//! Classes are ordered by full name and test methods by name (ordinal comparison), independent of the order the
//! provider enumerates them in.

use std::collections::BTreeMap;

use attrun_core::markers::MarkerId;
use attrun_core::layouts::INTEROP_CONTEXT_TYPE;
use attrun_core::LifecycleRole;
use miette::Diagnostic;
use thiserror::Error;

use super::model::{TestAssembly, TestClass, TestMethod};
use super::recognizer;
use crate::metadata::{
    LoadError, Marker, MetadataProvider, MethodDef, ModuleDef, PropertyDef, Staticness, TypeDef, Visibility,
};

/// Name of the property that receives the context on each new instance.
pub const CONTEXT_PROPERTY: &str = "TestContext";

/// Errors that abort discovery for one unit.
#[derive(Debug, Error, Diagnostic)]
pub enum DiscoveryError {
    #[error("class '{class}' declares {count} {role} methods ({methods}); at most one is allowed")]
    #[diagnostic(code(attrun::discovery::duplicate_hook), help("remove the extra hook markers from the class"))]
    DuplicateClassHook {
        class: String,
        role: LifecycleRole,
        count: usize,
        methods: String,
    },

    #[error("unit '{assembly}' declares {count} {role} methods ({methods}); at most one is allowed")]
    #[diagnostic(code(attrun::discovery::duplicate_hook), help("assembly hooks are unit-wide; keep one across all classes"))]
    DuplicateAssemblyHook {
        assembly: String,
        role: LifecycleRole,
        count: usize,
        methods: String,
    },

    #[error("method '{method}' carries conflicting lifecycle markers: {roles}")]
    #[diagnostic(code(attrun::discovery::conflicting_roles), help("give each method a single lifecycle role"))]
    ConflictingRoles { method: String, roles: String },

    #[error("cannot load the unit")]
    #[diagnostic(code(attrun::discovery::load))]
    Load(#[from] LoadError),
}

pub struct ModelBuilder<'p> {
    provider: &'p dyn MetadataProvider,
}

impl<'p> ModelBuilder<'p> {
    pub fn new(provider: &'p dyn MetadataProvider) -> Self {
        Self { provider }
    }

    /// Build the model of `module`. `Ok(None)` if it contains no test classes.
    #[tracing::instrument(skip_all, fields(module = %module.name))]
    pub fn try_build_assembly(&self, module: &ModuleDef) -> Result<Option<TestAssembly>, DiscoveryError> {
        let types = self.provider.enumerate_types(module)?;

        let mut classes = Vec::new();
        for ty in &types {
            if let Some(class) = self.try_build_class(ty)? {
                classes.push(class);
            }
        }
        if classes.is_empty() {
            tracing::debug!(types = types.len(), "no test classes");
            return Ok(None);
        }
        classes.sort_by(|a, b| a.full_name().cmp(b.full_name()));

        let assembly_initialize = single_assembly_hook(
            &module.name,
            LifecycleRole::AssemblyInitialize,
            classes.iter().filter_map(|c| c.assembly_initialize.as_ref()),
        )?;
        let assembly_cleanup = single_assembly_hook(
            &module.name,
            LifecycleRole::AssemblyCleanup,
            classes.iter().filter_map(|c| c.assembly_cleanup.as_ref()),
        )?;

        tracing::debug!(classes = classes.len(), "built test model");
        Ok(Some(TestAssembly {
            name: module.name.clone(),
            path: module.path.clone(),
            classes,
            assembly_initialize,
            assembly_cleanup,
        }))
    }

    /// Build the model of one type. `Ok(None)` unless it is a test container with at least one test method.
    pub fn try_build_class(&self, ty: &TypeDef) -> Result<Option<TestClass>, DiscoveryError> {
        let type_markers = self.provider.type_markers(ty);
        if !recognizer::has(self.provider, &type_markers, MarkerId::TestClass) {
            return Ok(None);
        }

        let candidates: Vec<(MethodDef, Vec<Marker>, Vec<LifecycleRole>)> = self
            .provider
            .enumerate_methods(ty, Visibility::Public, Staticness::Any)
            .into_iter()
            .map(|method| {
                let markers = self.provider.method_markers(&method);
                let roles = recognizer::roles(self.provider, &markers);
                (method, markers, roles)
            })
            .collect();

        if !candidates
            .iter()
            .any(|(_, _, roles)| roles.contains(&LifecycleRole::TestMethod))
        {
            tracing::debug!(class = %ty.full_name, "test class without test methods");
            return Ok(None);
        }

        let mut methods = Vec::new();
        let mut hooks: BTreeMap<LifecycleRole, Vec<&MethodDef>> = BTreeMap::new();
        for (method, markers, roles) in &candidates {
            let role = match roles.as_slice() {
                [] => continue,
                [role] => *role,
                _ => {
                    return Err(DiscoveryError::ConflictingRoles {
                        method: format!("{}.{}", ty.full_name, method.name),
                        roles: join(roles.iter().map(ToString::to_string)),
                    });
                }
            };
            if role.is_static() != method.is_static {
                tracing::debug!(method = %method.name, %role, "hook has the wrong staticness; skipped");
                continue;
            }
            if role == LifecycleRole::TestMethod {
                methods.extend(self.method_from_markers(method, markers));
            } else {
                hooks.entry(role).or_default().push(method);
            }
        }
        if methods.is_empty() {
            tracing::debug!(class = %ty.full_name, "test class without instance test methods");
            return Ok(None);
        }
        methods.sort_by(|a, b| a.name().cmp(b.name()));

        let hook = |role: LifecycleRole| single_class_hook(ty, role, hooks.get(&role).map(Vec::as_slice));

        Ok(Some(TestClass {
            type_def: ty.clone(),
            methods,
            class_initialize: hook(LifecycleRole::ClassInitialize)?,
            class_cleanup: hook(LifecycleRole::ClassCleanup)?,
            test_initialize: hook(LifecycleRole::TestInitialize)?,
            test_cleanup: hook(LifecycleRole::TestCleanup)?,
            context_setter: self.find_context_setter(ty),
            is_ignored: recognizer::has(self.provider, &type_markers, MarkerId::Ignore),
            assembly_initialize: hook(LifecycleRole::AssemblyInitialize)?,
            assembly_cleanup: hook(LifecycleRole::AssemblyCleanup)?,
        }))
    }

    /// Build the model of one method. `None` unless it carries the test-method marker.
    pub fn try_build_method(&self, method: &MethodDef) -> Option<TestMethod> {
        let markers = self.provider.method_markers(method);
        self.method_from_markers(method, &markers)
    }

    fn method_from_markers(&self, method: &MethodDef, markers: &[Marker]) -> Option<TestMethod> {
        recognizer::find(self.provider, markers, MarkerId::TestMethod)?;
        Some(TestMethod {
            method: method.clone(),
            is_ignored: recognizer::has(self.provider, markers, MarkerId::Ignore),
            expected_exception: recognizer::find(self.provider, markers, MarkerId::ExpectedException)
                .and_then(|m| m.expected_exception()),
        })
    }

    /// A public, non-static, publicly writable `TestContext` property of the interop type.
    fn find_context_setter(&self, ty: &TypeDef) -> Option<PropertyDef> {
        self.provider.enumerate_properties(ty).into_iter().find(|p| {
            p.name == CONTEXT_PROPERTY
                && p.type_name == INTEROP_CONTEXT_TYPE
                && p.is_public
                && !p.is_static
                && p.has_public_setter
        })
    }
}

fn single_class_hook(
    ty: &TypeDef,
    role: LifecycleRole,
    found: Option<&[&MethodDef]>,
) -> Result<Option<MethodDef>, DiscoveryError> {
    match found.unwrap_or_default() {
        [] => Ok(None),
        [method] => Ok(Some((*method).clone())),
        many => Err(DiscoveryError::DuplicateClassHook {
            class: ty.full_name.clone(),
            role,
            count: many.len(),
            methods: join(many.iter().map(|m| m.name.clone())),
        }),
    }
}

fn single_assembly_hook<'a>(
    assembly: &str,
    role: LifecycleRole,
    found: impl Iterator<Item = &'a MethodDef>,
) -> Result<Option<MethodDef>, DiscoveryError> {
    let found: Vec<&MethodDef> = found.collect();
    match found.as_slice() {
        [] => Ok(None),
        [method] => Ok(Some((*method).clone())),
        many => Err(DiscoveryError::DuplicateAssemblyHook {
            assembly: assembly.to_string(),
            role,
            count: many.len(),
            methods: join(many.iter().map(|m| format!("{}.{}", m.declaring_type, m.name))),
        }),
    }
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}
