//! The immutable test model built from a loaded unit.

use std::path::PathBuf;

use attrun_core::layouts::INTEROP_CONTEXT_TYPE;

use super::recognizer::ExpectedException;
use crate::metadata::{MethodDef, PropertyDef, TypeDef};

/// One loaded unit and the test classes found in it.
#[derive(Debug, Clone)]
pub struct TestAssembly {
    pub name: String,
    pub path: PathBuf,
    /// Ordered by full name; never empty.
    pub classes: Vec<TestClass>,
    pub assembly_initialize: Option<MethodDef>,
    pub assembly_cleanup: Option<MethodDef>,
}

impl TestAssembly {
    /// Whether any hook or test in this unit asks for a context.
    pub fn needs_context(&self) -> bool {
        let hooks = [&self.assembly_initialize, &self.assembly_cleanup];
        hooks.into_iter().flatten().any(takes_context) || self.classes.iter().any(TestClass::needs_context)
    }
}

/// A type recognized as a test container with at least one test method.
#[derive(Debug, Clone)]
pub struct TestClass {
    pub type_def: TypeDef,
    /// Ordered by name; never empty.
    pub methods: Vec<TestMethod>,
    pub class_initialize: Option<MethodDef>,
    pub class_cleanup: Option<MethodDef>,
    pub test_initialize: Option<MethodDef>,
    pub test_cleanup: Option<MethodDef>,
    /// Writable `TestContext` property receiving the context on every new instance.
    pub context_setter: Option<PropertyDef>,
    pub is_ignored: bool,
    /// Assembly-level hooks declared by this class.
    pub assembly_initialize: Option<MethodDef>,
    pub assembly_cleanup: Option<MethodDef>,
}

impl TestClass {
    pub fn full_name(&self) -> &str {
        &self.type_def.full_name
    }

    pub fn name(&self) -> &str {
        self.type_def.name()
    }

    fn needs_context(&self) -> bool {
        let hooks = [
            &self.class_initialize,
            &self.class_cleanup,
            &self.test_initialize,
            &self.test_cleanup,
        ];
        self.context_setter.is_some()
            || hooks.into_iter().flatten().any(takes_context)
            || self.methods.iter().any(|m| takes_context(&m.method))
    }
}

/// A recognized test entry point.
#[derive(Debug, Clone)]
pub struct TestMethod {
    pub method: MethodDef,
    pub is_ignored: bool,
    pub expected_exception: Option<ExpectedException>,
}

impl TestMethod {
    pub fn name(&self) -> &str {
        &self.method.name
    }
}

/// Whether `method` declares a parameter of the interop context type.
pub fn takes_context(method: &MethodDef) -> bool {
    method.parameters.iter().any(|p| p.type_name == INTEROP_CONTEXT_TYPE)
}
