//! Invoking one hook or test method.

use std::panic::{self, AssertUnwindSafe};

use attrun_core::LifecycleRole;
use attrun_core::markers::ASSERT_FAILED_EXCEPTION;
use attrun_events::{
    AssemblyCleanupMethodBeginEvent, AssemblyCleanupMethodEndEvent, AssemblyInitializeMethodBeginEvent,
    AssemblyInitializeMethodEndEvent, ClassCleanupMethodBeginEvent, ClassCleanupMethodEndEvent,
    ClassInitializeMethodBeginEvent, ClassInitializeMethodEndEvent, Event, ExceptionInfo, MethodRef, MethodResult,
    TestCleanupMethodBeginEvent, TestCleanupMethodEndEvent, TestInitializeMethodBeginEvent,
    TestInitializeMethodEndEvent, TestMethodBeginEvent, TestMethodEndEvent,
};

use crate::discovery::ExpectedException;
use crate::metadata::{Argument, BASE_EXCEPTION, Instance, MetadataProvider, MethodDef, ThrownError};

/// Type reported for a panic raised by provider code during an invocation.
pub const PANIC_EXCEPTION: &str = "attrun.ProviderPanicException";

pub(crate) fn begin_event(role: LifecycleRole, method: MethodRef) -> Event {
    match role {
        LifecycleRole::AssemblyInitialize => AssemblyInitializeMethodBeginEvent { method }.into(),
        LifecycleRole::AssemblyCleanup => AssemblyCleanupMethodBeginEvent { method }.into(),
        LifecycleRole::ClassInitialize => ClassInitializeMethodBeginEvent { method }.into(),
        LifecycleRole::ClassCleanup => ClassCleanupMethodBeginEvent { method }.into(),
        LifecycleRole::TestInitialize => TestInitializeMethodBeginEvent { method }.into(),
        LifecycleRole::TestMethod => TestMethodBeginEvent { method }.into(),
        LifecycleRole::TestCleanup => TestCleanupMethodBeginEvent { method }.into(),
    }
}

pub(crate) fn end_event(role: LifecycleRole, method: MethodRef, result: MethodResult) -> Event {
    match role {
        LifecycleRole::AssemblyInitialize => AssemblyInitializeMethodEndEvent { method, result }.into(),
        LifecycleRole::AssemblyCleanup => AssemblyCleanupMethodEndEvent { method, result }.into(),
        LifecycleRole::ClassInitialize => ClassInitializeMethodEndEvent { method, result }.into(),
        LifecycleRole::ClassCleanup => ClassCleanupMethodEndEvent { method, result }.into(),
        LifecycleRole::TestInitialize => TestInitializeMethodEndEvent { method, result }.into(),
        LifecycleRole::TestMethod => TestMethodEndEvent { method, result }.into(),
        LifecycleRole::TestCleanup => TestCleanupMethodEndEvent { method, result }.into(),
    }
}

/// Whether `thrown` satisfies an expected-exception specification.
///
/// The exact type always matches; a subtype only when derived types are allowed.
pub fn matches_expected(expected: &ExpectedException, thrown: &ThrownError) -> bool {
    if thrown.full_name() == expected.type_name {
        return true;
    }
    expected.allow_derived && thrown.is_a(&expected.type_name)
}

/// Failure recorded when a test method with an expected exception returns normally.
pub(crate) fn not_thrown(method: &MethodRef, expected: &ExpectedException) -> ExceptionInfo {
    ExceptionInfo::new(
        ASSERT_FAILED_EXCEPTION,
        format!(
            "Test method {method} did not throw expected exception {}.",
            expected.type_name
        ),
    )
}

/// Invoke `method`, turning a provider panic into a thrown error.
pub(crate) fn invoke_guarded(
    provider: &dyn MetadataProvider,
    method: &MethodDef,
    instance: Option<&mut Instance>,
    args: &[Argument],
) -> Result<(), ThrownError> {
    let invoked = panic::catch_unwind(AssertUnwindSafe(|| provider.invoke(method, instance, args)));
    invoked.unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "provider panicked".to_string());
        tracing::warn!(method = %method.name, %message, "provider panicked during invoke");
        Err(ThrownError::with_hierarchy(
            vec![PANIC_EXCEPTION.to_string(), BASE_EXCEPTION.to_string()],
            message,
        ))
    })
}
