//! Event taxonomy and the observer capability.
//!
//! The whole taxonomy is declared once in [`event_taxonomy!`]. From that list the macro derives:
//! - the [`Event`] enum and its `From` conversions,
//! - the type-name dispatch used by the codec, and
//! - the [`EventHandler`] trait with one defaulted (no-op) hook per event kind.
//!
//! Adding an event kind is a single line in the list; observers that don't care about it need no change.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use attrun_core::TestOutcome;
use serde::{Deserialize, Serialize};

use crate::codec::CodecError;
use crate::exception::ExceptionInfo;
use crate::results::{MethodResult, TestAssemblyResult, TestClassResult, TestResult};

/// Identify a method by its declaring class and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodRef {
    pub class_full_name: String,
    pub name: String,
}

impl MethodRef {
    pub fn new(class_full_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class_full_name: class_full_name.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for MethodRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.class_full_name, self.name)
    }
}

macro_rules! record {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $field:ident : $ty:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            $($(#[$fmeta])* pub $field: $ty,)*
        }
    };
}

macro_rules! event_taxonomy {
    ($($variant:ident($record:ident) => $hook:ident;)*) => {
        /// Every occurrence the runner reports.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Event {
            $($variant($record),)*
        }

        impl Event {
            /// Name of the record type, as written in the machine-readable stream.
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(Event::$variant(_) => stringify!($record),)*
                }
            }

            pub(crate) fn encode_fields(&self) -> Result<String, serde_json::Error> {
                match self {
                    $(Event::$variant(record) => serde_json::to_string(record),)*
                }
            }

            pub(crate) fn decode_fields(type_name: &str, fields: &str) -> Result<Event, CodecError> {
                match type_name {
                    $(stringify!($record) => Ok(Event::$variant(serde_json::from_str(fields)?)),)*
                    other => Err(CodecError::UnknownEventType(other.to_string())),
                }
            }
        }

        $(
            impl From<$record> for Event {
                fn from(record: $record) -> Self {
                    Event::$variant(record)
                }
            }
        )*

        /// Observer of lifecycle events.
        ///
        /// Every hook defaults to a no-op, so an observer only overrides what it renders or collects. Observers
        /// never stop an event: the pipeline hands each event to every observer in order.
        pub trait EventHandler {
            $(
                fn $hook(&mut self, _event: &$record) {}
            )*

            /// Route `event` to the matching hook.
            fn handle(&mut self, event: &Event) {
                match event {
                    $(Event::$variant(record) => self.$hook(record),)*
                }
            }
        }
    };
}

// ============================================================================
// Program
// ============================================================================

record!(ProgramBannerEvent { name: String, version: String });
record!(ProgramUsageEvent { usage: String });
record!(ProgramUserErrorEvent { message: String });
record!(ProgramInternalErrorEvent { exception: ExceptionInfo });

// ============================================================================
// Incidental output from test code
// ============================================================================

record!(OutputTraceEvent { message: String });
record!(OutputStdoutEvent { message: String });
record!(OutputStderrEvent { message: String });

// ============================================================================
// Run and assembly
// ============================================================================

record!(TestRunBeginEvent { unit_count: usize });
record!(TestRunEndEvent { success: bool });

record!(TestAssemblyBeginEvent { path: String });
record!(TestAssemblyNotFoundEvent { path: String });
record!(
    /// The unit is not a binary of the expected kind.
    TestAssemblyBadFormatEvent { path: String, reason: String }
);
record!(
    /// The unit loaded but contains no recognizable test classes.
    TestAssemblyNotTestEvent { path: String }
);
record!(TestAssemblyConfigFileEvent { config_path: String });
record!(TestAssemblyEndEvent { path: String, result: TestAssemblyResult });

record!(AssemblyInitializeMethodBeginEvent { method: MethodRef });
record!(AssemblyInitializeMethodEndEvent { method: MethodRef, result: MethodResult });
record!(AssemblyCleanupMethodBeginEvent { method: MethodRef });
record!(AssemblyCleanupMethodEndEvent { method: MethodRef, result: MethodResult });

// ============================================================================
// Class
// ============================================================================

record!(TestClassBeginEvent { full_name: String });
record!(TestClassEndEvent { full_name: String, result: TestClassResult });

record!(ClassInitializeMethodBeginEvent { method: MethodRef });
record!(ClassInitializeMethodEndEvent { method: MethodRef, result: MethodResult });
record!(ClassCleanupMethodBeginEvent { method: MethodRef });
record!(ClassCleanupMethodEndEvent { method: MethodRef, result: MethodResult });

// ============================================================================
// Test
// ============================================================================

record!(TestBeginEvent { method: MethodRef });
record!(TestEndEvent {
    method: MethodRef,
    outcome: TestOutcome,
    elapsed: Duration,
    result: TestResult,
});

record!(TestInitializeMethodBeginEvent { method: MethodRef });
record!(TestInitializeMethodEndEvent { method: MethodRef, result: MethodResult });
record!(TestMethodBeginEvent { method: MethodRef });
record!(TestMethodEndEvent { method: MethodRef, result: MethodResult });
record!(TestCleanupMethodBeginEvent { method: MethodRef });
record!(TestCleanupMethodEndEvent { method: MethodRef, result: MethodResult });

// ============================================================================
// Exceptions
// ============================================================================

record!(MethodExpectedExceptionEvent {
    method: MethodRef,
    expected_full_name: String,
    exception: ExceptionInfo,
});
record!(MethodUnexpectedExceptionEvent { method: MethodRef, exception: ExceptionInfo });

event_taxonomy! {
    ProgramBanner(ProgramBannerEvent) => on_program_banner;
    ProgramUsage(ProgramUsageEvent) => on_program_usage;
    ProgramUserError(ProgramUserErrorEvent) => on_program_user_error;
    ProgramInternalError(ProgramInternalErrorEvent) => on_program_internal_error;

    OutputTrace(OutputTraceEvent) => on_output_trace;
    OutputStdout(OutputStdoutEvent) => on_output_stdout;
    OutputStderr(OutputStderrEvent) => on_output_stderr;

    TestRunBegin(TestRunBeginEvent) => on_test_run_begin;
    TestRunEnd(TestRunEndEvent) => on_test_run_end;

    TestAssemblyBegin(TestAssemblyBeginEvent) => on_test_assembly_begin;
    TestAssemblyNotFound(TestAssemblyNotFoundEvent) => on_test_assembly_not_found;
    TestAssemblyBadFormat(TestAssemblyBadFormatEvent) => on_test_assembly_bad_format;
    TestAssemblyNotTest(TestAssemblyNotTestEvent) => on_test_assembly_not_test;
    TestAssemblyConfigFile(TestAssemblyConfigFileEvent) => on_test_assembly_config_file;
    TestAssemblyEnd(TestAssemblyEndEvent) => on_test_assembly_end;
    AssemblyInitializeMethodBegin(AssemblyInitializeMethodBeginEvent) => on_assembly_initialize_method_begin;
    AssemblyInitializeMethodEnd(AssemblyInitializeMethodEndEvent) => on_assembly_initialize_method_end;
    AssemblyCleanupMethodBegin(AssemblyCleanupMethodBeginEvent) => on_assembly_cleanup_method_begin;
    AssemblyCleanupMethodEnd(AssemblyCleanupMethodEndEvent) => on_assembly_cleanup_method_end;

    TestClassBegin(TestClassBeginEvent) => on_test_class_begin;
    TestClassEnd(TestClassEndEvent) => on_test_class_end;
    ClassInitializeMethodBegin(ClassInitializeMethodBeginEvent) => on_class_initialize_method_begin;
    ClassInitializeMethodEnd(ClassInitializeMethodEndEvent) => on_class_initialize_method_end;
    ClassCleanupMethodBegin(ClassCleanupMethodBeginEvent) => on_class_cleanup_method_begin;
    ClassCleanupMethodEnd(ClassCleanupMethodEndEvent) => on_class_cleanup_method_end;

    TestBegin(TestBeginEvent) => on_test_begin;
    TestEnd(TestEndEvent) => on_test_end;
    TestInitializeMethodBegin(TestInitializeMethodBeginEvent) => on_test_initialize_method_begin;
    TestInitializeMethodEnd(TestInitializeMethodEndEvent) => on_test_initialize_method_end;
    TestMethodBegin(TestMethodBeginEvent) => on_test_method_begin;
    TestMethodEnd(TestMethodEndEvent) => on_test_method_end;
    TestCleanupMethodBegin(TestCleanupMethodBeginEvent) => on_test_cleanup_method_begin;
    TestCleanupMethodEnd(TestCleanupMethodEndEvent) => on_test_cleanup_method_end;

    MethodExpectedException(MethodExpectedExceptionEvent) => on_method_expected_exception;
    MethodUnexpectedException(MethodUnexpectedExceptionEvent) => on_method_unexpected_exception;
}

/// Shared observers: the pipeline owns one handle, the caller keeps another to read results back.
impl<H: EventHandler + ?Sized> EventHandler for Rc<RefCell<H>> {
    fn handle(&mut self, event: &Event) {
        self.borrow_mut().handle(event);
    }
}
