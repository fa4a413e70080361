//! Result records for each lifecycle level.
//!
//! Records are created while a level executes and never change after the level's end event is raised.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::exception::ExceptionInfo;

/// Outcome of invoking one method (a hook or the test method itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodResult {
    pub success: bool,
    pub elapsed: Duration,
    /// The thrown error, whether or not it was expected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionInfo>,
}

impl MethodResult {
    pub fn passed(elapsed: Duration) -> Self {
        Self {
            success: true,
            elapsed,
            exception: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub success: bool,
    pub ignored: bool,
    pub ignored_from_command_line: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestClassResult {
    pub success: bool,
    pub class_ignored: bool,
    pub ignored_from_command_line: bool,
    pub initialize_present: bool,
    pub initialize_succeeded: bool,
    pub cleanup_present: bool,
    pub cleanup_succeeded: bool,
    pub total: usize,
    pub ran: usize,
    pub ignored: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAssemblyResult {
    pub success: bool,
    pub not_found: bool,
    pub not_loadable: bool,
    pub not_a_test_module: bool,
}

impl TestAssemblyResult {
    pub fn not_found() -> Self {
        Self {
            not_found: true,
            ..Self::default()
        }
    }

    /// Unit is not a binary of the expected kind. Counts as success.
    pub fn not_loadable() -> Self {
        Self {
            success: true,
            not_loadable: true,
            ..Self::default()
        }
    }

    /// Unit loaded but has no recognizable test classes. Counts as success.
    pub fn not_a_test_module() -> Self {
        Self {
            success: true,
            not_a_test_module: true,
            ..Self::default()
        }
    }
}
