//! Execution engine: the lifecycle state machine.
//!
//! The engine walks a [`TestAssembly`] strictly sequentially and raises an event for every step into the
//! [`EventPipeline`]:
//!
//! ```text
//! AssemblyInitialize
//!   for each class:  ClassInitialize
//!                      for each test:  new instance -> TestInitialize -> TestMethod -> TestCleanup
//!                    ClassCleanup
//! AssemblyCleanup
//! ```
//!
//! A failed initializer skips everything it guards, including its own cleanup. The one exception is TestCleanup,
//! which always runs once TestInitialize succeeded so that it can observe the real outcome.
//!
//! ## Modules
//!
//! - `context` - the per-run [`ContextScope`]
//! - `bridge` - adapting the scope to the interop context type
//! - `invoke` - one guarded invocation and expected-exception matching

pub mod bridge;
pub mod context;
pub mod invoke;

use std::cell::OnceCell;
use std::rc::Rc;
use std::time::Instant;

use attrun_core::layouts::INTEROP_CONTEXT_TYPE;
use attrun_core::{LifecycleRole, TestOutcome, UnitTestOutcome};
use attrun_events::{
    MethodExpectedExceptionEvent, MethodRef, MethodResult, MethodUnexpectedExceptionEvent, OutputTraceEvent,
    TestBeginEvent, TestClassBeginEvent, TestClassEndEvent, TestClassResult, TestEndEvent, TestResult,
};

use self::bridge::{BridgeError, ContextBridge, TestContextProxy};
use self::context::{ContextFrame, ContextScope};
use crate::discovery::{ExpectedException, TestAssembly, TestClass, TestMethod};
use crate::metadata::{Argument, Instance, MetadataProvider, MethodDef};
use crate::options::RunOptions;
use crate::report::EventPipeline;

/// Runs one test assembly.
pub struct Engine<'r> {
    provider: &'r dyn MetadataProvider,
    pipeline: &'r mut EventPipeline,
    options: &'r RunOptions,
    scope: ContextScope,
    bridge: OnceCell<Rc<ContextBridge>>,
}

impl<'r> Engine<'r> {
    pub fn new(
        provider: &'r dyn MetadataProvider,
        pipeline: &'r mut EventPipeline,
        options: &'r RunOptions,
        scope: ContextScope,
    ) -> Self {
        Self {
            provider,
            pipeline,
            options,
            scope,
            bridge: OnceCell::new(),
        }
    }

    /// Run every class of `assembly`. Returns whether the assembly succeeded.
    ///
    /// Fails before running anything if the assembly needs a context and none can be bridged.
    #[tracing::instrument(skip_all, fields(assembly = %assembly.name))]
    pub fn run(&mut self, assembly: &TestAssembly) -> Result<bool, BridgeError> {
        if assembly.needs_context() {
            self.ensure_bridge(&assembly.name)?;
        }

        let runnable = assembly.classes.iter().any(|class| self.will_execute(class));
        if !runnable {
            tracing::debug!("no class will execute; skipping assembly hooks");
        }

        if let Some(init) = assembly.assembly_initialize.as_ref().filter(|_| runnable) {
            self.scope.push(ContextFrame::for_hook(&init.declaring_type));
            let result = self.invoke(LifecycleRole::AssemblyInitialize, init, None, None);
            self.scope.pop();
            if !result.success {
                return Ok(false);
            }
        }

        let mut success = true;
        for class in &assembly.classes {
            success &= self.run_class(class);
        }

        if let Some(cleanup) = assembly.assembly_cleanup.as_ref().filter(|_| runnable) {
            success &= self.invoke(LifecycleRole::AssemblyCleanup, cleanup, None, None).success;
        }
        Ok(success)
    }

    /// The bridge for this engine, built on first use.
    pub fn ensure_bridge(&self, assembly: &str) -> Result<&Rc<ContextBridge>, BridgeError> {
        if let Some(bridge) = self.bridge.get() {
            return Ok(bridge);
        }
        let built = ContextBridge::build(self.provider, assembly)?;
        tracing::debug!(
            module = %built.module(),
            bridged = built.bridged().len(),
            omitted = built.omitted().len(),
            "built context bridge"
        );
        Ok(self.bridge.get_or_init(|| Rc::new(built)))
    }

    fn will_execute(&self, class: &TestClass) -> bool {
        !class.is_ignored && self.options.selects(&class.type_def)
    }

    #[tracing::instrument(skip_all, fields(class = %class.full_name()))]
    fn run_class(&mut self, class: &TestClass) -> bool {
        self.pipeline.raise(TestClassBeginEvent {
            full_name: class.full_name().to_string(),
        });

        let filtered_out = !self.options.selects(&class.type_def);
        let mut result = TestClassResult {
            total: class.methods.len(),
            initialize_present: class.class_initialize.is_some(),
            cleanup_present: class.class_cleanup.is_some(),
            ..TestClassResult::default()
        };

        if class.is_ignored || filtered_out {
            for test in &class.methods {
                self.report_ignored(class, test, filtered_out);
            }
            result.class_ignored = class.is_ignored;
            result.ignored_from_command_line = filtered_out;
            result.ignored = class.methods.len();
            result.success = true;
        } else {
            result.initialize_succeeded = match &class.class_initialize {
                Some(init) => {
                    self.scope.push(ContextFrame::for_hook(class.full_name()));
                    let ok = self.invoke(LifecycleRole::ClassInitialize, init, None, None).success;
                    self.scope.pop();
                    ok
                }
                None => true,
            };

            if result.initialize_succeeded {
                for test in &class.methods {
                    match self.run_test(class, test) {
                        TestOutcome::Passed => {
                            result.ran += 1;
                            result.passed += 1;
                        }
                        TestOutcome::Failed => {
                            result.ran += 1;
                            result.failed += 1;
                        }
                        TestOutcome::Ignored => result.ignored += 1,
                    }
                }
                result.cleanup_succeeded = match &class.class_cleanup {
                    Some(cleanup) => self.invoke(LifecycleRole::ClassCleanup, cleanup, None, None).success,
                    None => true,
                };
            }
            result.success = result.initialize_succeeded && result.failed == 0 && result.cleanup_succeeded;
        }

        tracing::debug!(passed = result.passed, failed = result.failed, ignored = result.ignored, "class finished");
        self.pipeline.raise(TestClassEndEvent {
            full_name: class.full_name().to_string(),
            result,
        });
        result.success
    }

    fn report_ignored(&mut self, class: &TestClass, test: &TestMethod, from_command_line: bool) {
        let method = MethodRef::new(class.full_name(), test.name());
        self.pipeline.raise(TestBeginEvent { method: method.clone() });
        self.pipeline.raise(TestEndEvent {
            method,
            outcome: TestOutcome::Ignored,
            elapsed: std::time::Duration::ZERO,
            result: TestResult {
                success: true,
                ignored: true,
                ignored_from_command_line: from_command_line,
            },
        });
    }

    fn run_test(&mut self, class: &TestClass, test: &TestMethod) -> TestOutcome {
        if test.is_ignored {
            self.report_ignored(class, test, false);
            return TestOutcome::Ignored;
        }

        let method = MethodRef::new(class.full_name(), test.name());
        self.pipeline.raise(TestBeginEvent { method: method.clone() });

        let started = Instant::now();
        self.scope.push(ContextFrame::for_test(class.full_name(), test.name()));
        let outcome = self.run_test_body(class, test, &method);
        self.scope.pop();

        self.pipeline.raise(TestEndEvent {
            method,
            outcome,
            elapsed: started.elapsed(),
            result: TestResult {
                success: outcome == TestOutcome::Passed,
                ..TestResult::default()
            },
        });
        outcome
    }

    fn run_test_body(&mut self, class: &TestClass, test: &TestMethod, method: &MethodRef) -> TestOutcome {
        let Some(mut instance) = self.new_instance(class, method) else {
            self.scope.set_outcome(UnitTestOutcome::Failed);
            return TestOutcome::Failed;
        };

        if let Some(init) = &class.test_initialize {
            if !self.invoke(LifecycleRole::TestInitialize, init, Some(&mut instance), None).success {
                self.scope.set_outcome(UnitTestOutcome::Failed);
                return TestOutcome::Failed;
            }
        }

        let passed = self
            .invoke(
                LifecycleRole::TestMethod,
                &test.method,
                Some(&mut instance),
                test.expected_exception.as_ref(),
            )
            .success;
        let mut outcome = if passed { TestOutcome::Passed } else { TestOutcome::Failed };
        self.scope.set_outcome(outcome.into());

        if let Some(cleanup) = &class.test_cleanup {
            if !self.invoke(LifecycleRole::TestCleanup, cleanup, Some(&mut instance), None).success {
                outcome = TestOutcome::Failed;
                self.scope.set_outcome(UnitTestOutcome::Failed);
            }
        }
        outcome
    }

    /// A fresh instance with the context injected, or `None` after reporting why it could not be created.
    fn new_instance(&mut self, class: &TestClass, method: &MethodRef) -> Option<Instance> {
        let created = self.provider.construct(&class.type_def).and_then(|mut instance| {
            if let Some(setter) = &class.context_setter {
                self.provider
                    .set_property(&mut instance, setter, self.context_argument())?;
            }
            Ok(instance)
        });
        self.flush_trace();
        match created {
            Ok(instance) => Some(instance),
            Err(thrown) => {
                self.pipeline.raise(MethodUnexpectedExceptionEvent {
                    method: method.clone(),
                    exception: thrown.snapshot(),
                });
                None
            }
        }
    }

    fn context_argument(&self) -> Argument {
        match self.bridge.get() {
            Some(bridge) => Argument::Context(TestContextProxy::new(self.scope.clone(), Rc::clone(bridge))),
            None => Argument::Null,
        }
    }

    /// Invoke one hook or test method and report it.
    ///
    /// `expected` is only ever set for the test method itself.
    fn invoke(
        &mut self,
        role: LifecycleRole,
        method: &MethodDef,
        instance: Option<&mut Instance>,
        expected: Option<&ExpectedException>,
    ) -> MethodResult {
        let method_ref = MethodRef::new(&method.declaring_type, &method.name);
        self.pipeline.raise_event(&invoke::begin_event(role, method_ref.clone()));

        let args: Vec<Argument> = method
            .parameters
            .iter()
            .map(|p| {
                if p.type_name == INTEROP_CONTEXT_TYPE {
                    self.context_argument()
                } else {
                    Argument::Null
                }
            })
            .collect();

        let started = Instant::now();
        let invoked = invoke::invoke_guarded(self.provider, method, instance, &args);
        let elapsed = started.elapsed();
        self.flush_trace();

        let result = match (invoked, expected) {
            (Ok(()), None) => MethodResult::passed(elapsed),
            (Ok(()), Some(expected)) => MethodResult {
                success: false,
                elapsed,
                exception: Some(invoke::not_thrown(&method_ref, expected)),
            },
            (Err(thrown), Some(expected)) if invoke::matches_expected(expected, &thrown) => {
                let exception = thrown.snapshot();
                self.pipeline.raise(MethodExpectedExceptionEvent {
                    method: method_ref.clone(),
                    expected_full_name: expected.type_name.clone(),
                    exception: exception.clone(),
                });
                MethodResult {
                    success: true,
                    elapsed,
                    exception: Some(exception),
                }
            }
            (Err(thrown), _) => {
                let exception = thrown.snapshot();
                self.pipeline.raise(MethodUnexpectedExceptionEvent {
                    method: method_ref.clone(),
                    exception: exception.clone(),
                });
                MethodResult {
                    success: false,
                    elapsed,
                    exception: Some(exception),
                }
            }
        };

        tracing::trace!(%role, method = %method_ref, success = result.success, "invoked");
        self.pipeline.raise_event(&invoke::end_event(role, method_ref, result.clone()));
        result
    }

    /// Forward lines written through the context as trace events.
    fn flush_trace(&mut self) {
        for message in self.scope.drain_trace() {
            self.pipeline.raise(OutputTraceEvent { message });
        }
    }
}
