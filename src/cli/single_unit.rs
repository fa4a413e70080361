//! Child mode: discover and run exactly one unit in this process.

use std::path::Path;

use attrun_events::{
    ProgramUserErrorEvent, TestAssemblyBadFormatEvent, TestAssemblyBeginEvent, TestAssemblyConfigFileEvent,
    TestAssemblyEndEvent, TestAssemblyNotFoundEvent, TestAssemblyNotTestEvent, TestAssemblyResult,
};
use miette::Diagnostic;

use super::render_diagnostic;
use crate::discovery::{DiscoveryError, ModelBuilder};
use crate::engine::Engine;
use crate::engine::context::{ContextDirectories, ContextScope};
use crate::metadata::{LoadError, MetadataProvider};
use crate::options::RunOptions;
use crate::report::EventPipeline;
use crate::unit_config;

/// Load, configure, discover and execute `unit`, bracketed by its assembly begin and end events.
///
/// Problems with the unit itself are reported as events and reflected in the returned result; nothing here aborts
/// the process.
#[tracing::instrument(skip_all, fields(unit = %unit.display()))]
pub fn run_single_unit(
    provider: &dyn MetadataProvider,
    unit: &Path,
    options: &RunOptions,
    pipeline: &mut EventPipeline,
) -> TestAssemblyResult {
    let path = unit.display().to_string();
    pipeline.raise(TestAssemblyBeginEvent { path: path.clone() });
    let result = run_unit(provider, unit, &path, options, pipeline);
    tracing::debug!(success = result.success, "unit finished");
    pipeline.raise(TestAssemblyEndEvent { path, result });
    result
}

fn run_unit(
    provider: &dyn MetadataProvider,
    unit: &Path,
    path: &str,
    options: &RunOptions,
    pipeline: &mut EventPipeline,
) -> TestAssemblyResult {
    let module = match provider.load_module(unit) {
        Ok(module) => module,
        Err(LoadError::NotFound(_)) => {
            pipeline.raise(TestAssemblyNotFoundEvent { path: path.to_string() });
            return TestAssemblyResult::not_found();
        }
        Err(LoadError::BadImageFormat { reason, .. }) => {
            pipeline.raise(TestAssemblyBadFormatEvent {
                path: path.to_string(),
                reason,
            });
            return TestAssemblyResult::not_loadable();
        }
        Err(err) => return user_error(pipeline, &DiscoveryError::from(err)),
    };

    let config_path = unit_config::config_path_for(unit);
    match unit_config::activate(&config_path) {
        Ok(true) => pipeline.raise(TestAssemblyConfigFileEvent {
            config_path: config_path.display().to_string(),
        }),
        Ok(false) => {}
        Err(err) => return user_error(pipeline, &err),
    }

    let assembly = match ModelBuilder::new(provider).try_build_assembly(&module) {
        Ok(Some(assembly)) => assembly,
        Ok(None) => {
            pipeline.raise(TestAssemblyNotTestEvent { path: path.to_string() });
            return TestAssemblyResult::not_a_test_module();
        }
        Err(err) => return user_error(pipeline, &err),
    };

    let working_dir = std::env::current_dir().unwrap_or_default();
    let scope = ContextScope::new(ContextDirectories::for_unit(unit, &working_dir));
    let outcome = Engine::new(provider, pipeline, options, scope).run(&assembly);
    match outcome {
        Ok(success) => TestAssemblyResult {
            success,
            ..TestAssemblyResult::default()
        },
        Err(err) => user_error(pipeline, &err),
    }
}

fn user_error(pipeline: &mut EventPipeline, err: &dyn Diagnostic) -> TestAssemblyResult {
    pipeline.raise(ProgramUserErrorEvent {
        message: render_diagnostic(err),
    });
    TestAssemblyResult::default()
}
