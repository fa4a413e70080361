#![forbid(unsafe_code)]
//! attrun: a runner for attribute-driven unit tests.
//!
//! Test units are loaded through a [`MetadataProvider`](metadata::MetadataProvider), their test classes are
//! recognized by the fully-qualified names of their markers, and every class runs through the lifecycle state
//! machine in [`engine`]. Everything that happens is raised as an event; the CLI runs each unit in its own child
//! process and reads the child's machine-readable event stream back.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//! - **Code under test**: panics raised by a provider while invoking test code are caught and reported as a thrown
//!   error of that method.

pub mod cli;
pub mod discovery;
pub mod engine;
pub mod metadata;
pub mod options;
pub mod report;
pub mod unit_config;
pub mod version;

pub use attrun_core::{LifecycleRole, TestOutcome, UnitTestOutcome};
pub use attrun_events::{Event, EventHandler, ExceptionInfo};
pub use discovery::{ModelBuilder, TestAssembly};
pub use engine::Engine;
pub use metadata::MetadataProvider;
pub use metadata::manifest::ManifestProvider;
pub use options::RunOptions;
pub use report::{EventPipeline, ResultAccumulator, RunReport};
