//! Provide the shared, pure vocabulary of the attribute-driven test convention.
//!
//! This crate is intentionally small and dependency-light. It contains the registries that both:
//! - the discovery layer uses to recognize lifecycle markers by their fully-qualified names, and
//! - the context bridge uses to decide which interop `TestContext` members can be forwarded.
//!
//! ## Notes
//!
//! - This is a “vocabulary” crate: **no IO**, no global state, and no engine-specific types.
//! - Marker recognition is nominal. Nothing in here depends on the identity of a loaded support library, only on the
//!   spelling of its type names.

pub mod layouts;
pub mod markers;
pub mod outcome;

pub use layouts::{CONTEXT_MEMBERS, INTEROP_CONTEXT_TYPE, MemberKind, StaticMember, SupportLayout};
pub use markers::{LifecycleRole, MarkerId};
pub use outcome::{TestOutcome, UnitTestOutcome};
