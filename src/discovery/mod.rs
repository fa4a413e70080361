//! Test discovery.
//!
//! - `recognizer` - matches opaque markers against known capabilities by fully-qualified name
//! - `model` - the immutable assembly/class/method model
//! - `builder` - walks a loaded module and builds the model

pub mod builder;
pub mod model;
pub mod recognizer;

pub use builder::{DiscoveryError, ModelBuilder};
pub use model::{TestAssembly, TestClass, TestMethod};
pub use recognizer::{ExpectedException, RecognizedMarker};
