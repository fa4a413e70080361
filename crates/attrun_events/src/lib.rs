//! Structured lifecycle events shared by the single-unit runner and the orchestrator.
//!
//! Every occurrence during a run is an immutable record ([`Event`]) carrying only the data relevant to it. The
//! records cross the process boundary as one line each (see [`codec`]), so everything in here is plain data:
//! exceptions are captured as portable [`ExceptionInfo`] snapshots rather than native error values.
//!
//! ## Modules
//!
//! - `event` - the taxonomy and the [`EventHandler`] observer capability
//! - `exception` - portable exception snapshots and stack-trace parsing
//! - `results` - per-level result records carried by end events
//! - `codec` - single-line machine-readable encoding

pub mod codec;
pub mod event;
pub mod exception;
pub mod results;

pub use codec::{CodecError, EVENT_LINE_PREFIX, decode_line, encode_line};
pub use event::*;
pub use exception::{ExceptionInfo, StackFrameInfo};
pub use results::{MethodResult, TestAssemblyResult, TestClassResult, TestResult};
