//! Single-line machine-readable event encoding.
//!
//! Each event is written as one line:
//!
//! ```text
//! @@attrun-event@@ TestEndEvent {"method":{...},"outcome":"Passed",...}
//! ```
//!
//! The fixed prefix lets a reader tell event lines apart from anything else a child process writes to standard
//! output. The type name selects the record type; the JSON object carries only that record's own fields.

use thiserror::Error;

use crate::event::Event;

/// Literal that starts every event line.
pub const EVENT_LINE_PREFIX: &str = "@@attrun-event@@ ";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown event type `{0}`")]
    UnknownEventType(String),

    #[error("event line has no field encoding after type `{0}`")]
    MissingFields(String),

    #[error("malformed event fields: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode `event` as one line, without a trailing newline.
pub fn encode_line(event: &Event) -> Result<String, CodecError> {
    let fields = event.encode_fields()?;
    Ok(format!("{EVENT_LINE_PREFIX}{} {fields}", event.type_name()))
}

/// Decode one line of a machine-readable stream.
///
/// Returns `Ok(None)` for lines that don't carry the event prefix (plain output).
pub fn decode_line(line: &str) -> Result<Option<Event>, CodecError> {
    let Some(rest) = line.trim_end_matches(['\r', '\n']).strip_prefix(EVENT_LINE_PREFIX) else {
        return Ok(None);
    };
    let Some((type_name, fields)) = rest.split_once(' ') else {
        return Err(CodecError::MissingFields(rest.to_string()));
    };
    Event::decode_fields(type_name, fields).map(Some)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use attrun_core::TestOutcome;

    use super::*;
    use crate::event::{MethodRef, MethodUnexpectedExceptionEvent, TestEndEvent, TestRunEndEvent};
    use crate::exception::{ExceptionInfo, StackFrameInfo};
    use crate::results::TestResult;

    #[test]
    fn run_end_line_layout() {
        let line = encode_line(&TestRunEndEvent { success: false }.into()).unwrap();
        insta::assert_snapshot!(line, @r#"@@attrun-event@@ TestRunEndEvent {"success":false}"#);
    }

    #[test]
    fn test_end_line_layout() {
        let event = TestEndEvent {
            method: MethodRef::new("Sample.MathTests", "Adds"),
            outcome: TestOutcome::Passed,
            elapsed: Duration::from_millis(5),
            result: TestResult {
                success: true,
                ignored: false,
                ignored_from_command_line: false,
            },
        };
        let line = encode_line(&event.into()).unwrap();
        insta::assert_snapshot!(line, @r#"@@attrun-event@@ TestEndEvent {"method":{"classFullName":"Sample.MathTests","name":"Adds"},"outcome":"Passed","elapsed":{"secs":0,"nanos":5000000},"result":{"success":true,"ignored":false,"ignoredFromCommandLine":false}}"#);
    }

    #[test]
    fn unexpected_exception_survives_the_stream() {
        let mut exception = ExceptionInfo::new("System.InvalidOperationException", "boom");
        exception.stack_trace = StackFrameInfo::parse_trace("at Sample.MathTests.Fails() in MathTests.cs:line 9");
        exception.data.insert("attempt".into(), "2".into());
        exception.inner = Some(Box::new(ExceptionInfo::new("System.Exception", "root cause")));
        let event: Event = MethodUnexpectedExceptionEvent {
            method: MethodRef::new("Sample.MathTests", "Fails"),
            exception,
        }
        .into();

        let decoded = decode_line(&encode_line(&event).unwrap()).unwrap();
        assert_eq!(decoded, Some(event));
    }

    #[test]
    fn plain_output_is_not_an_event() {
        assert!(decode_line("hello from a test").unwrap().is_none());
        assert!(decode_line("").unwrap().is_none());
    }

    #[test]
    fn unknown_and_truncated_lines_are_errors() {
        let unknown = decode_line(&format!("{EVENT_LINE_PREFIX}NopeEvent {{}}"));
        assert!(matches!(unknown, Err(CodecError::UnknownEventType(name)) if name == "NopeEvent"));

        let truncated = decode_line(&format!("{EVENT_LINE_PREFIX}TestRunEndEvent"));
        assert!(matches!(truncated, Err(CodecError::MissingFields(_))));

        let malformed = decode_line(&format!("{EVENT_LINE_PREFIX}TestRunEndEvent {{\"success\":3}}"));
        assert!(matches!(malformed, Err(CodecError::Json(_))));
    }

    #[test]
    fn carriage_returns_are_tolerated() {
        let line = format!("{}\r\n", encode_line(&TestRunEndEvent { success: true }.into()).unwrap());
        assert!(matches!(decode_line(&line), Ok(Some(Event::TestRunEnd(_)))));
    }
}
