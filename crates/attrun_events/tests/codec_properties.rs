//! Property-based tests for the event stream.
//!
//! These use proptest to check that the reader never panics on arbitrary child output and that free-form strings
//! survive the encoding untouched.

use attrun_events::{Event, OutputStdoutEvent, ProgramUserErrorEvent, StackFrameInfo, decode_line, encode_line};
use proptest::prelude::*;

proptest! {
    /// Property: arbitrary output lines either decode or fail cleanly.
    #[test]
    fn decode_never_panics(line in ".*") {
        let _ = decode_line(&line);
    }

    /// Property: lines without the prefix are passed through as plain output.
    #[test]
    fn unprefixed_lines_are_plain_output(line in "[^@].*") {
        prop_assert!(decode_line(&line).unwrap().is_none());
    }

    /// Property: messages with newlines, quotes and unicode round-trip.
    #[test]
    fn messages_round_trip(message in any::<String>()) {
        let event: Event = OutputStdoutEvent { message: message.clone() }.into();
        let line = encode_line(&event).unwrap();
        prop_assert!(!line.contains('\n'));
        prop_assert_eq!(decode_line(&line).unwrap(), Some(event));
    }

    #[test]
    fn user_errors_round_trip(message in "\\PC*") {
        let event: Event = ProgramUserErrorEvent { message }.into();
        prop_assert_eq!(decode_line(&encode_line(&event).unwrap()).unwrap(), Some(event));
    }

    /// Property: the stack-trace parser tolerates any text.
    #[test]
    fn stack_trace_parse_never_panics(raw in ".*(\n.*){0,4}") {
        for frame in StackFrameInfo::parse_trace(&raw) {
            prop_assert!(!frame.method.is_empty());
        }
    }
}
