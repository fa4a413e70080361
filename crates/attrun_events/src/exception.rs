//! Portable exception snapshots.
//!
//! An [`ExceptionInfo`] is a detached copy of a thrown error: its full type name, message, source, help link, data
//! entries, parsed stack frames, and (recursively) its inner exception. It carries no reference to the native error,
//! so it can be serialized into the event stream and reconstructed in another process.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionInfo {
    pub full_name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_link: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack_trace: Vec<StackFrameInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner: Option<Box<ExceptionInfo>>,
}

impl ExceptionInfo {
    pub fn new(full_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Snapshot a Rust error and its `source()` chain.
    ///
    /// The outermost snapshot is named after `E`. Sources are only reachable as trait objects, so they are named
    /// `std::error::Error`.
    pub fn from_error<E: std::error::Error + 'static>(err: &E) -> Self {
        let mut info = ExceptionInfo::new(std::any::type_name::<E>(), err.to_string());
        info.inner = err.source().map(|source| Box::new(Self::from_source(source)));
        info
    }

    fn from_source(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut info = ExceptionInfo::new("std::error::Error", err.to_string());
        info.inner = err.source().map(|source| Box::new(Self::from_source(source)));
        info
    }

    /// Iterate over this exception and its inner exceptions, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &ExceptionInfo> {
        std::iter::successors(Some(self), |e| e.inner.as_deref())
    }
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, exception) in self.chain().enumerate() {
            if depth > 0 {
                write!(f, "\n ---> ")?;
            }
            write!(f, "{}: {}", exception.full_name, exception.message)?;
            for (key, value) in &exception.data {
                write!(f, "\n   data[{key}] = {value}")?;
            }
            for frame in &exception.stack_trace {
                write!(f, "\n   {frame}")?;
            }
        }
        Ok(())
    }
}

/// One parsed frame of a stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrameInfo {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl StackFrameInfo {
    /// Parse a textual stack trace of the form `   at Ns.Type.Method(Args) in /path/File.cs:line 42`.
    ///
    /// Lines that are not frames (separators, blank lines) are skipped.
    pub fn parse_trace(raw: &str) -> Vec<StackFrameInfo> {
        raw.lines().filter_map(Self::parse_line).collect()
    }

    fn parse_line(line: &str) -> Option<StackFrameInfo> {
        let frame = line.trim().strip_prefix("at ")?.trim();
        if frame.is_empty() {
            return None;
        }

        let Some((method, location)) = frame.rsplit_once(" in ") else {
            return Some(StackFrameInfo {
                method: frame.to_string(),
                file: None,
                line: None,
            });
        };

        let (file, line) = match location.rsplit_once(":line ") {
            Some((file, number)) => (file, number.trim().parse().ok()),
            None => (location, None),
        };

        Some(StackFrameInfo {
            method: method.trim().to_string(),
            file: Some(file.trim().to_string()),
            line,
        })
    }
}

impl fmt::Display for StackFrameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {}", self.method)?;
        if let Some(file) = &self.file {
            write!(f, " in {file}")?;
            if let Some(line) = self.line {
                write!(f, ":line {line}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frames_with_and_without_locations() {
        let trace = "   at Sample.Tests.MathTests.Adds() in /src/MathTests.cs:line 17\n\
                     --- End of inner exception stack trace ---\n\
                     \n\
                     at System.RuntimeMethodHandle.InvokeMethod(Object target)";
        let frames = StackFrameInfo::parse_trace(trace);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].method, "Sample.Tests.MathTests.Adds()");
        assert_eq!(frames[0].file.as_deref(), Some("/src/MathTests.cs"));
        assert_eq!(frames[0].line, Some(17));
        assert_eq!(frames[1].file, None);
    }

    #[test]
    fn file_without_line_number_keeps_the_file() {
        let frames = StackFrameInfo::parse_trace("at A.B() in C:\\src\\B.cs");
        assert_eq!(frames[0].file.as_deref(), Some("C:\\src\\B.cs"));
        assert_eq!(frames[0].line, None);
    }

    #[test]
    fn display_unwraps_inner_exceptions() {
        let mut outer = ExceptionInfo::new("System.InvalidOperationException", "outer");
        outer.inner = Some(Box::new(ExceptionInfo::new("System.ArgumentException", "inner")));
        let text = outer.to_string();
        assert!(text.starts_with("System.InvalidOperationException: outer"));
        assert!(text.ends_with("\n ---> System.ArgumentException: inner"));
        assert_eq!(outer.chain().count(), 2);
    }

    #[test]
    fn rust_errors_keep_their_source_chain() {
        #[derive(Debug)]
        struct Outer(std::io::Error);
        impl fmt::Display for Outer {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("could not spawn")
            }
        }
        impl std::error::Error for Outer {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(std::io::Error::other("no such file"));
        let info = ExceptionInfo::from_error(&err);
        assert!(info.full_name.ends_with("Outer"));
        assert_eq!(info.message, "could not spawn");
        assert_eq!(info.inner.as_ref().map(|i| i.message.as_str()), Some("no such file"));
    }
}
