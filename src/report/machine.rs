//! Machine-readable event stream.

use std::io::Write;

use attrun_events::{Event, EventHandler, encode_line};

/// Writes every event as one prefixed line, flushing after each so a reading parent sees events as they happen.
pub struct MachineFormatter<W: Write> {
    out: W,
}

impl<W: Write> MachineFormatter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl MachineFormatter<std::io::Stdout> {
    /// The stream read by the orchestrator. Shares the process stdout buffer with test code, keeping the order.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> EventHandler for MachineFormatter<W> {
    fn handle(&mut self, event: &Event) {
        let line = match encode_line(event) {
            Ok(line) => line,
            Err(err) => {
                tracing::error!(event = event.type_name(), error = %err, "cannot encode event");
                return;
            }
        };
        if let Err(err) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %err, "cannot write event line");
        }
    }
}
