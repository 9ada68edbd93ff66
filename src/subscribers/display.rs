//! # Display: per-consumer progress rows on a terminal
//!
//! Renders each `CounterObserved` event as `"<worker>: <value>"` on the
//! terminal row that belongs to that consumer, using ANSI cursor positioning:
//! ```text
//! ESC[2J              clear screen (once, via Display::clear)
//! ESC[<row>;0H        move to the consumer's row
//! <row>: <value>      overwrite the row
//! ```
//!
//! Writes go through the display's own lock, independent of the counting
//! semaphore, so two rows are never interleaved.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const CLEAR_SCREEN: &str = "\x1b[2J";

/// Terminal renderer for counter observations.
pub struct Display<W = io::Stdout> {
    out: Mutex<W>,
}

impl Display<io::Stdout> {
    /// Renders to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + 'static> Display<W> {
    /// Renders to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Clears the whole screen.
    pub fn clear(&self) -> io::Result<()> {
        self.with_out(|out| {
            out.write_all(CLEAR_SCREEN.as_bytes())?;
            out.flush()
        })
    }

    /// Draws one progress row for `worker`.
    pub fn draw(&self, worker: usize, value: u64) -> io::Result<()> {
        self.with_out(|out| {
            write!(out, "\x1b[{worker};0H\x1b[2K{worker}: {value}")?;
            out.flush()
        })
    }

    /// Clears the screen and prints the final counter value.
    pub fn summary(&self, value: u64) -> io::Result<()> {
        self.with_out(|out| {
            writeln!(out, "{CLEAR_SCREEN}\x1b[1;0HTotal: {value}")?;
            out.flush()
        })
    }

    /// Consumes the display and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_out<R>(&self, f: impl FnOnce(&mut W) -> io::Result<R>) -> io::Result<R> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut out)
    }
}

#[async_trait]
impl<W: Write + Send + 'static> Subscribe for Display<W> {
    async fn on_event(&self, e: &Event) {
        if let (EventKind::CounterObserved, Some(worker), Some(value)) = (e.kind, e.worker, e.value) {
            // A broken terminal must not take the run down.
            let _ = self.draw(worker, value);
        }
    }

    fn name(&self) -> &'static str {
        "Display"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_positions_cursor_on_worker_row() {
        let d = Display::new(Vec::new());
        d.draw(3, 42).unwrap();
        let out = String::from_utf8(d.into_inner()).unwrap();
        assert_eq!(out, "\x1b[3;0H\x1b[2K3: 42");
    }

    #[tokio::test]
    async fn test_only_observations_are_drawn() {
        let d = Display::new(Vec::new());
        d.on_event(&Event::new(EventKind::TargetReached).with_value(10))
            .await;
        d.on_event(&Event::observed(1, 10)).await;
        let out = String::from_utf8(d.into_inner()).unwrap();
        assert!(out.ends_with("1: 10"));
        assert_eq!(out.matches("\x1b[1;0H").count(), 1);
    }

    #[test]
    fn test_summary_clears_then_prints_total() {
        let d = Display::new(Vec::new());
        d.summary(1000).unwrap();
        let out = String::from_utf8(d.into_inner()).unwrap();
        assert!(out.starts_with(CLEAR_SCREEN));
        assert!(out.ends_with("Total: 1000\n"));
    }
}
