//! Live progress across every check of a run.
//!
//! [`ProgressTracker`] owns the counters; a [`ProgressSink`] decides how a
//! snapshot is shown. The terminal sink redraws one line on stderr in place.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

const BAR_WIDTH: usize = 30;
const ERASE_LINE: &str = "\x1b[K";
const YELLOW: &str = "\x1b[93m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub done: usize,
    pub in_flight: usize,
}

impl ProgressSnapshot {
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            100 * self.done / self.total
        }
    }
}

/// Receives every state change of a tracker.
///
/// Called while the tracker's counters are locked, so implementations must
/// return quickly and must not call back into the tracker.
pub trait ProgressSink: Send + Sync {
    fn render(&self, snapshot: &ProgressSnapshot, label: &str);

    fn finish(&self, snapshot: &ProgressSnapshot);
}

/// Concurrency-safe queued/running/completed counters.
pub struct ProgressTracker {
    state: Mutex<ProgressSnapshot>,
    sink: Arc<dyn ProgressSink>,
}

impl ProgressTracker {
    /// Start tracking `total` checks and draw the initial line.
    pub fn begin(total: usize, sink: Arc<dyn ProgressSink>) -> Self {
        let tracker = Self {
            state: Mutex::new(ProgressSnapshot {
                total,
                done: 0,
                in_flight: 0,
            }),
            sink,
        };
        tracker.render("waiting...");
        tracker
    }

    /// A request for `label` now holds a gate permit.
    pub fn on_start(&self, label: &str) {
        self.update(|s| s.in_flight += 1, &format!("+{label}"));
    }

    /// The check behind `label` produced its final result while in flight.
    pub fn on_finish(&self, label: &str) {
        self.update(
            |s| {
                s.in_flight = s.in_flight.saturating_sub(1);
                s.done = (s.done + 1).min(s.total);
            },
            label,
        );
    }

    /// An attempt for `label` gave its permit back and will be retried.
    pub fn on_release(&self, label: &str) {
        self.update(
            |s| s.in_flight = s.in_flight.saturating_sub(1),
            &format!("~{label}"),
        );
    }

    /// The check behind `label` ended without holding a permit, e.g. it was
    /// cancelled while waiting.
    pub fn on_skip(&self, label: &str) {
        self.update(|s| s.done = (s.done + 1).min(s.total), label);
    }

    /// Redraw without changing any counter.
    pub fn render(&self, label: &str) {
        self.update(|_| {}, label);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.sink.finish(&state);
    }

    fn update(&self, apply: impl FnOnce(&mut ProgressSnapshot), label: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state);
        self.sink.render(&state, label);
    }
}

/// Single in-place progress bar on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalProgress;

impl TerminalProgress {
    fn bar(snapshot: &ProgressSnapshot) -> String {
        let filled = if snapshot.total == 0 {
            0
        } else {
            BAR_WIDTH * snapshot.done / snapshot.total
        };
        format!("{}{}", "\u{2588}".repeat(filled), "\u{2591}".repeat(BAR_WIDTH - filled))
    }
}

impl ProgressSink for TerminalProgress {
    fn render(&self, snapshot: &ProgressSnapshot, label: &str) {
        let flight = if snapshot.in_flight > 0 {
            format!(" {YELLOW}{} running{RESET}", snapshot.in_flight)
        } else {
            String::new()
        };
        let label = match label.strip_prefix('+') {
            Some(name) => format!("{BOLD}+{name}{RESET}"),
            None => label.to_string(),
        };
        let mut err = std::io::stderr().lock();
        let _ = write!(
            err,
            "\r  [{}] {}/{} ({}%){flight} {label}{ERASE_LINE}",
            Self::bar(snapshot),
            snapshot.done,
            snapshot.total,
            snapshot.percent()
        );
        let _ = err.flush();
    }

    fn finish(&self, snapshot: &ProgressSnapshot) {
        let _ = writeln!(
            std::io::stderr().lock(),
            "\r  [{}] {}/{} (100%) done{ERASE_LINE}",
            "\u{2588}".repeat(BAR_WIDTH),
            snapshot.done,
            snapshot.total
        );
    }
}

/// Keeps every rendered snapshot in memory. Useful for asserting on what a
/// run displayed.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    frames: Mutex<Vec<(ProgressSnapshot, String)>>,
    finished: Mutex<Option<ProgressSnapshot>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<(ProgressSnapshot, String)> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn finished(&self) -> Option<ProgressSnapshot> {
        *self.finished.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Highest in-flight count ever displayed.
    pub fn max_in_flight(&self) -> usize {
        self.frames()
            .iter()
            .map(|(s, _)| s.in_flight)
            .max()
            .unwrap_or(0)
    }
}

impl ProgressSink for RecordingProgress {
    fn render(&self, snapshot: &ProgressSnapshot, label: &str) {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((*snapshot, label.to_string()));
    }

    fn finish(&self, snapshot: &ProgressSnapshot) {
        *self.finished.lock().unwrap_or_else(PoisonError::into_inner) = Some(*snapshot);
    }
}
