//! In-place terminal progress bar.
//!
//! Renders routing progress as a single line redrawn with a carriage
//! return. The bar spans `total + 1` slots: one per net plus a final slot
//! that only fills when the engine reports optimization complete. The
//! engine reports absolute remaining-net counts, so the fill is computed
//! as `total - remaining` rather than accumulated from raw tick values.
//!
//! Rendering goes to stderr and failures are ignored; presentation must
//! never fail a job.

use std::io::Write;

use crate::progress::{Phase, ProgressState};

/// Width of the bar in terminal columns.
const BAR_WIDTH: usize = 40;

/// Stateful terminal progress indicator for one job.
#[derive(Debug, Default)]
pub struct ProgressPresenter {
    active: bool,
}

impl ProgressPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redraw the bar from the current progress state.
    ///
    /// Does nothing until a total is known.
    pub fn update(&mut self, state: &ProgressState) {
        let Some(total) = state.total else {
            return;
        };
        self.active = true;

        let capacity = total as u64 + 1;
        let done = match state.phase {
            Phase::Completed => capacity,
            _ => u64::from(total - state.current.min(total)),
        };

        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{}", render_bar(done, capacity, BAR_WIDTH));
        let _ = err.flush();
    }

    /// Fill the bar, print the final tally, and release the line.
    pub fn finish(&mut self, state: &ProgressState) {
        self.update(state);
        if !self.active {
            return;
        }

        let total = state.total.unwrap_or(0);
        let mut err = std::io::stderr().lock();
        let _ = writeln!(
            err,
            "\nRouting result: {} of {} nets incomplete",
            state.current, total,
        );
    }
}

/// Render the bar text for `done` of `capacity` slots.
fn render_bar(done: u64, capacity: u64, width: usize) -> String {
    let capacity = capacity.max(1);
    let done = done.min(capacity);
    let filled = (done as usize * width) / capacity as usize;
    let percent = done * 100 / capacity;

    format!(
        "Routing [{}{}] {percent:>3}%",
        "=".repeat(filled),
        " ".repeat(width - filled),
    )
}
