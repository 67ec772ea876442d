//! Job progress state derived from classified log events.

use crate::events::LogEvent;

/// Coarse job phase. Only ever advances through the declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    NotStarted,
    Routing,
    Optimizing,
    Completed,
}

/// The state change produced by applying one event.
///
/// Tells the session what, if anything, needs publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// Nothing to publish.
    None,
    /// The total net count is now known; routing has begun.
    Started { total: u32 },
    /// The remaining-net count changed.
    Ticked { current: u32 },
    /// The job finished with `final_count` nets still incomplete.
    Finished { final_count: u32 },
}

/// Mutable progress of one routing job.
///
/// `current` is the absolute remaining-net count as last reported by the
/// engine; it is not a delta. Once `total` is known, `current <= total`
/// holds (out-of-range ticks are flagged and clamped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub total: Option<u32>,
    pub current: u32,
    pub phase: Phase,
}

impl ProgressState {
    pub fn new() -> Self {
        Self {
            total: None,
            current: 0,
            phase: Phase::NotStarted,
        }
    }

    /// Fold one classified event into the state.
    pub fn apply(&mut self, event: LogEvent) -> StateChange {
        match event {
            LogEvent::Unrecognized => StateChange::None,
            LogEvent::TotalAnnounced { total } => {
                self.total = Some(total);
                self.current = total;
                self.advance(Phase::Routing);
                StateChange::Started { total }
            }
            LogEvent::ProgressTick { count } => {
                self.current = self.clamp_tick(count);
                StateChange::Ticked {
                    current: self.current,
                }
            }
            LogEvent::RoutingFinished { count } => {
                self.current = self.clamp_tick(count);
                self.advance(Phase::Optimizing);
                StateChange::Ticked {
                    current: self.current,
                }
            }
            LogEvent::JobCompleted => {
                if self.total.is_none() {
                    tracing::warn!("engine reported completion before announcing a net total");
                }
                self.advance(Phase::Completed);
                StateChange::Finished {
                    final_count: self.current,
                }
            }
        }
    }

    fn clamp_tick(&self, count: u32) -> u32 {
        match self.total {
            Some(total) if count > total => {
                tracing::warn!(
                    count,
                    total,
                    "engine reported more incomplete nets than announced; clamping",
                );
                total
            }
            _ => count,
        }
    }

    /// Phase transitions are monotonic; a lower target is ignored.
    fn advance(&mut self, to: Phase) {
        if to > self.phase {
            self.phase = to;
        }
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}
