//! Typed events derived from engine log lines.
//!
//! One event is produced per line by a [`LogClassifier`]. Events are
//! transient: they drive a progress-state update and are never stored.
//!
//! [`LogClassifier`]: crate::classifier::LogClassifier

/// A progress event derived from a single engine log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    /// The line carries no progress information. It is still echoed to the
    /// diagnostic log, but produces no state change.
    Unrecognized,

    /// The engine announced how many nets it is about to route.
    TotalAnnounced { total: u32 },

    /// A routing pass reported the number of nets still incomplete.
    ///
    /// The count is an absolute remaining-net count, not a delta; later
    /// ticks normally carry smaller values than earlier ones.
    ProgressTick { count: u32 },

    /// The routing phase finished with `count` nets still incomplete.
    ///
    /// Also a tick for display purposes; optimization follows.
    RoutingFinished { count: u32 },

    /// Route optimization finished; the job is done.
    ///
    /// The completion line carries no net count. The final count is the
    /// last tick value observed before this event.
    JobCompleted,
}
