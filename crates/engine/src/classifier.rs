//! Engine log-line classification.
//!
//! The engine writes free-form text to stdout. The few lines that matter
//! carry a severity marker and a keyword sequence at fixed token offsets;
//! everything else is noise. [`TokenClassifier`] implements that matching
//! policy for the current engine log format. The matcher is deliberately
//! isolated behind [`LogClassifier`] so a changed log format means a new
//! implementation, not edits to the session loop.

use crate::events::LogEvent;

/// Strategy for turning one log line into a [`LogEvent`].
///
/// Implementations must be stateless and total: classifying the same line
/// twice yields the same result, and no input is an error.
pub trait LogClassifier: Send + Sync {
    fn classify(&self, line: &str) -> LogEvent;
}

/// Token-positional matcher for the current engine log format.
///
/// Lines are split on whitespace and matched on fixed offsets, e.g.
///
/// ```text
/// 2024-05-01 10:00:00 +0000 INFO main Before route: 42
/// 2024-05-01 10:00:05 +0000 INFO main Auto-router pass #1 done: 30
/// 2024-05-01 10:01:00 +0000 INFO main After route: 3
/// 2024-05-01 10:01:30 +0000 INFO main Route optimization was completed ...
/// ```
///
/// This is a knowingly fragile coupling to an external tool's wording: a
/// reworded or re-columned log makes every line `Unrecognized`, silently.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenClassifier;

impl LogClassifier for TokenClassifier {
    fn classify(&self, line: &str) -> LogEvent {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        if tokens.get(3).copied() != Some("INFO") {
            return LogEvent::Unrecognized;
        }

        match (tokens.get(5).copied(), tokens.get(6).copied()) {
            (Some("Before"), Some("route:")) => match parse_count(tokens.get(7)) {
                Some(total) => LogEvent::TotalAnnounced { total },
                None => LogEvent::Unrecognized,
            },
            (Some("Auto-router"), Some("pass")) => match parse_count(tokens.get(9)) {
                Some(count) => LogEvent::ProgressTick { count },
                None => LogEvent::Unrecognized,
            },
            (Some("After"), Some("route:")) => match parse_count(tokens.get(7)) {
                Some(count) => LogEvent::RoutingFinished { count },
                None => LogEvent::Unrecognized,
            },
            (Some("Route"), Some("optimization"))
                if tokens.get(7).copied() == Some("was")
                    && tokens.get(8).copied() == Some("completed") =>
            {
                LogEvent::JobCompleted
            }
            _ => LogEvent::Unrecognized,
        }
    }
}

/// Classifier that recognizes nothing.
///
/// Used by the raw echo mode: every line is diagnostic output and no
/// progress state is derived.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughClassifier;

impl LogClassifier for PassthroughClassifier {
    fn classify(&self, _line: &str) -> LogEvent {
        LogEvent::Unrecognized
    }
}

fn parse_count(token: Option<&&str>) -> Option<u32> {
    token.and_then(|t| t.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> LogEvent {
        TokenClassifier.classify(line)
    }

    #[test]
    fn before_route_announces_total() {
        let ev = classify("2024-05-01 10:00:00 +0000 INFO main Before route: 42");
        assert_eq!(ev, LogEvent::TotalAnnounced { total: 42 });
    }

    #[test]
    fn autorouter_pass_is_a_tick() {
        let ev = classify("2024-05-01 10:00:05 +0000 INFO main Auto-router pass #1 done: 30");
        assert_eq!(ev, LogEvent::ProgressTick { count: 30 });
    }

    #[test]
    fn after_route_finishes_routing() {
        let ev = classify("2024-05-01 10:01:00 +0000 INFO main After route: 3");
        assert_eq!(ev, LogEvent::RoutingFinished { count: 3 });
    }

    #[test]
    fn optimization_completed_ends_the_job() {
        let ev =
            classify("2024-05-01 10:01:30 +0000 INFO main Route optimization was completed in 30s");
        assert_eq!(ev, LogEvent::JobCompleted);
    }

    #[test]
    fn severity_must_be_info() {
        let ev = classify("2024-05-01 10:00:00 +0000 WARN main Before route: 42");
        assert_eq!(ev, LogEvent::Unrecognized);
    }

    #[test]
    fn keywords_at_wrong_offsets_do_not_match() {
        // The keywords appear, but shifted by one column.
        let ev = classify("2024-05-01 10:00:00 INFO main Before route: 42");
        assert_eq!(ev, LogEvent::Unrecognized);
    }

    #[test]
    fn non_numeric_count_is_unrecognized() {
        let ev = classify("2024-05-01 10:00:00 +0000 INFO main Before route: many");
        assert_eq!(ev, LogEvent::Unrecognized);
    }

    #[test]
    fn truncated_pass_line_is_unrecognized() {
        let ev = classify("2024-05-01 10:00:05 +0000 INFO main Auto-router pass 1");
        assert_eq!(ev, LogEvent::Unrecognized);
    }

    #[test]
    fn arbitrary_lines_are_unrecognized() {
        assert_eq!(classify(""), LogEvent::Unrecognized);
        assert_eq!(classify("freerouting 2.0 starting up"), LogEvent::Unrecognized);
        assert_eq!(
            classify("2024-05-01 10:00:00 +0000 DEBUG main Before route: 42"),
            LogEvent::Unrecognized
        );
    }

    #[test]
    fn classification_is_idempotent() {
        let line = "2024-05-01 10:00:05 +0000 INFO main Auto-router pass #2 done: 17";
        assert_eq!(classify(line), classify(line));
        assert_eq!(classify(line), LogEvent::ProgressTick { count: 17 });
    }

    #[test]
    fn passthrough_recognizes_nothing() {
        let c = PassthroughClassifier;
        assert_eq!(
            c.classify("2024-05-01 10:00:00 +0000 INFO main Before route: 42"),
            LogEvent::Unrecognized
        );
    }
}
