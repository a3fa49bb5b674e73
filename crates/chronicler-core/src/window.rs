use thiserror::Error;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::diag::Diagnostics;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("empty report window: start {start} is not before end {end}")]
    Empty {
        start: OffsetDateTime,
        end: OffsetDateTime,
    },
}

/// Anything carrying an event timestamp. Lets the pruner work on raw forge
/// events and tracker events alike.
pub trait Timestamped {
    fn ts(&self) -> OffsetDateTime;
}

/// The half-open reporting interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl ReportWindow {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, WindowError> {
        if start >= end {
            return Err(WindowError::Empty { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    pub fn end(&self) -> OffsetDateTime {
        self.end
    }

    /// Interval test: `start <= ts < end`.
    pub fn contains(&self, ts: OffsetDateTime) -> bool {
        self.start <= ts && ts < self.end
    }
}

impl std::fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", ymd(self.start), ymd(self.end))
    }
}

fn ymd(ts: OffsetDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    ts.format(&fmt).unwrap_or_else(|_| ts.to_string())
}

/// Keep only in-window events.
///
/// Also performs the best-effort completeness check: if the oldest event of
/// the *full* input history is not older than `start`, the upstream adapter
/// may have returned too short a history to cover the window — warn, do not
/// fail.
pub fn prune<E: Timestamped + Clone>(
    events: &[E],
    window: &ReportWindow,
    diags: &mut Diagnostics,
) -> Vec<E> {
    if let Some(oldest) = events.iter().map(Timestamped::ts).min() {
        if oldest >= window.start() {
            diags.warn(
                format!(
                    "history may be missing events between {} and {}",
                    ymd(window.start()),
                    ymd(oldest)
                ),
                format!("window {window}"),
            );
        }
    }
    events
        .iter()
        .filter(|e| window.contains(e.ts()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[derive(Debug, Clone, PartialEq)]
    struct Stamp(OffsetDateTime);

    impl Timestamped for Stamp {
        fn ts(&self) -> OffsetDateTime {
            self.0
        }
    }

    fn window() -> ReportWindow {
        ReportWindow::new(datetime!(2016-04-01 0:00 UTC), datetime!(2016-07-01 0:00 UTC)).unwrap()
    }

    #[test]
    fn empty_window_rejected() {
        let at = datetime!(2016-04-01 0:00 UTC);
        assert_eq!(
            ReportWindow::new(at, at),
            Err(WindowError::Empty { start: at, end: at })
        );
    }

    #[test]
    fn interval_is_half_open() {
        let w = window();
        assert!(w.contains(datetime!(2016-04-01 0:00 UTC)));
        assert!(w.contains(datetime!(2016-06-30 23:59:59 UTC)));
        assert!(!w.contains(datetime!(2016-07-01 0:00 UTC)));
        assert!(!w.contains(datetime!(2016-03-31 23:59:59 UTC)));
    }

    #[test]
    fn prune_drops_out_of_window_events() {
        let mut diags = Diagnostics::new();
        let events = vec![
            Stamp(datetime!(2016-03-01 0:00 UTC)),
            Stamp(datetime!(2016-05-01 0:00 UTC)),
            Stamp(datetime!(2016-08-01 0:00 UTC)),
        ];
        let kept = prune(&events, &window(), &mut diags);
        assert_eq!(kept, vec![Stamp(datetime!(2016-05-01 0:00 UTC))]);
        // Oldest event predates the window, so the history is complete.
        assert!(diags.is_empty());
    }

    #[test]
    fn prune_warns_when_history_too_short() {
        let mut diags = Diagnostics::new();
        let events = vec![
            Stamp(datetime!(2016-05-01 0:00 UTC)),
            Stamp(datetime!(2016-06-01 0:00 UTC)),
        ];
        let kept = prune(&events, &window(), &mut diags);
        assert_eq!(kept.len(), 2);
        assert_eq!(diags.len(), 1);
        let warning = diags.iter().next().unwrap();
        assert!(warning.message.contains("2016-04-01"), "{warning}");
        assert!(warning.message.contains("2016-05-01"), "{warning}");
        assert!(warning.context.contains("2016-07-01"), "{warning}");
    }

    #[test]
    fn prune_empty_history_is_silent() {
        let mut diags = Diagnostics::new();
        let kept = prune(&[] as &[Stamp], &window(), &mut diags);
        assert!(kept.is_empty());
        assert!(diags.is_empty());
    }
}
