//! Rolling window used to deduplicate property views.
//!
//! A user's visit to a property only counts as a new view if their previous
//! counted visit is older than the window. Storage layers evaluate the same
//! rule inside a single conditional write; this type owns the constants and
//! the predicate so every caller agrees on them.

use chrono::{DateTime, Duration, Utc};

/// Rolling window for counting a user's views of a property.
///
/// ```
/// use chrono::{Duration, Utc};
/// use homestead_core::ViewWindow;
///
/// let window = ViewWindow::default();
/// let now = Utc::now();
///
/// assert!(window.counts(None, now));
/// assert!(!window.counts(Some(now - Duration::hours(1)), now));
/// assert!(window.counts(Some(now - Duration::hours(121)), now));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewWindow {
    length: Duration,
}

impl ViewWindow {
    /// Hours a counted view suppresses further counting for the same user.
    pub const DEFAULT_HOURS: i64 = 120;

    /// Create a window of the given length.
    #[must_use]
    pub const fn new(length: Duration) -> Self {
        Self { length }
    }

    /// Length of the window.
    #[must_use]
    pub const fn length(&self) -> Duration {
        self.length
    }

    /// Oldest last-seen timestamp that is still inside the window.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.length
    }

    /// Whether a visit at `now` counts, given when the last counted visit was.
    ///
    /// A missing record always counts. An existing record counts only when it
    /// is strictly earlier than the cutoff.
    #[must_use]
    pub fn counts(&self, last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        last_seen.is_none_or(|seen| seen < self.cutoff(now))
    }
}

impl Default for ViewWindow {
    fn default() -> Self {
        Self::new(Duration::hours(Self::DEFAULT_HOURS))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0)
            .single()
            .map(|base| base + Duration::hours(hour))
            .unwrap_or_default()
    }

    #[test]
    fn test_default_is_120_hours() {
        assert_eq!(ViewWindow::default().length(), Duration::hours(120));
    }

    #[test]
    fn test_cutoff() {
        let window = ViewWindow::default();
        assert_eq!(window.cutoff(at(200)), at(80));
    }

    #[test]
    fn test_first_view_counts() {
        assert!(ViewWindow::default().counts(None, at(0)));
    }

    #[test]
    fn test_repeat_view_inside_window_does_not_count() {
        let window = ViewWindow::default();
        assert!(!window.counts(Some(at(0)), at(1)));
        assert!(!window.counts(Some(at(0)), at(119)));
    }

    #[test]
    fn test_view_exactly_at_cutoff_does_not_count() {
        let window = ViewWindow::default();
        assert!(!window.counts(Some(at(0)), at(120)));
    }

    #[test]
    fn test_view_after_window_counts() {
        let window = ViewWindow::default();
        assert!(window.counts(Some(at(0)), at(120) + Duration::seconds(1)));
        assert!(window.counts(Some(at(0)), at(500)));
    }

    #[test]
    fn test_twice_within_then_after_window() {
        let window = ViewWindow::default();
        let mut last_seen = None;
        let mut views = 0;

        for now in [at(0), at(10), at(130)] {
            if window.counts(last_seen, now) {
                views += 1;
                last_seen = Some(now);
            }
        }

        assert_eq!(views, 2);
        assert_eq!(last_seen, Some(at(130)));
    }

    #[test]
    fn test_custom_window() {
        let window = ViewWindow::new(Duration::minutes(5));
        assert!(!window.counts(Some(at(0)), at(0) + Duration::minutes(4)));
        assert!(window.counts(Some(at(0)), at(0) + Duration::minutes(6)));
    }
}
