//! Ingest windows over UTC time.

use chrono::{DateTime, Duration, DurationRound, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A site and an inclusive `[start, end]` time window that drives listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestWindow {
    pub site: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl IngestWindow {
    pub fn new(site: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            site: site.into(),
            start,
            end,
        }
    }

    /// Window covering the `minutes` leading up to `now`.
    pub fn ending_at(site: impl Into<String>, now: DateTime<Utc>, minutes: u32) -> Self {
        Self::new(site, now - Duration::minutes(minutes as i64), now)
    }

    /// Inclusive at both ends.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }

    /// Every calendar date from the start date to the end date, inclusive.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let last = self.end.date_naive();
        let mut dates = Vec::new();
        let mut current = self.start.date_naive();
        while current <= last {
            dates.push(current);
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        dates
    }

    /// Every hour bucket from the hour containing `start` to the hour
    /// containing `end`, inclusive.
    pub fn hours(&self) -> Vec<DateTime<Utc>> {
        let mut current = self
            .start
            .duration_trunc(Duration::hours(1))
            .unwrap_or(self.start);
        let mut hours = Vec::new();
        while current <= self.end {
            hours.push(current);
            current += Duration::hours(1);
        }
        hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_spans_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap();
        let window = IngestWindow::ending_at("KPDT", now, 180);
        let dates = window.dates();
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        assert_eq!(dates[1], NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn test_hours_include_end_bucket() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 11, 40, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let window = IngestWindow::new("PDT", start, end);
        let hours = window.hours();
        assert_eq!(
            hours,
            vec![
                Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn test_contains_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let window = IngestWindow::new("KPDT", start, end);
        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(start - Duration::seconds(1)));
        assert!(!window.contains(end + Duration::seconds(1)));
    }
}
