//! Bucket functions for split dimensions.
//!
//! Every dimension maps a frame to a [`BucketKey`]; calendar keys also know
//! the span of days they cover so empty buckets can be enumerated.

use time::{Date, Month, OffsetDateTime, Time, UtcOffset, Weekday};

use crate::domain::{DateRange, ProjectId, SplitDimension};

/// Key of one group at one split level. Calendar keys order chronologically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    Year(i32),
    Month { year: i32, month: u8 },
    /// ISO week-year and week number; weeks start on Monday.
    Week { year: i32, week: u8 },
    Day(Date),
    Project(ProjectId),
}

/// Half-open range of local calendar days `[start, end)`.
pub type DayWindow = (Date, Date);

impl BucketKey {
    /// The calendar bucket of a local date. `None` for the Project dimension.
    pub fn of_date(dimension: SplitDimension, date: Date) -> Option<BucketKey> {
        match dimension {
            SplitDimension::Year => Some(BucketKey::Year(date.year())),
            SplitDimension::Month => Some(BucketKey::Month {
                year: date.year(),
                month: u8::from(date.month()),
            }),
            SplitDimension::Week => {
                let (year, week, _) = date.to_iso_week_date();
                Some(BucketKey::Week { year, week })
            }
            SplitDimension::Day => Some(BucketKey::Day(date)),
            SplitDimension::Project => None,
        }
    }

    /// The bucket a frame falls into: its start for calendar dimensions, its
    /// own project (not rolled up) for the Project dimension.
    pub fn of_frame(
        dimension: SplitDimension,
        start: OffsetDateTime,
        offset: UtcOffset,
        project_id: &ProjectId,
    ) -> BucketKey {
        Self::of_date(dimension, start.to_offset(offset).date())
            .unwrap_or_else(|| BucketKey::Project(project_id.clone()))
    }

    /// Days covered by a calendar bucket.
    pub fn span(&self) -> Option<DayWindow> {
        match self {
            BucketKey::Year(year) => {
                let start = Date::from_calendar_date(*year, Month::January, 1).ok()?;
                let end = Date::from_calendar_date(year + 1, Month::January, 1).ok()?;
                Some((start, end))
            }
            BucketKey::Month { year, month } => {
                let month = Month::try_from(*month).ok()?;
                let start = Date::from_calendar_date(*year, month, 1).ok()?;
                let (next_year, next_month) = match month {
                    Month::December => (year + 1, Month::January),
                    other => (*year, other.next()),
                };
                let end = Date::from_calendar_date(next_year, next_month, 1).ok()?;
                Some((start, end))
            }
            BucketKey::Week { year, week } => {
                let start = Date::from_iso_week_date(*year, *week, Weekday::Monday).ok()?;
                let end = start.checked_add(time::Duration::days(7))?;
                Some((start, end))
            }
            BucketKey::Day(date) => Some((*date, date.next_day()?)),
            BucketKey::Project(_) => None,
        }
    }

    /// Display label for calendar keys; project labels come from the index.
    pub fn calendar_label(&self) -> Option<String> {
        match self {
            BucketKey::Year(year) => Some(year.to_string()),
            BucketKey::Month { year, month } => Some(format!("{year}-{month:02}")),
            BucketKey::Week { year, week } => Some(format!("{year}-W{week:02}")),
            BucketKey::Day(date) => Some(date.to_string()),
            BucketKey::Project(_) => None,
        }
    }
}

/// Every bucket of `dimension` that overlaps `window`, in chronological order.
pub fn calendar_buckets(dimension: SplitDimension, window: DayWindow) -> Vec<BucketKey> {
    let (start, end) = window;
    let mut buckets = Vec::new();
    if start >= end {
        return buckets;
    }

    let mut current = BucketKey::of_date(dimension, start);
    while let Some(key) = current {
        let Some((bucket_start, bucket_end)) = key.span() else {
            break;
        };
        if bucket_start >= end {
            break;
        }
        buckets.push(key);
        current = BucketKey::of_date(dimension, bucket_end);
    }
    buckets
}

/// Local days touched by a date range: the day of its start up to, and
/// including, the day holding the last instant before its end.
pub fn range_window(range: &DateRange, offset: UtcOffset) -> DayWindow {
    let start = range.start.to_offset(offset);
    let end = range.end.to_offset(offset);
    let last_day = if end.time() == Time::MIDNIGHT {
        end.date()
    } else {
        end.date().next_day().unwrap_or(end.date())
    };
    (start.date(), last_day.max(start.date()))
}

/// Intersection of two day windows.
pub fn narrow(window: DayWindow, other: DayWindow) -> DayWindow {
    (window.0.max(other.0), window.1.min(other.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, offset};

    #[test]
    fn week_uses_iso_week_year() {
        // 2024-12-30 is a Monday belonging to ISO week 1 of 2025
        assert_eq!(
            BucketKey::of_date(SplitDimension::Week, date!(2024-12-30)),
            Some(BucketKey::Week { year: 2025, week: 1 })
        );
        assert_eq!(
            BucketKey::Week { year: 2025, week: 1 }.span(),
            Some((date!(2024-12-30), date!(2025-01-06)))
        );
    }

    #[test]
    fn month_span_rolls_over_december() {
        let key = BucketKey::Month { year: 2023, month: 12 };
        assert_eq!(key.span(), Some((date!(2023-12-01), date!(2024-01-01))));
        assert_eq!(key.calendar_label().as_deref(), Some("2023-12"));
    }

    #[test]
    fn frame_bucket_uses_report_offset() {
        let key = BucketKey::of_frame(
            SplitDimension::Day,
            datetime!(2024-03-05 23:30 UTC),
            offset!(+1),
            &"p".into(),
        );
        assert_eq!(key, BucketKey::Day(date!(2024-03-06)));

        let key = BucketKey::of_frame(
            SplitDimension::Project,
            datetime!(2024-03-05 23:30 UTC),
            offset!(+1),
            &"p".into(),
        );
        assert_eq!(key, BucketKey::Project("p".into()));
    }

    #[test]
    fn enumerates_buckets_overlapping_window() {
        let days = calendar_buckets(SplitDimension::Day, (date!(2024-03-04), date!(2024-03-09)));
        assert_eq!(days.len(), 5);

        let weeks = calendar_buckets(SplitDimension::Week, (date!(2024-03-06), date!(2024-03-13)));
        assert_eq!(
            weeks,
            vec![
                BucketKey::Week { year: 2024, week: 10 },
                BucketKey::Week { year: 2024, week: 11 },
            ]
        );

        let window = (date!(2024-03-06), date!(2024-03-06));
        assert!(calendar_buckets(SplitDimension::Month, window).is_empty());
    }

    #[test]
    fn range_window_includes_partial_last_day() {
        let start = datetime!(2024-03-04 00:00 UTC);
        let range = DateRange::new(start, datetime!(2024-03-06 12:00 UTC)).unwrap();
        assert_eq!(
            range_window(&range, offset!(UTC)),
            (date!(2024-03-04), date!(2024-03-07))
        );
        let start = datetime!(2024-03-04 00:00 UTC);
        let range = DateRange::new(start, datetime!(2024-03-06 00:00 UTC)).unwrap();
        assert_eq!(
            range_window(&range, offset!(UTC)),
            (date!(2024-03-04), date!(2024-03-06))
        );
    }
}
