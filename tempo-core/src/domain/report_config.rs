use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::{Date, OffsetDateTime, Time, UtcOffset};

use super::ProjectId;
use crate::{error::ConfigurationError, rounding::RoundingPolicy};

/// A grouping axis of a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SplitDimension {
    Year,
    Month,
    Week,
    Day,
    Project,
}

impl SplitDimension {
    pub fn is_calendar(&self) -> bool {
        !matches!(self, SplitDimension::Project)
    }

    /// Ordering of calendar granularity, coarse to fine. `None` for Project.
    fn granularity(&self) -> Option<u8> {
        match self {
            SplitDimension::Year => Some(0),
            SplitDimension::Month => Some(1),
            SplitDimension::Week => Some(2),
            SplitDimension::Day => Some(3),
            SplitDimension::Project => None,
        }
    }

    /// The finest calendar dimension in `splits`, Day when there is none.
    pub fn finest_calendar(splits: &[SplitDimension]) -> SplitDimension {
        splits
            .iter()
            .filter(|d| d.is_calendar())
            .max_by_key(|d| d.granularity())
            .copied()
            .unwrap_or(SplitDimension::Day)
    }
}

/// Half-open `[start, end)` filter on frame intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl DateRange {
    pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self, ConfigurationError> {
        if end < start {
            return Err(ConfigurationError::InvalidDateRange);
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days `from..=to` at `offset`, the way a date picker
    /// selects them.
    pub fn days(from: Date, to: Date, offset: UtcOffset) -> Result<Self, ConfigurationError> {
        let start = from.with_time(Time::MIDNIGHT).assume_offset(offset);
        let end = to
            .next_day()
            .ok_or(ConfigurationError::InvalidDateRange)?
            .with_time(Time::MIDNIGHT)
            .assume_offset(offset);
        Self::new(start, end)
    }

    /// Whether `[start, end)` overlaps the range. A zero-length interval
    /// overlaps when its instant lies inside the range.
    pub fn intersects(&self, start: OffsetDateTime, end: OffsetDateTime) -> bool {
        if start == end {
            return self.start <= start && start < self.end;
        }
        start < self.end && end > self.start
    }

    pub fn span(&self) -> time::Duration {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayOptions {
    pub show_summary: bool,
    pub show_matrix_tables: bool,
    pub show_sales: bool,
    pub show_tracked_average: bool,
    pub show_untracked_average: bool,
    pub show_empty_groups: bool,
}

/// Everything that shapes one report. Built by the caller, never persisted
/// by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfiguration {
    /// Project to report on; `None` reports on every project.
    pub target: Option<ProjectId>,
    pub include_subprojects: bool,
    pub date_range: Option<DateRange>,
    pub include_archived: bool,
    pub rounding: RoundingPolicy,
    pub splits: Vec<SplitDimension>,
    pub display: DisplayOptions,
    pub template: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Offset used to place frames into calendar buckets.
    pub utc_offset: UtcOffset,
    /// When set, running frames are measured up to this instant; otherwise
    /// they are left out.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub now: Option<OffsetDateTime>,
}

impl ReportConfiguration {
    pub fn new(splits: Vec<SplitDimension>) -> Self {
        Self {
            target: None,
            include_subprojects: false,
            date_range: None,
            include_archived: false,
            rounding: RoundingPolicy::none(),
            splits,
            display: DisplayOptions::default(),
            template: "default".to_string(),
            title: None,
            description: None,
            utc_offset: UtcOffset::UTC,
            now: None,
        }
    }

    pub fn for_project(mut self, target: impl Into<ProjectId>, include_subprojects: bool) -> Self {
        self.target = Some(target.into());
        self.include_subprojects = include_subprojects;
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_archived(mut self, include_archived: bool) -> Self {
        self.include_archived = include_archived;
        self
    }

    pub fn with_rounding(mut self, rounding: RoundingPolicy) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_display(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_utc_offset(mut self, offset: UtcOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn with_now(mut self, now: OffsetDateTime) -> Self {
        self.now = Some(now);
        self
    }

    /// Rejects configurations the aggregator cannot work with.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.splits.is_empty() {
            return Err(ConfigurationError::EmptySplit);
        }
        let project_splits = self
            .splits
            .iter()
            .filter(|d| **d == SplitDimension::Project)
            .count();
        if project_splits > 1 {
            return Err(ConfigurationError::DuplicateProjectSplit);
        }
        if self.display.show_matrix_tables && self.splits.len() > 2 {
            return Err(ConfigurationError::MatrixTooManyDimensions(self.splits.len()));
        }
        self.rounding.validate()?;
        Ok(())
    }
}
