//! Live per-project totals for fixed time windows (today, this week, ...),
//! plus the small project actions shown next to them.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::{
    aggregate::{aggregate, BucketKey, DayWindow},
    clock::Clock,
    domain::{
        active_frame, DateRange, Frame, FrameId, Project, ProjectId, ReportConfiguration,
        SplitDimension,
    },
    error::ConfigurationError,
    hierarchy::ProjectIndex,
};

/// Label of the pseudo project summing up everything.
pub const OVERALL_LABEL: &str = "ALL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize)]
pub enum StatusWindow {
    #[strum(to_string = "Today")]
    Today,
    #[strum(to_string = "Yesterday")]
    Yesterday,
    #[strum(to_string = "This week")]
    ThisWeek,
    #[strum(to_string = "This month")]
    ThisMonth,
    #[strum(to_string = "This year")]
    ThisYear,
    #[strum(to_string = "All")]
    All,
}

impl StatusWindow {
    /// The local days covered by the window on `today`. `None` for
    /// [`StatusWindow::All`].
    pub fn days(&self, today: Date) -> Option<DayWindow> {
        let (dimension, date) = match self {
            StatusWindow::Today => (SplitDimension::Day, today),
            StatusWindow::Yesterday => (SplitDimension::Day, today.previous_day()?),
            StatusWindow::ThisWeek => (SplitDimension::Week, today),
            StatusWindow::ThisMonth => (SplitDimension::Month, today),
            StatusWindow::ThisYear => (SplitDimension::Year, today),
            StatusWindow::All => return None,
        };
        BucketKey::of_date(dimension, date)?.span()
    }

    fn range(
        &self,
        today: Date,
        offset: UtcOffset,
    ) -> Result<Option<DateRange>, ConfigurationError> {
        let Some((start, end)) = self.days(today) else {
            return Ok(None);
        };
        DateRange::new(
            start.midnight().assume_offset(offset),
            end.midnight().assume_offset(offset),
        )
        .map(Some)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WindowTotals {
    /// Frames booked directly on the project.
    pub own: Duration,
    /// The project and all of its subprojects.
    pub total: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStatus {
    pub id: ProjectId,
    pub name: String,
    pub depth: usize,
    pub windows: BTreeMap<StatusWindow, WindowTotals>,
}

impl ProjectStatus {
    pub fn totals(&self, window: StatusWindow) -> WindowTotals {
        self.windows.get(&window).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectsStatus {
    pub now: OffsetDateTime,
    /// Projects ordered by full name, parents before their children.
    pub projects: Vec<ProjectStatus>,
    pub overall: BTreeMap<StatusWindow, Duration>,
    pub active: Option<FrameId>,
}

impl ProjectsStatus {
    pub fn get(&self, id: &ProjectId) -> Option<&ProjectStatus> {
        self.projects.iter().find(|status| &status.id == id)
    }

    pub fn overall(&self, window: StatusWindow) -> Duration {
        self.overall.get(&window).copied().unwrap_or_default()
    }
}

/// Tracked time of every project for each [`StatusWindow`], measured at the
/// clock's current instant. Running frames count up to that instant.
#[tracing::instrument(skip_all, fields(projects = projects.len(), frames = frames.len()))]
pub fn project_statuses(
    projects: &[Project],
    frames: &[Frame],
    clock: &impl Clock,
    utc_offset: UtcOffset,
    include_archived: bool,
) -> Result<ProjectsStatus, ConfigurationError> {
    let index = ProjectIndex::build(projects)?;
    let now = clock.now();
    let today = now.to_offset(utc_offset).date();

    let mut own: HashMap<(ProjectId, StatusWindow), Duration> = HashMap::new();
    let mut overall = BTreeMap::new();

    for window in StatusWindow::iter() {
        let mut config = ReportConfiguration::new(vec![SplitDimension::Project])
            .with_archived(include_archived)
            .with_utc_offset(utc_offset)
            .with_now(now);
        if let Some(range) = window.range(today, utc_offset)? {
            config = config.with_date_range(range);
        }

        let report = aggregate(frames, &config, &index)?;
        for group in &report.root.children {
            if let Some(BucketKey::Project(id)) = group.bucket() {
                own.insert((id.clone(), window), group.duration);
            }
        }
        overall.insert(window, report.total_duration());
    }

    let statuses = index
        .projects()
        .sorted_by_cached_key(|project| {
            (index.full_name(&project.id).join("\u{0}"), project.id.clone())
        })
        .map(|project| {
            let windows = StatusWindow::iter()
                .map(|window| {
                    let own_of = |id: &ProjectId| {
                        own.get(&(id.clone(), window)).copied().unwrap_or_default()
                    };
                    let total = index
                        .descendants_of(&project.id)
                        .map(|ids| ids.iter().map(own_of).sum())
                        .unwrap_or_default();
                    let totals = WindowTotals {
                        own: own_of(&project.id),
                        total,
                    };
                    (window, totals)
                })
                .collect();
            ProjectStatus {
                id: project.id.clone(),
                name: index.display_name(&project.id),
                depth: index.full_name(&project.id).len().saturating_sub(1),
                windows,
            }
        })
        .collect();

    Ok(ProjectsStatus {
        now,
        projects: statuses,
        overall,
        active: active_frame(frames).map(|frame| frame.id.clone()),
    })
}

/// Whether the running frame, if any, belongs to `project` (or one of its
/// subprojects when `include_subprojects` is set).
pub fn is_started(
    frames: &[Frame],
    project: &ProjectId,
    include_subprojects: bool,
    index: &ProjectIndex,
) -> bool {
    active_frame(frames)
        .is_some_and(|frame| in_scope(&frame.project_id, project, include_subprojects, index))
}

/// Ids of the finished, not yet archived frames of `project`. The caller
/// persists the flag; nothing here mutates the frames.
pub fn frames_to_archive(
    frames: &[Frame],
    project: &ProjectId,
    include_subprojects: bool,
    index: &ProjectIndex,
) -> Vec<FrameId> {
    frames
        .iter()
        .filter(|frame| !frame.archived && !frame.is_running())
        .filter(|frame| in_scope(&frame.project_id, project, include_subprojects, index))
        .map(|frame| frame.id.clone())
        .collect()
}

fn in_scope(
    candidate: &ProjectId,
    project: &ProjectId,
    include_subprojects: bool,
    index: &ProjectIndex,
) -> bool {
    candidate == project || (include_subprojects && index.is_descendant_of(candidate, project))
}
