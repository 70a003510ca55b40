//! Turns a frame snapshot into a nested, summed report tree.

mod bucket;
mod group;

use std::collections::{BTreeMap, HashSet};

use time::Duration;

pub use bucket::*;
pub use group::*;

use crate::{
    domain::{Frame, ProjectId, ReportConfiguration, SplitDimension},
    error::ConfigurationError,
    hierarchy::ProjectIndex,
    rounding::{round, Interval},
};

/// Per-bucket averages. `None` means "no data".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Averages {
    /// Calendar unit the averages are taken over.
    pub unit: Option<SplitDimension>,
    /// Tracked time per bucket that holds at least one frame.
    pub tracked: Option<Duration>,
    /// Untracked time per bucket in range, empty buckets included.
    pub untracked: Option<Duration>,
}

/// Result of [`aggregate`]: the synthetic root group plus report-wide
/// figures.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub root: Group,
    pub averages: Averages,
}

impl Report {
    pub fn total_duration(&self) -> Duration {
        self.root.duration
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

struct Context<'a> {
    config: &'a ReportConfiguration,
    index: &'a ProjectIndex,
    /// Projects in scope, ordered by full name.
    scope: Vec<ProjectId>,
}

/// Filters, rounds and groups `frames` according to `config`.
///
/// Fails only on configuration problems; an empty selection yields an empty
/// root group.
#[tracing::instrument(skip_all, fields(splits = ?config.splits, target = ?config.target))]
pub fn aggregate(
    frames: &[Frame],
    config: &ReportConfiguration,
    index: &ProjectIndex,
) -> Result<Report, ConfigurationError> {
    config.validate()?;

    let scope_set: HashSet<ProjectId> = match &config.target {
        Some(target) if config.include_subprojects => index
            .descendants_of(target)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownProject(target.clone()))?,
        Some(target) if index.contains(target) => HashSet::from([target.clone()]),
        Some(target) => return Err(ConfigurationError::UnknownProject(target.clone())),
        None => index.projects().map(|p| p.id.clone()).collect(),
    };

    let mut scope: Vec<ProjectId> = scope_set.iter().cloned().collect();
    scope.sort_by_cached_key(|id| (index.display_name(id), id.clone()));

    let selected = select_frames(frames, config, index, &scope_set)?;
    tracing::debug!(
        available = frames.len(),
        selected = selected.len(),
        "selected frames for report"
    );

    let ctx = Context {
        config,
        index,
        scope,
    };

    let window = match &config.date_range {
        Some(range) => Some(range_window(range, config.utc_offset)),
        None if config.display.show_empty_groups => frame_window(&selected, config),
        None => None,
    };

    let averages = averages(&selected, config);
    let children = build_level(&ctx, 0, selected, window);
    let label = config.title.clone().unwrap_or_default();
    let root = Group::branch(GroupKey::Root, None, label, children);

    tracing::debug!(
        frames = root.frame_count,
        seconds = root.duration.whole_seconds(),
        "aggregated report"
    );

    Ok(Report { root, averages })
}

/// Applies scope, archive, running and date filters, then rounds.
fn select_frames(
    frames: &[Frame],
    config: &ReportConfiguration,
    index: &ProjectIndex,
    scope: &HashSet<ProjectId>,
) -> Result<Vec<ReportFrame>, ConfigurationError> {
    let mut selected = Vec::new();

    for frame in frames {
        if !scope.contains(&frame.project_id) {
            continue;
        }
        if frame.archived && !config.include_archived {
            continue;
        }
        let Some(end) = frame.end.or(config.now) else {
            continue;
        };
        let end = end.max(frame.start);
        if let Some(range) = &config.date_range {
            if !range.intersects(frame.start, end) {
                continue;
            }
        }

        let interval = round(Interval::new(frame.start, end), &config.rounding)?;
        let duration = interval.duration();
        let sales = index
            .get(&frame.project_id)
            .and_then(|p| p.hourly_rate.as_ref())
            .map(|rate| rate.for_duration(duration));

        selected.push(ReportFrame {
            frame: frame.clone(),
            interval,
            duration,
            sales,
        });
    }

    selected.sort_by(|a, b| {
        a.interval
            .start
            .cmp(&b.interval.start)
            .then_with(|| a.frame.id.cmp(&b.frame.id))
    });
    Ok(selected)
}

/// Local days from the first to the last frame start.
fn frame_window(frames: &[ReportFrame], config: &ReportConfiguration) -> Option<DayWindow> {
    let dates = frames
        .iter()
        .map(|f| f.interval.start.to_offset(config.utc_offset).date());
    let (first, last) = dates.fold(None, |acc: Option<(time::Date, time::Date)>, date| match acc {
        None => Some((date, date)),
        Some((min, max)) => Some((min.min(date), max.max(date))),
    })?;
    Some((first, last.next_day().unwrap_or(last)))
}

fn build_level(
    ctx: &Context<'_>,
    depth: usize,
    frames: Vec<ReportFrame>,
    window: Option<DayWindow>,
) -> Vec<Group> {
    let Some(&dimension) = ctx.config.splits.get(depth) else {
        return Vec::new();
    };
    let is_last = depth + 1 == ctx.config.splits.len();
    let show_empty = ctx.config.display.show_empty_groups;

    let mut buckets: BTreeMap<BucketKey, Vec<ReportFrame>> = BTreeMap::new();
    for frame in frames {
        let key = BucketKey::of_frame(
            dimension,
            frame.interval.start,
            ctx.config.utc_offset,
            &frame.frame.project_id,
        );
        buckets.entry(key).or_default().push(frame);
    }

    if show_empty {
        if dimension.is_calendar() {
            if let Some(window) = window {
                for key in calendar_buckets(dimension, window) {
                    buckets.entry(key).or_default();
                }
            }
        } else {
            for id in &ctx.scope {
                buckets.entry(BucketKey::Project(id.clone())).or_default();
            }
        }
    }

    let mut groups: Vec<Group> = buckets
        .into_iter()
        .filter(|(_, frames)| show_empty || !frames.is_empty())
        .map(|(key, frames)| {
            let label = match &key {
                BucketKey::Project(id) => ctx.index.display_name(id),
                calendar => calendar.calendar_label().unwrap_or_default(),
            };
            if is_last {
                return Group::leaf(key, dimension, label, frames);
            }
            let child_window = match (window, key.span()) {
                (Some(window), Some(span)) => Some(narrow(window, span)),
                (None, Some(span)) if show_empty => Some(span),
                (window, _) => window,
            };
            let children = build_level(ctx, depth + 1, frames, child_window);
            Group::branch(GroupKey::Bucket(key), Some(dimension), label, children)
        })
        .collect();

    if dimension == SplitDimension::Project {
        groups.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.key_cmp(b)));
    }
    groups
}

impl Group {
    fn key_cmp(&self, other: &Group) -> std::cmp::Ordering {
        self.bucket().cmp(&other.bucket())
    }
}

fn averages(frames: &[ReportFrame], config: &ReportConfiguration) -> Averages {
    let unit = SplitDimension::finest_calendar(&config.splits);
    let Some(range) = &config.date_range else {
        return Averages {
            unit: Some(unit),
            ..Default::default()
        };
    };

    let buckets = calendar_buckets(unit, range_window(range, config.utc_offset));
    let in_range: HashSet<&BucketKey> = buckets.iter().collect();
    // Frames reaching in from before the range count for its first bucket.
    let tracked_buckets: HashSet<BucketKey> = frames
        .iter()
        .map(|f| {
            let start = f.interval.start.max(range.start);
            BucketKey::of_frame(unit, start, config.utc_offset, &f.frame.project_id)
        })
        .filter(|key| in_range.contains(key))
        .collect();

    let total: Duration = frames.iter().map(|f| f.duration).sum();
    let per_bucket = |amount: Duration, count: usize| {
        u32::try_from(count)
            .ok()
            .filter(|count| *count > 0)
            .map(|count| amount / count)
    };

    Averages {
        unit: Some(unit),
        tracked: per_bucket(total, tracked_buckets.len()),
        untracked: per_bucket((range.span() - total).max(Duration::ZERO), buckets.len()),
    }
}
