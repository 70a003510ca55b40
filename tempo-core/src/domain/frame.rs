use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, UtcOffset};

use super::{FrameId, ProjectId};

/// A single recorded interval attributed to a project.
///
/// `end` is `None` while the frame is still running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: FrameId,
    pub project_id: ProjectId,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Frame {
    pub fn new(
        id: impl Into<FrameId>,
        project_id: impl Into<ProjectId>,
        start: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            start,
            end: None,
            notes: String::new(),
            archived: false,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_end(mut self, end: OffsetDateTime) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    pub fn is_running(&self) -> bool {
        self.end.is_none()
    }

    /// Tracked duration, measuring running frames up to `now`.
    ///
    /// Never negative: an end before the start counts as zero.
    pub fn duration(&self, now: OffsetDateTime) -> Duration {
        let end = self.end.unwrap_or(now);
        (end - self.start).max(Duration::ZERO)
    }

    /// Whether start and end fall on different calendar days in `offset`.
    pub fn spans_multiple_days(&self, offset: UtcOffset) -> bool {
        match self.end {
            Some(end) => self.start.to_offset(offset).date() != end.to_offset(offset).date(),
            None => false,
        }
    }
}

/// The running frame, if any.
pub fn active_frame(frames: &[Frame]) -> Option<&Frame> {
    frames.iter().find(|frame| frame.is_running())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn duration_of_finished_frame() {
        let frame = Frame::new("f1", "p1", datetime!(2024-03-05 09:00 UTC))
            .with_end(datetime!(2024-03-05 10:30 UTC));
        assert_eq!(
            frame.duration(datetime!(2024-03-06 00:00 UTC)),
            Duration::minutes(90)
        );
    }

    #[test]
    fn running_frame_measures_until_now() {
        let frame = Frame::new("f1", "p1", datetime!(2024-03-05 09:00 UTC));
        assert!(frame.is_running());
        assert_eq!(
            frame.duration(datetime!(2024-03-05 09:45 UTC)),
            Duration::minutes(45)
        );
        assert_eq!(active_frame(std::slice::from_ref(&frame)), Some(&frame));
    }

    #[test]
    fn multiple_days_depends_on_offset() {
        let frame = Frame::new("f1", "p1", datetime!(2024-03-05 22:00 UTC))
            .with_end(datetime!(2024-03-05 23:30 UTC));
        assert!(!frame.spans_multiple_days(offset!(UTC)));
        assert!(frame.spans_multiple_days(offset!(+1)));
    }

    #[test]
    fn tags_are_unique() {
        let frame = Frame::new("f1", "p1", datetime!(2024-03-05 09:00 UTC))
            .with_tag("review")
            .with_tag("review");
        assert_eq!(frame.tags.len(), 1);
    }
}
