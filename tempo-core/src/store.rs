//! Persistence port. The core only reads and writes through [`FrameStore`];
//! the collaborator decides where the data actually lives.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{DateRange, Frame, Project, ProjectId},
    error::StoreError,
};

/// Which frames a read should return. The default matches every
/// non-archived frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameFilter {
    /// Restrict to these projects. `None` means all projects.
    pub projects: Option<BTreeSet<ProjectId>>,
    pub include_archived: bool,
    /// Frames intersecting this range. Running frames are always kept.
    pub range: Option<DateRange>,
}

impl FrameFilter {
    pub fn with_projects(mut self, projects: impl IntoIterator<Item = ProjectId>) -> Self {
        self.projects = Some(projects.into_iter().collect());
        self
    }

    pub fn with_archived(mut self, include_archived: bool) -> Self {
        self.include_archived = include_archived;
        self
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn matches(&self, frame: &Frame) -> bool {
        if frame.archived && !self.include_archived {
            return false;
        }
        if let Some(projects) = &self.projects {
            if !projects.contains(&frame.project_id) {
                return false;
            }
        }
        match (&self.range, frame.end) {
            (Some(range), Some(end)) => range.intersects(frame.start, end),
            _ => true,
        }
    }
}

pub trait FrameStore {
    fn all_projects(&self) -> Result<Vec<Project>, StoreError>;

    fn frames_matching(&self, filter: &FrameFilter) -> Result<Vec<Frame>, StoreError>;

    /// Inserts the project or replaces the one with the same id.
    fn upsert_project(&mut self, project: Project) -> Result<(), StoreError>;

    fn insert_frame(&mut self, frame: Frame) -> Result<(), StoreError>;
}

/// A store held entirely in memory. Serializable so a collaborator can keep
/// it in a single file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryStore {
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    frames: Vec<Frame>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Sets the archived flag on the given frames, returning how many changed.
    pub fn archive(&mut self, ids: &[crate::domain::FrameId]) -> usize {
        let mut changed = 0;
        for frame in self.frames.iter_mut().filter(|f| ids.contains(&f.id)) {
            if !frame.archived {
                frame.archived = true;
                changed += 1;
            }
        }
        changed
    }
}

impl FrameStore for InMemoryStore {
    fn all_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.projects.clone())
    }

    fn frames_matching(&self, filter: &FrameFilter) -> Result<Vec<Frame>, StoreError> {
        Ok(self
            .frames
            .iter()
            .filter(|frame| filter.matches(frame))
            .cloned()
            .collect())
    }

    fn upsert_project(&mut self, project: Project) -> Result<(), StoreError> {
        if project.name.trim().is_empty() {
            return Err(StoreError::EmptyProjectName);
        }
        match self.projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project,
            None => self.projects.push(project),
        }
        Ok(())
    }

    fn insert_frame(&mut self, frame: Frame) -> Result<(), StoreError> {
        if !self.projects.iter().any(|p| p.id == frame.project_id) {
            return Err(StoreError::ProjectNotFound(frame.project_id));
        }
        if self.frames.iter().any(|f| f.id == frame.id) {
            return Err(StoreError::DuplicateFrame(frame.id));
        }
        if frame.end.is_some_and(|end| end < frame.start) {
            return Err(StoreError::InvertedFrame(frame.id));
        }
        if frame.is_running() {
            if let Some(running) = self.frames.iter().find(|f| f.is_running()) {
                return Err(StoreError::SecondRunningFrame(running.id.clone()));
            }
        }

        tracing::debug!(frame = %frame.id, project = %frame.project_id, "inserting frame");
        self.frames.push(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FrameId;
    use time::macros::{date, datetime, offset};

    fn store() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store.upsert_project(Project::new("p", "P")).unwrap();
        store.upsert_project(Project::new("q", "Q")).unwrap();
        store
    }

    #[test]
    fn rejects_frames_breaking_invariants() {
        let mut store = store();
        let start = datetime!(2024-03-05 09:00 UTC);

        assert!(matches!(
            store.insert_frame(Frame::new("f1", "missing", start)),
            Err(StoreError::ProjectNotFound(_))
        ));
        store.insert_frame(Frame::new("f1", "p", start)).unwrap();
        assert!(matches!(
            store.insert_frame(Frame::new("f1", "q", start).with_end(start)),
            Err(StoreError::DuplicateFrame(_))
        ));
        assert!(matches!(
            store.insert_frame(Frame::new("f2", "q", start)),
            Err(StoreError::SecondRunningFrame(id)) if id == FrameId::from("f1")
        ));
        assert!(matches!(
            store.insert_frame(
                Frame::new("f3", "q", start).with_end(datetime!(2024-03-05 08:00 UTC))
            ),
            Err(StoreError::InvertedFrame(_))
        ));
        assert!(matches!(
            store.upsert_project(Project::new("r", "  ")),
            Err(StoreError::EmptyProjectName)
        ));
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut store = store();
        store.upsert_project(Project::new("p", "Renamed")).unwrap();
        let projects = store.all_projects().unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].name, "Renamed");
    }

    #[test]
    fn filters_by_project_archive_and_range() {
        let mut store = store();
        let day = |d: u8| datetime!(2024-03-01 09:00 UTC).replace_day(d).unwrap();
        store
            .insert_frame(Frame::new("a", "p", day(4)).with_end(day(4) + time::Duration::HOUR))
            .unwrap();
        store
            .insert_frame(Frame::new("b", "q", day(5)).with_end(day(5) + time::Duration::HOUR))
            .unwrap();
        store
            .insert_frame(
                Frame::new("c", "p", day(5))
                    .with_end(day(5) + time::Duration::HOUR)
                    .archived(),
            )
            .unwrap();

        let ids = |filter: &FrameFilter| -> Vec<String> {
            store
                .frames_matching(filter)
                .unwrap()
                .into_iter()
                .map(|f| f.id.to_string())
                .collect()
        };

        assert_eq!(ids(&FrameFilter::default()), vec!["a", "b"]);
        assert_eq!(ids(&FrameFilter::default().with_archived(true)), vec!["a", "b", "c"]);
        assert_eq!(
            ids(&FrameFilter::default().with_projects([ProjectId::from("p")])),
            vec!["a"]
        );
        let range = DateRange::days(date!(2024-03-05), date!(2024-03-05), offset!(UTC)).unwrap();
        assert_eq!(ids(&FrameFilter::default().with_range(range)), vec!["b"]);
    }

    #[test]
    fn archive_marks_frames_once() {
        let mut store = store();
        let start = datetime!(2024-03-05 09:00 UTC);
        store.insert_frame(Frame::new("a", "p", start).with_end(start)).unwrap();
        assert_eq!(store.archive(&[FrameId::from("a"), FrameId::from("x")]), 1);
        assert_eq!(store.archive(&[FrameId::from("a")]), 0);
        assert!(store.frames()[0].archived);
    }
}
