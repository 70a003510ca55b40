//! Importers for time records exported by other trackers.
//!
//! Every format has its own parser; the caller picks the format explicitly.
//! Malformed records are skipped and reported next to the parsed frames,
//! structural problems abort the whole import.

mod csv_rows;
mod fanurio;
mod mac_time_tracker;
mod watson;

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    domain::{Frame, FrameId, Project, ProjectId},
    error::{ImportFormatError, ImportParseError, StoreError},
    store::{FrameFilter, FrameStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "camelCase")]
pub enum ImportFormat {
    #[strum(to_string = "macTimeTracker", serialize = "mac")]
    MacTimeTracker,
    #[strum(to_string = "fanurio")]
    Fanurio,
    #[strum(to_string = "watson")]
    Watson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Offset of the wall-clock times found in CSV exports. Watson frames
    /// carry unix timestamps and are only converted to this offset.
    pub utc_offset: UtcOffset,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            utc_offset: UtcOffset::UTC,
        }
    }
}

/// Everything an import produced, for the caller to persist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportOutcome {
    /// Top-level projects created for names that matched no known project.
    pub created_projects: Vec<Project>,
    pub frames: Vec<Frame>,
    pub errors: Vec<ImportParseError>,
}

impl ImportOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parses `source` as `format`, mapping project names onto `existing`
/// projects.
#[tracing::instrument(skip(source, existing), fields(bytes = source.len()))]
pub fn import(
    format: ImportFormat,
    source: &str,
    existing: &[Project],
    options: &ImportOptions,
) -> Result<ImportOutcome, ImportFormatError> {
    let collector = Collector::new(existing);
    let outcome = match format {
        ImportFormat::MacTimeTracker => mac_time_tracker::parse(source, collector, options)?,
        ImportFormat::Fanurio => fanurio::parse(source, collector, options)?,
        ImportFormat::Watson => watson::parse(source, collector, options)?,
    };

    tracing::info!(
        frames = outcome.frames.len(),
        created_projects = outcome.created_projects.len(),
        errors = outcome.errors.len(),
        "import finished"
    );
    Ok(outcome)
}

/// Persists an outcome through the store's write path: projects first, then
/// frames. Returns the number of inserted frames.
///
/// The whole outcome is checked against the store before the first write, so
/// a conflicting frame leaves the store untouched.
pub fn apply(outcome: &ImportOutcome, store: &mut impl FrameStore) -> Result<usize, StoreError> {
    check_conflicts(outcome, store)?;

    for project in &outcome.created_projects {
        store.upsert_project(project.clone())?;
    }
    for frame in &outcome.frames {
        store.insert_frame(frame.clone())?;
    }
    Ok(outcome.frames.len())
}

fn check_conflicts(outcome: &ImportOutcome, store: &impl FrameStore) -> Result<(), StoreError> {
    if outcome.created_projects.iter().any(|p| p.name.trim().is_empty()) {
        return Err(StoreError::EmptyProjectName);
    }

    let projects: HashSet<ProjectId> = store
        .all_projects()?
        .into_iter()
        .map(|p| p.id)
        .chain(outcome.created_projects.iter().map(|p| p.id.clone()))
        .collect();
    let stored = store.frames_matching(&FrameFilter::default().with_archived(true))?;
    let mut ids: HashSet<&FrameId> = stored.iter().map(|f| &f.id).collect();
    let mut running = stored.iter().find(|f| f.is_running()).map(|f| &f.id);

    for frame in &outcome.frames {
        if !projects.contains(&frame.project_id) {
            return Err(StoreError::ProjectNotFound(frame.project_id.clone()));
        }
        if !ids.insert(&frame.id) {
            return Err(StoreError::DuplicateFrame(frame.id.clone()));
        }
        if frame.end.is_some_and(|end| end < frame.start) {
            return Err(StoreError::InvertedFrame(frame.id.clone()));
        }
        if frame.is_running() {
            if let Some(other) = running {
                return Err(StoreError::SecondRunningFrame(other.clone()));
            }
            running = Some(&frame.id);
        }
    }
    Ok(())
}

/// A record that parsed cleanly, before project resolution.
#[derive(Debug, Clone)]
struct ParsedRecord {
    id: Option<FrameId>,
    project_name: String,
    start: OffsetDateTime,
    end: Option<OffsetDateTime>,
    notes: String,
    tags: BTreeSet<String>,
    archived: bool,
}

impl ParsedRecord {
    fn new(
        project_name: impl Into<String>,
        start: OffsetDateTime,
        end: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            id: None,
            project_name: project_name.into(),
            start,
            end,
            notes: String::new(),
            tags: BTreeSet::new(),
            archived: false,
        }
    }
}

/// Maps project names to ids by exact match, creating top-level projects for
/// unknown names.
#[derive(Debug, Default)]
struct ProjectResolver {
    by_name: HashMap<String, ProjectId>,
}

impl ProjectResolver {
    fn new(existing: &[Project]) -> Self {
        // Top-level projects win over subprojects of the same name, ties go
        // to the smallest id.
        let mut candidates: Vec<&Project> = existing.iter().collect();
        candidates.sort_by(|a, b| {
            b.is_top_level()
                .cmp(&a.is_top_level())
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut by_name = HashMap::new();
        for project in candidates {
            by_name
                .entry(project.name.clone())
                .or_insert_with(|| project.id.clone());
        }
        Self { by_name }
    }

    fn resolve(&mut self, name: &str, created: &mut Vec<Project>) -> ProjectId {
        if let Some(id) = self.by_name.get(name) {
            return id.clone();
        }
        let project = Project::new(ProjectId::generate(), name);
        tracing::debug!(name, id = %project.id, "creating project for import");
        self.by_name.insert(name.to_string(), project.id.clone());
        let id = project.id.clone();
        created.push(project);
        id
    }
}

/// Accumulates accepted and rejected records into an [`ImportOutcome`].
#[derive(Debug)]
struct Collector {
    resolver: ProjectResolver,
    outcome: ImportOutcome,
    running: Option<FrameId>,
}

impl Collector {
    fn new(existing: &[Project]) -> Self {
        Self {
            resolver: ProjectResolver::new(existing),
            outcome: ImportOutcome::default(),
            running: None,
        }
    }

    fn accept(&mut self, row: usize, record: ParsedRecord) {
        let name = record.project_name.trim();
        if name.is_empty() {
            self.reject(row, "missing project name");
            return;
        }
        if let Some(end) = record.end {
            if end < record.start {
                self.reject(row, "end is before start");
                return;
            }
        }
        let id = record.id.unwrap_or_else(FrameId::generate);
        if record.end.is_none() {
            if let Some(running) = &self.running {
                self.reject(row, format!("another frame is already running: {running}"));
                return;
            }
            self.running = Some(id.clone());
        }

        let project_id = self
            .resolver
            .resolve(name, &mut self.outcome.created_projects);
        self.outcome.frames.push(Frame {
            id,
            project_id,
            start: record.start,
            end: record.end,
            notes: record.notes,
            archived: record.archived,
            tags: record.tags,
        });
    }

    fn reject(&mut self, row: usize, reason: impl Into<String>) {
        let error = ImportParseError::new(row, reason);
        tracing::warn!(row, reason = %error.reason, "skipping malformed record");
        self.outcome.errors.push(error);
    }

    fn finish(self) -> ImportOutcome {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_matches_exact_names_only() {
        let existing = vec![Project::new("a1", "Acme")];
        let mut resolver = ProjectResolver::new(&existing);
        let mut created = Vec::new();

        assert_eq!(resolver.resolve("Acme", &mut created), ProjectId::from("a1"));
        let lower = resolver.resolve("acme", &mut created);
        assert_ne!(lower, ProjectId::from("a1"));
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "acme");
        assert!(created[0].is_top_level());

        // the created project is reused on the next mention
        assert_eq!(resolver.resolve("acme", &mut created), lower);
        assert_eq!(created.len(), 1);
    }

    #[test]
    fn resolver_prefers_top_level_projects() {
        let existing = vec![
            Project::new("a", "Docs").with_parent("x"),
            Project::new("x", "Acme"),
            Project::new("b", "Docs"),
        ];
        let mut resolver = ProjectResolver::new(&existing);
        assert_eq!(resolver.resolve("Docs", &mut Vec::new()), ProjectId::from("b"));
    }

    #[test]
    fn conflicting_outcome_leaves_store_untouched() {
        use crate::store::InMemoryStore;
        use time::macros::datetime;

        let start = datetime!(2024-03-05 09:00 UTC);
        let mut store = InMemoryStore::new();
        store.upsert_project(Project::new("acme", "Acme")).unwrap();
        store.insert_frame(Frame::new("f1", "acme", start).with_end(start)).unwrap();
        let before = store.clone();

        let duplicate = ImportOutcome {
            created_projects: vec![Project::new("new", "New")],
            frames: vec![
                Frame::new("f2", "new", start).with_end(start),
                Frame::new("f1", "acme", start).with_end(start),
            ],
            errors: Vec::new(),
        };
        assert!(matches!(
            apply(&duplicate, &mut store),
            Err(StoreError::DuplicateFrame(id)) if id == FrameId::from("f1")
        ));
        assert_eq!(store, before);

        let two_running = ImportOutcome {
            created_projects: Vec::new(),
            frames: vec![
                Frame::new("f3", "acme", start),
                Frame::new("f4", "acme", start),
            ],
            errors: Vec::new(),
        };
        assert!(matches!(
            apply(&two_running, &mut store),
            Err(StoreError::SecondRunningFrame(id)) if id == FrameId::from("f3")
        ));
        assert_eq!(store, before);

        let clean = ImportOutcome {
            created_projects: vec![Project::new("new", "New")],
            frames: vec![Frame::new("f2", "new", start).with_end(start)],
            errors: Vec::new(),
        };
        assert_eq!(apply(&clean, &mut store).unwrap(), 1);
        assert_eq!(store.frames().len(), 2);
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("mac".parse::<ImportFormat>(), Ok(ImportFormat::MacTimeTracker));
        assert_eq!(
            "macTimeTracker".parse::<ImportFormat>(),
            Ok(ImportFormat::MacTimeTracker)
        );
        assert_eq!("Fanurio".parse::<ImportFormat>(), Ok(ImportFormat::Fanurio));
        assert_eq!(ImportFormat::Watson.to_string(), "watson");
    }
}
