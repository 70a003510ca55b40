use thiserror::Error;

use crate::domain::ProjectId;

/// A single malformed record. Collected next to the successfully parsed
/// frames instead of aborting the import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {row}: {reason}")]
pub struct ImportParseError {
    /// 1-based data row (CSV, header excluded) or record position (Watson).
    pub row: usize,
    pub reason: String,
}

impl ImportParseError {
    pub fn new(row: usize, reason: impl Into<String>) -> Self {
        Self {
            row,
            reason: reason.into(),
        }
    }
}

/// The source is not the expected format at all. Aborts the import.
#[derive(Debug, Error)]
pub enum ImportFormatError {
    #[error("input is empty")]
    Empty,
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("unreadable CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("unreadable JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON array of frames")]
    NotAnArray,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundingDomainError {
    #[error("rounding interval must not be negative, got {0} minutes")]
    NegativeInterval(i64),
}

/// Invalid report configuration or project hierarchy, rejected before any
/// aggregation starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("split specification is empty")]
    EmptySplit,
    #[error("split specification contains 'project' more than once")]
    DuplicateProjectSplit,
    #[error("matrix tables support at most two split dimensions, got {0}")]
    MatrixTooManyDimensions(usize),
    #[error("project hierarchy contains a cycle through {0}")]
    CyclicHierarchy(ProjectId),
    #[error("project {project} references unknown parent {parent}")]
    UnknownParent {
        project: ProjectId,
        parent: ProjectId,
    },
    #[error("project {0} is listed more than once")]
    DuplicateProject(ProjectId),
    #[error("project not found: {0}")]
    UnknownProject(ProjectId),
    #[error("date range ends before it starts")]
    InvalidDateRange,
    #[error(transparent)]
    Rounding(#[from] RoundingDomainError),
}

/// Errors raised by [`crate::store::FrameStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    #[error("frame {0} already exists")]
    DuplicateFrame(crate::domain::FrameId),
    #[error("another frame is already running: {0}")]
    SecondRunningFrame(crate::domain::FrameId),
    #[error("frame {0} ends before it starts")]
    InvertedFrame(crate::domain::FrameId),
    #[error("project name must not be empty")]
    EmptyProjectName,
}
