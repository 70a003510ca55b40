use time::{Duration, OffsetDateTime};

use crate::{
    aggregate::{Group, ReportFrame},
    domain::Sales,
};

/// One frame listed below its leaf group.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLine {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub duration: Duration,
    pub notes: String,
    pub tags: Vec<String>,
}

impl From<&ReportFrame> for FrameLine {
    fn from(frame: &ReportFrame) -> Self {
        Self {
            start: frame.interval.start,
            end: frame.interval.end,
            duration: frame.duration,
            notes: frame.frame.notes.clone(),
            tags: frame.frame.tags.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Nesting level, 0 for top-level groups.
    pub depth: usize,
    pub label: String,
    pub duration: Duration,
    pub sales: Sales,
    pub frame_count: usize,
    /// Frames of leaf groups; empty for inner rows.
    pub frames: Vec<FrameLine>,
}

/// The group tree flattened depth first into indented rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn from_root(root: &Group) -> Self {
        let mut rows = Vec::new();
        for child in &root.children {
            push_rows(child, 0, &mut rows);
        }
        Self { rows }
    }

    pub fn total_duration(&self) -> Duration {
        self.rows
            .iter()
            .filter(|row| row.depth == 0)
            .map(|row| row.duration)
            .sum()
    }
}

fn push_rows(group: &Group, depth: usize, rows: &mut Vec<TableRow>) {
    rows.push(TableRow {
        depth,
        label: group.label.clone(),
        duration: group.duration,
        sales: group.sales.clone(),
        frame_count: group.frame_count,
        frames: group.frames.iter().map(FrameLine::from).collect(),
    });
    for child in &group.children {
        push_rows(child, depth + 1, rows);
    }
}
