use time::Duration;

use crate::{
    aggregate::{BucketKey, Group},
    domain::SplitDimension,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    pub label: String,
    /// One cell per column; `None` where the row has no such group.
    pub cells: Vec<Option<Duration>>,
    pub total: Duration,
}

/// Two-level report laid out with the first split as rows and the second as
/// columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub row_dimension: SplitDimension,
    pub column_dimension: SplitDimension,
    pub columns: Vec<String>,
    pub rows: Vec<MatrixRow>,
    pub column_totals: Vec<Duration>,
    pub total: Duration,
}

impl Matrix {
    /// Builds the matrix from a root whose tree is exactly two levels deep.
    pub fn from_root(
        root: &Group,
        row_dimension: SplitDimension,
        column_dimension: SplitDimension,
    ) -> Self {
        let mut columns: Vec<(&BucketKey, &str)> = Vec::new();
        for row in &root.children {
            for cell in &row.children {
                if let Some(key) = cell.bucket() {
                    if !columns.iter().any(|(k, _)| *k == key) {
                        columns.push((key, cell.label.as_str()));
                    }
                }
            }
        }
        if column_dimension == SplitDimension::Project {
            columns.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
        } else {
            columns.sort_by(|a, b| a.0.cmp(b.0));
        }

        let mut column_totals = vec![Duration::ZERO; columns.len()];
        let rows = root
            .children
            .iter()
            .map(|row| {
                let cells: Vec<Option<Duration>> = columns
                    .iter()
                    .enumerate()
                    .map(|(i, (key, _))| {
                        let cell = row.child(key).map(|g| g.duration);
                        if let Some(duration) = cell {
                            column_totals[i] += duration;
                        }
                        cell
                    })
                    .collect();
                MatrixRow {
                    label: row.label.clone(),
                    cells,
                    total: row.duration,
                }
            })
            .collect();

        Self {
            row_dimension,
            column_dimension,
            columns: columns.into_iter().map(|(_, label)| label.to_string()).collect(),
            rows,
            column_totals,
            total: root.duration,
        }
    }
}
