//! Report rendering: group tree to table or matrix, then to HTML.

mod html;
mod matrix;
mod table;

use std::str::FromStr;

use strum::{Display, EnumString};
use time::Duration;

pub use html::escape_html;
pub use matrix::*;
pub use table::*;

use crate::{
    aggregate::{Averages, Report},
    domain::{DisplayOptions, ReportConfiguration, Sales},
    error::ConfigurationError,
};

/// Layout preset of the HTML output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Template {
    /// Group totals only.
    #[default]
    Default,
    /// Group totals followed by every frame of each leaf group.
    Timelog,
}

impl Template {
    /// Resolves a template identifier, falling back to [`Template::Default`]
    /// for unknown ones.
    pub fn resolve(id: &str) -> Template {
        Template::from_str(id.trim()).unwrap_or_else(|_| {
            tracing::warn!(template = id, "unknown report template, using default");
            Template::Default
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    Table(Table),
    Matrix(Matrix),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: Duration,
    pub frame_count: usize,
    pub sales: Sales,
    pub averages: Averages,
}

/// A rendered report, ready to be serialized with [`Document::to_html`].
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: Option<String>,
    pub description: Option<String>,
    pub template: Template,
    pub display: DisplayOptions,
    pub layout: Layout,
    pub summary: Option<Summary>,
    pub total: Duration,
    pub sales: Sales,
}

/// Lays out `report` as a flat nested table, or as a matrix when matrix
/// tables are requested for a two-level split.
#[tracing::instrument(skip_all, fields(template = template))]
pub fn render(
    report: &Report,
    config: &ReportConfiguration,
    template: &str,
) -> Result<Document, ConfigurationError> {
    let splits = &config.splits;
    let display = config.display;

    if display.show_matrix_tables && splits.len() > 2 {
        return Err(ConfigurationError::MatrixTooManyDimensions(splits.len()));
    }

    let layout = match splits.as_slice() {
        [rows, columns] if display.show_matrix_tables => {
            Layout::Matrix(Matrix::from_root(&report.root, *rows, *columns))
        }
        _ => Layout::Table(Table::from_root(&report.root)),
    };

    let summary = display.show_summary.then(|| Summary {
        total: report.root.duration,
        frame_count: report.root.frame_count,
        sales: report.root.sales.clone(),
        averages: report.averages,
    });

    Ok(Document {
        title: config.title.clone(),
        description: config.description.clone(),
        template: Template::resolve(template),
        display,
        layout,
        summary,
        total: report.root.duration,
        sales: report.root.sales.clone(),
    })
}

/// [`render`] with the configuration's own template, serialized to HTML.
pub fn render_html(
    report: &Report,
    config: &ReportConfiguration,
) -> Result<String, ConfigurationError> {
    Ok(render(report, config, &config.template)?.to_html())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_template_falls_back_to_default() {
        assert_eq!(Template::resolve("timelog"), Template::Timelog);
        assert_eq!(Template::resolve("TimeLog"), Template::Timelog);
        assert_eq!(Template::resolve("fancy"), Template::Default);
        assert_eq!(Template::resolve(""), Template::Default);
    }
}
