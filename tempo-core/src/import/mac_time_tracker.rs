//! CSV export of the Mac "Time Tracker" app.
//!
//! ```text
//! Project,Task,Date,Start time,End time,Duration,Comment
//! Acme,Design,2024-03-05,09:00,10:30,1:30,Landing page
//! ```
//!
//! Times are wall-clock times in the import offset. The Duration column is
//! recomputed from start and end and therefore ignored.

use csv::StringRecord;
use time::{format_description::BorrowedFormatItem, macros::format_description};

use super::{
    csv_rows::{self, CsvTable},
    Collector, ImportOptions, ImportOutcome, ParsedRecord,
};
use crate::error::ImportFormatError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

const PROJECT: &str = "Project";
const TASK: &str = "Task";
const DATE: &str = "Date";
const START: &str = "Start time";
const END: &str = "End time";
const COMMENT: &str = "Comment";

pub(super) fn parse(
    source: &str,
    mut collector: Collector,
    options: &ImportOptions,
) -> Result<ImportOutcome, ImportFormatError> {
    let table = CsvTable::read(source, &[PROJECT, DATE, START, END])?;

    for (row, record) in &table.rows {
        let parsed = record
            .as_ref()
            .map_err(Clone::clone)
            .and_then(|record| parse_row(&table, record, options));
        match parsed {
            Ok(record) => collector.accept(*row, record),
            Err(reason) => collector.reject(*row, reason),
        }
    }

    Ok(collector.finish())
}

fn parse_row(
    table: &CsvTable,
    record: &StringRecord,
    options: &ImportOptions,
) -> Result<ParsedRecord, String> {
    let project = table.required(record, PROJECT)?;
    let date = csv_rows::parse_date(table.required(record, DATE)?, DATE_FORMAT, DATE)?;
    let start = csv_rows::parse_time(table.required(record, START)?, START)?;
    let end = csv_rows::parse_time(table.required(record, END)?, END)?;

    let mut parsed = ParsedRecord::new(
        project,
        csv_rows::local_timestamp(date, start, options.utc_offset),
        Some(csv_rows::local_timestamp(date, end, options.utc_offset)),
    );
    parsed.notes = table.field(record, COMMENT).to_string();
    parsed.tags.extend(csv_rows::tag(table.field(record, TASK)));
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::super::{import, ImportFormat};
    use super::*;
    use crate::domain::Project;
    use time::macros::{datetime, offset};

    const SAMPLE: &str = "\
Project,Task,Date,Start time,End time,Duration,Comment
Acme,Design,2024-03-05,09:00,10:30,1:30,Landing page
Acme,,2024-03-05,11:00,11:15,0:15,
Beta,Review,2024-03-06,14:00:00,15:00:00,1:00,\"Notes, with comma\"
";

    #[test]
    fn parses_rows_and_creates_projects() {
        let existing = vec![Project::new("acme", "Acme")];
        let outcome = import(
            ImportFormat::MacTimeTracker,
            SAMPLE,
            &existing,
            &ImportOptions::default(),
        )
        .unwrap();

        assert!(outcome.is_clean());
        assert_eq!(outcome.frames.len(), 3);
        assert_eq!(outcome.created_projects.len(), 1);
        assert_eq!(outcome.created_projects[0].name, "Beta");

        let first = &outcome.frames[0];
        assert_eq!(first.project_id.as_str(), "acme");
        assert_eq!(first.start, datetime!(2024-03-05 09:00 UTC));
        assert_eq!(first.end, Some(datetime!(2024-03-05 10:30 UTC)));
        assert_eq!(first.notes, "Landing page");
        assert!(first.tags.contains("Design"));
        assert!(outcome.frames[1].tags.is_empty());
        assert_eq!(outcome.frames[2].notes, "Notes, with comma");
    }

    #[test]
    fn applies_import_offset() {
        let options = ImportOptions {
            utc_offset: offset!(+2),
        };
        let outcome = import(ImportFormat::MacTimeTracker, SAMPLE, &[], &options).unwrap();
        assert_eq!(outcome.frames[0].start, datetime!(2024-03-05 07:00 UTC));
    }

    #[test]
    fn malformed_rows_are_reported_individually() {
        let source = "\
Project,Task,Date,Start time,End time,Duration,Comment
Acme,,2024-03-05,09:00,08:00,,
Acme,,05.03.2024,09:00,10:00,,
Acme,,2024-03-05,09:00,10:00,,
,,2024-03-05,09:00,10:00,,
";
        let outcome =
            import(ImportFormat::MacTimeTracker, source, &[], &ImportOptions::default()).unwrap();
        assert_eq!(outcome.frames.len(), 1);
        let rows: Vec<usize> = outcome.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![1, 2, 4]);
        assert_eq!(outcome.errors[0].reason, "end is before start");
    }

    #[test]
    fn fanurio_header_is_not_accepted() {
        let source =
            "Client,Project,Task,Start Date,Start Time,End Date,End Time,Duration,Description\n";
        let options = ImportOptions::default();
        let err = import(ImportFormat::MacTimeTracker, source, &[], &options).unwrap_err();
        assert!(matches!(err, ImportFormatError::MissingColumns(_)));
    }
}
