//! CSV time export of Fanurio.
//!
//! ```text
//! Client,Project,Task,Start Date,Start Time,End Date,End Time,Duration,Description
//! Initech,Website,Layout,03/05/2024,09:00,03/05/2024,10:30,1:30,Header
//! ```
//!
//! Dates are US style (`MM/DD/YYYY`). An empty end date means the frame ends
//! on its start date.

use csv::StringRecord;
use time::{format_description::BorrowedFormatItem, macros::format_description};

use super::{
    csv_rows::{self, CsvTable},
    Collector, ImportOptions, ImportOutcome, ParsedRecord,
};
use crate::error::ImportFormatError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[month padding:none]/[day padding:none]/[year]");

const CLIENT: &str = "Client";
const PROJECT: &str = "Project";
const TASK: &str = "Task";
const START_DATE: &str = "Start Date";
const START_TIME: &str = "Start Time";
const END_DATE: &str = "End Date";
const END_TIME: &str = "End Time";
const DESCRIPTION: &str = "Description";

pub(super) fn parse(
    source: &str,
    mut collector: Collector,
    options: &ImportOptions,
) -> Result<ImportOutcome, ImportFormatError> {
    let table = CsvTable::read(source, &[PROJECT, START_DATE, START_TIME, END_TIME])?;

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
    let start_date =
        csv_rows::parse_date(table.required(record, START_DATE)?, DATE_FORMAT, START_DATE)?;
    let start_time = csv_rows::parse_time(table.required(record, START_TIME)?, START_TIME)?;
    let end_date = match table.field(record, END_DATE) {
        "" => start_date,
        value => csv_rows::parse_date(value, DATE_FORMAT, END_DATE)?,
    };
    let end_time = csv_rows::parse_time(table.required(record, END_TIME)?, END_TIME)?;

    let mut parsed = ParsedRecord::new(
        project,
        csv_rows::local_timestamp(start_date, start_time, options.utc_offset),
        Some(csv_rows::local_timestamp(end_date, end_time, options.utc_offset)),
    );
    parsed.notes = table.field(record, DESCRIPTION).to_string();
    parsed.tags.extend(csv_rows::tag(table.field(record, TASK)));
    parsed.tags.extend(
        csv_rows::tag(table.field(record, CLIENT)).map(|client| format!("client:{client}")),
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::super::{import, ImportFormat};
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_us_dates_and_overnight_frames() {
        let source = "\
Client,Project,Task,Start Date,Start Time,End Date,End Time,Duration,Description
Initech,Website,Layout,03/05/2024,09:00,03/05/2024,10:30,1:30,Header
Initech,Website,,3/5/2024,23:00,3/6/2024,1:00,2:00,Deploy
,Internal,,03/07/2024,08:00,,08:45,0:45,
";
        let outcome =
            import(ImportFormat::Fanurio, source, &[], &ImportOptions::default()).unwrap();
        assert!(outcome.is_clean(), "{:?}", outcome.errors);
        assert_eq!(outcome.frames.len(), 3);
        assert_eq!(outcome.created_projects.len(), 2);

        let overnight = &outcome.frames[1];
        assert_eq!(overnight.start, datetime!(2024-03-05 23:00 UTC));
        assert_eq!(overnight.end, Some(datetime!(2024-03-06 01:00 UTC)));
        assert_eq!(overnight.notes, "Deploy");
        assert!(overnight.tags.contains("client:Initech"));

        let same_day = &outcome.frames[2];
        assert_eq!(same_day.end, Some(datetime!(2024-03-07 08:45 UTC)));
        assert!(same_day.tags.is_empty());
    }

    #[test]
    fn iso_dates_are_rejected_per_row() {
        let source = "\
Project,Start Date,Start Time,End Time
Website,2024-03-05,09:00,10:00
Website,03/05/2024,09:00,10:00
";
        let outcome =
            import(ImportFormat::Fanurio, source, &[], &ImportOptions::default()).unwrap();
        assert_eq!(outcome.frames.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].row, 1);
        assert!(outcome.errors[0].reason.contains("Start Date"));
    }

    #[test]
    fn mac_header_is_not_accepted() {
        let source = "Project,Task,Date,Start time,End time,Duration,Comment\n";
        let err =
            import(ImportFormat::Fanurio, source, &[], &ImportOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ImportFormatError::MissingColumns(cols) if cols == vec!["Start Date"]
        ));
    }
}
