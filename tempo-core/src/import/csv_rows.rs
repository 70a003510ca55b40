//! Header-addressed CSV rows shared by the CSV importers.

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord, Trim};
use time::{
    format_description::BorrowedFormatItem, macros::format_description, Date, PrimitiveDateTime,
    Time, UtcOffset,
};

use crate::error::ImportFormatError;

const TIME_HM: &[BorrowedFormatItem<'static>] = format_description!("[hour padding:none]:[minute]");
const TIME_HMS: &[BorrowedFormatItem<'static>] =
    format_description!("[hour padding:none]:[minute]:[second]");

/// A CSV document whose columns are looked up by header name.
pub(super) struct CsvTable {
    columns: HashMap<String, usize>,
    /// 1-based data row number and the row, or why it could not be read.
    pub rows: Vec<(usize, Result<StringRecord, String>)>,
}

impl CsvTable {
    /// Reads `source`, requiring a header row that names every column in
    /// `required` (case-insensitive).
    pub fn read(source: &str, required: &[&str]) -> Result<Self, ImportFormatError> {
        if source.trim().is_empty() {
            return Err(ImportFormatError::Empty);
        }

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(source.trim_start_matches('\u{feff}').as_bytes());

        let columns: HashMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_lowercase(), i))
            .collect();

        let missing: Vec<String> = required
            .iter()
            .filter(|name| !columns.contains_key(&name.to_lowercase()))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ImportFormatError::MissingColumns(missing));
        }

        let rows = reader
            .records()
            .enumerate()
            .map(|(i, record)| (i + 1, record.map_err(|e| e.to_string())))
            .collect();

        Ok(Self { columns, rows })
    }

    /// The trimmed value of `column`, empty when the column or cell is absent.
    pub fn field<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.columns
            .get(&column.to_lowercase())
            .and_then(|i| record.get(*i))
            .unwrap_or("")
    }

    /// Like [`CsvTable::field`] but fails with a row-level reason when empty.
    pub fn required<'r>(&self, record: &'r StringRecord, column: &str) -> Result<&'r str, String> {
        let value = self.field(record, column);
        if value.is_empty() {
            return Err(format!("missing value for '{column}'"));
        }
        Ok(value)
    }
}

pub(super) fn parse_date(
    value: &str,
    format: &[BorrowedFormatItem<'_>],
    column: &str,
) -> Result<Date, String> {
    Date::parse(value, format).map_err(|e| format!("invalid {column} '{value}': {e}"))
}

/// Accepts `H:MM` and `H:MM:SS`.
pub(super) fn parse_time(value: &str, column: &str) -> Result<Time, String> {
    Time::parse(value, TIME_HMS)
        .or_else(|_| Time::parse(value, TIME_HM))
        .map_err(|e| format!("invalid {column} '{value}': {e}"))
}

pub(super) fn local_timestamp(date: Date, time: Time, offset: UtcOffset) -> time::OffsetDateTime {
    PrimitiveDateTime::new(date, time).assume_offset(offset)
}

/// Non-empty tag from a free text cell.
pub(super) fn tag(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::time;

    #[test]
    fn columns_are_case_insensitive() {
        let table =
            CsvTable::read("PROJECT,Date\nAcme,2024-03-05\n", &["project", "date"]).unwrap();
        let (row, record) = &table.rows[0];
        let record = record.as_ref().unwrap();
        assert_eq!(*row, 1);
        assert_eq!(table.field(record, "Project"), "Acme");
        assert_eq!(table.field(record, "missing"), "");
    }

    #[test]
    fn missing_columns_abort() {
        let err = CsvTable::read("Project\nAcme\n", &["Project", "Date"]).err();
        assert!(matches!(
            err,
            Some(ImportFormatError::MissingColumns(cols)) if cols == vec!["Date"]
        ));
    }

    #[test]
    fn empty_input_aborts() {
        assert!(matches!(CsvTable::read("  \n", &[]), Err(ImportFormatError::Empty)));
    }

    #[test]
    fn time_with_or_without_seconds() {
        assert_eq!(parse_time("9:05", "Start"), Ok(time!(9:05)));
        assert_eq!(parse_time("09:05:30", "Start"), Ok(time!(9:05:30)));
        assert!(parse_time("25:00", "Start").is_err());
    }
}
