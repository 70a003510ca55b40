//! Watson's `frames` file.
//!
//! A JSON array where every frame is itself an array:
//!
//! ```text
//! [start, stop, project, id, tags, updated_at, archived]
//! ```
//!
//! `start`/`stop` are unix seconds, `stop` is `null` for the running frame.
//! `tags` is either an array of strings or one comma-delimited string. The
//! trailing `updated_at` and `archived` fields are optional.

use std::collections::HashSet;

use serde_json::Value;
use time::OffsetDateTime;

use super::{Collector, ImportOptions, ImportOutcome, ParsedRecord};
use crate::{domain::FrameId, error::ImportFormatError};

const TAG_DELIMITER: char = ',';

pub(super) fn parse(
    source: &str,
    mut collector: Collector,
    options: &ImportOptions,
) -> Result<ImportOutcome, ImportFormatError> {
    if source.trim().is_empty() {
        return Err(ImportFormatError::Empty);
    }
    let Value::Array(records) = serde_json::from_str::<Value>(source)? else {
        return Err(ImportFormatError::NotAnArray);
    };

    let mut seen = HashSet::new();
    for (i, value) in records.iter().enumerate() {
        let row = i + 1;
        match parse_record(value, options) {
            Ok(record) => {
                let id = record.id.as_ref().map(FrameId::to_string).unwrap_or_default();
                if !seen.insert(id.clone()) {
                    collector.reject(row, format!("duplicate frame id {id}"));
                    continue;
                }
                collector.accept(row, record);
            }
            Err(reason) => collector.reject(row, reason),
        }
    }

    Ok(collector.finish())
}

fn parse_record(value: &Value, options: &ImportOptions) -> Result<ParsedRecord, String> {
    let fields = value
        .as_array()
        .ok_or_else(|| "frame is not an array".to_string())?;
    if fields.len() < 4 {
        return Err(format!("expected at least 4 fields, got {}", fields.len()));
    }

    let start = timestamp(&fields[0], "start")?;
    let end = match &fields[1] {
        Value::Null => None,
        stop => Some(timestamp(stop, "stop")?),
    };
    let project = fields[2]
        .as_str()
        .ok_or_else(|| "project is not a string".to_string())?;
    let id = fields[3]
        .as_str()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| "missing frame id".to_string())?;

    let mut record = ParsedRecord::new(
        project,
        start.to_offset(options.utc_offset),
        end.map(|end| end.to_offset(options.utc_offset)),
    );
    record.id = Some(FrameId::from(id.trim()));
    record.tags = tags(fields.get(4).unwrap_or(&Value::Null))?
        .into_iter()
        .collect();
    record.archived = match fields.get(6) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(archived)) => *archived,
        Some(other) => return Err(format!("archived flag is not a boolean: {other}")),
    };
    Ok(record)
}

fn timestamp(value: &Value, field: &str) -> Result<OffsetDateTime, String> {
    let seconds = value
        .as_i64()
        .or_else(|| value.as_f64().map(|secs| secs.trunc() as i64))
        .ok_or_else(|| format!("{field} is not a unix timestamp: {value}"))?;
    OffsetDateTime::from_unix_timestamp(seconds).map_err(|e| format!("invalid {field}: {e}"))
}

fn tags(value: &Value) -> Result<Vec<String>, String> {
    let raw: Vec<&str> = match value {
        Value::Null => Vec::new(),
        Value::String(joined) => joined.split(TAG_DELIMITER).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().ok_or_else(|| format!("tag is not a string: {item}")))
            .collect::<Result<_, _>>()?,
        other => return Err(format!("tags must be a list or a string, got {other}")),
    };
    Ok(raw
        .into_iter()
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::{import, ImportFormat};
    use super::*;
    use crate::domain::Project;
    use time::macros::{datetime, offset};

    #[test]
    fn unknown_project_becomes_top_level() {
        let source = r#"[[1709629200, 1709634600, "Acme", "f1", ["design", "web"], 1709634600]]"#;
        let outcome = import(ImportFormat::Watson, source, &[], &ImportOptions::default()).unwrap();

        assert!(outcome.is_clean());
        assert_eq!(outcome.created_projects.len(), 1);
        assert_eq!(outcome.created_projects[0].name, "Acme");
        assert!(outcome.created_projects[0].is_top_level());

        let frame = &outcome.frames[0];
        assert_eq!(frame.id, FrameId::from("f1"));
        assert_eq!(frame.project_id, outcome.created_projects[0].id);
        assert_eq!(frame.start, datetime!(2024-03-05 09:00 UTC));
        assert_eq!(frame.end, Some(datetime!(2024-03-05 10:30 UTC)));
        assert_eq!(frame.tags.len(), 2);
        assert!(!frame.archived);
    }

    #[test]
    fn string_tags_archived_flag_and_running_frame() {
        let source = r#"[
            [1709629200, 1709634600, "Acme", "f1", "design, web ,", 0, true],
            [1709640000, null, "Acme", "f2", []]
        ]"#;
        let existing = vec![Project::new("acme", "Acme")];
        let options = ImportOptions {
            utc_offset: offset!(+1),
        };
        let outcome = import(ImportFormat::Watson, source, &existing, &options).unwrap();

        assert!(outcome.is_clean(), "{:?}", outcome.errors);
        assert!(outcome.created_projects.is_empty());
        let archived = &outcome.frames[0];
        assert!(archived.archived);
        assert_eq!(
            archived.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["design", "web"]
        );
        assert_eq!(archived.start.offset(), offset!(+1));
        assert!(outcome.frames[1].is_running());
    }

    #[test]
    fn first_duplicate_wins() {
        let source = r#"[
            [1709629200, 1709634600, "Acme", "f1", []],
            [1709640000, 1709643600, "Beta", "f1", []],
            ["yesterday", 1709643600, "Beta", "f3", []],
            [1709640000, 1709643600, "Beta"]
        ]"#;
        let outcome = import(ImportFormat::Watson, source, &[], &ImportOptions::default()).unwrap();

        assert_eq!(outcome.frames.len(), 1);
        assert_eq!(outcome.frames[0].end, Some(datetime!(2024-03-05 10:30 UTC)));
        let rows: Vec<usize> = outcome.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![2, 3, 4]);
        assert_eq!(outcome.errors[0].reason, "duplicate frame id f1");
        // Beta only appeared in rejected records
        assert_eq!(outcome.created_projects.len(), 1);
    }

    #[test]
    fn non_array_documents_abort() {
        let options = ImportOptions::default();
        assert!(matches!(
            import(ImportFormat::Watson, r#"{"frames": []}"#, &[], &options),
            Err(ImportFormatError::NotAnArray)
        ));
        assert!(matches!(
            import(ImportFormat::Watson, "[1709629200,", &[], &options),
            Err(ImportFormatError::Json(_))
        ));
        assert!(matches!(
            import(ImportFormat::Watson, "", &[], &options),
            Err(ImportFormatError::Empty)
        ));
    }
}
