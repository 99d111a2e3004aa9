//! CSV export of filtered records

use crate::error::Result;
use crate::types::{DateRange, FilteredRecord, ProjectId};
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

/// CSV header row, in column order
pub const CSV_COLUMNS: [&str; 5] = [
    "taskId",
    "projectId",
    "taskStatus",
    "lastUpdated",
    "lastUpdatedBy",
];

/// File name for an export, e.g. `tasks_project_24229_2025-08-01_to_2025-08-31.csv`
pub fn csv_file_name(project_id: ProjectId, range: &DateRange) -> String {
    format!(
        "tasks_project_{}_{}_to_{}.csv",
        project_id,
        range.from(),
        range.to()
    )
}

/// Write records as CSV (header plus one row per record)
///
/// # Errors
/// Returns [`crate::Error::Io`] if the writer fails.
pub fn write_csv<W: Write>(mut writer: W, records: &[FilteredRecord]) -> Result<()> {
    writeln!(writer, "{}", CSV_COLUMNS.join(","))?;

    for record in records {
        writeln!(
            writer,
            "{},{},{},{},{}",
            record.task_id,
            record.project_id,
            escape_field(record.task_status.as_str()),
            escape_field(&record.last_updated),
            escape_field(&record.last_updated_by),
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Render records as a CSV string
///
/// # Errors
/// Only fails if writing to the in-memory buffer fails.
pub fn to_csv_string(records: &[FilteredRecord]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, records)?;
    // Every field written is valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write the CSV export into `dir` under [`csv_file_name`], returning the path
///
/// # Errors
/// Returns [`crate::Error::Io`] if `dir` cannot be created or the file cannot be written.
pub fn write_csv_file(
    dir: impl AsRef<Path>,
    project_id: ProjectId,
    range: &DateRange,
    records: &[FilteredRecord],
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let path = dir.join(csv_file_name(project_id, range));
    let file = std::fs::File::create(&path)?;
    write_csv(std::io::BufWriter::new(file), records)?;

    tracing::info!(path = %path.display(), rows = records.len(), "CSV export written");
    Ok(path)
}

/// Quote a field if it contains a delimiter, quote or line break
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
