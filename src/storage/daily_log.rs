use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Appends one vehicle-status record to the CSV file for `date`, creating the
/// data directory and the file as needed. The header row is written only when
/// the file is empty, so the header of a day's file is fixed by the first
/// successful poll of that day. Because the file name is derived from `date`
/// per record, the log rotates to a new file at midnight on its own.
///
/// Rows are written in the record's own field order. If the vendor's schema
/// shifts mid-day the header no longer matches later rows; that misalignment
/// is passed through untouched, matching the upstream service's contract.
pub fn append_record(
    data_path: &Path,
    date: NaiveDate,
    record: &Map<String, Value>,
) -> Result<PathBuf, csv::Error> {
    fs::create_dir_all(data_path)?;
    let file_path = data_path.join(format!("{}.csv", date.format("%Y-%m-%d")));

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&file_path)?;
    let needs_header = file.metadata()?.len() == 0;

    let mut writer = csv::Writer::from_writer(file);
    if needs_header {
        writer.write_record(record.keys())?;
    }
    writer.write_record(record.values().map(cell_value))?;
    writer.flush()?;

    Ok(file_path)
}

/// Strings go out verbatim; any other scalar keeps its JSON rendering.
fn cell_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
