mod csv;
mod json;
mod sqlite;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

use crate::export::ExportTable;

pub use self::csv::CsvStore;
pub use self::json::JsonStore;
pub use self::sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] ::csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("malformed stored data: {0}")]
    Format(String),
    #[error("refusing to write an empty table")]
    EmptyTable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageFormat {
    Csv,
    Json,
    Sqlite,
}

impl StorageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            StorageFormat::Csv => "csv",
            StorageFormat::Json => "json",
            StorageFormat::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for StorageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(StorageFormat::Csv),
            "json" => Ok(StorageFormat::Json),
            "sqlite" => Ok(StorageFormat::Sqlite),
            other => Err(format!(
                "unknown format '{other}'; expected csv, json or sqlite"
            )),
        }
    }
}

/// Reads and writes one tabular artifact in a concrete format.
pub trait TableStore {
    fn read(&self, path: &Path) -> Result<ExportTable, StoreError>;
    fn write(&self, path: &Path, table: &ExportTable) -> Result<(), StoreError>;
}

pub fn store_for(format: StorageFormat) -> Box<dyn TableStore> {
    match format {
        StorageFormat::Csv => Box::new(CsvStore),
        StorageFormat::Json => Box::new(JsonStore),
        StorageFormat::Sqlite => Box::new(SqliteStore),
    }
}

/// Finds the artifact a previous run left behind for this plant, either a
/// bare `{stem}.{ext}` or a range-named `{stem}_from_..._to_....{ext}`.
pub fn locate_artifact(
    dir: &Path,
    stem: &str,
    format: StorageFormat,
) -> Result<Option<PathBuf>, StoreError> {
    if !dir.exists() {
        return Ok(None);
    }
    let suffix = format!(".{}", format.extension());
    let plain = format!("{stem}{suffix}");
    let range_prefix = format!("{stem}_from_");

    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name == plain || (name.starts_with(&range_prefix) && name.ends_with(&suffix)) {
            candidates.push(entry.path());
        }
    }
    candidates.sort();
    let found = candidates.pop();
    if let (Some(latest), true) = (&found, !candidates.is_empty()) {
        log::warn!(
            "Found {} artifacts for '{stem}'; continuing from {}",
            candidates.len() + 1,
            latest.display()
        );
    }
    Ok(found)
}

pub fn artifact_name(
    stem: &str,
    first: NaiveDate,
    last: NaiveDate,
    format: StorageFormat,
) -> String {
    format!("{stem}_from_{first}_to_{last}.{}", format.extension())
}

/// Writes the table to a fresh temp file, renames it into place, and only
/// then removes the superseded artifact. A failed run leaves the previous
/// artifact untouched.
pub fn persist(
    format: StorageFormat,
    dir: &Path,
    stem: &str,
    table: &ExportTable,
    superseded: Option<&Path>,
) -> Result<PathBuf, StoreError> {
    let (Some(first), Some(last)) = (table.first_date(), table.last_date()) else {
        return Err(StoreError::EmptyTable);
    };
    fs::create_dir_all(dir)?;

    let target = dir.join(artifact_name(stem, first, last, format));
    let tmp = target.with_extension(format!("{}.tmp", format.extension()));
    if tmp.exists() {
        fs::remove_file(&tmp)?;
    }
    store_for(format).write(&tmp, table)?;
    fs::rename(&tmp, &target)?;

    if let Some(old) = superseded {
        if old != target {
            fs::remove_file(old)?;
            log::debug!("Removed superseded artifact {}", old.display());
        }
    }
    Ok(target)
}
