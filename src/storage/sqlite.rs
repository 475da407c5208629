use std::path::Path;

use chrono::NaiveDateTime;
use rusqlite::{params_from_iter, types::Value, Connection, OpenFlags};

use super::csv::TIMESTAMP_FORMAT;
use super::{StoreError, TableStore};
use crate::export::{ExportTable, TableRow};

const TABLE_NAME: &str = "power";

/// SQLite artifacts hold a single `power` table keyed by timestamp, with
/// the same variable power columns as the CSV layout.
pub struct SqliteStore;

impl TableStore for SqliteStore {
    fn read(&self, path: &Path) -> Result<ExportTable, StoreError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let mut stmt =
            conn.prepare(&format!("SELECT * FROM {TABLE_NAME} ORDER BY timestamp"))?;

        let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();
        let position = |name: &str| names.iter().position(|n| n == name);
        let Some(ts_idx) = position("timestamp") else {
            return Err(StoreError::Format("missing 'timestamp' column".to_string()));
        };
        let mean_idx = position("mean_power");
        let min_idx = position("min_power");
        let max_idx = position("max_power");

        let mut rows = Vec::new();
        let mut result = stmt.query([])?;
        while let Some(row) = result.next()? {
            let raw_ts: String = row.get(ts_idx)?;
            let timestamp = NaiveDateTime::parse_from_str(&raw_ts, TIMESTAMP_FORMAT)
                .map_err(|_| StoreError::Format(format!("bad timestamp '{raw_ts}'")))?;
            let power = |idx: Option<usize>| -> Result<Option<f64>, rusqlite::Error> {
                idx.map(|i| row.get(i)).transpose().map(Option::flatten)
            };
            rows.push(TableRow {
                timestamp,
                mean_power: power(mean_idx)?,
                min_power: power(min_idx)?,
                max_power: power(max_idx)?,
            });
        }
        Ok(ExportTable::from_rows(rows))
    }

    fn write(&self, path: &Path, table: &ExportTable) -> Result<(), StoreError> {
        let columns = table.columns();
        let mut conn = Connection::open(path)?;

        let mut defs = vec!["timestamp TEXT PRIMARY KEY NOT NULL".to_string()];
        let mut names = vec!["timestamp".to_string()];
        for (present, name) in [
            (columns.mean, "mean_power"),
            (columns.min, "min_power"),
            (columns.max, "max_power"),
        ] {
            if present {
                defs.push(format!("{name} REAL"));
                names.push(name.to_string());
            }
        }
        conn.execute(
            &format!("CREATE TABLE {TABLE_NAME} ({})", defs.join(", ")),
            [],
        )?;

        let placeholders = vec!["?"; names.len()].join(", ");
        let insert = format!(
            "INSERT INTO {TABLE_NAME} ({}) VALUES ({placeholders})",
            names.join(", ")
        );
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&insert)?;
            for row in table.rows() {
                let mut values = vec![Value::Text(
                    row.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                )];
                for (present, value) in [
                    (columns.mean, row.mean_power),
                    (columns.min, row.min_power),
                    (columns.max, row.max_power),
                ] {
                    if present {
                        values.push(value.map(Value::Real).unwrap_or(Value::Null));
                    }
                }
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
