use std::path::Path;

use chrono::NaiveDateTime;

use super::{StoreError, TableStore};
use crate::export::{ExportTable, TableRow};

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const COL_TIMESTAMP: &str = "timestamp";
const COL_MEAN: &str = "mean_power";
const COL_MIN: &str = "min_power";
const COL_MAX: &str = "max_power";

/// CSV artifacts carry only the power columns that hold any data, so the
/// header varies from plant to plant.
pub struct CsvStore;

impl TableStore for CsvStore {
    fn read(&self, path: &Path) -> Result<ExportTable, StoreError> {
        let mut reader = ::csv::Reader::from_path(path)?;

        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h == name);
        let Some(ts_idx) = position(COL_TIMESTAMP) else {
            return Err(StoreError::Format(format!(
                "missing '{COL_TIMESTAMP}' column"
            )));
        };
        let mean_idx = position(COL_MEAN);
        let min_idx = position(COL_MIN);
        let max_idx = position(COL_MAX);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let raw_ts = record.get(ts_idx).unwrap_or_default();
            rows.push(TableRow {
                timestamp: parse_timestamp(raw_ts)?,
                mean_power: parse_power(&record, mean_idx)?,
                min_power: parse_power(&record, min_idx)?,
                max_power: parse_power(&record, max_idx)?,
            });
        }
        Ok(ExportTable::from_rows(rows))
    }

    fn write(&self, path: &Path, table: &ExportTable) -> Result<(), StoreError> {
        let columns = table.columns();
        let mut writer = ::csv::Writer::from_path(path)?;

        let mut header = vec![COL_TIMESTAMP];
        if columns.mean {
            header.push(COL_MEAN);
        }
        if columns.min {
            header.push(COL_MIN);
        }
        if columns.max {
            header.push(COL_MAX);
        }
        writer.write_record(&header)?;

        for row in table.rows() {
            let mut record = vec![row.timestamp.format(TIMESTAMP_FORMAT).to_string()];
            if columns.mean {
                record.push(format_power(row.mean_power));
            }
            if columns.min {
                record.push(format_power(row.min_power));
            }
            if columns.max {
                record.push(format_power(row.max_power));
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn format_power(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_power(record: &::csv::StringRecord, idx: Option<usize>) -> Result<Option<f64>, StoreError> {
    let Some(raw) = idx.and_then(|i| record.get(i)) else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| StoreError::Format(format!("bad power value '{raw}'")))
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, StoreError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|_| StoreError::Format(format!("bad timestamp '{raw}'")))
}
