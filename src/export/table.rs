use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sunnyportal::PowerReading;

/// One interval row of an exported table. Powers in watts.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct TableRow {
    pub timestamp: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_power: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_power: Option<f64>,
}

impl TableRow {
    pub fn from_reading(reading: &PowerReading) -> Self {
        Self {
            timestamp: reading.timestamp,
            mean_power: reading.mean,
            min_power: reading.min,
            max_power: reading.max,
        }
    }
}

/// Which optional columns are populated in at least one row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColumnSet {
    pub mean: bool,
    pub min: bool,
    pub max: bool,
}

/// Rows ordered by timestamp, with unique timestamps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportTable {
    rows: Vec<TableRow>,
}

impl ExportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from rows in any order. Rows are sorted and duplicate
    /// timestamps dropped; on a duplicate the earliest-pushed row wins.
    pub fn from_rows(mut rows: Vec<TableRow>) -> Self {
        rows.sort_by_key(|r| r.timestamp);
        rows.dedup_by_key(|r| r.timestamp);
        Self { rows }
    }

    /// Concatenates two tables and restores the ordering invariant. On a
    /// timestamp collision the row from `self` wins, so merging stored data
    /// with a re-fetch never rewrites history.
    pub fn merge(self, other: ExportTable) -> ExportTable {
        let mut rows = self.rows;
        rows.extend(other.rows);
        Self::from_rows(rows)
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.timestamp.date())
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.timestamp.date())
    }

    pub fn columns(&self) -> ColumnSet {
        ColumnSet {
            mean: self.rows.iter().any(|r| r.mean_power.is_some()),
            min: self.rows.iter().any(|r| r.min_power.is_some()),
            max: self.rows.iter().any(|r| r.max_power.is_some()),
        }
    }

    /// Drops rows with zero mean power. Rows without a mean value are kept;
    /// absent is not the same as zero.
    pub fn drop_zero_rows(&mut self) {
        self.rows.retain(|r| r.mean_power != Some(0.0));
    }
}
