use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::{StoreError, TableStore};
use crate::export::{ExportTable, TableRow};

/// JSON artifacts are a flat array of row objects; absent power values are
/// omitted rather than serialized as null.
pub struct JsonStore;

impl TableStore for JsonStore {
    fn read(&self, path: &Path) -> Result<ExportTable, StoreError> {
        let reader = BufReader::new(File::open(path)?);
        let rows: Vec<TableRow> = serde_json::from_reader(reader)?;
        Ok(ExportTable::from_rows(rows))
    }

    fn write(&self, path: &Path, table: &ExportTable) -> Result<(), StoreError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, table.rows())?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    #[test]
    fn test_roundtrip_omits_absent_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plant.json");
        let table = ExportTable::from_rows(vec![
            TableRow {
                timestamp: "2023-06-01T10:00:00".parse().unwrap(),
                mean_power: Some(100.0),
                min_power: None,
                max_power: None,
            },
            TableRow {
                timestamp: "2023-06-01T10:15:00".parse().unwrap(),
                mean_power: None,
                min_power: None,
                max_power: None,
            },
        ]);
        JsonStore.write(&path, &table).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("null"));
        assert_eq!(JsonStore.read(&path).unwrap(), table);
    }

    #[test]
    fn test_read_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plant.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonStore.read(&path).unwrap_err(),
            StoreError::Json(_)
        ));
    }
}
