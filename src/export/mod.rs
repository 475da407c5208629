mod range;
mod table;

pub use range::{clamp_to_yesterday, resolve_range};
pub use table::{ColumnSet, ExportTable, TableRow};

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};

use crate::argsets::FileArgs;
use crate::helpers::sanitize_filename;
use crate::portal::Portal;
use crate::storage;

/// Exports every plant of the account to one artifact per plant.
pub fn run(portal: &mut dyn Portal, args: &FileArgs) -> Result<()> {
    let plants = portal.plants().context("could not list plants")?;
    if plants.is_empty() {
        bail!("no plants found for this account");
    }

    let today = Local::now().date_naive();
    for plant in &plants {
        export_plant(portal, &plant.oid, &plant.name, args, today)
            .with_context(|| format!("export failed for plant '{}'", plant.name))?;
    }
    Ok(())
}

/// Incremental export of a single plant: read what is already stored,
/// fetch only the missing days, merge and replace the artifact.
fn export_plant(
    portal: &mut dyn Portal,
    oid: &str,
    name: &str,
    args: &FileArgs,
    today: NaiveDate,
) -> Result<()> {
    let stem = sanitize_filename(name);
    let existing = storage::locate_artifact(&args.dest_dir, &stem, args.format)?;
    let stored = match &existing {
        Some(path) => {
            log::info!("Reading stored data from {}", path.display());
            storage::store_for(args.format).read(path)?
        }
        None => ExportTable::new(),
    };

    let yesterday = today - Duration::days(1);
    let requested_start = args.start.unwrap_or(yesterday);
    let requested_end = args.end.unwrap_or(yesterday);

    let fetched = match resolve_range(requested_start, requested_end, stored.last_date(), today) {
        Some((start, end)) => fetch_days(portal, oid, name, start, end)?,
        None => {
            log::info!("Stored data for '{name}' already covers the requested range");
            ExportTable::new()
        }
    };

    let mut table = stored.merge(fetched);
    if args.skip_zero {
        table.drop_zero_rows();
    }
    if table.is_empty() {
        log::warn!("No data for plant '{name}'; nothing written");
        return Ok(());
    }

    let written = storage::persist(
        args.format,
        &args.dest_dir,
        &stem,
        &table,
        existing.as_deref(),
    )?;
    log::info!("Wrote {} rows to {}", table.len(), written.display());
    Ok(())
}

fn fetch_days(
    portal: &mut dyn Portal,
    oid: &str,
    name: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<ExportTable> {
    log::info!("Fetching '{name}' from {start} to {end}");
    let mut rows = Vec::new();
    let mut date = start;
    while date <= end {
        let overview = portal
            .day_overview(oid, date)
            .with_context(|| format!("day overview fetch failed for {date}"))?;
        if overview.is_empty() {
            log::debug!("No measurements for {date}");
        } else {
            rows.extend(overview.readings.iter().map(TableRow::from_reading));
        }
        date += Duration::days(1);
    }
    log::info!("Fetched {} rows", rows.len());
    Ok(ExportTable::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use sunnyportal::{DayEnergyBalance, DayOverview, Plant, PowerReading};

    use crate::storage::StorageFormat;

    /// In-memory portal: one plant, a fixed map of day overviews, and a log
    /// of every fetched date.
    struct FakePortal {
        days: BTreeMap<NaiveDate, Vec<PowerReading>>,
        fetched: RefCell<Vec<NaiveDate>>,
    }

    impl FakePortal {
        fn new(days: BTreeMap<NaiveDate, Vec<PowerReading>>) -> Self {
            Self {
                days,
                fetched: RefCell::new(Vec::new()),
            }
        }
    }

    impl Portal for FakePortal {
        fn plants(&mut self) -> Result<Vec<Plant>> {
            Ok(vec![Plant {
                oid: "p-1".to_string(),
                name: "Home / roof".to_string(),
            }])
        }

        fn day_overview(&mut self, _oid: &str, date: NaiveDate) -> Result<DayOverview> {
            self.fetched.borrow_mut().push(date);
            Ok(DayOverview {
                date,
                absolute_energy_wh: None,
                difference_energy_wh: None,
                readings: self.days.get(&date).cloned().unwrap_or_default(),
            })
        }

        fn day_energy_balance(
            &mut self,
            _oid: &str,
            date: NaiveDate,
        ) -> Result<DayEnergyBalance> {
            Ok(DayEnergyBalance {
                date,
                pv_generation_wh: None,
                total_consumption_wh: None,
            })
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reading(d: NaiveDate, h: u32, min: u32, mean: f64) -> PowerReading {
        PowerReading {
            timestamp: d.and_hms_opt(h, min, 0).unwrap(),
            mean: Some(mean),
            min: None,
            max: None,
        }
    }

    fn args(dir: PathBuf, start: NaiveDate, end: NaiveDate) -> FileArgs {
        FileArgs {
            config: PathBuf::from("unused.json"),
            format: StorageFormat::Csv,
            start: Some(start),
            end: Some(end),
            dest_dir: dir,
            skip_zero: false,
        }
    }

    #[test]
    fn test_initial_export_writes_range_named_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let today = date(2023, 6, 10);
        let d1 = date(2023, 6, 1);
        let d2 = date(2023, 6, 2);

        let mut days = BTreeMap::new();
        days.insert(d1, vec![reading(d1, 10, 0, 100.0), reading(d1, 10, 15, 200.0)]);
        days.insert(d2, vec![reading(d2, 10, 0, 300.0)]);
        let mut portal = FakePortal::new(days);

        export_plant(
            &mut portal,
            "p-1",
            "Home / roof",
            &args(dir.path().to_path_buf(), d1, d2),
            today,
        )
        .unwrap();

        let artifact = dir
            .path()
            .join("Home___roof_from_2023-06-01_to_2023-06-02.csv");
        assert!(artifact.exists());
        let table = storage::store_for(StorageFormat::Csv).read(&artifact).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_rerun_fetches_only_missing_days_and_supersedes() {
        let dir = tempfile::tempdir().unwrap();
        let today = date(2023, 6, 10);
        let d1 = date(2023, 6, 1);
        let d2 = date(2023, 6, 2);
        let d3 = date(2023, 6, 3);

        let mut days = BTreeMap::new();
        days.insert(d1, vec![reading(d1, 10, 0, 100.0)]);
        days.insert(d2, vec![reading(d2, 10, 0, 200.0)]);
        days.insert(d3, vec![reading(d3, 10, 0, 300.0)]);

        let mut portal = FakePortal::new(days.clone());
        export_plant(
            &mut portal,
            "p-1",
            "Home / roof",
            &args(dir.path().to_path_buf(), d1, d2),
            today,
        )
        .unwrap();

        let mut portal = FakePortal::new(days);
        export_plant(
            &mut portal,
            "p-1",
            "Home / roof",
            &args(dir.path().to_path_buf(), d1, d3),
            today,
        )
        .unwrap();

        // Only the day after the stored maximum was fetched.
        assert_eq!(*portal.fetched.borrow(), vec![d3]);

        let old = dir
            .path()
            .join("Home___roof_from_2023-06-01_to_2023-06-02.csv");
        let new = dir
            .path()
            .join("Home___roof_from_2023-06-01_to_2023-06-03.csv");
        assert!(!old.exists());
        assert!(new.exists());
        let table = storage::store_for(StorageFormat::Csv).read(&new).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_day_without_measurements_contributes_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let today = date(2023, 6, 10);
        let d1 = date(2023, 6, 1);
        let d2 = date(2023, 6, 2);

        let mut days = BTreeMap::new();
        days.insert(d2, vec![reading(d2, 10, 0, 300.0)]);
        let mut portal = FakePortal::new(days);

        export_plant(
            &mut portal,
            "p-1",
            "Home / roof",
            &args(dir.path().to_path_buf(), d1, d2),
            today,
        )
        .unwrap();

        let artifact = dir
            .path()
            .join("Home___roof_from_2023-06-02_to_2023-06-02.csv");
        let table = storage::store_for(StorageFormat::Csv).read(&artifact).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_no_plants_is_fatal() {
        struct EmptyPortal;
        impl Portal for EmptyPortal {
            fn plants(&mut self) -> Result<Vec<Plant>> {
                Ok(Vec::new())
            }
            fn day_overview(&mut self, _: &str, _: NaiveDate) -> Result<DayOverview> {
                unreachable!()
            }
            fn day_energy_balance(&mut self, _: &str, _: NaiveDate) -> Result<DayEnergyBalance> {
                unreachable!()
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &mut EmptyPortal,
            &args(dir.path().to_path_buf(), date(2023, 6, 1), date(2023, 6, 2)),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no plants"));
    }
}
