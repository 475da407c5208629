use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A monitored solar installation; the unit of export.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Plant {
    pub oid: String,
    pub name: String,
}

/// One interval measurement from a day overview. All powers in watts.
///
/// Timestamps are plant-local; the portal does not report a zone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerReading {
    pub timestamp: NaiveDateTime,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// One calendar day of interval measurements for a plant.
#[derive(Clone, Debug, PartialEq)]
pub struct DayOverview {
    pub date: NaiveDate,
    /// Meter total at the end of the day, in Wh.
    pub absolute_energy_wh: Option<f64>,
    /// Energy generated during the day, in Wh.
    pub difference_energy_wh: Option<f64>,
    pub readings: Vec<PowerReading>,
}

impl DayOverview {
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Daily generation and consumption totals, in Wh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DayEnergyBalance {
    pub date: NaiveDate,
    pub pv_generation_wh: Option<f64>,
    pub total_consumption_wh: Option<f64>,
}
