use anyhow::Result;
use chrono::NaiveDate;
use sunnyportal::{Client, DayEnergyBalance, DayOverview, Plant};

/// The portal operations the export and upload engines consume.
///
/// Engines only ever see this trait, so tests drive them with in-memory
/// fakes instead of a live session.
pub trait Portal {
    fn plants(&mut self) -> Result<Vec<Plant>>;
    fn day_overview(&mut self, plant_oid: &str, date: NaiveDate) -> Result<DayOverview>;
    fn day_energy_balance(&mut self, plant_oid: &str, date: NaiveDate)
        -> Result<DayEnergyBalance>;
}

impl Portal for Client {
    fn plants(&mut self) -> Result<Vec<Plant>> {
        Ok(Client::plants(self)?)
    }

    fn day_overview(&mut self, plant_oid: &str, date: NaiveDate) -> Result<DayOverview> {
        Ok(Client::day_overview(self, plant_oid, date)?)
    }

    fn day_energy_balance(
        &mut self,
        plant_oid: &str,
        date: NaiveDate,
    ) -> Result<DayEnergyBalance> {
        Ok(Client::day_energy_balance(self, plant_oid, date)?)
    }
}
