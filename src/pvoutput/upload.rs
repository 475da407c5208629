use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use sunnyportal::{DayEnergyBalance, DayOverview, Plant};

use super::{DailyOutput, PvOutputClient, StatusPoint};
use crate::export::clamp_to_yesterday;
use crate::portal::Portal;

/// Default interval when a day holds fewer than two readings.
const DEFAULT_INTERVAL_HOURS: f64 = 0.25;

/// Uploads one day of a plant's data: interval statuses first, then the
/// end-of-day output.
pub fn run(
    portal: &mut dyn Portal,
    client: &PvOutputClient,
    plant_oid: Option<&str>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let today = Local::now().date_naive();
    let date = clamp_to_yesterday(date.unwrap_or(today - Duration::days(1)), today);

    let plants = portal.plants().context("could not list plants")?;
    let plant = select_plant(&plants, plant_oid)?;
    log::info!("Uploading {date} for plant '{}'", plant.name);

    let overview = portal
        .day_overview(&plant.oid, date)
        .context("day overview fetch failed")?;
    if overview.is_empty() {
        log::warn!("No measurements for {date}; nothing uploaded");
        return Ok(());
    }
    let balance = portal
        .day_energy_balance(&plant.oid, date)
        .context("energy balance fetch failed")?;

    let points = status_points(&overview);
    log::info!("Uploading {} status points", points.len());
    client
        .add_batch_status(&points)
        .context("status upload failed")?;

    let output = daily_output(&overview, &balance, &points);
    log::info!(
        "Uploading daily output: {} Wh generated",
        output.generated_wh
    );
    client.add_output(&output).context("output upload failed")?;
    Ok(())
}

fn select_plant<'a>(plants: &'a [Plant], oid: Option<&str>) -> Result<&'a Plant> {
    match oid {
        Some(oid) => plants
            .iter()
            .find(|p| p.oid == oid)
            .with_context(|| format!("no plant with id {oid} found")),
        None => match plants {
            [] => bail!("no plants found for this account"),
            [plant] => Ok(plant),
            _ => bail!(
                "account has {} plants; set pvoutput.plant_oid in the config to pick one",
                plants.len()
            ),
        },
    }
}

/// Integrates mean power over the day into cumulative energy. Readings
/// without a mean value are skipped.
fn status_points(overview: &DayOverview) -> Vec<StatusPoint> {
    let interval_hours = match overview.readings.as_slice() {
        [first, second, ..] => (second.timestamp - first.timestamp).num_seconds() as f64 / 3600.0,
        _ => DEFAULT_INTERVAL_HOURS,
    };

    let mut energy_wh = 0.0;
    let mut points = Vec::new();
    for reading in &overview.readings {
        let Some(mean) = reading.mean else { continue };
        energy_wh += mean * interval_hours;
        points.push(StatusPoint {
            timestamp: reading.timestamp,
            energy_wh: energy_wh.round() as u64,
            power_w: mean.round() as u64,
        });
    }
    points
}

/// Picks the day's generation total, preferring what the portal reports
/// over our own integration.
fn daily_output(
    overview: &DayOverview,
    balance: &DayEnergyBalance,
    points: &[StatusPoint],
) -> DailyOutput {
    let generated_wh = overview
        .difference_energy_wh
        .or(balance.pv_generation_wh)
        .map(|wh| wh.round() as u64)
        .or_else(|| points.last().map(|p| p.energy_wh))
        .unwrap_or(0);
    DailyOutput {
        date: overview.date,
        generated_wh,
        consumed_wh: balance.total_consumption_wh.map(|wh| wh.round() as u64),
    }
}
