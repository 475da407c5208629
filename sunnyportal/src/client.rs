use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{DayEnergyBalance, DayOverview, Plant, PowerReading};

const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const TOKEN_HEADER: &str = "X-SP-Token";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("portal error {code}: {message}")]
    Api { code: String, message: String },
    #[error("not logged in")]
    NotLoggedIn,
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Http(Box<ureq::Error>),
    #[error(transparent)]
    Tls(#[from] native_tls::Error),
    #[error(transparent)]
    Decode(#[from] std::io::Error),
}

/// Authenticated session against the portal's day-data services.
///
/// The portal reports powers in kW and energies in kWh; all values are
/// converted to W/Wh at this boundary.
pub struct Client {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self, PortalError> {
        let agent = ureq::AgentBuilder::new()
            .tls_connector(Arc::new(native_tls::TlsConnector::new()?))
            .timeout(API_REQUEST_TIMEOUT)
            .build();
        Ok(Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<(), PortalError> {
        #[derive(Deserialize)]
        struct TokenBody {
            token: String,
        }

        log::debug!("Authenticating {} against {}", email, self.base_url);
        let resp = self
            .agent
            .post(&format!("{}/session", self.base_url))
            .send_json(serde_json::json!({ "email": email, "password": password }))
            .map_err(|e| match e {
                ureq::Error::Status(401, _) => {
                    PortalError::Auth(format!("invalid credentials for {email}"))
                }
                other => into_portal_error(other),
            })?;

        let body: TokenBody = resp.into_json()?;
        self.token = Some(body.token);
        Ok(())
    }

    /// Ends the session. A no-op when not logged in.
    pub fn logout(&mut self) -> Result<(), PortalError> {
        let Some(token) = self.token.take() else {
            return Ok(());
        };
        self.agent
            .delete(&format!("{}/session", self.base_url))
            .set(TOKEN_HEADER, &token)
            .call()
            .map_err(into_portal_error)?;
        Ok(())
    }

    pub fn plants(&self) -> Result<Vec<Plant>, PortalError> {
        let resp = self.get(&format!("{}/plants", self.base_url))?;
        Ok(resp.into_json()?)
    }

    pub fn day_overview(
        &self,
        plant_oid: &str,
        date: NaiveDate,
    ) -> Result<DayOverview, PortalError> {
        let url = format!(
            "{}/plants/{}/day-overview?date={}",
            self.base_url, plant_oid, date
        );
        let dto: DayOverviewDto = self.get(&url)?.into_json()?;
        dto.into_overview(date)
    }

    pub fn day_energy_balance(
        &self,
        plant_oid: &str,
        date: NaiveDate,
    ) -> Result<DayEnergyBalance, PortalError> {
        let url = format!(
            "{}/plants/{}/energy-balance?date={}",
            self.base_url, plant_oid, date
        );
        let dto: EnergyBalanceDto = self.get(&url)?.into_json()?;
        Ok(DayEnergyBalance {
            date,
            pv_generation_wh: dto.pv_generation_kwh.map(kwh_to_wh),
            total_consumption_wh: dto.total_consumption_kwh.map(kwh_to_wh),
        })
    }

    fn get(&self, url: &str) -> Result<ureq::Response, PortalError> {
        let token = self.token.as_deref().ok_or(PortalError::NotLoggedIn)?;
        self.agent
            .get(url)
            .set(TOKEN_HEADER, token)
            .call()
            .map_err(into_portal_error)
    }
}

fn into_portal_error(err: ureq::Error) -> PortalError {
    match err {
        ureq::Error::Status(401, _) => PortalError::Auth("session rejected".into()),
        ureq::Error::Status(_, resp) => decode_api_error(resp),
        other => PortalError::Http(Box::new(other)),
    }
}

fn decode_api_error(resp: ureq::Response) -> PortalError {
    #[derive(Deserialize)]
    struct ErrorBody {
        code: String,
        message: String,
    }

    let status = resp.status();
    match resp.into_json::<ErrorBody>() {
        Ok(body) => PortalError::Api {
            code: body.code,
            message: body.message,
        },
        Err(_) => PortalError::Malformed(format!("unexpected error body for status {status}")),
    }
}

fn kw_to_w(kw: f64) -> f64 {
    kw * 1000.0
}

fn kwh_to_wh(kwh: f64) -> f64 {
    kwh * 1000.0
}

#[derive(Deserialize)]
struct DayOverviewDto {
    #[serde(default)]
    absolute_kwh: Option<f64>,
    #[serde(default)]
    difference_kwh: Option<f64>,
    #[serde(default)]
    readings: Vec<ReadingDto>,
}

#[derive(Deserialize)]
struct EnergyBalanceDto {
    #[serde(default)]
    pv_generation_kwh: Option<f64>,
    #[serde(default)]
    total_consumption_kwh: Option<f64>,
}

#[derive(Deserialize)]
struct ReadingDto {
    time: String,
    #[serde(default)]
    mean_kw: Option<f64>,
    #[serde(default)]
    min_kw: Option<f64>,
    #[serde(default)]
    max_kw: Option<f64>,
}

impl DayOverviewDto {
    fn into_overview(self, date: NaiveDate) -> Result<DayOverview, PortalError> {
        let mut readings = Vec::with_capacity(self.readings.len());
        for entry in self.readings {
            // Entries with no measured value at all carry no information.
            if entry.mean_kw.is_none() && entry.min_kw.is_none() && entry.max_kw.is_none() {
                continue;
            }
            let time = NaiveTime::parse_from_str(&entry.time, TIME_FORMAT)
                .map_err(|e| PortalError::Malformed(format!("bad time '{}': {e}", entry.time)))?;
            readings.push(PowerReading {
                timestamp: date.and_time(time),
                mean: entry.mean_kw.map(kw_to_w),
                min: entry.min_kw.map(kw_to_w),
                max: entry.max_kw.map(kw_to_w),
            });
        }
        Ok(DayOverview {
            date,
            absolute_energy_wh: self.absolute_kwh.map(kwh_to_wh),
            difference_energy_wh: self.difference_kwh.map(kwh_to_wh),
            readings,
        })
    }
}
