mod upload;

pub use upload::run;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use backoff::ExponentialBackoff;
use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use thiserror::Error;

use crate::constants::{
    BATCH_PAUSE, LOAD_RETRY_INTERVAL, LOAD_RETRY_MAX_ELAPSED, OUTPUT_BATCH_SIZE, STATUS_BATCH_SIZE,
};
use crate::helpers::backoff_retry;

const APIKEY_HEADER: &str = "X-Pvoutput-Apikey";
const SYSTEM_ID_HEADER: &str = "X-Pvoutput-SystemId";
const ADD_STATUS_PATH: &str = "/service/r2/addstatus.jsp";
const ADD_BATCH_STATUS_PATH: &str = "/service/r2/addbatchstatus.jsp";
const ADD_OUTPUT_PATH: &str = "/service/r2/addoutput.jsp";
const ADD_BATCH_OUTPUT_PATH: &str = "/service/r2/addbatchoutput.jsp";

/// Marker in a 400 body for a rejection that resolves on its own.
const LOAD_IN_PROGRESS: &str = "Load in progress";

const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const DATE_FORMAT: &str = "%Y%m%d";
const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Error)]
pub enum PvOutputError {
    #[error("service rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error(transparent)]
    Http(Box<ureq::Error>),
    #[error(transparent)]
    Tls(#[from] native_tls::Error),
}

impl PvOutputError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            PvOutputError::Rejected { status: 400, body } if body.contains(LOAD_IN_PROGRESS)
        )
    }
}

/// One five-minute style interval: cumulative energy so far that day plus
/// the interval's mean power.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusPoint {
    pub timestamp: NaiveDateTime,
    pub energy_wh: u64,
    pub power_w: u64,
}

/// End-of-day totals for one date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailyOutput {
    pub date: NaiveDate,
    pub generated_wh: u64,
    pub consumed_wh: Option<u64>,
}

pub struct PvOutputClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    system_id: String,
    batch_pause: Duration,
    retry: ExponentialBackoff,
}

impl PvOutputClient {
    pub fn new(base_url: &str, api_key: &str, system_id: &str) -> Result<Self, PvOutputError> {
        let agent = ureq::AgentBuilder::new()
            .tls_connector(Arc::new(native_tls::TlsConnector::new()?))
            .timeout(API_REQUEST_TIMEOUT)
            .build();
        let retry = ExponentialBackoff {
            initial_interval: LOAD_RETRY_INTERVAL,
            max_elapsed_time: Some(LOAD_RETRY_MAX_ELAPSED),
            ..Default::default()
        };
        Ok(Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            system_id: system_id.to_string(),
            batch_pause: BATCH_PAUSE,
            retry,
        })
    }

    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    pub fn with_retry_policy(mut self, retry: ExponentialBackoff) -> Self {
        self.retry = retry;
        self
    }

    /// Uploads a single interval status.
    pub fn add_status(&self, point: &StatusPoint) -> Result<(), PvOutputError> {
        let date = point.timestamp.format(DATE_FORMAT).to_string();
        let time = point.timestamp.format(TIME_FORMAT).to_string();
        let energy = point.energy_wh.to_string();
        let power = point.power_w.to_string();
        self.post_with_retry(
            ADD_STATUS_PATH,
            &[
                ("d", date.as_str()),
                ("t", time.as_str()),
                ("v1", energy.as_str()),
                ("v2", power.as_str()),
            ],
        )
    }

    /// Uploads interval statuses in batches of up to 30.
    pub fn add_batch_status(&self, points: &[StatusPoint]) -> Result<(), PvOutputError> {
        self.send_batches(ADD_BATCH_STATUS_PATH, points, STATUS_BATCH_SIZE, encode_status)
    }

    /// Uploads daily outputs in batches of up to 100.
    pub fn add_batch_output(&self, outputs: &[DailyOutput]) -> Result<(), PvOutputError> {
        self.send_batches(ADD_BATCH_OUTPUT_PATH, outputs, OUTPUT_BATCH_SIZE, encode_output)
    }

    /// Uploads the end-of-day totals for a single date.
    pub fn add_output(&self, output: &DailyOutput) -> Result<(), PvOutputError> {
        let date = output.date.format(DATE_FORMAT).to_string();
        let generated = output.generated_wh.to_string();
        let mut form = vec![("d", date.as_str()), ("g", generated.as_str())];
        let consumed = output.consumed_wh.map(|c| c.to_string());
        if let Some(consumed) = &consumed {
            form.push(("c", consumed.as_str()));
        }
        self.post_with_retry(ADD_OUTPUT_PATH, &form)
    }

    /// Sends entries in chunks. A chunk that keeps getting rejected is
    /// degraded to per-entry sends once, so one bad entry cannot sink the
    /// rest of its chunk.
    fn send_batches<T>(
        &self,
        path: &str,
        entries: &[T],
        batch_size: usize,
        encode: fn(&T) -> String,
    ) -> Result<(), PvOutputError> {
        let mut first = true;
        for chunk in entries.chunks(batch_size) {
            if !first {
                thread::sleep(self.batch_pause);
            }
            first = false;

            let data = chunk.iter().map(encode).join(";");
            match self.post_with_retry(path, &[("data", &data)]) {
                Ok(()) => {}
                Err(err) if chunk.len() > 1 => {
                    log::warn!(
                        "Batch of {} entries rejected ({err}); retrying them one by one",
                        chunk.len()
                    );
                    for entry in chunk {
                        thread::sleep(self.batch_pause);
                        let data = encode(entry);
                        self.post_with_retry(path, &[("data", &data)])?;
                    }
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Posts a form, retrying while the service reports "Load in progress".
    fn post_with_retry(&self, path: &str, form: &[(&str, &str)]) -> Result<(), PvOutputError> {
        let op = || {
            self.post(path, form).map_err(|err| {
                if err.is_transient() {
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })
        };
        match backoff_retry(self.retry.clone(), op) {
            Ok(()) => Ok(()),
            Err(backoff::Error::Permanent(err)) => Err(err),
            Err(backoff::Error::Transient { err, .. }) => Err(err),
        }
    }

    fn post(&self, path: &str, form: &[(&str, &str)]) -> Result<(), PvOutputError> {
        let url = format!("{}{path}", self.base_url);
        let result = self
            .agent
            .post(&url)
            .set(APIKEY_HEADER, &self.api_key)
            .set(SYSTEM_ID_HEADER, &self.system_id)
            .send_form(form);
        match result {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(PvOutputError::Rejected { status, body })
            }
            Err(other) => Err(PvOutputError::Http(Box::new(other))),
        }
    }
}

fn encode_status(point: &StatusPoint) -> String {
    format!(
        "{},{},{},{}",
        point.timestamp.format(DATE_FORMAT),
        point.timestamp.format(TIME_FORMAT),
        point.energy_wh,
        point.power_w
    )
}

fn encode_output(output: &DailyOutput) -> String {
    let mut encoded = format!("{},{}", output.date.format(DATE_FORMAT), output.generated_wh);
    if let Some(consumed) = output.consumed_wh {
        encoded.push(',');
        encoded.push_str(&consumed.to_string());
    }
    encoded
}
