use std::time::Duration;

pub const LOG_LEVEL_ENV_VAR: &str = "LOGGING_LEVEL";
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

pub const DEFAULT_CONFIG_PATH: &str = "spt-config.json";

pub const PORTAL_BASE_URL_ENV_VAR: &str = "SUNNYPORTAL_BASE_URL";
pub const DEFAULT_PORTAL_BASE_URL: &str = "https://com.sunny-portal.de/api/v1";

pub const PVOUTPUT_BASE_URL_ENV_VAR: &str = "PVOUTPUT_BASE_URL";
pub const DEFAULT_PVOUTPUT_BASE_URL: &str = "https://pvoutput.org";

/// addbatchstatus accepts at most 30 entries per request.
pub const STATUS_BATCH_SIZE: usize = 30;
/// addbatchoutput accepts at most 100 entries per request.
pub const OUTPUT_BATCH_SIZE: usize = 100;
/// The service rate-limits consecutive batch requests without this pause.
pub const BATCH_PAUSE: Duration = Duration::from_secs(10);
/// First wait after a "Load in progress" rejection.
pub const LOAD_RETRY_INTERVAL: Duration = Duration::from_secs(10);
/// Give up retrying a transient rejection after this long.
pub const LOAD_RETRY_MAX_ELAPSED: Duration = Duration::from_secs(300);
