mod backoff_retry;
mod prompt;
mod sanitize;

pub use backoff_retry::backoff_retry;
pub use prompt::prompt;
pub use sanitize::sanitize_filename;
