use std::path::PathBuf;
use std::time::Duration;

use crate::fetcher::RetryPolicy;

pub const DEFAULT_COOKIE_FILE: &str = "private/www.linkedin.com_cookies.json";
pub const DEFAULT_OUTPUT_DIR: &str = "fetched_pages";
pub const DEFAULT_URL: &str = "https://www.linkedin.com/jobs/collections/recommended/";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Max retries must be at least 1")]
    ZeroRetries,
    #[error("Default URL must not be empty")]
    EmptyDefaultUrl,
}

/// Everything a fetch run needs besides the URL itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cookie_file: PathBuf,
    pub output_dir: PathBuf,
    pub default_url: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cookie_file: PathBuf::from(DEFAULT_COOKIE_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            default_url: DEFAULT_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        }
    }
}

impl Settings {
    pub fn validate(self) -> Result<Self, SettingsError> {
        if self.max_retries == 0 {
            return Err(SettingsError::ZeroRetries);
        }
        if self.default_url.trim().is_empty() {
            return Err(SettingsError::EmptyDefaultUrl);
        }
        Ok(self)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: self.retry_delay,
        }
    }
}
