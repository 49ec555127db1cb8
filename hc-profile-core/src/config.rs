use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ProfileError;

/// Directory under the system temp dir where artifacts are written by default.
pub const DEFAULT_OUTPUT_SUBDIR: &str = "home-connect-profiles";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Upper bound for each HTTP request, body included.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// How long to wait for the login redirect.
    #[serde(default = "default_login_timeout_secs")]
    pub login_timeout_secs: u64,
    /// Appliance archives fetched in parallel. 1 keeps the pipeline strictly sequential.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

pub fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_OUTPUT_SUBDIR)
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_login_timeout_secs() -> u64 {
    600
}

fn default_max_concurrent_fetches() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            http_timeout_secs: default_http_timeout_secs(),
            login_timeout_secs: default_login_timeout_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.max_concurrent_fetches == 0 {
            return Err(ProfileError::Configuration(
                "max_concurrent_fetches must be at least 1".to_string(),
            ));
        }
        if self.http_timeout_secs == 0 || self.login_timeout_secs == 0 {
            return Err(ProfileError::Configuration(
                "timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn trace_loaded(&self) {
        info!(
            output_dir = %self.output_dir.display(),
            http_timeout_secs = self.http_timeout_secs,
            max_concurrent_fetches = self.max_concurrent_fetches,
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}
