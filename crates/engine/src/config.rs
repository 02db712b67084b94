//! Service configuration via `bulkops.toml`
//!
//! On first use a default `bulkops.toml` is created in the given directory.
//! To change settings, edit the file and restart.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use bulkops_core::{Error, Result, DEFAULT_BATCH_SIZE, DEFAULT_STATUS_TTL, MAX_STATUS_TTL};

/// Config file name placed in the service's config directory.
pub const CONFIG_FILE_NAME: &str = "bulkops.toml";

/// Service configuration loaded from `bulkops.toml`.
///
/// # Example
///
/// ```toml
/// batch_size = 1000
/// status_ttl_secs = 86400
/// workers = 4
/// max_pending_operations = 1024
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOpsConfig {
    /// Rows applied per store transaction.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Seconds a status record stays readable after its last update.
    #[serde(default = "default_status_ttl_secs")]
    pub status_ttl_secs: u64,
    /// Background worker threads running operations.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Accepted operations allowed to wait for a worker.
    #[serde(default = "default_max_pending")]
    pub max_pending_operations: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_status_ttl_secs() -> u64 {
    DEFAULT_STATUS_TTL.as_secs()
}

fn default_workers() -> usize {
    4
}

fn default_max_pending() -> usize {
    1024
}

impl Default for BulkOpsConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            status_ttl_secs: default_status_ttl_secs(),
            workers: default_workers(),
            max_pending_operations: default_max_pending(),
        }
    }
}

impl BulkOpsConfig {
    /// Status record time-to-live
    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }

    /// Reject zero sizes and a status TTL longer than a year
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("batch_size", self.batch_size as u64),
            ("status_ttl_secs", self.status_ttl_secs),
            ("workers", self.workers as u64),
            ("max_pending_operations", self.max_pending_operations as u64),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(Error::invalid_config(format!("{} must be greater than 0", field)));
            }
        }
        if self.status_ttl_secs > MAX_STATUS_TTL.as_secs() {
            return Err(Error::invalid_config(format!(
                "status_ttl_secs must be at most {}",
                MAX_STATUS_TTL.as_secs()
            )));
        }
        Ok(())
    }

    /// Parse and validate TOML text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the text does not parse or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BulkOpsConfig = toml::from_str(content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `bulkops.toml` from `dir`, writing the default file first if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written, read or parsed.
    pub fn load_or_create(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        Self::write_default_if_missing(&path)?;
        Self::from_file(&path)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::invalid_config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# bulkops configuration
#
# Rows deleted or inserted per store transaction. Smaller batches hold
# row locks for less time; larger batches finish sooner.
batch_size = 1000

# Seconds an operation's status stays readable after its last update.
# At most one year (31536000).
status_ttl_secs = 86400

# Background worker threads. Each accepted operation occupies one worker
# until it completes or fails.
workers = 4

# Accepted operations allowed to wait for a free worker. Submissions beyond
# this are refused.
max_pending_operations = 1024
"#
    }
}
