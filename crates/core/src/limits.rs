//! Default sizing constants

use std::time::Duration;

/// Rows applied per store transaction unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// How long a status record stays readable after its last write (24 hours).
pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest status time-to-live a configuration may ask for (one year).
pub const MAX_STATUS_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);
