//! Expired status record cleanup
//!
//! `ExpirySweeper` runs in a background thread and periodically purges
//! expired records from a [`MemoryStatusStore`]. Reads already hide expired
//! records; the sweeper only reclaims memory.
//!
//! # Design Notes
//!
//! - Sleeps in short slices so shutdown is noticed quickly
//! - Graceful shutdown via atomic flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::status::MemoryStatusStore;

/// Shortest pause between sweeps
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1);

/// Background expiry task for a [`MemoryStatusStore`]
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(MemoryStatusStore::new());
/// let sweeper = ExpirySweeper::new(Arc::clone(&store), Duration::from_secs(60));
/// let handle = sweeper.start();
///
/// // ... serve requests ...
///
/// sweeper.shutdown();
/// handle.join().unwrap();
/// ```
pub struct ExpirySweeper {
    store: Arc<MemoryStatusStore>,
    check_interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl ExpirySweeper {
    /// Create a sweeper checking every `check_interval`
    ///
    /// Intervals shorter than [`MIN_CHECK_INTERVAL`] are raised to it.
    pub fn new(store: Arc<MemoryStatusStore>, check_interval: Duration) -> Self {
        Self {
            store,
            check_interval: check_interval.max(MIN_CHECK_INTERVAL),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background thread
    ///
    /// The thread runs until `shutdown()` is called.
    pub fn start(&self) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let shutdown = Arc::clone(&self.shutdown);
        let check_interval = self.check_interval;

        thread::Builder::new()
            .name("bulkops-expiry".to_string())
            .spawn(move || {
                while !shutdown.load(Ordering::Relaxed) {
                    // Sleep first (don't purge immediately on start)
                    let slice = Duration::from_millis(100).min(check_interval);
                    let mut elapsed = Duration::ZERO;
                    while elapsed < check_interval {
                        if shutdown.load(Ordering::Relaxed) {
                            return;
                        }
                        thread::sleep(slice);
                        elapsed += slice;
                    }

                    let removed = store.purge_expired(Instant::now());
                    if removed > 0 {
                        debug!(target: "bulkops::storage", removed, "Expiry sweep");
                    }
                }
            })
            .expect("failed to spawn expiry sweeper thread")
    }

    /// Signal shutdown; the thread exits on its next check
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Pause between sweeps
    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Check if shutdown has been signaled
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}
