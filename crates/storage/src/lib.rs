//! Storage layer for bulkops
//!
//! This crate implements the two stores the engine consumes:
//! - MemoryStore: transactional association store (parking_lot RwLock over
//!   ordered sets), with commit latency and commit fault injection
//! - MemoryStatusStore: DashMap-backed key/value store with per-key TTL
//! - TtlIndex: expiry instant → keys, for O(expired) cleanup
//! - ExpirySweeper: background thread purging expired status records
//! - seed: the demo dataset (companies and three collections)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cleaner;
pub mod memory;
pub mod seed;
pub mod status;
pub mod ttl;

pub use cleaner::ExpirySweeper;
pub use memory::{MemoryStore, MemoryTransaction};
pub use seed::{SeedPlan, SeededCollections};
pub use status::MemoryStatusStore;
pub use ttl::TtlIndex;
