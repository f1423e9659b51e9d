//! The partition workload coordinator.
//!
//! Splits the partition-key seed space into disjoint per-worker ranges,
//! launches one OS thread per range, and gathers a [`Status`] from each.
//! Workers are self-contained: own RNG, own range, own cursor; the only
//! shared state is the immutable schema and the internally synchronized
//! store.

pub mod runner;
pub mod status;

pub use runner::{run_mixed_job, split_partition_ranges, JobConfig};
pub use status::Status;
