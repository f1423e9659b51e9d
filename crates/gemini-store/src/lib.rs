//! The differential executor.
//!
//! A [`Store`] owns two cluster drivers, the system under test and the
//! oracle. Mutations are applied to both with a bounded retry loop; reads are
//! fetched from both and compared as row multisets. The store never decides
//! what to run: it consumes single-use statements and reports agreement,
//! divergence ([`StoreError::RowDifference`]) or the benign "neither side has
//! data" case ([`StoreError::ReadNoDataReturned`]).

pub mod cancel;
pub mod counter;
pub mod mem;
pub mod store;

pub use cancel::CancelToken;
pub use counter::OpsCounter;
pub use mem::MemCluster;
pub use store::{ClusterDriver, DriverError, Row, Store, StoreConfig, StoreError};
