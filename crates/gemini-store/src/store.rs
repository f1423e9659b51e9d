use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, error, warn};

use gemini_typedef::{QueryBuilder, Schema, Stmt, Values};

use crate::cancel::CancelToken;
use crate::counter::OpsCounter;

/// One result row, keyed by column name. Cells are carried in their JSON
/// mirror form so rows from either cluster compare bit-for-bit.
pub type Row = BTreeMap<String, serde_json::Value>;

/// Transport-level failure from one cluster.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("request timed out")]
    Timeout,

    #[error("host unavailable: {0}")]
    Unavailable(String),

    #[error("unknown table {0}")]
    UnknownTable(String),

    #[error("{0}")]
    Internal(String),
}

impl DriverError {
    /// Cancellation and deadline expiry are the caller's doing; they are
    /// swallowed at the mutation site rather than reported as failures.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

/// Failure surfaced by the differential store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The two clusters returned different rows. Surfaced, counted, never
    /// fatal.
    #[error("row difference between {sut} and {oracle} for '{query}': {detail}")]
    RowDifference {
        sut: String,
        oracle: String,
        query: String,
        detail: String,
    },

    /// Both clusters returned an empty result set. Not a failure: the key
    /// may simply have no data yet.
    #[error("no data returned by either cluster")]
    ReadNoDataReturned,

    #[error("mutation failed after {attempts} attempts: {source}")]
    MutationRetriesExceeded {
        attempts: usize,
        #[source]
        source: DriverError,
    },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl StoreError {
    pub fn is_empty_read(&self) -> bool {
        matches!(self, Self::ReadNoDataReturned)
    }
}

/// One cluster endpoint: the system under test or the oracle.
///
/// Implementations serialize their own concurrent access; the store calls
/// them from every worker thread. A networked implementation renders
/// `Schema::get_create_schema()` / `get_drop_schema()` for the DDL entry
/// points and prepares `QueryBuilder::to_cql()` for data statements.
pub trait ClusterDriver: Send + Sync {
    fn name(&self) -> &str;

    fn apply_schema(&self, schema: &Schema) -> Result<(), DriverError>;

    fn drop_schema(&self, schema: &Schema) -> Result<(), DriverError>;

    /// Apply a mutation. `timestamp_micros` is the client-side write
    /// timestamp; `None` delegates timestamping to the server.
    fn execute(
        &self,
        query: &QueryBuilder,
        values: &Values,
        timestamp_micros: Option<i64>,
    ) -> Result<(), DriverError>;

    /// Run a read and return its rows.
    fn fetch(&self, query: &QueryBuilder, values: &Values) -> Result<Vec<Row>, DriverError>;
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub max_retries_mutate: usize,
    pub retry_sleep: Duration,
    pub use_server_side_timestamps: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_retries_mutate: 2,
            retry_sleep: Duration::from_millis(10),
            use_server_side_timestamps: false,
        }
    }
}

/// The differential store: one SUT driver, one oracle driver, a retry policy
/// and an operation counter.
pub struct Store<S, O> {
    sut: S,
    oracle: O,
    config: StoreConfig,
    ops: OpsCounter,
}

impl<S: ClusterDriver, O: ClusterDriver> Store<S, O> {
    pub fn new(sut: S, oracle: O, config: StoreConfig) -> Self {
        Self {
            sut,
            oracle,
            config,
            ops: OpsCounter::new(),
        }
    }

    pub fn ops(&self) -> &OpsCounter {
        &self.ops
    }

    pub fn apply_schema(&self, schema: &Schema) -> Result<(), StoreError> {
        self.sut.apply_schema(schema)?;
        self.oracle.apply_schema(schema)?;
        Ok(())
    }

    pub fn drop_schema(&self, schema: &Schema) -> Result<(), StoreError> {
        self.sut.drop_schema(schema)?;
        self.oracle.drop_schema(schema)?;
        Ok(())
    }

    /// Apply a mutation to both clusters.
    ///
    /// Bounded retry loop: every attempt uses a fresh client-side timestamp
    /// (retrying a list modification with the same timestamp duplicates
    /// elements), sleeps between attempts, and honors cancellation at each
    /// sleep boundary. Benign errors are swallowed inside the attempt.
    pub fn mutate(&self, cancel: &CancelToken, stmt: &Stmt) -> Result<(), StoreError> {
        let mut last_err = DriverError::Internal("mutation never attempted".to_owned());
        let attempts = self.config.max_retries_mutate.max(1);
        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Err(StoreError::Driver(DriverError::Cancelled));
            }
            let ts = self.fresh_timestamp();
            match self.mutate_once(stmt, ts) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    debug!(
                        attempt,
                        query = %stmt.query.to_cql(),
                        error = %err,
                        "mutation attempt failed"
                    );
                    last_err = err;
                }
            }
            if attempt < attempts {
                if cancel.is_cancelled() {
                    return Err(StoreError::Driver(DriverError::Cancelled));
                }
                std::thread::sleep(self.config.retry_sleep);
            }
        }
        error!(
            attempts,
            query = %stmt.query.to_cql(),
            error = %last_err,
            "failed to apply mutation"
        );
        Err(StoreError::MutationRetriesExceeded {
            attempts,
            source: last_err,
        })
    }

    fn mutate_once(&self, stmt: &Stmt, ts: Option<i64>) -> Result<(), DriverError> {
        for (driver, name) in [
            (&self.sut as &dyn ClusterDriver, self.sut.name()),
            (&self.oracle as &dyn ClusterDriver, self.oracle.name()),
        ] {
            match driver.execute(&stmt.query, &stmt.values, ts) {
                Ok(()) => self.ops.inc(name, stmt.query.op_type()),
                Err(err) if err.is_benign() => {
                    debug!(system = name, error = %err, "benign mutation error suppressed");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Fetch from both clusters and compare; returns the SUT rows on
    /// agreement.
    pub fn load(&self, cancel: &CancelToken, stmt: &Stmt) -> Result<Vec<Row>, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Driver(DriverError::Cancelled));
        }
        let sut_rows = self.sut.fetch(&stmt.query, &stmt.values)?;
        self.ops.inc(self.sut.name(), stmt.query.op_type());
        let oracle_rows = self.oracle.fetch(&stmt.query, &stmt.values)?;
        self.ops.inc(self.oracle.name(), stmt.query.op_type());

        if let Some(detail) = diff_rows(&sut_rows, &oracle_rows) {
            warn!(
                sut = self.sut.name(),
                oracle = self.oracle.name(),
                query = %stmt.pretty_cql(),
                %detail,
                "row difference"
            );
            return Err(StoreError::RowDifference {
                sut: self.sut.name().to_owned(),
                oracle: self.oracle.name().to_owned(),
                query: stmt.query.to_cql(),
                detail,
            });
        }
        Ok(sut_rows)
    }

    /// A read that only cares whether the clusters agree. Returns the row
    /// count, or [`StoreError::ReadNoDataReturned`] when both sides are
    /// empty.
    pub fn check(&self, cancel: &CancelToken, stmt: &Stmt) -> Result<usize, StoreError> {
        let rows = self.load(cancel, stmt)?;
        if rows.is_empty() {
            return Err(StoreError::ReadNoDataReturned);
        }
        Ok(rows.len())
    }

    fn fresh_timestamp(&self) -> Option<i64> {
        if self.config.use_server_side_timestamps {
            return None;
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Some(now.as_micros() as i64)
    }
}

/// Compare two result sets as multisets; row order is not significant.
/// Returns a human-readable description of the first difference.
fn diff_rows(sut: &[Row], oracle: &[Row]) -> Option<String> {
    if sut.len() != oracle.len() {
        return Some(format!(
            "row count mismatch: {} vs {}",
            sut.len(),
            oracle.len()
        ));
    }
    let canonical = |rows: &[Row]| -> Vec<String> {
        let mut keys: Vec<String> = rows
            .iter()
            .map(|row| serde_json::to_string(row).unwrap_or_default())
            .collect();
        keys.sort_unstable();
        keys
    };
    let a = canonical(sut);
    let b = canonical(oracle);
    for (left, right) in a.iter().zip(&b) {
        if left != right {
            return Some(format!("row mismatch: {left} vs {right}"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use parking_lot::Mutex;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use gemini_generators::{gen_insert_stmt, gen_schema, gen_single_partition_query};
    use gemini_typedef::{PartitionRange, PartitionRangeConfig, SchemaConfig};

    use crate::mem::MemCluster;

    /// A cluster that fails the next N executes before delegating to an
    /// in-memory cluster.
    struct FlakyCluster {
        inner: MemCluster,
        planned: Mutex<VecDeque<DriverError>>,
        executes: Mutex<usize>,
    }

    impl FlakyCluster {
        fn new(name: &str, failures: Vec<DriverError>) -> Self {
            Self {
                inner: MemCluster::new(name),
                planned: Mutex::new(failures.into()),
                executes: Mutex::new(0),
            }
        }

        fn execute_count(&self) -> usize {
            *self.executes.lock()
        }
    }

    impl ClusterDriver for FlakyCluster {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn apply_schema(&self, schema: &Schema) -> Result<(), DriverError> {
            self.inner.apply_schema(schema)
        }

        fn drop_schema(&self, schema: &Schema) -> Result<(), DriverError> {
            self.inner.drop_schema(schema)
        }

        fn execute(
            &self,
            query: &QueryBuilder,
            values: &Values,
            ts: Option<i64>,
        ) -> Result<(), DriverError> {
            *self.executes.lock() += 1;
            if let Some(err) = self.planned.lock().pop_front() {
                return Err(err);
            }
            self.inner.execute(query, values, ts)
        }

        fn fetch(&self, query: &QueryBuilder, values: &Values) -> Result<Vec<Row>, DriverError> {
            self.inner.fetch(query, values)
        }
    }

    fn fixture() -> (Schema, PartitionRangeConfig, PartitionRange) {
        let sc = SchemaConfig {
            counter_table_chance: 0.0,
            min_clustering_keys: 1,
            ..SchemaConfig::default()
        };
        let schema = gen_schema(&sc, &mut StdRng::seed_from_u64(21)).expect("schema");
        (
            schema,
            PartitionRangeConfig::default(),
            PartitionRange { min: 0, max: 10 },
        )
    }

    #[test]
    fn transient_failure_then_success_is_success() {
        let (schema, cfg, range) = fixture();
        let store = Store::new(
            FlakyCluster::new("test", vec![DriverError::Timeout]),
            MemCluster::new("oracle"),
            StoreConfig {
                max_retries_mutate: 3,
                retry_sleep: Duration::from_millis(1),
                ..StoreConfig::default()
            },
        );
        store.apply_schema(&schema).expect("schema applies");

        let mut rng = StdRng::seed_from_u64(1);
        let stmt = gen_insert_stmt(&schema, &schema.tables[0], &range, &mut rng, &cfg);
        store
            .mutate(&CancelToken::new(), &stmt)
            .expect("one transient failure is retried away");
    }

    #[test]
    fn exhausted_retries_report_attempts_and_cause() {
        let (schema, cfg, range) = fixture();
        let sut = FlakyCluster::new(
            "test",
            vec![DriverError::Timeout, DriverError::Timeout, DriverError::Timeout],
        );
        let store = Store::new(
            sut,
            MemCluster::new("oracle"),
            StoreConfig {
                max_retries_mutate: 3,
                retry_sleep: Duration::from_millis(1),
                ..StoreConfig::default()
            },
        );
        store.apply_schema(&schema).expect("schema applies");

        let mut rng = StdRng::seed_from_u64(1);
        let stmt = gen_insert_stmt(&schema, &schema.tables[0], &range, &mut rng, &cfg);
        let err = store
            .mutate(&CancelToken::new(), &stmt)
            .expect_err("all attempts fail");
        match err {
            StoreError::MutationRetriesExceeded { attempts, source } => {
                assert_eq!(attempts, 3);
                assert_eq!(source, DriverError::Timeout);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn benign_errors_are_swallowed_at_the_mutation_site() {
        let (schema, cfg, range) = fixture();
        let store = Store::new(
            FlakyCluster::new("test", vec![DriverError::DeadlineExceeded]),
            MemCluster::new("oracle"),
            StoreConfig::default(),
        );
        store.apply_schema(&schema).expect("schema applies");

        let mut rng = StdRng::seed_from_u64(2);
        let stmt = gen_insert_stmt(&schema, &schema.tables[0], &range, &mut rng, &cfg);
        store
            .mutate(&CancelToken::new(), &stmt)
            .expect("deadline expiry is not a mutation failure");
    }

    #[test]
    fn cancelled_token_short_circuits_mutation() {
        let (schema, cfg, range) = fixture();
        let sut = FlakyCluster::new("test", Vec::new());
        let store = Store::new(sut, MemCluster::new("oracle"), StoreConfig::default());
        store.apply_schema(&schema).expect("schema applies");

        let cancel = CancelToken::new();
        cancel.cancel();
        let mut rng = StdRng::seed_from_u64(3);
        let stmt = gen_insert_stmt(&schema, &schema.tables[0], &range, &mut rng, &cfg);
        let err = store.mutate(&cancel, &stmt).expect_err("cancelled");
        assert!(matches!(
            err,
            StoreError::Driver(DriverError::Cancelled)
        ));
    }

    #[test]
    fn agreeing_clusters_check_clean_and_empty_reads_are_distinct() {
        let (schema, cfg, range) = fixture();
        let store = Store::new(
            MemCluster::new("test"),
            MemCluster::new("oracle"),
            StoreConfig::default(),
        );
        store.apply_schema(&schema).expect("schema applies");
        let cancel = CancelToken::new();
        let table = &schema.tables[0];

        // Nothing written yet: both sides agree on empty.
        let mut rng = StdRng::seed_from_u64(4);
        let probe = gen_single_partition_query(&schema, table, &range, &mut rng, &cfg);
        let err = store.check(&cancel, &probe).expect_err("no data yet");
        assert!(err.is_empty_read());

        // Write, then read the same partition back via the shared seed space.
        let mut rng = StdRng::seed_from_u64(4);
        let insert = gen_insert_stmt(&schema, table, &range, &mut rng, &cfg);
        store.mutate(&cancel, &insert).expect("insert applies");
        let mut rng = StdRng::seed_from_u64(4);
        let read = gen_single_partition_query(&schema, table, &range, &mut rng, &cfg);
        let rows = store.check(&cancel, &read).expect("row is visible");
        assert_eq!(rows, 1);
    }

    #[test]
    fn diverging_clusters_surface_a_row_difference() {
        let (schema, cfg, range) = fixture();
        let sut = MemCluster::new("test");
        let oracle = MemCluster::new("oracle");
        let store = Store::new(sut, oracle, StoreConfig::default());
        store.apply_schema(&schema).expect("schema applies");
        let cancel = CancelToken::new();
        let table = &schema.tables[0];

        let mut rng = StdRng::seed_from_u64(5);
        let insert = gen_insert_stmt(&schema, table, &range, &mut rng, &cfg);
        // Apply to the SUT only, bypassing the store, to fabricate a
        // divergence.
        store
            .sut
            .execute(&insert.query, &insert.values, Some(1))
            .expect("direct insert");

        let mut rng = StdRng::seed_from_u64(5);
        let read = gen_single_partition_query(&schema, table, &range, &mut rng, &cfg);
        let err = store.check(&cancel, &read).expect_err("clusters diverge");
        assert!(matches!(err, StoreError::RowDifference { .. }), "{err:?}");
    }

    #[test]
    fn mutation_counts_both_systems() {
        let (schema, cfg, range) = fixture();
        let store = Store::new(
            MemCluster::new("test"),
            MemCluster::new("oracle"),
            StoreConfig::default(),
        );
        store.apply_schema(&schema).expect("schema applies");

        let mut rng = StdRng::seed_from_u64(6);
        let stmt = gen_insert_stmt(&schema, &schema.tables[0], &range, &mut rng, &cfg);
        store.mutate(&CancelToken::new(), &stmt).expect("insert");
        assert_eq!(store.ops().get("test", gemini_typedef::OpType::Insert), 1);
        assert_eq!(store.ops().get("oracle", gemini_typedef::OpType::Insert), 1);
    }

    #[test]
    fn flaky_retry_reissues_the_whole_mutation() {
        let (schema, cfg, range) = fixture();
        let sut = FlakyCluster::new("test", vec![DriverError::Unavailable("node down".into())]);
        let store = Store::new(sut, MemCluster::new("oracle"), StoreConfig {
            max_retries_mutate: 2,
            retry_sleep: Duration::from_millis(1),
            ..StoreConfig::default()
        });
        store.apply_schema(&schema).expect("schema applies");

        let mut rng = StdRng::seed_from_u64(7);
        let stmt = gen_insert_stmt(&schema, &schema.tables[0], &range, &mut rng, &cfg);
        store.mutate(&CancelToken::new(), &stmt).expect("second attempt lands");
        assert_eq!(store.sut.execute_count(), 2);
    }
}
