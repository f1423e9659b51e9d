use std::fmt;

use serde::{Deserialize, Serialize};

use crate::query::QueryBuilder;
use crate::types::ColumnType;
use crate::value::{ValueWithToken, Values};

/// Closed set of statement kinds the generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    Insert,
    InsertJson,
    InsertIfNotExists,
    Update,
    DeleteRow,
    DeleteRange,
    SelectSinglePartition,
    SelectMultiPartition,
    SelectClusteringRange,
    SelectByIndex,
    SelectFromMaterializedView,
}

impl StatementType {
    /// Whether the oracle may legitimately lag the system under test for this
    /// statement; a read mismatch should then be retried before being
    /// reported. True only for index scans and materialized-view reads, whose
    /// server-side propagation is asynchronous.
    pub fn possible_async_operation(self) -> bool {
        matches!(
            self,
            Self::SelectByIndex | Self::SelectFromMaterializedView
        )
    }

    pub fn is_select(self) -> bool {
        matches!(
            self,
            Self::SelectSinglePartition
                | Self::SelectMultiPartition
                | Self::SelectClusteringRange
                | Self::SelectByIndex
                | Self::SelectFromMaterializedView
        )
    }
}

/// Callback executed exactly once after its statement has been dispatched,
/// whether the dispatch succeeded or not.
pub struct PostStmtHook(Box<dyn FnOnce() + Send>);

impl PostStmtHook {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for PostStmtHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PostStmtHook")
    }
}

/// A single-use generated statement: built, dispatched, compared, discarded.
///
/// Invariants, guaranteed by the generator:
/// - `types` and `values` agree: Σ `types[i].len_value()` == `values.len()`;
/// - `kind` agrees with the builder's shape;
/// - `values_with_token` is set iff the statement targets one specific
///   partition.
#[derive(Debug)]
pub struct Stmt {
    pub query: QueryBuilder,
    pub types: Vec<ColumnType>,
    pub kind: StatementType,
    pub values: Values,
    pub values_with_token: Option<ValueWithToken>,
    pub post_hook: Option<PostStmtHook>,
}

impl Stmt {
    pub fn new(
        query: QueryBuilder,
        types: Vec<ColumnType>,
        kind: StatementType,
        values: Values,
    ) -> Self {
        Self {
            query,
            types,
            kind,
            values,
            values_with_token: None,
            post_hook: None,
        }
    }

    pub fn with_token(mut self, token: ValueWithToken) -> Self {
        self.values_with_token = Some(token);
        self
    }

    pub fn with_post_hook(mut self, hook: PostStmtHook) -> Self {
        self.post_hook = Some(hook);
        self
    }

    /// Number of bound cells the declared types consume.
    pub fn declared_len(&self) -> usize {
        self.types.iter().map(ColumnType::len_value).sum()
    }

    pub fn take_hook(&mut self) -> Option<PostStmtHook> {
        self.post_hook.take()
    }

    /// Human-readable CQL with every `?` substituted by a printed literal.
    /// Logging only; terminates when either types or values run out.
    pub fn pretty_cql(&self) -> String {
        let mut query = self.query.to_cql();
        if self.values.is_empty() {
            return query;
        }
        let mut rest = self.values.as_slice();
        for typ in &self.types {
            let (rewritten, consumed) = typ.cql_pretty(&query, rest);
            query = rewritten;
            if rest.len() >= consumed {
                rest = &rest[consumed..];
            } else {
                break;
            }
        }
        query
    }
}
