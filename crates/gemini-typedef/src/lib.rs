//! Typed schema model for a CQL-family wide-column database.
//!
//! This crate is the leaf of the workspace: it knows nothing about clusters,
//! workers, or random generation policy. It defines the value and type
//! algebra (`CqlValue`, `ColumnType`), the schema model (`Schema`, `Table`,
//! `MaterializedView`, `IndexDef`), structured query builders that render
//! prepared-statement CQL, and the single-use `Stmt` the differential
//! executor consumes.

pub mod columns;
pub mod config;
pub mod query;
pub mod schema;
pub mod stmt;
pub mod types;
pub mod value;

pub use columns::{ColumnDef, Columns, IndexDef, MaterializedView};
pub use config::{PartitionRange, PartitionRangeConfig, SchemaConfig};
pub use query::{
    AssignOp, Assignment, DeleteBuilder, InsertBuilder, OpType, QueryBuilder, RelOp, Relation,
    SelectBuilder, UpdateBuilder,
};
pub use schema::{Keyspace, Replication, Schema, SchemaError, Table};
pub use stmt::{PostStmtHook, StatementType, Stmt};
pub use types::{
    BagKind, BagType, ColumnType, MapType, SimpleType, TupleType, UdtType, ALL_SIMPLE_TYPES,
    MAX_BAG_SIZE,
};
pub use value::{CqlDecimal, CqlDuration, CqlValue, ValueWithToken, Values};
