use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::columns::{ColumnDef, Columns, IndexDef, MaterializedView};
use crate::types::UdtType;

/// Schema-level configuration or invariant failure, detected at build time.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema config: {0}")]
    InvalidConfig(&'static str),

    #[error("table {table}: duplicate column name {column}")]
    DuplicateColumn { table: String, column: String },

    #[error("table {table}: needs at least one partition key")]
    MissingPartitionKey { table: String },

    #[error("table {table}: index {index} targets non-indexable column {column}")]
    UnindexableColumn {
        table: String,
        index: String,
        column: String,
    },

    #[error("table {table}: index {index} targets unknown column {column}")]
    UnknownIndexColumn {
        table: String,
        index: String,
        column: String,
    },

    #[error("table {table}: view {view} references column {column} outside the base table")]
    InvalidViewColumn {
        table: String,
        view: String,
        column: String,
    },

    #[error("table {table}: view {view} primary key is not a permutation of the base key")]
    InvalidViewKey { table: String, view: String },

    #[error("table {table}: mixes counter and non-counter data columns")]
    MixedCounterColumns { table: String },

    #[error("table {table}: counter column {column} cannot be part of the primary key")]
    CounterInPrimaryKey { table: String, column: String },

    #[error("duplicate table name {0}")]
    DuplicateTable(String),
}

/// Keyspace replication descriptor, rendered into the CREATE KEYSPACE map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum Replication {
    #[serde(rename = "SimpleStrategy")]
    Simple { replication_factor: u32 },
    #[serde(rename = "NetworkTopologyStrategy")]
    NetworkTopology { datacenters: BTreeMap<String, u32> },
}

impl Replication {
    pub fn simple(replication_factor: u32) -> Self {
        Self::Simple { replication_factor }
    }

    pub fn to_cql(&self) -> String {
        match self {
            Self::Simple { replication_factor } => format!(
                "{{'class': 'SimpleStrategy', 'replication_factor': {replication_factor}}}"
            ),
            Self::NetworkTopology { datacenters } => {
                let mut out = String::from("{'class': 'NetworkTopologyStrategy'");
                for (dc, rf) in datacenters {
                    out.push_str(&format!(", '{dc}': {rf}"));
                }
                out.push('}');
                out
            }
        }
    }
}

impl Default for Replication {
    fn default() -> Self {
        Self::simple(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyspace {
    pub name: String,
    #[serde(default)]
    pub replication: Replication,
    #[serde(default)]
    pub oracle_replication: Replication,
}

impl Keyspace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replication: Replication::default(),
            oracle_replication: Replication::default(),
        }
    }

    /// CREATE KEYSPACE statement. The oracle runs with its own replication
    /// descriptor; the store picks the side when applying DDL.
    pub fn create_cql(&self, oracle: bool) -> String {
        let replication = if oracle {
            &self.oracle_replication
        } else {
            &self.replication
        };
        format!(
            "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {}",
            self.name,
            replication.to_cql()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub partition_keys: Columns,
    pub clustering_keys: Columns,
    pub columns: Columns,
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    #[serde(default)]
    pub materialized_views: Vec<MaterializedView>,
    #[serde(default)]
    pub known_issues: BTreeMap<String, bool>,
    #[serde(default)]
    pub table_options: Vec<String>,
}

impl Table {
    /// Whether this is a counter table (all data columns are counters).
    pub fn is_counter_table(&self) -> bool {
        self.columns.iter().any(|c| c.typ.is_counter())
    }

    /// Every column of the table: partition keys, then clustering keys, then
    /// data columns.
    pub fn all_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.partition_keys
            .iter()
            .chain(self.clustering_keys.iter())
            .chain(self.columns.iter())
    }

    pub fn column_by_name(&self, name: &str) -> Option<&ColumnDef> {
        self.all_columns().find(|c| c.name == name)
    }

    /// Data columns that a DELETE may target: not indexed, not claimed by any
    /// materialized view (as its extra primary-key column or otherwise).
    pub fn valid_columns_for_delete(&self) -> Columns {
        let mut blocked: BTreeSet<&str> = BTreeSet::new();
        for index in &self.indexes {
            blocked.insert(index.column.name.as_str());
        }
        for view in &self.materialized_views {
            if let Some(npk) = &view.non_primary_key {
                blocked.insert(npk.name.as_str());
            }
            for col in view.primary_key_columns() {
                blocked.insert(col.name.as_str());
            }
        }
        self.columns
            .iter()
            .filter(|c| !blocked.contains(c.name.as_str()))
            .cloned()
            .collect()
    }

    /// Check every structural invariant. Called once after construction;
    /// the schema is immutable afterwards.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.partition_keys.is_empty() {
            return Err(SchemaError::MissingPartitionKey {
                table: self.name.clone(),
            });
        }

        let mut names = BTreeSet::new();
        for col in self.all_columns() {
            if !names.insert(col.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.name.clone(),
                    column: col.name.clone(),
                });
            }
        }

        for key in self.partition_keys.iter().chain(self.clustering_keys.iter()) {
            if key.typ.is_counter() {
                return Err(SchemaError::CounterInPrimaryKey {
                    table: self.name.clone(),
                    column: key.name.clone(),
                });
            }
        }
        if self.is_counter_table() && self.columns.iter().any(|c| !c.typ.is_counter()) {
            return Err(SchemaError::MixedCounterColumns {
                table: self.name.clone(),
            });
        }

        for index in &self.indexes {
            let Some(col) = self.columns.by_name(&index.column.name) else {
                return Err(SchemaError::UnknownIndexColumn {
                    table: self.name.clone(),
                    index: index.name.clone(),
                    column: index.column.name.clone(),
                });
            };
            if !col.typ.indexable() {
                return Err(SchemaError::UnindexableColumn {
                    table: self.name.clone(),
                    index: index.name.clone(),
                    column: col.name.clone(),
                });
            }
        }

        for view in &self.materialized_views {
            for col in view.primary_key_columns() {
                if self.column_by_name(&col.name).is_none() {
                    return Err(SchemaError::InvalidViewColumn {
                        table: self.name.clone(),
                        view: view.name.clone(),
                        column: col.name.clone(),
                    });
                }
            }
            let mut base_key: BTreeSet<&str> = self
                .partition_keys
                .iter()
                .chain(self.clustering_keys.iter())
                .map(|c| c.name.as_str())
                .collect();
            if let Some(npk) = &view.non_primary_key {
                base_key.insert(npk.name.as_str());
            }
            let view_key: BTreeSet<&str> =
                view.primary_key_columns().map(|c| c.name.as_str()).collect();
            if view_key != base_key {
                return Err(SchemaError::InvalidViewKey {
                    table: self.name.clone(),
                    view: view.name.clone(),
                });
            }
        }

        Ok(())
    }

    fn create_cql(&self, keyspace: &str) -> String {
        let mut defs: Vec<String> = Vec::new();
        for col in self.all_columns() {
            defs.push(format!("{} {}", col.name, col.typ.cql_def()));
        }
        let pk = self.partition_keys.names().join(",");
        let mut key = format!("(({pk})");
        for ck in &self.clustering_keys {
            key.push(',');
            key.push_str(&ck.name);
        }
        key.push(')');
        defs.push(format!("PRIMARY KEY {key}"));

        let mut out = format!(
            "CREATE TABLE IF NOT EXISTS {keyspace}.{} ({})",
            self.name,
            defs.join(", ")
        );
        if !self.table_options.is_empty() {
            out.push_str(" WITH ");
            out.push_str(&self.table_options.join(" AND "));
        }
        out
    }

    fn view_create_cql(&self, keyspace: &str, view: &MaterializedView) -> String {
        let conditions: Vec<String> = view
            .primary_key_columns()
            .map(|c| format!("{} IS NOT NULL", c.name))
            .collect();
        let pk = view.partition_keys.names().join(",");
        let mut key = format!("(({pk})");
        for ck in &view.clustering_keys {
            key.push(',');
            key.push_str(&ck.name);
        }
        key.push(')');
        format!(
            "CREATE MATERIALIZED VIEW IF NOT EXISTS {keyspace}.{} AS SELECT * FROM {keyspace}.{} WHERE {} PRIMARY KEY {key}",
            view.name,
            self.name,
            conditions.join(" AND ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub keyspace: Keyspace,
    pub tables: Vec<Table>,
}

impl Schema {
    /// Check every table invariant plus table-name uniqueness.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut names = BTreeSet::new();
        for table in &self.tables {
            if !names.insert(table.name.as_str()) {
                return Err(SchemaError::DuplicateTable(table.name.clone()));
            }
            table.validate()?;
        }
        Ok(())
    }

    /// Every distinct UDT used by any column, keyed by type name.
    fn udts(&self) -> Vec<&UdtType> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for table in &self.tables {
            for col in table.all_columns() {
                if let Some(udt) = col.typ.as_udt() {
                    if seen.insert(udt.type_name.as_str()) {
                        out.push(udt);
                    }
                }
            }
        }
        out
    }

    /// DDL in dependency order: keyspace, user-defined types, tables,
    /// indexes, materialized views.
    pub fn get_create_schema(&self) -> Vec<String> {
        let ks = &self.keyspace.name;
        let mut out = vec![self.keyspace.create_cql(false)];
        for udt in self.udts() {
            let fields: Vec<String> = udt
                .fields
                .iter()
                .map(|(name, t)| format!("{name} {}", t.name()))
                .collect();
            out.push(format!(
                "CREATE TYPE IF NOT EXISTS {ks}.{} ({})",
                udt.type_name,
                fields.join(", ")
            ));
        }
        for table in &self.tables {
            out.push(table.create_cql(ks));
        }
        for table in &self.tables {
            for index in &table.indexes {
                out.push(format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {ks}.{} ({})",
                    index.name, table.name, index.column.name
                ));
            }
        }
        for table in &self.tables {
            for view in &table.materialized_views {
                out.push(table.view_create_cql(ks, view));
            }
        }
        out
    }

    /// DDL to tear the schema down, in exact reverse dependency order.
    pub fn get_drop_schema(&self) -> Vec<String> {
        let ks = &self.keyspace.name;
        let mut out = Vec::new();
        for table in self.tables.iter().rev() {
            for view in table.materialized_views.iter().rev() {
                out.push(format!("DROP MATERIALIZED VIEW IF EXISTS {ks}.{}", view.name));
            }
        }
        for table in self.tables.iter().rev() {
            for index in table.indexes.iter().rev() {
                out.push(format!("DROP INDEX IF EXISTS {ks}.{}", index.name));
            }
        }
        for table in self.tables.iter().rev() {
            out.push(format!("DROP TABLE IF EXISTS {ks}.{}", table.name));
        }
        for udt in self.udts().into_iter().rev() {
            out.push(format!("DROP TYPE IF EXISTS {ks}.{}", udt.type_name));
        }
        out.push(format!("DROP KEYSPACE IF EXISTS {ks}"));
        out
    }
}
