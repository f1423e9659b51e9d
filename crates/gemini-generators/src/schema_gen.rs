//! Random schema synthesis and the hand-assembly builder.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use gemini_typedef::{
    BagKind, BagType, ColumnDef, ColumnType, Columns, IndexDef, Keyspace, MapType,
    MaterializedView, Schema, SchemaConfig, SchemaError, SimpleType, Table, TupleType, UdtType,
    ALL_SIMPLE_TYPES,
};

pub fn gen_column_name(prefix: &str, i: usize) -> String {
    format!("{prefix}{i}")
}

pub fn gen_index_name(prefix: &str, i: usize) -> String {
    format!("{prefix}_idx_{i}")
}

/// Simple types allowed in a primary key. Durations have no defined order
/// and cannot key anything.
fn primary_key_types() -> Vec<SimpleType> {
    ALL_SIMPLE_TYPES
        .iter()
        .copied()
        .filter(|t| *t != SimpleType::Duration)
        .collect()
}

fn gen_simple_type(rng: &mut StdRng) -> SimpleType {
    ALL_SIMPLE_TYPES[rng.gen_range(0..ALL_SIMPLE_TYPES.len())]
}

fn gen_primary_key_type(rng: &mut StdRng) -> SimpleType {
    let candidates = primary_key_types();
    candidates[rng.gen_range(0..candidates.len())]
}

fn gen_bag_type(rng: &mut StdRng) -> BagType {
    BagType {
        kind: if rng.gen_bool(0.5) {
            BagKind::List
        } else {
            BagKind::Set
        },
        value: gen_simple_type(rng),
        frozen: rng.gen_bool(0.5),
    }
}

fn gen_map_type(rng: &mut StdRng) -> MapType {
    MapType {
        key: gen_primary_key_type(rng),
        value: gen_simple_type(rng),
        frozen: rng.gen_bool(0.5),
    }
}

fn gen_tuple_type(rng: &mut StdRng, cfg: &SchemaConfig) -> TupleType {
    let parts = rng.gen_range(2..=cfg.max_tuple_parts);
    TupleType {
        types: (0..parts).map(|_| gen_simple_type(rng)).collect(),
        frozen: rng.gen_bool(0.5),
    }
}

fn gen_udt_type(rng: &mut StdRng, cfg: &SchemaConfig, type_name: String) -> UdtType {
    let parts = rng.gen_range(1..=cfg.max_udt_parts);
    UdtType {
        type_name,
        fields: (0..parts)
            .map(|i| (gen_column_name("f", i), gen_simple_type(rng)))
            .collect(),
        frozen: rng.gen_bool(0.5),
    }
}

fn gen_column_type(rng: &mut StdRng, cfg: &SchemaConfig, udt_name: String) -> ColumnType {
    match rng.gen_range(0..10) {
        0 => ColumnType::Bag(gen_bag_type(rng)),
        1 => ColumnType::Map(gen_map_type(rng)),
        2 => ColumnType::Tuple(gen_tuple_type(rng, cfg)),
        3 => ColumnType::Udt(gen_udt_type(rng, cfg, udt_name)),
        _ => ColumnType::Simple(gen_simple_type(rng)),
    }
}

fn gen_table(rng: &mut StdRng, cfg: &SchemaConfig, table_index: usize) -> Table {
    let name = format!("table{table_index}");

    let pk_count = rng.gen_range(cfg.min_partition_keys..=cfg.max_partition_keys);
    let partition_keys: Columns = (0..pk_count)
        .map(|i| {
            ColumnDef::new(
                gen_column_name("pk", i),
                ColumnType::Simple(gen_primary_key_type(rng)),
            )
        })
        .collect();

    let ck_count = rng.gen_range(cfg.min_clustering_keys..=cfg.max_clustering_keys);
    let clustering_keys: Columns = (0..ck_count)
        .map(|i| {
            ColumnDef::new(
                gen_column_name("ck", i),
                ColumnType::Simple(gen_primary_key_type(rng)),
            )
        })
        .collect();

    let col_count = rng.gen_range(cfg.min_columns..=cfg.max_columns);
    let counter_table = rng.gen_bool(cfg.counter_table_chance);
    let columns: Columns = (0..col_count)
        .map(|i| {
            let col_name = gen_column_name("col", i);
            if counter_table {
                // Counter tables are all-or-nothing: every data column is a
                // counter.
                ColumnDef::new(col_name, ColumnType::Counter)
            } else {
                let udt_name = format!("{name}_udt_{i}");
                ColumnDef::new(col_name, gen_column_type(rng, cfg, udt_name))
            }
        })
        .collect();

    let indexes = if counter_table {
        Vec::new()
    } else {
        columns
            .iter()
            .filter(|c| c.typ.indexable())
            .take(cfg.max_indexes)
            .enumerate()
            .map(|(i, c)| IndexDef {
                name: gen_index_name(&format!("{name}_{}", c.name), i),
                column: c.clone(),
            })
            .collect()
    };

    let mut materialized_views = Vec::new();
    if !counter_table {
        let mv_count = rng.gen_range(0..=cfg.max_materialized_views);
        let npk_candidates: Vec<&ColumnDef> = columns
            .iter()
            .filter(|c| matches!(&c.typ, ColumnType::Simple(t) if t.indexable()))
            .collect();
        for j in 0..mv_count {
            let non_primary_key = if !npk_candidates.is_empty() && rng.gen_bool(0.5) {
                Some(npk_candidates[rng.gen_range(0..npk_candidates.len())].clone())
            } else {
                None
            };
            let (mv_pk, mv_ck) = match &non_primary_key {
                Some(npk) => {
                    // The promoted column leads the view key; the whole base
                    // key becomes clustering.
                    let pk: Columns = vec![npk.clone()].into();
                    let ck: Columns = partition_keys
                        .iter()
                        .chain(clustering_keys.iter())
                        .cloned()
                        .collect();
                    (pk, ck)
                }
                None => (partition_keys.clone(), clustering_keys.clone()),
            };
            materialized_views.push(MaterializedView {
                name: format!("{name}_mv_{j}"),
                partition_keys: mv_pk,
                clustering_keys: mv_ck,
                non_primary_key,
            });
        }
    }

    Table {
        name,
        partition_keys,
        clustering_keys,
        columns,
        indexes,
        materialized_views,
        known_issues: BTreeMap::new(),
        table_options: Vec::new(),
    }
}

/// Generate a random schema under `cfg`. Deterministic per RNG seed; the
/// output satisfies every table invariant.
pub fn gen_schema(cfg: &SchemaConfig, rng: &mut StdRng) -> Result<Schema, SchemaError> {
    cfg.validate()?;
    let table_count = rng.gen_range(1..=cfg.max_tables);
    let schema = Schema {
        keyspace: Keyspace::new("gemini"),
        tables: (0..table_count).map(|i| gen_table(rng, cfg, i)).collect(),
    };
    schema.validate()?;
    debug!(
        tables = schema.tables.len(),
        keyspace = %schema.keyspace.name,
        "generated schema"
    );
    Ok(schema)
}

/// Assemble a schema by hand, validating on `build`.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    keyspace: Option<Keyspace>,
    tables: Vec<Table>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyspace(mut self, keyspace: Keyspace) -> Self {
        self.keyspace = Some(keyspace);
        self
    }

    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let schema = Schema {
            keyspace: self
                .keyspace
                .unwrap_or_else(|| Keyspace::new("gemini")),
            tables: self.tables,
        };
        schema.validate()?;
        Ok(schema)
    }
}
