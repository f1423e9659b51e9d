//! Statement generation.
//!
//! Every generator takes the schema, a target table, the worker's partition
//! range, and the worker's RNG, and returns a single-use [`Stmt`]. Statements
//! are valid by construction: counter tables only ever see UPDATEs, deletes
//! are withheld while a materialized view claims a data column, and IF NOT
//! EXISTS appears only when the range config enables lightweight
//! transactions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use gemini_typedef::{
    AssignOp, Assignment, ColumnType, CqlValue, DeleteBuilder, InsertBuilder, PartitionRange,
    PartitionRangeConfig, PostStmtHook, QueryBuilder, RelOp, Relation, Schema, SelectBuilder,
    SimpleType, StatementType, Stmt, Table, UpdateBuilder, ValueWithToken, Values,
};

use crate::seeds::mix_seed;
use crate::token::token_for_partition_key;

/// Shared cursor over a worker's partition range. Multi-partition reads walk
/// the range through it and only advance it via the statement's post-hook,
/// after the statement has actually been executed.
#[derive(Debug, Clone, Default)]
pub struct PartitionCursor(Arc<AtomicU64>);

impl PartitionCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn advance(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }
}

/// Derive the partition-key values for seed `s`, deterministically: each
/// partition-key column draws from its own sub-seeded RNG, so the same `s`
/// always reproduces the same key tuple and therefore the same token.
pub fn gen_partition_key_for_seed(
    table: &Table,
    seed: u64,
    cfg: &PartitionRangeConfig,
) -> ValueWithToken {
    let mut values = Values::with_capacity(table.partition_keys.len_values());
    for (i, col) in table.partition_keys.iter().enumerate() {
        let mut sub = StdRng::seed_from_u64(mix_seed(seed, i as u64));
        values.append(&col.typ.gen_value(&mut sub, cfg));
    }
    let token = token_for_partition_key(&table.partition_keys, &values);
    ValueWithToken { value: values, token }
}

fn gen_partition_key(
    table: &Table,
    range: &PartitionRange,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> ValueWithToken {
    let seed = if range.is_empty() {
        range.min
    } else {
        rng.gen_range(range.min..range.max)
    };
    gen_partition_key_for_seed(table, seed, cfg)
}

/// The column scope of a generated DELETE. Whole-row (empty scope) only when
/// every data column is deletable; otherwise the delete names exactly the
/// columns no index or view claims, so a view's promoted column is never
/// removed on the base table.
fn delete_columns(table: &Table) -> Vec<String> {
    let valid = table.valid_columns_for_delete();
    assert!(
        !valid.is_empty() || table.columns.is_empty(),
        "DELETE is not valid against {}: every data column is claimed by an index or view",
        table.name
    );
    if valid.len() == table.columns.len() {
        Vec::new()
    } else {
        valid.iter().map(|c| c.name.clone()).collect()
    }
}

fn key_relations(table: &Table, clustering: bool) -> Vec<Relation> {
    let mut relations: Vec<Relation> = table
        .partition_keys
        .iter()
        .map(|c| Relation::eq(&c.name))
        .collect();
    if clustering {
        relations.extend(table.clustering_keys.iter().map(|c| Relation::eq(&c.name)));
    }
    relations
}

fn push_generated(
    columns: &gemini_typedef::Columns,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
    types: &mut Vec<ColumnType>,
    values: &mut Values,
) {
    for col in columns {
        types.push(col.typ.clone());
        values.append(&col.typ.gen_value(rng, cfg));
    }
}

/// INSERT targeting one partition; binds all partition keys, all clustering
/// keys, then every data column. Becomes IF NOT EXISTS with even odds when
/// lightweight transactions are enabled.
pub fn gen_insert_stmt(
    schema: &Schema,
    table: &Table,
    range: &PartitionRange,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> Stmt {
    assert!(
        !table.is_counter_table(),
        "INSERT is not valid against counter table {}",
        table.name
    );
    let vwt = gen_partition_key(table, range, rng, cfg);

    let mut types: Vec<ColumnType> = Vec::new();
    let mut values = Values::new();
    let mut columns: Vec<(String, String)> = Vec::new();

    for col in &table.partition_keys {
        columns.push((col.name.clone(), col.typ.cql_holder()));
        types.push(col.typ.clone());
    }
    values.append(&vwt.value);

    for cols in [&table.clustering_keys, &table.columns] {
        for col in cols {
            columns.push((col.name.clone(), col.typ.cql_holder()));
        }
        push_generated(cols, rng, cfg, &mut types, &mut values);
    }

    let if_not_exists = cfg.use_lwt && rng.gen_bool(0.5);
    let kind = if if_not_exists {
        StatementType::InsertIfNotExists
    } else {
        StatementType::Insert
    };
    let query = QueryBuilder::Insert(InsertBuilder {
        keyspace: schema.keyspace.name.clone(),
        table: table.name.clone(),
        columns,
        if_not_exists,
        json: false,
    });
    Stmt::new(query, types, kind, values).with_token(vwt)
}

/// INSERT JSON: the whole row is one JSON text bound to a single `?`. The
/// partition-key fields mirror the values the token was computed from.
pub fn gen_insert_json_stmt(
    schema: &Schema,
    table: &Table,
    range: &PartitionRange,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> Stmt {
    assert!(
        !table.is_counter_table(),
        "INSERT JSON is not valid against counter table {}",
        table.name
    );
    let vwt = gen_partition_key(table, range, rng, cfg);

    let mut row = serde_json::Map::new();
    let mut cursor = 0usize;
    for col in &table.partition_keys {
        let width = col.typ.len_value();
        let cells = &vwt.value.as_slice()[cursor..cursor + width];
        cursor += width;
        let mirror = if width == 1 {
            cells[0].to_json()
        } else {
            serde_json::Value::Array(cells.iter().map(CqlValue::to_json).collect())
        };
        row.insert(col.name.clone(), mirror);
    }
    for col in table.clustering_keys.iter().chain(table.columns.iter()) {
        row.insert(col.name.clone(), col.typ.gen_json_value(rng, cfg));
    }

    let query = QueryBuilder::Insert(InsertBuilder {
        keyspace: schema.keyspace.name.clone(),
        table: table.name.clone(),
        columns: Vec::new(),
        if_not_exists: false,
        json: true,
    });
    let payload = serde_json::Value::Object(row).to_string();
    Stmt::new(
        query,
        vec![ColumnType::Simple(SimpleType::Text)],
        StatementType::InsertJson,
        vec![CqlValue::Text(payload)].into(),
    )
    .with_token(vwt)
}

/// UPDATE of one row: binds data columns first, then partition keys, then
/// clustering keys. On counter tables the assignments become counter
/// increments, which is the only mutation counters admit.
pub fn gen_update_stmt(
    schema: &Schema,
    table: &Table,
    range: &PartitionRange,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> Stmt {
    let vwt = gen_partition_key(table, range, rng, cfg);

    let mut types: Vec<ColumnType> = Vec::new();
    let mut values = Values::new();
    let assignments: Vec<Assignment> = table
        .columns
        .iter()
        .map(|col| {
            types.push(col.typ.clone());
            values.append(&col.typ.gen_value(rng, cfg));
            Assignment {
                column: col.name.clone(),
                op: if col.typ.is_counter() {
                    AssignOp::Add
                } else {
                    AssignOp::Set
                },
                holder: col.typ.cql_holder(),
            }
        })
        .collect();

    for col in &table.partition_keys {
        types.push(col.typ.clone());
    }
    values.append(&vwt.value);
    push_generated(&table.clustering_keys, rng, cfg, &mut types, &mut values);

    let query = QueryBuilder::Update(UpdateBuilder {
        keyspace: schema.keyspace.name.clone(),
        table: table.name.clone(),
        assignments,
        relations: key_relations(table, true),
    });
    Stmt::new(query, types, StatementType::Update, values).with_token(vwt)
}

/// DELETE of one row: one partition, one clustering position. When an index
/// or a view claims part of the row, only the still-deletable columns are
/// named.
pub fn gen_delete_rows(
    schema: &Schema,
    table: &Table,
    range: &PartitionRange,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> Stmt {
    assert!(
        !table.is_counter_table(),
        "DELETE is not valid against counter table {}",
        table.name
    );
    let vwt = gen_partition_key(table, range, rng, cfg);

    let mut types: Vec<ColumnType> = Vec::new();
    let mut values = Values::new();
    for col in &table.partition_keys {
        types.push(col.typ.clone());
    }
    values.append(&vwt.value);
    push_generated(&table.clustering_keys, rng, cfg, &mut types, &mut values);

    let query = QueryBuilder::Delete(DeleteBuilder {
        keyspace: schema.keyspace.name.clone(),
        table: table.name.clone(),
        columns: delete_columns(table),
        relations: key_relations(table, true),
    });
    Stmt::new(query, types, StatementType::DeleteRow, values).with_token(vwt)
}

/// DELETE of a clustering range within one partition: equality on the
/// partition key, a half-open `[low, high)` bound on the first clustering
/// key. Falls back to a whole-partition delete when the table has no
/// clustering keys, and carries the same column scope as a row delete when
/// an index or a view claims part of the row.
pub fn gen_delete_range(
    schema: &Schema,
    table: &Table,
    range: &PartitionRange,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> Stmt {
    assert!(
        !table.is_counter_table(),
        "DELETE is not valid against counter table {}",
        table.name
    );
    let vwt = gen_partition_key(table, range, rng, cfg);

    let mut types: Vec<ColumnType> = Vec::new();
    let mut values = Values::new();
    let mut relations = key_relations(table, false);
    for col in &table.partition_keys {
        types.push(col.typ.clone());
    }
    values.append(&vwt.value);

    if let Some(ck) = table.clustering_keys.get(0) {
        relations.push(Relation {
            column: ck.name.clone(),
            op: RelOp::Ge,
        });
        relations.push(Relation {
            column: ck.name.clone(),
            op: RelOp::Lt,
        });
        for _ in 0..2 {
            types.push(ck.typ.clone());
            values.append(&ck.typ.gen_value(rng, cfg));
        }
    }

    let query = QueryBuilder::Delete(DeleteBuilder {
        keyspace: schema.keyspace.name.clone(),
        table: table.name.clone(),
        columns: delete_columns(table),
        relations,
    });
    Stmt::new(query, types, StatementType::DeleteRange, values).with_token(vwt)
}

/// SELECT of one partition by full partition key.
pub fn gen_single_partition_query(
    schema: &Schema,
    table: &Table,
    range: &PartitionRange,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> Stmt {
    let vwt = gen_partition_key(table, range, rng, cfg);
    let mut types: Vec<ColumnType> = Vec::new();
    for col in &table.partition_keys {
        types.push(col.typ.clone());
    }
    let query = QueryBuilder::Select(SelectBuilder {
        keyspace: schema.keyspace.name.clone(),
        table: table.name.clone(),
        relations: key_relations(table, false),
        allow_filtering: false,
    });
    Stmt::new(
        query,
        types,
        StatementType::SelectSinglePartition,
        vwt.value.clone(),
    )
    .with_token(vwt)
}

/// SELECT over several partitions with per-column IN lists. Walks the
/// worker's range through `cursor`; the cursor only advances via the
/// post-hook, i.e. once the statement has actually been executed. Requires
/// scalar partition-key columns; falls back to a single-partition read
/// otherwise.
pub fn gen_multiple_partition_query(
    schema: &Schema,
    table: &Table,
    range: &PartitionRange,
    cursor: &PartitionCursor,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> Stmt {
    let span = range.len();
    if span < 2 || table.partition_keys.iter().any(|c| c.typ.len_value() != 1) {
        return gen_single_partition_query(schema, table, range, rng, cfg);
    }
    let n = rng.gen_range(2..=10).min(span as usize);
    let base = cursor.position();
    let keys: Vec<ValueWithToken> = (0..n as u64)
        .map(|k| {
            let seed = range.min + (base.wrapping_add(k) % span);
            gen_partition_key_for_seed(table, seed, cfg)
        })
        .collect();

    let mut types: Vec<ColumnType> = Vec::new();
    let mut values = Values::new();
    let relations: Vec<Relation> = table
        .partition_keys
        .iter()
        .enumerate()
        .map(|(i, col)| {
            for key in &keys {
                types.push(col.typ.clone());
                values.push(key.value[i].clone());
            }
            Relation {
                column: col.name.clone(),
                op: RelOp::In(n),
            }
        })
        .collect();

    let query = QueryBuilder::Select(SelectBuilder {
        keyspace: schema.keyspace.name.clone(),
        table: table.name.clone(),
        relations,
        allow_filtering: false,
    });
    let advanced = cursor.clone();
    Stmt::new(query, types, StatementType::SelectMultiPartition, values).with_post_hook(
        PostStmtHook::new(move || {
            advanced.advance(n as u64);
        }),
    )
}

/// SELECT of a clustering slice inside one partition: equality on a prefix
/// of the clustering keys, a `[low, high)` bound on the next one. Falls back
/// to a single-partition read when the table has no clustering keys.
pub fn gen_clustering_range_query(
    schema: &Schema,
    table: &Table,
    range: &PartitionRange,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> Stmt {
    if table.clustering_keys.is_empty() {
        return gen_single_partition_query(schema, table, range, rng, cfg);
    }
    let vwt = gen_partition_key(table, range, rng, cfg);

    let mut types: Vec<ColumnType> = Vec::new();
    let mut values = Values::new();
    let mut relations = key_relations(table, false);
    for col in &table.partition_keys {
        types.push(col.typ.clone());
    }
    values.append(&vwt.value);

    let depth = rng.gen_range(1..=table.clustering_keys.len());
    for i in 0..depth - 1 {
        let ck = &table.clustering_keys[i];
        relations.push(Relation::eq(&ck.name));
        types.push(ck.typ.clone());
        values.append(&ck.typ.gen_value(rng, cfg));
    }
    let bounded = &table.clustering_keys[depth - 1];
    relations.push(Relation {
        column: bounded.name.clone(),
        op: RelOp::Ge,
    });
    relations.push(Relation {
        column: bounded.name.clone(),
        op: RelOp::Lt,
    });
    for _ in 0..2 {
        types.push(bounded.typ.clone());
        values.append(&bounded.typ.gen_value(rng, cfg));
    }

    let query = QueryBuilder::Select(SelectBuilder {
        keyspace: schema.keyspace.name.clone(),
        table: table.name.clone(),
        relations,
        allow_filtering: false,
    });
    Stmt::new(query, types, StatementType::SelectClusteringRange, values).with_token(vwt)
}

/// SELECT through a secondary index. Falls back to a single-partition read
/// when the table has no indexes.
pub fn gen_single_index_query(
    schema: &Schema,
    table: &Table,
    range: &PartitionRange,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> Stmt {
    if table.indexes.is_empty() {
        return gen_single_partition_query(schema, table, range, rng, cfg);
    }
    let index = &table.indexes[rng.gen_range(0..table.indexes.len())];
    let col = &index.column;
    let mut values = Values::new();
    values.append(&col.typ.gen_value(rng, cfg));
    let query = QueryBuilder::Select(SelectBuilder {
        keyspace: schema.keyspace.name.clone(),
        table: table.name.clone(),
        relations: vec![Relation::eq(&col.name)],
        allow_filtering: true,
    });
    Stmt::new(
        query,
        vec![col.typ.clone()],
        StatementType::SelectByIndex,
        values,
    )
}

/// SELECT from a materialized view by the view's partition key. Falls back
/// to a single-partition read when the table has no views.
pub fn gen_mv_query(
    schema: &Schema,
    table: &Table,
    range: &PartitionRange,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> Stmt {
    if table.materialized_views.is_empty() {
        return gen_single_partition_query(schema, table, range, rng, cfg);
    }
    let view = &table.materialized_views[rng.gen_range(0..table.materialized_views.len())];
    let mut types: Vec<ColumnType> = Vec::new();
    let mut values = Values::new();
    let relations: Vec<Relation> = view
        .partition_keys
        .iter()
        .map(|col| {
            types.push(col.typ.clone());
            values.append(&col.typ.gen_value(rng, cfg));
            Relation::eq(&col.name)
        })
        .collect();
    let query = QueryBuilder::Select(SelectBuilder {
        keyspace: schema.keyspace.name.clone(),
        table: view.name.clone(),
        relations,
        allow_filtering: false,
    });
    Stmt::new(
        query,
        types,
        StatementType::SelectFromMaterializedView,
        values,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutationKind {
    Insert,
    InsertJson,
    Update,
    DeleteRow,
    DeleteRange,
}

/// Random mutation respecting table shape: counter tables only update,
/// deletes name only columns no index or view claims, and are withheld
/// entirely once every data column is claimed.
pub fn gen_mutate_stmt(
    schema: &Schema,
    table: &Table,
    range: &PartitionRange,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> Stmt {
    if table.is_counter_table() {
        return gen_update_stmt(schema, table, range, rng, cfg);
    }
    let deletes_ok =
        !table.valid_columns_for_delete().is_empty() || table.columns.is_empty();

    let mut weighted: Vec<(MutationKind, u32)> = vec![
        (MutationKind::Insert, 40),
        (MutationKind::InsertJson, 10),
        (MutationKind::Update, 25),
    ];
    if deletes_ok {
        weighted.push((MutationKind::DeleteRow, 15));
        weighted.push((MutationKind::DeleteRange, 10));
    }
    let total: u32 = weighted.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    let mut picked = MutationKind::Insert;
    for (kind, weight) in &weighted {
        if roll < *weight {
            picked = *kind;
            break;
        }
        roll -= weight;
    }

    match picked {
        MutationKind::Insert => gen_insert_stmt(schema, table, range, rng, cfg),
        MutationKind::InsertJson => gen_insert_json_stmt(schema, table, range, rng, cfg),
        MutationKind::Update => gen_update_stmt(schema, table, range, rng, cfg),
        MutationKind::DeleteRow => gen_delete_rows(schema, table, range, rng, cfg),
        MutationKind::DeleteRange => gen_delete_range(schema, table, range, rng, cfg),
    }
}

/// Random check statement over the select kinds the table supports.
pub fn gen_check_stmt(
    schema: &Schema,
    table: &Table,
    range: &PartitionRange,
    cursor: &PartitionCursor,
    rng: &mut StdRng,
    cfg: &PartitionRangeConfig,
) -> Stmt {
    let mut kinds = vec![
        StatementType::SelectSinglePartition,
        StatementType::SelectMultiPartition,
    ];
    if !table.clustering_keys.is_empty() {
        kinds.push(StatementType::SelectClusteringRange);
    }
    if !table.indexes.is_empty() {
        kinds.push(StatementType::SelectByIndex);
    }
    if !table.materialized_views.is_empty() {
        kinds.push(StatementType::SelectFromMaterializedView);
    }
    match kinds[rng.gen_range(0..kinds.len())] {
        StatementType::SelectMultiPartition => {
            gen_multiple_partition_query(schema, table, range, cursor, rng, cfg)
        }
        StatementType::SelectClusteringRange => {
            gen_clustering_range_query(schema, table, range, rng, cfg)
        }
        StatementType::SelectByIndex => gen_single_index_query(schema, table, range, rng, cfg),
        StatementType::SelectFromMaterializedView => {
            gen_mv_query(schema, table, range, rng, cfg)
        }
        _ => gen_single_partition_query(schema, table, range, rng, cfg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_gen::gen_schema;
    use gemini_typedef::SchemaConfig;

    fn cfg() -> PartitionRangeConfig {
        PartitionRangeConfig::default()
    }

    fn range() -> PartitionRange {
        PartitionRange { min: 0, max: 50 }
    }

    fn sample_schema(seed: u64) -> Schema {
        let sc = SchemaConfig {
            max_tables: 1,
            counter_table_chance: 0.0,
            min_clustering_keys: 1,
            ..SchemaConfig::default()
        };
        gen_schema(&sc, &mut StdRng::seed_from_u64(seed)).expect("schema")
    }

    fn assert_value_count(stmt: &Stmt) {
        assert_eq!(
            stmt.declared_len(),
            stmt.values.len(),
            "kind {:?}: {}",
            stmt.kind,
            stmt.query.to_cql()
        );
    }

    #[test]
    fn every_generator_upholds_the_value_count_invariant() {
        for seed in 0..24 {
            let schema = sample_schema(seed);
            let table = &schema.tables[0];
            let mut rng = StdRng::seed_from_u64(seed ^ 0xdead);
            let cursor = PartitionCursor::new();

            let mut stmts = vec![
                gen_insert_stmt(&schema, table, &range(), &mut rng, &cfg()),
                gen_insert_json_stmt(&schema, table, &range(), &mut rng, &cfg()),
                gen_update_stmt(&schema, table, &range(), &mut rng, &cfg()),
                gen_single_partition_query(&schema, table, &range(), &mut rng, &cfg()),
                gen_multiple_partition_query(&schema, table, &range(), &cursor, &mut rng, &cfg()),
                gen_clustering_range_query(&schema, table, &range(), &mut rng, &cfg()),
                gen_single_index_query(&schema, table, &range(), &mut rng, &cfg()),
                gen_mv_query(&schema, table, &range(), &mut rng, &cfg()),
            ];
            if !table.valid_columns_for_delete().is_empty() {
                stmts.push(gen_delete_rows(&schema, table, &range(), &mut rng, &cfg()));
                stmts.push(gen_delete_range(&schema, table, &range(), &mut rng, &cfg()));
            }
            for stmt in &stmts {
                assert_value_count(stmt);
            }
        }
    }

    #[test]
    fn pretty_cql_replaces_every_placeholder() {
        for seed in 0..24 {
            let schema = sample_schema(seed);
            let table = &schema.tables[0];
            let mut rng = StdRng::seed_from_u64(seed);
            let cursor = PartitionCursor::new();
            for stmt in [
                gen_mutate_stmt(&schema, table, &range(), &mut rng, &cfg()),
                gen_check_stmt(&schema, table, &range(), &cursor, &mut rng, &cfg()),
            ] {
                let pretty = stmt.pretty_cql();
                assert!(!pretty.contains('?'), "{pretty}");
            }
        }
    }

    #[test]
    fn partition_key_is_deterministic_per_seed() {
        let schema = sample_schema(7);
        let table = &schema.tables[0];
        for s in 0..32 {
            let a = gen_partition_key_for_seed(table, s, &cfg());
            let b = gen_partition_key_for_seed(table, s, &cfg());
            assert_eq!(a, b);
            assert_eq!(a.token, b.token);
        }
        // Adjacent seeds land on different keys.
        let a = gen_partition_key_for_seed(table, 0, &cfg());
        let b = gen_partition_key_for_seed(table, 1, &cfg());
        assert_ne!(a.value, b.value);
    }

    #[test]
    fn single_partition_statements_carry_a_token() {
        let schema = sample_schema(3);
        let table = &schema.tables[0];
        let mut rng = StdRng::seed_from_u64(3);
        let mut stmts = vec![
            gen_insert_stmt(&schema, table, &range(), &mut rng, &cfg()),
            gen_insert_json_stmt(&schema, table, &range(), &mut rng, &cfg()),
            gen_update_stmt(&schema, table, &range(), &mut rng, &cfg()),
            gen_single_partition_query(&schema, table, &range(), &mut rng, &cfg()),
            gen_clustering_range_query(&schema, table, &range(), &mut rng, &cfg()),
        ];
        if !table.valid_columns_for_delete().is_empty() {
            stmts.push(gen_delete_rows(&schema, table, &range(), &mut rng, &cfg()));
            stmts.push(gen_delete_range(&schema, table, &range(), &mut rng, &cfg()));
        }
        for stmt in stmts {
            assert!(stmt.values_with_token.is_some(), "kind {:?}", stmt.kind);
        }
    }

    #[test]
    fn multi_partition_query_has_no_token_and_advances_cursor_via_hook() {
        let schema = sample_schema(3);
        let table = &schema.tables[0];
        let mut rng = StdRng::seed_from_u64(3);
        let cursor = PartitionCursor::new();
        let mut stmt =
            gen_multiple_partition_query(&schema, table, &range(), &cursor, &mut rng, &cfg());
        assert_eq!(stmt.kind, StatementType::SelectMultiPartition);
        assert!(stmt.values_with_token.is_none());
        assert_eq!(cursor.position(), 0, "cursor holds until the hook runs");
        let hook = stmt.take_hook().expect("multi-partition reads emit a hook");
        hook.run();
        assert!(cursor.position() > 0);
    }

    #[test]
    fn lwt_inserts_appear_only_when_enabled() {
        let schema = sample_schema(9);
        let table = &schema.tables[0];

        let plain = cfg();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..64 {
            let stmt = gen_insert_stmt(&schema, table, &range(), &mut rng, &plain);
            assert_eq!(stmt.kind, StatementType::Insert);
        }

        let lwt = PartitionRangeConfig {
            use_lwt: true,
            ..cfg()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut saw_lwt = false;
        for _ in 0..64 {
            let stmt = gen_insert_stmt(&schema, table, &range(), &mut rng, &lwt);
            if stmt.kind == StatementType::InsertIfNotExists {
                saw_lwt = true;
                if let QueryBuilder::Insert(b) = &stmt.query {
                    assert!(b.if_not_exists);
                } else {
                    unreachable!();
                }
            }
        }
        assert!(saw_lwt, "64 draws with LWT enabled should hit IF NOT EXISTS");
    }

    #[test]
    fn counter_tables_receive_only_counter_updates() {
        let sc = SchemaConfig {
            counter_table_chance: 1.0,
            ..SchemaConfig::default()
        };
        let schema = gen_schema(&sc, &mut StdRng::seed_from_u64(2)).expect("schema");
        let table = &schema.tables[0];
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..64 {
            let stmt = gen_mutate_stmt(&schema, table, &range(), &mut rng, &cfg());
            assert_eq!(stmt.kind, StatementType::Update);
            let QueryBuilder::Update(b) = &stmt.query else {
                panic!("counter mutation must be an UPDATE");
            };
            for a in &b.assignments {
                assert_eq!(a.op, AssignOp::Add);
            }
        }
    }

    #[test]
    #[should_panic(expected = "INSERT is not valid against counter table")]
    fn insert_against_counter_table_is_an_invariant_violation() {
        let sc = SchemaConfig {
            counter_table_chance: 1.0,
            ..SchemaConfig::default()
        };
        let schema = gen_schema(&sc, &mut StdRng::seed_from_u64(2)).expect("schema");
        let mut rng = StdRng::seed_from_u64(0);
        let _ = gen_insert_stmt(&schema, &schema.tables[0], &range(), &mut rng, &cfg());
    }

    #[test]
    fn deletes_are_withheld_while_a_view_claims_a_column() {
        let mut schema = sample_schema(4);
        {
            let table = &mut schema.tables[0];
            // Block every data column: claim them via view non-primary keys.
            let claimable: Vec<_> = table.columns.iter().cloned().collect();
            table.indexes.clear();
            table.materialized_views.clear();
            for (j, col) in claimable.iter().enumerate() {
                table.materialized_views.push(gemini_typedef::MaterializedView {
                    name: format!("{}_mv_{j}", table.name),
                    partition_keys: table.partition_keys.clone(),
                    clustering_keys: table.clustering_keys.clone(),
                    non_primary_key: Some(col.clone()),
                });
            }
            assert!(table.valid_columns_for_delete().is_empty());
        }
        let table = &schema.tables[0];
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..128 {
            let stmt = gen_mutate_stmt(&schema, table, &range(), &mut rng, &cfg());
            assert!(
                !matches!(
                    stmt.kind,
                    StatementType::DeleteRow | StatementType::DeleteRange
                ),
                "delete emitted despite views claiming every column"
            );
        }
    }

    #[test]
    fn deletes_scope_to_unclaimed_columns_under_partial_claim() {
        let mut schema = sample_schema(14);
        let claimed = {
            let table = &mut schema.tables[0];
            table.indexes.clear();
            table.materialized_views.clear();
            let claimed = table.columns[0].clone();
            table
                .materialized_views
                .push(gemini_typedef::MaterializedView {
                    name: format!("{}_mv_0", table.name),
                    partition_keys: table.partition_keys.clone(),
                    clustering_keys: table.clustering_keys.clone(),
                    non_primary_key: Some(claimed.clone()),
                });
            claimed
        };
        let table = &schema.tables[0];
        let valid = table.valid_columns_for_delete();
        assert!(!valid.is_empty(), "partial claim leaves deletable columns");
        assert!(!valid.contains_name(&claimed.name));

        let mut rng = StdRng::seed_from_u64(14);
        for _ in 0..32 {
            for stmt in [
                gen_delete_rows(&schema, table, &range(), &mut rng, &cfg()),
                gen_delete_range(&schema, table, &range(), &mut rng, &cfg()),
            ] {
                let QueryBuilder::Delete(b) = &stmt.query else {
                    panic!("delete generator must build a DELETE");
                };
                assert!(
                    !b.columns.is_empty(),
                    "a partial claim forces a column-scoped delete"
                );
                assert!(
                    !b.columns.contains(&claimed.name),
                    "the view-claimed column must never be deleted"
                );
                for col in &b.columns {
                    assert!(valid.contains_name(col), "unexpected delete target {col}");
                }
            }
        }
    }

    #[test]
    fn check_statements_stay_within_supported_kinds() {
        let schema = sample_schema(12);
        let table = &schema.tables[0];
        let mut rng = StdRng::seed_from_u64(12);
        let cursor = PartitionCursor::new();
        for _ in 0..64 {
            let stmt = gen_check_stmt(&schema, table, &range(), &cursor, &mut rng, &cfg());
            assert!(stmt.kind.is_select(), "{:?}", stmt.kind);
            if stmt.kind == StatementType::SelectByIndex {
                assert!(!table.indexes.is_empty());
            }
            if stmt.kind == StatementType::SelectFromMaterializedView {
                assert!(!table.materialized_views.is_empty());
            }
        }
    }

    #[test]
    fn insert_json_binds_a_single_json_text() {
        let schema = sample_schema(6);
        let table = &schema.tables[0];
        let mut rng = StdRng::seed_from_u64(6);
        let stmt = gen_insert_json_stmt(&schema, table, &range(), &mut rng, &cfg());
        assert_eq!(stmt.values.len(), 1);
        let CqlValue::Text(payload) = &stmt.values[0] else {
            panic!("INSERT JSON binds one text cell");
        };
        let row: serde_json::Value = serde_json::from_str(payload).expect("payload is JSON");
        for col in table.all_columns() {
            assert!(
                row.get(&col.name).is_some(),
                "JSON row is missing {}",
                col.name
            );
        }
    }
}
