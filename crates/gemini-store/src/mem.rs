//! In-memory reference cluster.
//!
//! Interprets [`QueryBuilder`] structurally instead of parsing CQL, which
//! keeps it honest as a stand-in for a cluster endpoint in tests and demo
//! runs. Semantics are deliberately plain: inserts and updates are upserts,
//! deletes remove matching rows, selects filter-scan. Materialized views are
//! not maintained; a read against an unknown table returns no rows, which the
//! differential layer treats as the benign empty-read case.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde_json::Value as Json;

use gemini_typedef::{
    AssignOp, ColumnDef, CqlValue, QueryBuilder, RelOp, Relation, Schema, Table, Values,
};

use crate::store::{ClusterDriver, DriverError, Row};

struct TableData {
    meta: Table,
    /// partition key -> clustering key -> row. Keys are canonical JSON
    /// encodings so plain and JSON inserts land in the same slot.
    partitions: BTreeMap<String, BTreeMap<String, Row>>,
}

pub struct MemCluster {
    name: String,
    tables: Mutex<BTreeMap<String, TableData>>,
}

impl MemCluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Mutex::new(BTreeMap::new()),
        }
    }

    /// Total stored rows, for assertions in tests.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .get(table)
            .map(|t| t.partitions.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }
}

fn cells_to_json(col: &ColumnDef, cells: &[CqlValue]) -> Json {
    if col.typ.len_value() == 1 {
        cells[0].to_json()
    } else {
        Json::Array(cells.iter().map(CqlValue::to_json).collect())
    }
}

fn key_string(parts: &[Json]) -> String {
    Json::Array(parts.to_vec()).to_string()
}

/// A relation with its bound arguments resolved to JSON mirrors.
struct Binding {
    column: String,
    op: RelOp,
    args: Vec<Json>,
}

fn bind_relations(
    relations: &[Relation],
    values: &[CqlValue],
    mut cursor: usize,
) -> Result<Vec<Binding>, DriverError> {
    let mut out = Vec::with_capacity(relations.len());
    for rel in relations {
        let width = rel.len_values();
        if cursor + width > values.len() {
            return Err(DriverError::Internal(format!(
                "relation on {} is missing bound values",
                rel.column
            )));
        }
        let args: Vec<Json> = values[cursor..cursor + width]
            .iter()
            .map(CqlValue::to_json)
            .collect();
        cursor += width;
        out.push(Binding {
            column: rel.column.clone(),
            op: rel.op,
            args,
        });
    }
    if cursor != values.len() {
        return Err(DriverError::Internal(
            "bound values left over after the last relation".to_owned(),
        ));
    }
    Ok(out)
}

/// Typed comparison over JSON mirrors: numbers numerically, strings and
/// arrays lexicographically. Incomparable kinds order as `None`, which makes
/// the enclosing relation not match.
fn json_cmp(a: &Json, b: &Json) -> Option<Ordering> {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Json::String(x), Json::String(y)) => Some(x.cmp(y)),
        (Json::Bool(x), Json::Bool(y)) => Some(x.cmp(y)),
        (Json::Array(x), Json::Array(y)) => {
            for (xi, yi) in x.iter().zip(y) {
                match json_cmp(xi, yi)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(x.len().cmp(&y.len()))
        }
        (Json::Null, Json::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn row_matches(row: &Row, bindings: &[Binding]) -> bool {
    bindings.iter().all(|b| {
        let Some(cell) = row.get(&b.column) else {
            return false;
        };
        match b.op {
            RelOp::Eq => cell == &b.args[0],
            RelOp::In(_) => b.args.iter().any(|arg| arg == cell),
            RelOp::Ge => matches!(
                json_cmp(cell, &b.args[0]),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            RelOp::Gt => matches!(json_cmp(cell, &b.args[0]), Some(Ordering::Greater)),
            RelOp::Le => matches!(
                json_cmp(cell, &b.args[0]),
                Some(Ordering::Less | Ordering::Equal)
            ),
            RelOp::Lt => matches!(json_cmp(cell, &b.args[0]), Some(Ordering::Less)),
        }
    })
}

impl TableData {
    fn key_columns_from_bindings(
        &self,
        bindings: &[Binding],
    ) -> Result<(String, String), DriverError> {
        let lookup = |col: &ColumnDef| -> Result<Json, DriverError> {
            bindings
                .iter()
                .find(|b| b.op == RelOp::Eq && b.column == col.name)
                .map(|b| b.args[0].clone())
                .ok_or_else(|| {
                    DriverError::Internal(format!("key column {} is not bound", col.name))
                })
        };
        let pk: Vec<Json> = self
            .meta
            .partition_keys
            .iter()
            .map(lookup)
            .collect::<Result<_, _>>()?;
        let ck: Vec<Json> = self
            .meta
            .clustering_keys
            .iter()
            .map(lookup)
            .collect::<Result<_, _>>()?;
        Ok((key_string(&pk), key_string(&ck)))
    }

    fn insert_row(&mut self, row: Row) -> Result<(), DriverError> {
        let key_of = |columns: &gemini_typedef::Columns| -> Result<Vec<Json>, DriverError> {
            columns
                .iter()
                .map(|c| {
                    row.get(&c.name).cloned().ok_or_else(|| {
                        DriverError::Internal(format!("insert is missing key column {}", c.name))
                    })
                })
                .collect()
        };
        let pk = key_string(&key_of(&self.meta.partition_keys)?);
        let ck = key_string(&key_of(&self.meta.clustering_keys)?);
        self.partitions.entry(pk).or_default().insert(ck, row);
        Ok(())
    }
}

impl ClusterDriver for MemCluster {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply_schema(&self, schema: &Schema) -> Result<(), DriverError> {
        let mut tables = self.tables.lock();
        for table in &schema.tables {
            tables
                .entry(table.name.clone())
                .or_insert_with(|| TableData {
                    meta: table.clone(),
                    partitions: BTreeMap::new(),
                });
        }
        Ok(())
    }

    fn drop_schema(&self, schema: &Schema) -> Result<(), DriverError> {
        let mut tables = self.tables.lock();
        for table in &schema.tables {
            tables.remove(&table.name);
        }
        Ok(())
    }

    fn execute(
        &self,
        query: &QueryBuilder,
        values: &Values,
        _timestamp_micros: Option<i64>,
    ) -> Result<(), DriverError> {
        let mut tables = self.tables.lock();
        match query {
            QueryBuilder::Insert(b) => {
                let data = tables
                    .get_mut(&b.table)
                    .ok_or_else(|| DriverError::UnknownTable(b.table.clone()))?;
                let row = if b.json {
                    let Some(CqlValue::Text(payload)) = values.get(0) else {
                        return Err(DriverError::Internal(
                            "INSERT JSON binds exactly one text cell".to_owned(),
                        ));
                    };
                    let parsed: Json = serde_json::from_str(payload)
                        .map_err(|e| DriverError::Internal(format!("bad JSON row: {e}")))?;
                    let Json::Object(fields) = parsed else {
                        return Err(DriverError::Internal(
                            "JSON row must be an object".to_owned(),
                        ));
                    };
                    fields.into_iter().collect()
                } else {
                    let mut row = Row::new();
                    let mut cursor = 0usize;
                    for (name, _holder) in &b.columns {
                        let col = data.meta.column_by_name(name).ok_or_else(|| {
                            DriverError::Internal(format!("unknown column {name}"))
                        })?;
                        let width = col.typ.len_value();
                        let cells = &values.as_slice()[cursor..cursor + width];
                        cursor += width;
                        row.insert(name.clone(), cells_to_json(col, cells));
                    }
                    row
                };
                data.insert_row(row)
            }
            QueryBuilder::Update(b) => {
                let data = tables
                    .get_mut(&b.table)
                    .ok_or_else(|| DriverError::UnknownTable(b.table.clone()))?;

                // Assignments bind first, relations after.
                let mut cursor = 0usize;
                let mut sets: Vec<(String, Json)> = Vec::new();
                let mut adds: Vec<(String, i64)> = Vec::new();
                for a in &b.assignments {
                    let col = data.meta.column_by_name(&a.column).ok_or_else(|| {
                        DriverError::Internal(format!("unknown column {}", a.column))
                    })?;
                    let width = col.typ.len_value();
                    let cells = &values.as_slice()[cursor..cursor + width];
                    cursor += width;
                    match a.op {
                        AssignOp::Set => sets.push((a.column.clone(), cells_to_json(col, cells))),
                        AssignOp::Add => {
                            let delta = cells[0].to_json().as_i64().ok_or_else(|| {
                                DriverError::Internal("counter delta must be integral".to_owned())
                            })?;
                            adds.push((a.column.clone(), delta));
                        }
                    }
                }
                let bindings = bind_relations(&b.relations, values.as_slice(), cursor)?;
                let (pk, ck) = data.key_columns_from_bindings(&bindings)?;

                let partition = data.partitions.entry(pk).or_default();
                let row = partition.entry(ck).or_insert_with(|| {
                    // Upsert: a fresh row starts from the bound key columns.
                    let mut row = Row::new();
                    for binding in &bindings {
                        if binding.op == RelOp::Eq {
                            row.insert(binding.column.clone(), binding.args[0].clone());
                        }
                    }
                    row
                });
                for (col, v) in sets {
                    row.insert(col, v);
                }
                for (col, delta) in adds {
                    let current = row.get(&col).and_then(Json::as_i64).unwrap_or(0);
                    row.insert(col, Json::from(current + delta));
                }
                Ok(())
            }
            QueryBuilder::Delete(b) => {
                let data = tables
                    .get_mut(&b.table)
                    .ok_or_else(|| DriverError::UnknownTable(b.table.clone()))?;
                let bindings = bind_relations(&b.relations, values.as_slice(), 0)?;
                if b.columns.is_empty() {
                    for partition in data.partitions.values_mut() {
                        partition.retain(|_, row| !row_matches(row, &bindings));
                    }
                    data.partitions.retain(|_, partition| !partition.is_empty());
                } else {
                    // Column-scoped delete: the row survives, the named cells
                    // go.
                    for partition in data.partitions.values_mut() {
                        for row in partition.values_mut() {
                            if row_matches(row, &bindings) {
                                for col in &b.columns {
                                    row.remove(col);
                                }
                            }
                        }
                    }
                }
                Ok(())
            }
            QueryBuilder::Select(_) => Err(DriverError::Internal(
                "SELECT dispatched as a mutation".to_owned(),
            )),
        }
    }

    fn fetch(&self, query: &QueryBuilder, values: &Values) -> Result<Vec<Row>, DriverError> {
        let QueryBuilder::Select(b) = query else {
            return Err(DriverError::Internal(
                "mutation dispatched as a read".to_owned(),
            ));
        };
        let tables = self.tables.lock();
        let Some(data) = tables.get(&b.table) else {
            // Unknown read targets (materialized views are not maintained
            // here) return empty rather than failing, keeping both clusters
            // in agreement.
            return Ok(Vec::new());
        };
        let bindings = bind_relations(&b.relations, values.as_slice(), 0)?;
        let mut out = Vec::new();
        for partition in data.partitions.values() {
            for row in partition.values() {
                if row_matches(row, &bindings) {
                    out.push(row.clone());
                }
            }
        }
        Ok(out)
    }
}
