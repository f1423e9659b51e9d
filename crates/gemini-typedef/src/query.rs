//! Structured query builders.
//!
//! A builder renders the prepared-statement CQL text (`to_cql`) and stays
//! interpretable as data, so an in-process reference cluster can execute it
//! without a CQL parser. Bind order is fixed by construction: INSERT binds in
//! column order, UPDATE binds assignments then relations, DELETE and SELECT
//! bind relations left to right.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Relational operator in a WHERE clause. `In(n)` consumes `n` bound cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelOp {
    Eq,
    In(usize),
    Ge,
    Gt,
    Le,
    Lt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub column: String,
    pub op: RelOp,
}

impl Relation {
    pub fn eq(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: RelOp::Eq,
        }
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.column);
        match self.op {
            RelOp::Eq => out.push_str(" = ?"),
            RelOp::In(n) => {
                out.push_str(" IN (");
                for i in 0..n {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push('?');
                }
                out.push(')');
            }
            RelOp::Ge => out.push_str(" >= ?"),
            RelOp::Gt => out.push_str(" > ?"),
            RelOp::Le => out.push_str(" <= ?"),
            RelOp::Lt => out.push_str(" < ?"),
        }
    }

    /// Number of bound cells this relation consumes (scalar holders only;
    /// composite keys never appear in generated WHERE clauses).
    pub fn len_values(&self) -> usize {
        match self.op {
            RelOp::In(n) => n,
            _ => 1,
        }
    }
}

fn render_where(out: &mut String, relations: &[Relation]) {
    for (i, rel) in relations.iter().enumerate() {
        out.push_str(if i == 0 { " WHERE " } else { " AND " });
        rel.render(out);
    }
}

/// `INSERT INTO ks.t (…) VALUES (…)`, plain or JSON, optionally LWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertBuilder {
    pub keyspace: String,
    pub table: String,
    /// `(column name, placeholder)` pairs; the placeholder comes from the
    /// column's type (`?`, or `(?,?)` for tuples).
    pub columns: Vec<(String, String)>,
    pub if_not_exists: bool,
    pub json: bool,
}

/// How an UPDATE assignment binds its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    /// `col = ?`
    Set,
    /// `col = col + ?` (counter increments).
    Add,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: String,
    pub op: AssignOp,
    pub holder: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBuilder {
    pub keyspace: String,
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBuilder {
    pub keyspace: String,
    pub table: String,
    /// Columns to delete; empty deletes the whole row (or range).
    pub columns: Vec<String>,
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectBuilder {
    pub keyspace: String,
    pub table: String,
    pub relations: Vec<Relation>,
    pub allow_filtering: bool,
}

/// The operation class a builder belongs to, as counted by the metrics
/// counter vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Insert,
    Delete,
    Update,
    Select,
    Batch,
    Unknown,
}

impl OpType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Select => "select",
            Self::Batch => "batch",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryBuilder {
    Insert(InsertBuilder),
    Update(UpdateBuilder),
    Delete(DeleteBuilder),
    Select(SelectBuilder),
}

impl QueryBuilder {
    /// Render the prepared-statement CQL with `?` placeholders.
    pub fn to_cql(&self) -> String {
        match self {
            Self::Insert(b) => {
                let mut out = format!("INSERT INTO {}.{}", b.keyspace, b.table);
                if b.json {
                    out.push_str(" JSON ?");
                } else {
                    out.push_str(" (");
                    for (i, (name, _)) in b.columns.iter().enumerate() {
                        if i > 0 {
                            out.push(',');
                        }
                        out.push_str(name);
                    }
                    out.push_str(") VALUES (");
                    for (i, (_, holder)) in b.columns.iter().enumerate() {
                        if i > 0 {
                            out.push(',');
                        }
                        out.push_str(holder);
                    }
                    out.push(')');
                }
                if b.if_not_exists {
                    out.push_str(" IF NOT EXISTS");
                }
                out
            }
            Self::Update(b) => {
                let mut out = format!("UPDATE {}.{} SET ", b.keyspace, b.table);
                for (i, a) in b.assignments.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    match a.op {
                        AssignOp::Set => {
                            out.push_str(&format!("{} = {}", a.column, a.holder));
                        }
                        AssignOp::Add => {
                            out.push_str(&format!("{} = {} + {}", a.column, a.column, a.holder));
                        }
                    }
                }
                render_where(&mut out, &b.relations);
                out
            }
            Self::Delete(b) => {
                let mut out = String::from("DELETE ");
                if !b.columns.is_empty() {
                    out.push_str(&b.columns.join(","));
                    out.push(' ');
                }
                out.push_str(&format!("FROM {}.{}", b.keyspace, b.table));
                render_where(&mut out, &b.relations);
                out
            }
            Self::Select(b) => {
                let mut out = format!("SELECT * FROM {}.{}", b.keyspace, b.table);
                render_where(&mut out, &b.relations);
                if b.allow_filtering {
                    out.push_str(" ALLOW FILTERING");
                }
                out
            }
        }
    }

    pub fn op_type(&self) -> OpType {
        match self {
            Self::Insert(_) => OpType::Insert,
            Self::Update(_) => OpType::Update,
            Self::Delete(_) => OpType::Delete,
            Self::Select(_) => OpType::Select,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Self::Insert(b) => &b.table,
            Self::Update(b) => &b.table,
            Self::Delete(b) => &b.table,
            Self::Select(b) => &b.table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_render() {
        let b = QueryBuilder::Insert(InsertBuilder {
            keyspace: "ks".to_owned(),
            table: "t".to_owned(),
            columns: vec![
                ("pk0".to_owned(), "?".to_owned()),
                ("tp0".to_owned(), "(?,?)".to_owned()),
            ],
            if_not_exists: false,
            json: false,
        });
        assert_eq!(b.to_cql(), "INSERT INTO ks.t (pk0,tp0) VALUES (?,(?,?))");
        assert_eq!(b.op_type(), OpType::Insert);
    }

    #[test]
    fn insert_json_and_lwt_render() {
        let b = QueryBuilder::Insert(InsertBuilder {
            keyspace: "ks".to_owned(),
            table: "t".to_owned(),
            columns: Vec::new(),
            if_not_exists: true,
            json: true,
        });
        assert_eq!(b.to_cql(), "INSERT INTO ks.t JSON ? IF NOT EXISTS");
    }

    #[test]
    fn update_counter_render() {
        let b = QueryBuilder::Update(UpdateBuilder {
            keyspace: "ks".to_owned(),
            table: "t".to_owned(),
            assignments: vec![Assignment {
                column: "cnt".to_owned(),
                op: AssignOp::Add,
                holder: "?".to_owned(),
            }],
            relations: vec![Relation::eq("pk0"), Relation::eq("ck0")],
        });
        assert_eq!(
            b.to_cql(),
            "UPDATE ks.t SET cnt = cnt + ? WHERE pk0 = ? AND ck0 = ?"
        );
    }

    #[test]
    fn select_in_and_range_render() {
        let b = QueryBuilder::Select(SelectBuilder {
            keyspace: "ks".to_owned(),
            table: "t".to_owned(),
            relations: vec![
                Relation {
                    column: "pk0".to_owned(),
                    op: RelOp::In(3),
                },
                Relation {
                    column: "ck0".to_owned(),
                    op: RelOp::Ge,
                },
                Relation {
                    column: "ck0".to_owned(),
                    op: RelOp::Lt,
                },
            ],
            allow_filtering: false,
        });
        assert_eq!(
            b.to_cql(),
            "SELECT * FROM ks.t WHERE pk0 IN (?,?,?) AND ck0 >= ? AND ck0 < ?"
        );
        let total: usize = match &b {
            QueryBuilder::Select(s) => s.relations.iter().map(Relation::len_values).sum(),
            _ => unreachable!(),
        };
        assert_eq!(total, 5);
    }

    #[test]
    fn delete_render() {
        let b = QueryBuilder::Delete(DeleteBuilder {
            keyspace: "ks".to_owned(),
            table: "t".to_owned(),
            columns: Vec::new(),
            relations: vec![Relation::eq("pk0")],
        });
        assert_eq!(b.to_cql(), "DELETE FROM ks.t WHERE pk0 = ?");
        assert_eq!(b.op_type(), OpType::Delete);
    }

    #[test]
    fn column_scoped_delete_render() {
        let b = QueryBuilder::Delete(DeleteBuilder {
            keyspace: "ks".to_owned(),
            table: "t".to_owned(),
            columns: vec!["col2".to_owned(), "col3".to_owned()],
            relations: vec![Relation::eq("pk0"), Relation::eq("ck0")],
        });
        assert_eq!(
            b.to_cql(),
            "DELETE col2,col3 FROM ks.t WHERE pk0 = ? AND ck0 = ?"
        );
    }
}
