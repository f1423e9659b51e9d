use serde::{Deserialize, Serialize};

use crate::types::ColumnType;

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, typ: ColumnType) -> Self {
        Self {
            name: name.into(),
            typ,
        }
    }
}

/// An ordered column list with value semantics: `remove` and `non_counters`
/// return new lists rather than mutating in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Columns(Vec<ColumnDef>);

impl Columns {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, col: ColumnDef) {
        self.0.push(col);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDef> {
        self.0.iter()
    }

    pub fn get(&self, i: usize) -> Option<&ColumnDef> {
        self.0.get(i)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.0.iter().any(|c| c.name == name)
    }

    pub fn by_name(&self, name: &str) -> Option<&ColumnDef> {
        self.0.iter().find(|c| c.name == name)
    }

    /// All columns that are not counters.
    pub fn non_counters(&self) -> Columns {
        Self(
            self.0
                .iter()
                .filter(|c| !c.typ.is_counter())
                .cloned()
                .collect(),
        )
    }

    /// A copy of this list without `col` (matched by name).
    pub fn remove(&self, col: &ColumnDef) -> Columns {
        Self(
            self.0
                .iter()
                .filter(|c| c.name != col.name)
                .cloned()
                .collect(),
        )
    }

    /// Total number of bound cells the columns consume in one statement.
    pub fn len_values(&self) -> usize {
        self.0.iter().map(|c| c.typ.len_value()).sum()
    }
}

impl From<Vec<ColumnDef>> for Columns {
    fn from(v: Vec<ColumnDef>) -> Self {
        Self(v)
    }
}

impl FromIterator<ColumnDef> for Columns {
    fn from_iter<I: IntoIterator<Item = ColumnDef>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::ops::Index<usize> for Columns {
    type Output = ColumnDef;

    fn index(&self, i: usize) -> &ColumnDef {
        &self.0[i]
    }
}

impl<'a> IntoIterator for &'a Columns {
    type Item = &'a ColumnDef;
    type IntoIter = std::slice::Iter<'a, ColumnDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A secondary index over one column. The column must satisfy
/// `typ.indexable()`; the schema validator enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub column: ColumnDef,
}

/// A server-maintained projection of a base table under a different primary
/// key. `partition_keys` and `clustering_keys` together are a permutation of
/// the base table's primary key, optionally extended by one data column
/// (`non_primary_key`), which then becomes non-deletable on the base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedView {
    pub name: String,
    pub partition_keys: Columns,
    pub clustering_keys: Columns,
    pub non_primary_key: Option<ColumnDef>,
}

impl MaterializedView {
    /// Every primary-key column of the view, partition keys first.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.partition_keys.iter().chain(self.clustering_keys.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BagKind, BagType, SimpleType, TupleType};

    fn list_col(name: &str) -> ColumnDef {
        ColumnDef::new(
            name,
            ColumnType::Bag(BagType {
                kind: BagKind::List,
                value: SimpleType::Int,
                frozen: false,
            }),
        )
    }

    fn tuple_col(name: &str) -> ColumnDef {
        ColumnDef::new(
            name,
            ColumnType::Tuple(TupleType {
                types: vec![SimpleType::Int, SimpleType::Text],
                frozen: false,
            }),
        )
    }

    #[test]
    fn primitives_over_list_tuple_counter() {
        let cols: Columns = vec![
            list_col("pk_mv_0"),
            tuple_col("pk_mv_1"),
            ColumnDef::new("ct_1", ColumnType::Counter),
        ]
        .into();

        assert_eq!(cols.len(), 3);
        assert_eq!(cols.names().join(","), "pk_mv_0,pk_mv_1,ct_1");
        assert_eq!(cols.non_counters().len(), 2);
        assert_eq!(cols.non_counters().names().join(","), "pk_mv_0,pk_mv_1");

        let cols = cols.remove(&cols[2]);
        assert_eq!(cols.len(), 2);
        assert_eq!(cols.names().join(","), "pk_mv_0,pk_mv_1");

        let cols = cols.remove(&cols[0]);
        assert_eq!(cols.len(), 1);
        assert_eq!(cols.names().join(","), "pk_mv_1");

        let cols = cols.remove(&cols[0]);
        assert_eq!(cols.len(), 0);
        assert_eq!(cols.names().join(","), "");
    }

    #[test]
    fn len_values_counts_tuple_components() {
        let cols: Columns = vec![list_col("a"), tuple_col("b")].into();
        assert_eq!(cols.len_values(), 3);
    }
}
