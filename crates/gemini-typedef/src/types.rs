//! The CQL type algebra.
//!
//! Every type the statement generator can emit is a [`ColumnType`] variant.
//! A variant knows its DDL fragment, the placeholder shape it contributes to
//! a prepared statement, how many bound cells it consumes, how to generate a
//! random value of itself, and how to splice a printed literal into a logged
//! query. Dispatch is a plain `match`; there is no trait object anywhere.

use std::collections::BTreeSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::StdRng;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::{Builder, Variant, Version};

use crate::config::PartitionRangeConfig;
use crate::value::{CqlDecimal, CqlDuration, CqlValue, Values};

/// Upper bound on generated collection and UDT sizes. Kept constant rather
/// than configurable; the partition-range config only bounds scalar lengths.
pub const MAX_BAG_SIZE: usize = 10;

/// Wire epoch midpoint for the `date` type: day zero is `1970-01-01`.
const DATE_EPOCH_MIDPOINT: u32 = 1 << 31;

/// All primitive scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimpleType {
    Ascii,
    BigInt,
    Blob,
    Boolean,
    Date,
    Decimal,
    Double,
    Duration,
    Float,
    Inet,
    Int,
    SmallInt,
    Text,
    Time,
    Timestamp,
    TimeUuid,
    TinyInt,
    Uuid,
    Varchar,
    Varint,
}

/// Every simple type, in CQL name order. Used by the random schema generator.
pub const ALL_SIMPLE_TYPES: &[SimpleType] = &[
    SimpleType::Ascii,
    SimpleType::BigInt,
    SimpleType::Blob,
    SimpleType::Boolean,
    SimpleType::Date,
    SimpleType::Decimal,
    SimpleType::Double,
    SimpleType::Duration,
    SimpleType::Float,
    SimpleType::Inet,
    SimpleType::Int,
    SimpleType::SmallInt,
    SimpleType::Text,
    SimpleType::Time,
    SimpleType::Timestamp,
    SimpleType::TimeUuid,
    SimpleType::TinyInt,
    SimpleType::Uuid,
    SimpleType::Varchar,
    SimpleType::Varint,
];

impl SimpleType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::BigInt => "bigint",
            Self::Blob => "blob",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Decimal => "decimal",
            Self::Double => "double",
            Self::Duration => "duration",
            Self::Float => "float",
            Self::Inet => "inet",
            Self::Int => "int",
            Self::SmallInt => "smallint",
            Self::Text => "text",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::TimeUuid => "timeuuid",
            Self::TinyInt => "tinyint",
            Self::Uuid => "uuid",
            Self::Varchar => "varchar",
            Self::Varint => "varint",
        }
    }

    /// Whether CREATE INDEX may target a column of this type.
    pub fn indexable(self) -> bool {
        !matches!(self, Self::Duration)
    }

    /// Generate one cell of this type.
    pub fn gen_cell(self, rng: &mut StdRng, cfg: &PartitionRangeConfig) -> CqlValue {
        match self {
            Self::Ascii => CqlValue::Ascii(rand_string(rng, cfg)),
            Self::BigInt => CqlValue::BigInt(rng.gen()),
            Self::Blob => CqlValue::Blob(rand_blob(rng, cfg)),
            Self::Boolean => CqlValue::Boolean(rng.gen()),
            Self::Date => CqlValue::Date(DATE_EPOCH_MIDPOINT + rng.gen_range(0..36_500)),
            Self::Decimal => CqlValue::Decimal(CqlDecimal {
                unscaled: i64::from(rng.gen::<i32>()),
                scale: rng.gen_range(0..6),
            }),
            Self::Double => CqlValue::Double(rng.gen_range(-1.0e9..1.0e9)),
            Self::Duration => CqlValue::Duration(CqlDuration {
                months: rng.gen_range(0..120),
                days: rng.gen_range(0..31),
                nanos: rng.gen_range(0..86_400_000_000_000),
            }),
            Self::Float => CqlValue::Float(rng.gen_range(-1.0e9..1.0e9)),
            Self::Inet => CqlValue::Inet(IpAddr::V4(Ipv4Addr::from(rng.gen::<u32>()))),
            Self::Int => CqlValue::Int(rng.gen()),
            Self::SmallInt => CqlValue::SmallInt(rng.gen()),
            Self::Text => CqlValue::Text(rand_string(rng, cfg)),
            Self::Time => CqlValue::Time(rng.gen_range(0..86_400_000_000_000)),
            Self::Timestamp => CqlValue::Timestamp(rng.gen_range(0..4_102_444_800_000)),
            Self::TimeUuid => CqlValue::TimeUuid(rand_uuid(rng, Version::Mac)),
            Self::TinyInt => CqlValue::TinyInt(rng.gen()),
            Self::Uuid => CqlValue::Uuid(rand_uuid(rng, Version::Random)),
            Self::Varchar => CqlValue::Varchar(rand_string(rng, cfg)),
            Self::Varint => CqlValue::Varint(i128::from(rng.gen::<i64>())),
        }
    }

    fn matches(self, value: &CqlValue) -> bool {
        matches!(
            (self, value),
            (Self::Ascii, CqlValue::Ascii(_))
                | (Self::BigInt, CqlValue::BigInt(_))
                | (Self::Blob, CqlValue::Blob(_))
                | (Self::Boolean, CqlValue::Boolean(_))
                | (Self::Date, CqlValue::Date(_))
                | (Self::Decimal, CqlValue::Decimal(_))
                | (Self::Double, CqlValue::Double(_))
                | (Self::Duration, CqlValue::Duration(_))
                | (Self::Float, CqlValue::Float(_))
                | (Self::Inet, CqlValue::Inet(_))
                | (Self::Int, CqlValue::Int(_))
                | (Self::SmallInt, CqlValue::SmallInt(_))
                | (Self::Text, CqlValue::Text(_))
                | (Self::Time, CqlValue::Time(_))
                | (Self::Timestamp, CqlValue::Timestamp(_))
                | (Self::TimeUuid, CqlValue::TimeUuid(_))
                | (Self::TinyInt, CqlValue::TinyInt(_))
                | (Self::Uuid, CqlValue::Uuid(_))
                | (Self::Varchar, CqlValue::Varchar(_))
                | (Self::Varint, CqlValue::Varint(_))
        )
    }

    /// Cardinality estimate: how many distinct values generation can reach
    /// under `cfg`. Collapses to powers of two; only relative magnitude is
    /// ever compared.
    pub fn value_variations(self, cfg: &PartitionRangeConfig) -> f64 {
        match self {
            Self::Ascii | Self::Text | Self::Varchar => {
                2f64.powi(cfg.max_string_length.min(512) as i32)
            }
            Self::Blob => 2f64.powi(cfg.max_blob_length.min(512) as i32),
            Self::Boolean => 2.0,
            Self::TinyInt => 2f64.powi(8),
            Self::SmallInt => 2f64.powi(16),
            Self::Date | Self::Float | Self::Inet | Self::Int => 2f64.powi(32),
            Self::BigInt
            | Self::Decimal
            | Self::Double
            | Self::Duration
            | Self::Time
            | Self::Timestamp
            | Self::Varint => 2f64.powi(64),
            Self::TimeUuid | Self::Uuid => 2f64.powi(128),
        }
    }
}

impl fmt::Display for SimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn rand_string(rng: &mut StdRng, cfg: &PartitionRangeConfig) -> String {
    let len = rng.gen_range(cfg.min_string_length..=cfg.max_string_length.max(1));
    Alphanumeric.sample_string(rng, len.max(1))
}

fn rand_blob(rng: &mut StdRng, cfg: &PartitionRangeConfig) -> Vec<u8> {
    let len = rng.gen_range(cfg.min_blob_length..=cfg.max_blob_length.max(1));
    let mut buf = vec![0u8; len.max(1)];
    rng.fill_bytes(&mut buf);
    buf
}

fn rand_uuid(rng: &mut StdRng, version: Version) -> uuid::Uuid {
    Builder::from_bytes(rng.gen())
        .with_variant(Variant::RFC4122)
        .with_version(version)
        .into_uuid()
}

/// Whether a bag is a `list` or a `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BagKind {
    List,
    Set,
}

impl BagKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Set => "set",
        }
    }
}

/// `list<T>` or `set<T>`, optionally frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagType {
    pub kind: BagKind,
    pub value: SimpleType,
    pub frozen: bool,
}

impl BagType {
    fn cql_def(&self) -> String {
        let inner = format!("{}<{}>", self.kind.name(), self.value.name());
        if self.frozen {
            format!("frozen<{inner}>")
        } else {
            inner
        }
    }

    fn gen_cell(&self, rng: &mut StdRng, cfg: &PartitionRangeConfig) -> CqlValue {
        let count = rng.gen_range(1..=MAX_BAG_SIZE);
        match self.kind {
            BagKind::List => {
                CqlValue::List((0..count).map(|_| self.value.gen_cell(rng, cfg)).collect())
            }
            BagKind::Set => {
                // Set elements must be distinct; duplicates are dropped.
                let mut seen = BTreeSet::new();
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    let v = self.value.gen_cell(rng, cfg);
                    if seen.insert(v.to_string()) {
                        items.push(v);
                    }
                }
                CqlValue::Set(items)
            }
        }
    }
}

/// `map<K,V>`, optionally frozen. Keys are generated unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapType {
    pub key: SimpleType,
    pub value: SimpleType,
    pub frozen: bool,
}

impl MapType {
    fn cql_def(&self) -> String {
        let inner = format!("map<{},{}>", self.key.name(), self.value.name());
        if self.frozen {
            format!("frozen<{inner}>")
        } else {
            inner
        }
    }

    fn gen_cell(&self, rng: &mut StdRng, cfg: &PartitionRangeConfig) -> CqlValue {
        let count = rng.gen_range(1..=MAX_BAG_SIZE);
        let mut seen = BTreeSet::new();
        let mut pairs = Vec::with_capacity(count);
        for _ in 0..count {
            let k = self.key.gen_cell(rng, cfg);
            if seen.insert(k.to_string()) {
                let v = self.value.gen_cell(rng, cfg);
                pairs.push((k, v));
            }
        }
        CqlValue::Map(pairs)
    }
}

/// `tuple<…>`: the only composite whose components bind individually, one
/// `?` per component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleType {
    pub types: Vec<SimpleType>,
    pub frozen: bool,
}

impl TupleType {
    fn cql_def(&self) -> String {
        let parts: Vec<&str> = self.types.iter().map(|t| t.name()).collect();
        let inner = format!("tuple<{}>", parts.join(","));
        if self.frozen {
            format!("frozen<{inner}>")
        } else {
            inner
        }
    }

    fn cql_holder(&self) -> String {
        let holders = vec!["?"; self.types.len()];
        format!("({})", holders.join(","))
    }
}

/// A user-defined type: a named, ordered field list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdtType {
    pub type_name: String,
    pub fields: Vec<(String, SimpleType)>,
    pub frozen: bool,
}

impl UdtType {
    fn cql_def(&self) -> String {
        if self.frozen {
            format!("frozen<{}>", self.type_name)
        } else {
            self.type_name.clone()
        }
    }

    fn gen_cell(&self, rng: &mut StdRng, cfg: &PartitionRangeConfig) -> CqlValue {
        CqlValue::Udt(
            self.fields
                .iter()
                .map(|(name, t)| (name.clone(), t.gen_cell(rng, cfg)))
                .collect(),
        )
    }
}

/// The full type algebra: every type a generated column can have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Simple(SimpleType),
    Bag(BagType),
    Map(MapType),
    Tuple(TupleType),
    Udt(UdtType),
    Counter,
}

impl ColumnType {
    /// The DDL fragment for a column of this type (`int`,
    /// `frozen<map<text,blob>>`, …).
    pub fn cql_def(&self) -> String {
        match self {
            Self::Simple(t) => t.name().to_owned(),
            Self::Bag(t) => t.cql_def(),
            Self::Map(t) => t.cql_def(),
            Self::Tuple(t) => t.cql_def(),
            Self::Udt(t) => t.cql_def(),
            Self::Counter => "counter".to_owned(),
        }
    }

    /// The placeholder this type contributes to a prepared statement.
    /// Everything is a single `?` except tuples, which bind per component.
    pub fn cql_holder(&self) -> String {
        match self {
            Self::Tuple(t) => t.cql_holder(),
            _ => "?".to_owned(),
        }
    }

    /// Number of bound cells one occurrence of this type consumes.
    pub fn len_value(&self) -> usize {
        match self {
            Self::Tuple(t) => t.types.len(),
            _ => 1,
        }
    }

    /// Generate a `len_value()`-long vector of cells.
    pub fn gen_value(&self, rng: &mut StdRng, cfg: &PartitionRangeConfig) -> Values {
        match self {
            Self::Simple(t) => vec![t.gen_cell(rng, cfg)].into(),
            Self::Bag(t) => vec![t.gen_cell(rng, cfg)].into(),
            Self::Map(t) => vec![t.gen_cell(rng, cfg)].into(),
            Self::Tuple(t) => t.types.iter().map(|c| c.gen_cell(rng, cfg)).collect(),
            Self::Udt(t) => vec![t.gen_cell(rng, cfg)].into(),
            // Counter deltas may be negative: UPDATE adds or subtracts.
            Self::Counter => vec![CqlValue::Counter(rng.gen_range(-1024..1024))].into(),
        }
    }

    /// JSON mirror of a freshly generated value, for oracle row comparison
    /// and INSERT JSON payloads.
    pub fn gen_json_value(&self, rng: &mut StdRng, cfg: &PartitionRangeConfig) -> serde_json::Value {
        let cells = self.gen_value(rng, cfg);
        match self {
            Self::Tuple(_) => {
                serde_json::Value::Array(cells.iter().map(CqlValue::to_json).collect())
            }
            _ => cells[0].to_json(),
        }
    }

    /// Replace the leftmost `?` placeholders in `query` with printed literals
    /// drawn from the front of `values`, returning the rewritten query and
    /// the number of cells consumed.
    ///
    /// Panics on a type/value mismatch: that is an internal invariant
    /// violation, not a runtime condition.
    pub fn cql_pretty(&self, query: &str, values: &[CqlValue]) -> (String, usize) {
        if values.is_empty() {
            return (query.to_owned(), 0);
        }
        match self {
            Self::Simple(t) => {
                if !t.matches(&values[0]) {
                    panic!("cql literal for {} got mismatched value {:?}", t, values[0]);
                }
                (replace_leftmost(query, &values[0].to_string()), 1)
            }
            Self::Bag(t) => match &values[0] {
                v @ (CqlValue::List(_) | CqlValue::Set(_)) => {
                    (replace_leftmost(query, &v.to_string()), 1)
                }
                other => panic!(
                    "cql literal for {} got mismatched value {other:?}",
                    t.cql_def()
                ),
            },
            Self::Map(t) => match &values[0] {
                v @ CqlValue::Map(_) => (replace_leftmost(query, &v.to_string()), 1),
                other => panic!(
                    "cql literal for {} got mismatched value {other:?}",
                    t.cql_def()
                ),
            },
            Self::Tuple(t) => {
                let arity = t.types.len();
                assert!(
                    values.len() >= arity,
                    "tuple literal needs {arity} cells, got {}",
                    values.len()
                );
                let mut query = query.to_owned();
                for (component, value) in t.types.iter().zip(values) {
                    let (rewritten, _) =
                        ColumnType::Simple(*component).cql_pretty(&query, std::slice::from_ref(value));
                    query = rewritten;
                }
                (query, arity)
            }
            Self::Udt(t) => match &values[0] {
                v @ CqlValue::Udt(_) => (replace_leftmost(query, &v.to_string()), 1),
                other => panic!(
                    "cql literal for {} got mismatched value {other:?}",
                    t.type_name
                ),
            },
            Self::Counter => match &values[0] {
                v @ CqlValue::Counter(_) => (replace_leftmost(query, &v.to_string()), 1),
                other => panic!("cql literal for counter got mismatched value {other:?}"),
            },
        }
    }

    /// Whether CREATE INDEX may target a column of this type.
    pub fn indexable(&self) -> bool {
        match self {
            Self::Simple(t) => t.indexable(),
            _ => false,
        }
    }

    /// Cardinality estimate under `cfg`; composites compound their element
    /// estimates.
    pub fn value_variations(&self, cfg: &PartitionRangeConfig) -> f64 {
        match self {
            Self::Simple(t) => t.value_variations(cfg),
            Self::Bag(t) => t.value.value_variations(cfg).powi(MAX_BAG_SIZE as i32),
            Self::Map(t) => (t.key.value_variations(cfg) * t.value.value_variations(cfg))
                .powi(MAX_BAG_SIZE as i32),
            Self::Tuple(t) => t
                .types
                .iter()
                .map(|c| c.value_variations(cfg))
                .product(),
            Self::Udt(t) => t
                .fields
                .iter()
                .map(|(_, c)| c.value_variations(cfg))
                .product(),
            Self::Counter => 2f64.powi(64),
        }
    }

    pub fn is_counter(&self) -> bool {
        matches!(self, Self::Counter)
    }

    pub fn as_udt(&self) -> Option<&UdtType> {
        match self {
            Self::Udt(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cql_def())
    }
}

fn replace_leftmost(query: &str, literal: &str) -> String {
    match query.find('?') {
        Some(i) => {
            let mut out = String::with_capacity(query.len() + literal.len());
            out.push_str(&query[..i]);
            out.push_str(literal);
            out.push_str(&query[i + 1..]);
            out
        }
        None => query.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn cfg() -> PartitionRangeConfig {
        PartitionRangeConfig::default()
    }

    #[test]
    fn ddl_fragments() {
        let bag = ColumnType::Bag(BagType {
            kind: BagKind::Set,
            value: SimpleType::Int,
            frozen: true,
        });
        assert_eq!(bag.cql_def(), "frozen<set<int>>");

        let map = ColumnType::Map(MapType {
            key: SimpleType::Text,
            value: SimpleType::Blob,
            frozen: false,
        });
        assert_eq!(map.cql_def(), "map<text,blob>");

        let tuple = ColumnType::Tuple(TupleType {
            types: vec![SimpleType::Int, SimpleType::Text],
            frozen: false,
        });
        assert_eq!(tuple.cql_def(), "tuple<int,text>");
        assert_eq!(tuple.cql_holder(), "(?,?)");
        assert_eq!(tuple.len_value(), 2);
    }

    #[test]
    fn generated_value_matches_declared_len() {
        let mut rng = StdRng::seed_from_u64(9);
        for t in [
            ColumnType::Simple(SimpleType::Inet),
            ColumnType::Bag(BagType {
                kind: BagKind::List,
                value: SimpleType::SmallInt,
                frozen: false,
            }),
            ColumnType::Map(MapType {
                key: SimpleType::Int,
                value: SimpleType::Text,
                frozen: false,
            }),
            ColumnType::Tuple(TupleType {
                types: vec![SimpleType::Uuid, SimpleType::Boolean, SimpleType::Float],
                frozen: false,
            }),
            ColumnType::Udt(UdtType {
                type_name: "udt0".to_owned(),
                fields: vec![
                    ("f0".to_owned(), SimpleType::Int),
                    ("f1".to_owned(), SimpleType::Text),
                ],
                frozen: true,
            }),
            ColumnType::Counter,
        ] {
            let values = t.gen_value(&mut rng, &cfg());
            assert_eq!(values.len(), t.len_value(), "type {t}");
        }
    }

    #[test]
    fn simple_generation_is_deterministic_per_seed() {
        for t in ALL_SIMPLE_TYPES {
            let a = t.gen_cell(&mut StdRng::seed_from_u64(17), &cfg());
            let b = t.gen_cell(&mut StdRng::seed_from_u64(17), &cfg());
            assert_eq!(a, b, "type {t}");
        }
    }

    #[test]
    fn pretty_map_literal() {
        let map = ColumnType::Map(MapType {
            key: SimpleType::Int,
            value: SimpleType::Text,
            frozen: false,
        });
        let value = CqlValue::Map(vec![
            (CqlValue::Int(1), CqlValue::Text("a".to_owned())),
            (CqlValue::Int(2), CqlValue::Text("b".to_owned())),
        ]);
        let (query, consumed) =
            map.cql_pretty("INSERT INTO ks.t (m) VALUES (?)", std::slice::from_ref(&value));
        assert_eq!(query, "INSERT INTO ks.t (m) VALUES ({1:'a',2:'b'})");
        assert_eq!(consumed, 1);
    }

    #[test]
    fn pretty_tuple_consumes_per_component() {
        let tuple = ColumnType::Tuple(TupleType {
            types: vec![SimpleType::Int, SimpleType::Text],
            frozen: false,
        });
        let values = [CqlValue::Int(7), CqlValue::Text("x".to_owned())];
        let (query, consumed) = tuple.cql_pretty("SELECT * FROM t WHERE tp = (?,?)", &values);
        assert_eq!(query, "SELECT * FROM t WHERE tp = (7,'x')");
        assert_eq!(consumed, 2);
    }

    #[test]
    #[should_panic(expected = "mismatched value")]
    fn pretty_panics_on_type_value_mismatch() {
        let t = ColumnType::Simple(SimpleType::Int);
        let v = [CqlValue::Text("oops".to_owned())];
        let _ = t.cql_pretty("SELECT * FROM t WHERE pk = ?", &v);
    }

    #[test]
    fn indexability() {
        assert!(ColumnType::Simple(SimpleType::Text).indexable());
        assert!(!ColumnType::Simple(SimpleType::Duration).indexable());
        assert!(!ColumnType::Counter.indexable());
        assert!(!ColumnType::Bag(BagType {
            kind: BagKind::Set,
            value: SimpleType::Int,
            frozen: false,
        })
        .indexable());
    }

    #[test]
    fn set_and_map_cells_are_distinct() {
        let mut rng = StdRng::seed_from_u64(3);
        let set = BagType {
            kind: BagKind::Set,
            value: SimpleType::TinyInt,
            frozen: false,
        };
        for _ in 0..64 {
            if let CqlValue::Set(items) = set.gen_cell(&mut rng, &cfg()) {
                let mut seen = BTreeSet::new();
                for item in &items {
                    assert!(seen.insert(item.to_string()), "duplicate set element");
                }
                assert!(!items.is_empty());
            } else {
                unreachable!();
            }
        }

        let map = MapType {
            key: SimpleType::TinyInt,
            value: SimpleType::Int,
            frozen: false,
        };
        for _ in 0..64 {
            if let CqlValue::Map(pairs) = map.gen_cell(&mut rng, &cfg()) {
                let mut seen = BTreeSet::new();
                for (k, _) in &pairs {
                    assert!(seen.insert(k.to_string()), "duplicate map key");
                }
                assert!(!pairs.is_empty());
            } else {
                unreachable!();
            }
        }
    }

    #[test]
    fn variations_grow_with_composition() {
        let c = cfg();
        let int = ColumnType::Simple(SimpleType::Int);
        let list = ColumnType::Bag(BagType {
            kind: BagKind::List,
            value: SimpleType::Int,
            frozen: false,
        });
        assert!(list.value_variations(&c) > int.value_variations(&c));
    }
}
