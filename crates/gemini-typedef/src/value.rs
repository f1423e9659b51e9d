use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An arbitrary-scale decimal, carried as unscaled digits plus a scale.
///
/// `unscaled = 12345, scale = 2` is the literal `123.45`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CqlDecimal {
    pub unscaled: i64,
    pub scale: u32,
}

impl fmt::Display for CqlDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.unscaled);
        }
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let digits = self.unscaled.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int}.{frac}")
        } else {
            write!(f, "{sign}0.{digits:0>scale$}")
        }
    }
}

/// A CQL duration: months, days and nanoseconds are independent components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CqlDuration {
    pub months: i32,
    pub days: i32,
    pub nanos: i64,
}

impl fmt::Display for CqlDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mo{}d{}ns", self.months, self.days, self.nanos)
    }
}

/// A single driver-encodable cell.
///
/// `Display` renders the CQL literal form, which is what the pretty printer
/// splices into logged queries: text-like values are single-quoted with `''`
/// escaping, blobs become `0x…`, collections use bracket syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CqlValue {
    Ascii(String),
    BigInt(i64),
    Blob(Vec<u8>),
    Boolean(bool),
    /// Days since the unsigned epoch midpoint, as encoded on the wire.
    Date(u32),
    Decimal(CqlDecimal),
    Double(f64),
    Duration(CqlDuration),
    Float(f32),
    Inet(IpAddr),
    Int(i32),
    SmallInt(i16),
    Text(String),
    /// Nanoseconds since midnight.
    Time(i64),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    TimeUuid(Uuid),
    TinyInt(i8),
    Uuid(Uuid),
    Varchar(String),
    Varint(i128),
    Counter(i64),
    List(Vec<CqlValue>),
    Set(Vec<CqlValue>),
    Map(Vec<(CqlValue, CqlValue)>),
    Tuple(Vec<CqlValue>),
    Udt(Vec<(String, CqlValue)>),
}

impl CqlValue {
    /// JSON mirror of this cell, used when diffing result rows between the
    /// system under test and the oracle. Encodings are canonical rather than
    /// human-oriented: blobs become `0x…` strings, varints that overflow an
    /// `i64` are carried as strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Self::Ascii(s) | Self::Text(s) | Self::Varchar(s) => J::String(s.clone()),
            Self::BigInt(v) | Self::Counter(v) | Self::Time(v) | Self::Timestamp(v) => {
                J::from(*v)
            }
            Self::Blob(b) => J::String(format!("0x{}", hex(b))),
            Self::Boolean(b) => J::Bool(*b),
            Self::Date(d) => J::from(*d),
            Self::Decimal(d) => J::String(d.to_string()),
            Self::Double(v) => serde_json::Number::from_f64(*v)
                .map(J::Number)
                .unwrap_or(J::Null),
            Self::Duration(d) => J::String(d.to_string()),
            Self::Float(v) => serde_json::Number::from_f64(f64::from(*v))
                .map(J::Number)
                .unwrap_or(J::Null),
            Self::Inet(ip) => J::String(ip.to_string()),
            Self::Int(v) => J::from(*v),
            Self::SmallInt(v) => J::from(*v),
            Self::TinyInt(v) => J::from(*v),
            Self::TimeUuid(u) | Self::Uuid(u) => J::String(u.to_string()),
            Self::Varint(v) => i64::try_from(*v)
                .map(J::from)
                .unwrap_or_else(|_| J::String(v.to_string())),
            Self::List(items) | Self::Set(items) => {
                J::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Map(pairs) => J::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.json_key(), v.to_json()))
                    .collect(),
            ),
            Self::Tuple(items) => J::Array(items.iter().map(Self::to_json).collect()),
            Self::Udt(fields) => J::Object(
                fields
                    .iter()
                    .map(|(name, v)| (name.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// String form usable as a JSON object key (CQL map keys are scalars).
    fn json_key(&self) -> String {
        match self {
            Self::Ascii(s) | Self::Text(s) | Self::Varchar(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

impl fmt::Display for CqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascii(s) | Self::Text(s) | Self::Varchar(s) => f.write_str(&quote(s)),
            Self::BigInt(v) | Self::Counter(v) | Self::Time(v) | Self::Timestamp(v) => {
                write!(f, "{v}")
            }
            Self::Blob(b) => write!(f, "0x{}", hex(b)),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Duration(d) => write!(f, "{d}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Inet(ip) => f.write_str(&quote(&ip.to_string())),
            Self::Int(v) => write!(f, "{v}"),
            Self::SmallInt(v) => write!(f, "{v}"),
            Self::TinyInt(v) => write!(f, "{v}"),
            Self::TimeUuid(u) | Self::Uuid(u) => write!(f, "{u}"),
            Self::Varint(v) => write!(f, "{v}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Set(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
            Self::Map(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("}")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Self::Udt(fields) => {
                f.write_str("{")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{name}:{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// An ordered sequence of bound cells. Copying is cheap relative to a
/// statement's lifetime and the type is value-semantic throughout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(Vec<CqlValue>);

impl Values {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(n: usize) -> Self {
        Self(Vec::with_capacity(n))
    }

    pub fn push(&mut self, value: CqlValue) {
        self.0.push(value);
    }

    /// Append every cell of `src`, growing `self`. Plain append semantics:
    /// the source is left untouched and no pre-existing cell is overwritten.
    pub fn append(&mut self, src: &Values) {
        self.0.extend_from_slice(&src.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CqlValue> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[CqlValue] {
        &self.0
    }

    pub fn get(&self, i: usize) -> Option<&CqlValue> {
        self.0.get(i)
    }

    pub fn into_inner(self) -> Vec<CqlValue> {
        self.0
    }
}

impl From<Vec<CqlValue>> for Values {
    fn from(v: Vec<CqlValue>) -> Self {
        Self(v)
    }
}

impl FromIterator<CqlValue> for Values {
    fn from_iter<I: IntoIterator<Item = CqlValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::ops::Index<usize> for Values {
    type Output = CqlValue;

    fn index(&self, i: usize) -> &CqlValue {
        &self.0[i]
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = &'a CqlValue;
    type IntoIter = std::slice::Iter<'a, CqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A partition-key value together with the token it hashes to.
///
/// The token is a pure function of the partition-key prefix of `value`; two
/// equal prefixes always carry equal tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueWithToken {
    pub value: Values,
    pub token: u64,
}
