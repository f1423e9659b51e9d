//! Partition token computation.
//!
//! Tokens come from the cluster's standard partitioner: MurmurHash3 x64-128
//! over the serialized partition key, keeping the first 64-bit half. The
//! Cassandra-family variant sign-extends tail bytes (the original Java code
//! reads `byte`, which is signed), so a faithful port must do the same or
//! routing would disagree with the cluster.

use gemini_typedef::{Columns, CqlValue, Values};

const C1: i64 = 0x87c3_7b91_1142_53d5_u64 as i64;
const C2: i64 = 0x4cf5_ad43_2745_937f_u64 as i64;

fn fmix(mut k: i64) -> i64 {
    k ^= ((k as u64) >> 33) as i64;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd_u64 as i64);
    k ^= ((k as u64) >> 33) as i64;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53_u64 as i64);
    k ^= ((k as u64) >> 33) as i64;
    k
}

/// MurmurHash3 x64-128, first half, Cassandra byte-sign semantics.
pub fn murmur3_token(data: &[u8]) -> u64 {
    let nblocks = data.len() / 16;
    let mut h1: i64 = 0;
    let mut h2: i64 = 0;

    for block in 0..nblocks {
        let base = block * 16;
        let mut k1 = i64::from_le_bytes(data[base..base + 8].try_into().expect("8-byte block"));
        let mut k2 =
            i64::from_le_bytes(data[base + 8..base + 16].try_into().expect("8-byte block"));

        k1 = k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2);
        h1 ^= k1;
        h1 = h1
            .rotate_left(27)
            .wrapping_add(h2)
            .wrapping_mul(5)
            .wrapping_add(0x52dc_e729);

        k2 = k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1);
        h2 ^= k2;
        h2 = h2
            .rotate_left(31)
            .wrapping_add(h1)
            .wrapping_mul(5)
            .wrapping_add(0x3849_5ab5);
    }

    let tail = &data[nblocks * 16..];
    let mut k1: i64 = 0;
    let mut k2: i64 = 0;
    if tail.len() > 8 {
        for i in (8..tail.len()).rev() {
            k2 ^= i64::from(tail[i] as i8) << ((i - 8) * 8);
        }
        k2 = k2.wrapping_mul(C2).rotate_left(33).wrapping_mul(C1);
        h2 ^= k2;
    }
    if !tail.is_empty() {
        for i in (0..tail.len().min(8)).rev() {
            k1 ^= i64::from(tail[i] as i8) << (i * 8);
        }
        k1 = k1.wrapping_mul(C1).rotate_left(31).wrapping_mul(C2);
        h1 ^= k1;
    }

    let len = data.len() as i64;
    h1 ^= len;
    h2 ^= len;
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    h1 = fmix(h1);
    h2 = fmix(h2);
    h1.wrapping_add(h2) as u64
}

/// Serialize one cell into its key-comparable wire form (big-endian scalars,
/// raw bytes for strings and blobs).
pub fn serialize_cell(value: &CqlValue) -> Vec<u8> {
    match value {
        CqlValue::Ascii(s) | CqlValue::Text(s) | CqlValue::Varchar(s) => s.as_bytes().to_vec(),
        CqlValue::BigInt(v) | CqlValue::Counter(v) | CqlValue::Time(v) | CqlValue::Timestamp(v) => {
            v.to_be_bytes().to_vec()
        }
        CqlValue::Blob(b) => b.clone(),
        CqlValue::Boolean(b) => vec![u8::from(*b)],
        CqlValue::Date(d) => d.to_be_bytes().to_vec(),
        CqlValue::Decimal(d) => {
            let mut out = d.scale.to_be_bytes().to_vec();
            out.extend_from_slice(&d.unscaled.to_be_bytes());
            out
        }
        CqlValue::Double(v) => v.to_bits().to_be_bytes().to_vec(),
        CqlValue::Duration(d) => {
            let mut out = d.months.to_be_bytes().to_vec();
            out.extend_from_slice(&d.days.to_be_bytes());
            out.extend_from_slice(&d.nanos.to_be_bytes());
            out
        }
        CqlValue::Float(v) => v.to_bits().to_be_bytes().to_vec(),
        CqlValue::Inet(ip) => match ip {
            std::net::IpAddr::V4(a) => a.octets().to_vec(),
            std::net::IpAddr::V6(a) => a.octets().to_vec(),
        },
        CqlValue::Int(v) => v.to_be_bytes().to_vec(),
        CqlValue::SmallInt(v) => v.to_be_bytes().to_vec(),
        CqlValue::TinyInt(v) => v.to_be_bytes().to_vec(),
        CqlValue::TimeUuid(u) | CqlValue::Uuid(u) => u.as_bytes().to_vec(),
        CqlValue::Varint(v) => v.to_be_bytes().to_vec(),
        CqlValue::List(items) | CqlValue::Set(items) | CqlValue::Tuple(items) => {
            let mut out = Vec::new();
            for item in items {
                let bytes = serialize_cell(item);
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(&bytes);
            }
            out
        }
        CqlValue::Map(pairs) => {
            let mut out = Vec::new();
            for (k, v) in pairs {
                for bytes in [serialize_cell(k), serialize_cell(v)] {
                    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                    out.extend_from_slice(&bytes);
                }
            }
            out
        }
        CqlValue::Udt(fields) => {
            let mut out = Vec::new();
            for (_, v) in fields {
                let bytes = serialize_cell(v);
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(&bytes);
            }
            out
        }
    }
}

/// Token of a full partition key. Single-column keys hash their raw
/// serialized form; composite keys use the length-prefixed component layout
/// the cluster uses for composites.
pub fn token_for_partition_key(partition_keys: &Columns, values: &Values) -> u64 {
    let mut components: Vec<Vec<u8>> = Vec::with_capacity(partition_keys.len());
    let mut cursor = 0usize;
    for col in partition_keys {
        let width = col.typ.len_value();
        let cells = &values.as_slice()[cursor..cursor + width];
        cursor += width;
        let mut bytes = Vec::new();
        for cell in cells {
            bytes.extend_from_slice(&serialize_cell(cell));
        }
        components.push(bytes);
    }

    if components.len() == 1 {
        return murmur3_token(&components[0]);
    }
    let mut composite = Vec::new();
    for component in &components {
        composite.extend_from_slice(&(component.len() as u16).to_be_bytes());
        composite.extend_from_slice(component);
        composite.push(0);
    }
    murmur3_token(&composite)
}
