use serde::{Deserialize, Serialize};

use crate::schema::SchemaError;

/// Bounds for random schema generation.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaConfig {
    pub max_tables: usize,
    pub min_partition_keys: usize,
    pub max_partition_keys: usize,
    pub min_clustering_keys: usize,
    pub max_clustering_keys: usize,
    pub min_columns: usize,
    pub max_columns: usize,
    pub max_tuple_parts: usize,
    pub max_udt_parts: usize,
    /// Probability that a generated table is a counter table.
    pub counter_table_chance: f64,
    pub max_indexes: usize,
    pub max_materialized_views: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_tables: 1,
            min_partition_keys: 1,
            max_partition_keys: 3,
            min_clustering_keys: 0,
            max_clustering_keys: 3,
            min_columns: 2,
            max_columns: 8,
            max_tuple_parts: 4,
            max_udt_parts: 4,
            counter_table_chance: 0.1,
            max_indexes: 2,
            max_materialized_views: 2,
        }
    }
}

impl SchemaConfig {
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.max_tables == 0 {
            return Err(SchemaError::InvalidConfig("max_tables must be positive"));
        }
        if self.min_partition_keys == 0 || self.min_partition_keys > self.max_partition_keys {
            return Err(SchemaError::InvalidConfig(
                "partition key bounds must satisfy 1 <= min <= max",
            ));
        }
        if self.min_clustering_keys > self.max_clustering_keys {
            return Err(SchemaError::InvalidConfig(
                "clustering key bounds must satisfy min <= max",
            ));
        }
        if self.min_columns == 0 || self.min_columns > self.max_columns {
            return Err(SchemaError::InvalidConfig(
                "column bounds must satisfy 1 <= min <= max",
            ));
        }
        if self.max_tuple_parts < 2 {
            return Err(SchemaError::InvalidConfig("tuples need at least 2 parts"));
        }
        if self.max_udt_parts == 0 {
            return Err(SchemaError::InvalidConfig("UDTs need at least 1 field"));
        }
        if !(0.0..=1.0).contains(&self.counter_table_chance) {
            return Err(SchemaError::InvalidConfig(
                "counter_table_chance must be a probability",
            ));
        }
        Ok(())
    }
}

/// Bounds applied to every generated scalar, plus the LWT switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionRangeConfig {
    pub min_blob_length: usize,
    pub max_blob_length: usize,
    pub min_string_length: usize,
    pub max_string_length: usize,
    /// Allow emitting IF NOT EXISTS inserts.
    pub use_lwt: bool,
}

impl Default for PartitionRangeConfig {
    fn default() -> Self {
        Self {
            min_blob_length: 1,
            max_blob_length: 32,
            min_string_length: 1,
            max_string_length: 16,
            use_lwt: false,
        }
    }
}

/// A half-open sub-range `[min, max)` of partition-key seeds owned by one
/// worker. Ranges are disjoint across workers and together cover
/// `[0, threads * keys_per_thread)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionRange {
    pub min: u64,
    pub max: u64,
}

impl PartitionRange {
    pub fn len(&self) -> u64 {
        self.max.saturating_sub(self.min)
    }

    pub fn is_empty(&self) -> bool {
        self.min >= self.max
    }

    pub fn contains(&self, seed: u64) -> bool {
        (self.min..self.max).contains(&seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SchemaConfig::default().validate().expect("default bounds");
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let cfg = SchemaConfig {
            min_columns: 9,
            max_columns: 3,
            ..SchemaConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partition_range_contains_is_half_open() {
        let r = PartitionRange { min: 10, max: 20 };
        assert!(r.contains(10));
        assert!(r.contains(19));
        assert!(!r.contains(20));
        assert_eq!(r.len(), 10);
    }
}
