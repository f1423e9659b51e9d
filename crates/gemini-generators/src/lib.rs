//! Random schema and statement generation.
//!
//! Everything here is deterministic given a PRNG: the same seed always yields
//! the same schema, the same partition keys, and the same token stream. No
//! module touches a process-global random source.

pub mod schema_gen;
pub mod seeds;
pub mod statements;
pub mod token;

pub use schema_gen::{gen_column_name, gen_index_name, gen_schema, SchemaBuilder};
pub use seeds::mix_seed;
pub use statements::{
    gen_check_stmt, gen_clustering_range_query, gen_delete_range, gen_delete_rows,
    gen_insert_json_stmt, gen_insert_stmt, gen_multiple_partition_query, gen_mutate_stmt,
    gen_mv_query, gen_partition_key_for_seed, gen_single_index_query,
    gen_single_partition_query, gen_update_stmt, PartitionCursor,
};
pub use token::{serialize_cell, token_for_partition_key};
