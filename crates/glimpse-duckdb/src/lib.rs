pub mod apps;
pub mod backend;
pub mod queries;
pub mod schema;
pub mod settings;
pub mod store_impl;

pub use backend::DuckDbBackend;

/// Re-export the `duckdb` crate so tests can use `glimpse_duckdb::duckdb::params!`
/// without an extra dependency.
pub use duckdb;
