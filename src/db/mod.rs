//! Database layer - connection pooling, table schema lookup and the SQLite record store

pub mod pool;
pub mod schema;
pub mod store;

pub use pool::Pool;
pub use schema::{TableSchema, query_table_schema};
pub use store::{DuplicatePolicy, SqliteRecordStore};
