//! # Kickstat Database Crate
//!
//! This crate is the application's interface to the PostgreSQL warehouse that
//! fetched match data is stored in and validated against.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All `sqlx` specifics live here. Callers see `Row`, `Value` and
//!   `Table` from `core-types`, never driver types.
//! - **Transactional Sessions:** Work happens inside a `DbSession`, which wraps one
//!   transaction and ends with an explicit `commit` or `rollback`.
//! - **Trait Seams:** `SessionFactory` and `QueryExecutor` let the validator run
//!   against any session implementation, including in-memory ones in tests.
//!
//! ## Public API
//!
//! - `connect` / `connect_options`: build the connection pool from credentials.
//! - `Database`: the pool holder; opens sessions and lists tables.
//! - `DbSession`: convenience queries (`select_all`, `select_one`, ...) and whole-table
//!   reads and writes (`write_table`, `read_table`, `query_table`).
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod decode;
pub mod error;
pub mod executor;
pub mod frames;
pub mod repository;
pub mod session;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, connect_options};
pub use error::DbError;
pub use executor::{QueryExecutor, SessionFactory};
pub use frames::{ColumnType, DEFAULT_CHUNK_CELLS, WriteMode, quote_identifier};
pub use session::{Database, DbSession};
