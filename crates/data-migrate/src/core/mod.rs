//! Core abstractions for database-agnostic table migration.
//!
//! - [`value`]: dynamically typed column values
//! - [`row`]: scanned rows and their column descriptors
//! - [`table`]: table handles (connection + database + table)
//! - [`traits`]: connection, statement, row set and dialect traits
//!
//! Drivers implement the traits; the engine, pipeline and statement builders
//! only ever talk to the traits.

pub mod row;
pub mod table;
pub mod traits;
pub mod value;

pub use row::{Column, ColumnInfo, ColumnType, Row};
pub use table::TableHandle;
pub use traits::{Connection, Dialect, RowSet, Statement};
pub use value::SqlValue;
