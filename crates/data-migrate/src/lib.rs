//! # data-migrate
//!
//! Copy a relational table into another table, row by row, through a chain
//! of row processors.
//!
//! - **Paginated reads** with `LIMIT ? OFFSET ?` over one prepared statement
//! - **Row processors** that transform, skip or write each row
//! - **Insert and upsert writers** prepared lazily from the first row
//! - **Guaranteed cleanup** of registered actions whatever the outcome
//! - **Concurrent tables** driven from a YAML configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use data_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> data_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let result = orchestrator.run().await?;
//!     println!("Migrated {} rows", result.rows_written);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod dialect;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod statement;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenient access
pub use config::{Config, ConnectionConfig, MigrationConfig, TableSpec};
pub use self::core::{Column, ColumnInfo, ColumnType, Connection, Dialect, Row, RowSet, SqlValue, Statement, TableHandle};
pub use engine::{Migration, MigrationStats};
pub use error::{MigrateError, Result};
pub use orchestrator::{MigrationResult, Orchestrator, TableResult};
pub use pipeline::{processor_fn, Pipeline, RowAction, RowProcessor};
pub use statement::{RowWriter, StatementSlot, WriteMode};
