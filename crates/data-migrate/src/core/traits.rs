//! Core traits for database-agnostic table migration.
//!
//! The engine needs very little from a database:
//!
//! - [`Connection`]: prepares statements and names its SQL [`Dialect`]
//! - [`Statement`]: a prepared statement, run as a query or as a write
//! - [`RowSet`]: the rows of one query execution
//!
//! Drivers (see `drivers/`) implement these for a concrete database; tests use
//! an in-memory implementation.

use async_trait::async_trait;

use crate::error::Result;

use super::row::{ColumnInfo, Row};
use super::value::SqlValue;

/// A database handle that can prepare statements.
///
/// Handles are shared (`Arc<dyn Connection>`) between every table that lives
/// in the same database, so implementations must be `Send + Sync`.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Prepare a parameterized statement for repeated execution.
    async fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>>;

    /// SQL syntax used by this database.
    fn dialect(&self) -> &dyn Dialect;

    /// Database type identifier (e.g. "mysql").
    fn db_type(&self) -> &str;
}

/// A prepared statement bound to a connection.
///
/// A statement is used from one migration at a time; it is `Send` so it can
/// be held across await points, but not shared.
#[async_trait]
pub trait Statement: Send {
    /// SQL text this statement was prepared from.
    fn sql(&self) -> &str;

    /// Execute as a query with positional parameters.
    ///
    /// The returned row set exposes its columns before the first row is read.
    async fn query(&mut self, params: &[SqlValue]) -> Result<Box<dyn RowSet>>;

    /// Execute as a write with positional parameters.
    async fn execute(&mut self, params: &[SqlValue]) -> Result<()>;

    /// Release the statement on the server.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Rows produced by one execution of a query statement.
#[async_trait]
pub trait RowSet: Send {
    /// Column names and type descriptors, in select order.
    fn columns(&self) -> &[ColumnInfo];

    /// Read the next row, or `None` when the row set is exhausted.
    async fn next_row(&mut self) -> Result<Option<Row>>;

    /// Release any resources still held by the row set.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// SQL syntax strategy for different database engines.
///
/// Statement text for the page query and the insert statement is generated
/// by default methods from [`quote_ident`](Dialect::quote_ident) and
/// [`param_placeholder`](Dialect::param_placeholder); upserts have no portable
/// form and must be provided by each dialect.
pub trait Dialect: Send + Sync {
    /// Get the dialect identifier (e.g., "mysql").
    fn name(&self) -> &str;

    /// Quote an identifier (table name, column name, etc.).
    fn quote_ident(&self, name: &str) -> String;

    /// Get a parameter placeholder for the given 1-based index.
    fn param_placeholder(&self, index: usize) -> String;

    /// Qualify a table name with its logical database.
    ///
    /// An empty database name leaves the table unqualified so the
    /// connection's default database is used.
    fn qualify_table(&self, database: &str, table: &str) -> String {
        if database.is_empty() {
            self.quote_ident(table)
        } else {
            format!("{}.{}", self.quote_ident(database), self.quote_ident(table))
        }
    }

    /// Comma separated placeholders for `count` parameters starting at `first`.
    fn placeholders(&self, first: usize, count: usize) -> String {
        (first..first + count)
            .map(|i| self.param_placeholder(i))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Build the page query: `SELECT * FROM t LIMIT ? OFFSET ?`.
    fn build_page_query(&self, database: &str, table: &str) -> String {
        format!(
            "SELECT * FROM {} LIMIT {} OFFSET {}",
            self.qualify_table(database, table),
            self.param_placeholder(1),
            self.param_placeholder(2)
        )
    }

    /// Build an insert with one placeholder per column, in column order.
    fn build_insert_query(&self, database: &str, table: &str, columns: &[String]) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.qualify_table(database, table),
            self.column_list(columns),
            self.placeholders(1, columns.len())
        )
    }

    /// Build an insert-or-update statement.
    ///
    /// Binds are the column values in order for the insert clause, followed
    /// by the same values in the same order for the update clause.
    fn build_upsert_query(&self, database: &str, table: &str, columns: &[String]) -> String;

    /// Quoted, comma separated column list.
    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
