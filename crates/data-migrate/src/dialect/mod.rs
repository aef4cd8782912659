//! SQL dialects.
//!
//! Dialects generate the statement text the engine and the statement
//! builders prepare. They are independent of any driver so that SQL
//! generation can be tested without a database.
//!
//! - [`MysqlDialect`]: MySQL / MariaDB syntax

mod mysql;

pub use mysql::MysqlDialect;

use crate::core::traits::Dialect;
use crate::error::{MigrateError, Result};

/// Look up a dialect by database type name.
///
/// # Errors
///
/// Returns an error if the database type is not recognized.
pub fn from_db_type(db_type: &str) -> Result<Box<dyn Dialect>> {
    match db_type.to_lowercase().as_str() {
        "mysql" | "mariadb" => Ok(Box::new(MysqlDialect::new())),
        other => Err(MigrateError::Config(format!(
            "Unknown database type: '{}'. Supported types: mysql",
            other
        ))),
    }
}
