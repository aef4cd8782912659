//! MySQL/MariaDB SQL dialect (Strategy pattern).
//!
//! Provides MySQL-specific SQL syntax for identifier quoting, query building,
//! and parameter placeholders.

use crate::core::traits::Dialect;

/// MySQL/MariaDB dialect implementation.
///
/// Compatible with MySQL 5.7+, 8.0+, and MariaDB 10.2+.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MysqlDialect {
    fn name(&self) -> &str {
        "mysql"
    }

    fn quote_ident(&self, name: &str) -> String {
        // Backticks inside a name are escaped by doubling them
        format!("`{}`", name.replace('`', "``"))
    }

    fn param_placeholder(&self, _index: usize) -> String {
        // The binary protocol only knows positional `?`
        "?".to_string()
    }

    fn build_upsert_query(&self, database: &str, table: &str, columns: &[String]) -> String {
        let update_set = columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "{} = {}",
                    self.quote_ident(c),
                    self.param_placeholder(columns.len() + i + 1)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{} ON DUPLICATE KEY UPDATE {}",
            self.build_insert_query(database, table, columns),
            update_set
        )
    }
}
