//! Table identity: which connection, which logical database, which table.

use std::fmt;
use std::sync::Arc;

use super::traits::Connection;

/// A table within a database, together with a connection to that database.
///
/// Handles are cheap to clone; clones share the same connection.
#[derive(Clone)]
pub struct TableHandle {
    connection: Arc<dyn Connection>,
    database: String,
    table: String,
}

impl TableHandle {
    pub fn new(
        connection: Arc<dyn Connection>,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            database: database.into(),
            table: table.into(),
        }
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Logical database name; empty means the connection default.
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The table name as it appears in generated SQL.
    pub fn qualified_name(&self) -> String {
        self.connection
            .dialect()
            .qualify_table(&self.database, &self.table)
    }
}

impl fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableHandle")
            .field("db_type", &self.connection.db_type())
            .field("database", &self.database)
            .field("table", &self.table)
            .finish()
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.database.is_empty() {
            f.write_str(&self.table)
        } else {
            write!(f, "{}.{}", self.database, self.table)
        }
    }
}
