//! Error types for the migration library.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// Preparing a statement failed
    #[error("Failed to prepare statement `{sql}`: {message}")]
    Prepare { sql: String, message: String },

    /// Running a query or reading its rows failed
    #[error("Query `{sql}` failed: {message}")]
    Query { sql: String, message: String },

    /// Executing a write statement failed
    #[error("Statement `{sql}` failed: {message}")]
    Execute { sql: String, message: String },

    /// A row did not have the columns the destination statement was prepared for
    #[error("Row shape changed for {table}: statement prepared for [{expected}], row has [{found}]")]
    ShapeMismatch {
        table: String,
        expected: String,
        found: String,
    },

    /// A statement handle was used after it was closed
    #[error("Statement already closed: {0}")]
    StatementClosed(String),

    /// A caller supplied row processor failed
    #[error("Row processor failed: {0}")]
    Processor(String),

    /// MySQL driver error
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql_async::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        MigrateError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    pub fn prepare(sql: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Prepare {
            sql: sql.into(),
            message: message.to_string(),
        }
    }

    pub fn query(sql: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Query {
            sql: sql.into(),
            message: message.to_string(),
        }
    }

    pub fn execute(sql: impl Into<String>, message: impl ToString) -> Self {
        MigrateError::Execute {
            sql: sql.into(),
            message: message.to_string(),
        }
    }

    /// Create a Processor error from any displayable message.
    pub fn processor(message: impl ToString) -> Self {
        MigrateError::Processor(message.to_string())
    }

    /// Process exit code for the CLI.
    ///
    /// Configuration problems exit with 2 so wrappers can tell a bad config
    /// apart from a failed migration.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => 2,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("bad".into()).exit_code(), 2);
        assert_eq!(MigrateError::processor("boom").exit_code(), 1);
        assert_eq!(MigrateError::query("SELECT 1", "gone").exit_code(), 1);
    }

    #[test]
    fn test_format_detailed_includes_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.yaml");
        let err = MigrateError::from(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error: missing.yaml"));
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = MigrateError::ShapeMismatch {
            table: "`shop`.`users`".into(),
            expected: "id, name".into(),
            found: "id".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("[id, name]"));
        assert!(msg.contains("row has [id]"));
    }
}
