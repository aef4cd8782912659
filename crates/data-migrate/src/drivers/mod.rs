//! Database driver implementations.
//!
//! Each driver implements the core traits for one database engine:
//!
//! - [`mysql`]: MySQL / MariaDB via `mysql_async`
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/`
//! 2. Implement `Connection`, `Statement` and `RowSet`
//! 3. Add a `Dialect` under `dialect/` and register it in `dialect::from_db_type`
//! 4. Gate the driver with a feature flag in `Cargo.toml`

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "mysql")]
pub use mysql::MysqlConnection;

use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::core::Connection;
use crate::error::{MigrateError, Result};

/// Open a pooled connection for the database type named by the URL scheme.
#[cfg_attr(not(feature = "mysql"), allow(unused_variables))]
pub async fn connect(config: &ConnectionConfig, max_conns: usize) -> Result<Arc<dyn Connection>> {
    let db_type = config.db_type().unwrap_or_default().to_lowercase();
    match db_type.as_str() {
        #[cfg(feature = "mysql")]
        "mysql" | "mariadb" => {
            // mysql_async only accepts the mysql:// scheme
            let url = match config.url.split_once("://") {
                Some((_, rest)) => format!("mysql://{}", rest),
                None => config.url.clone(),
            };
            let conn = mysql::MysqlConnection::connect(&url, max_conns).await?;
            Ok(Arc::new(conn))
        }
        other => Err(MigrateError::Config(format!(
            "No driver available for database type '{}' ({})",
            other,
            config.redacted_url()
        ))),
    }
}
