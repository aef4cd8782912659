//! Shared holder for a lazily prepared destination statement.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::core::Statement;
use crate::error::Result;

/// A prepared write statement and the column shape it was generated for.
pub(crate) struct PreparedWrite {
    pub(crate) statement: Box<dyn Statement>,
    pub(crate) columns: Vec<String>,
}

/// Holder for a destination statement that is prepared on first use.
///
/// The writer that prepares the statement and the caller that eventually
/// releases it share the slot. The engine never closes it: register
/// [`StatementSlot::close_quietly`] as a cleanup action, or call
/// [`StatementSlot::close`] yourself once the slot is no longer needed.
///
/// A slot may be reused by several sequential migrations; each reuse must
/// feed rows of the same column shape.
#[derive(Clone, Default)]
pub struct StatementSlot {
    inner: Arc<Mutex<Option<PreparedWrite>>>,
}

impl StatementSlot {
    /// An empty slot; nothing is prepared until the first row arrives.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> &Mutex<Option<PreparedWrite>> {
        &self.inner
    }

    /// Whether a statement is currently prepared.
    pub async fn is_prepared(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// SQL text of the prepared statement, if any.
    pub async fn sql(&self) -> Option<String> {
        self.inner
            .lock()
            .await
            .as_ref()
            .map(|p| p.statement.sql().to_string())
    }

    /// Close the prepared statement, if any. The slot is empty afterwards
    /// and will prepare again on next use.
    pub async fn close(&self) -> Result<()> {
        let prepared = self.inner.lock().await.take();
        match prepared {
            Some(p) => p.statement.close().await,
            None => Ok(()),
        }
    }

    /// Close the prepared statement and log, rather than return, a failure.
    ///
    /// Suitable as a migration cleanup action.
    pub async fn close_quietly(&self) {
        if let Err(e) = self.close().await {
            warn!("Failed to close destination statement: {}", e);
        }
    }
}

impl fmt::Debug for StatementSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prepared = self.inner.try_lock().map(|g| g.is_some()).ok();
        f.debug_struct("StatementSlot")
            .field("prepared", &prepared)
            .finish()
    }
}
