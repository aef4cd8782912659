//! Paginated table migration engine.
//!
//! A [`Migration`] reads the source table page by page with
//! `SELECT * FROM t LIMIT ? OFFSET ?`, hands every row to its processor
//! pipeline, and stops at the first empty page. The select statement is
//! prepared on the first fetch and reused for every page.
//!
//! Whatever the outcome, the registered cleanup actions run once in
//! registration order, and the select statement is closed, before
//! [`Migration::run`] returns.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{RowSet, SqlValue, Statement, TableHandle};
use crate::error::{MigrateError, Result};
use crate::pipeline::{Pipeline, RowAction, RowProcessor};

type Cleanup = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Statistics from a completed migration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationStats {
    /// Page queries issued, including the final empty page.
    pub pages: u64,

    /// Rows read from the source.
    pub rows_read: u64,

    /// Rows a processor asked to skip.
    pub rows_skipped: u64,

    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl MigrationStats {
    /// Rows that made it through every processor.
    pub fn rows_accepted(&self) -> u64 {
        self.rows_read - self.rows_skipped
    }

    /// Average read throughput.
    pub fn rows_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.rows_read as f64 / secs
        } else {
            0.0
        }
    }
}

/// Migration of one source table through a processor pipeline.
///
/// Built once per table, configured with processors and cleanup actions, then
/// consumed by [`run`](Migration::run).
pub struct Migration {
    from: TableHandle,
    pipeline: Pipeline,
    defers: Vec<Cleanup>,
    page_size: usize,
    select: Option<Box<dyn Statement>>,
}

impl Migration {
    /// Create a migration reading `from` in pages of `page_size` rows.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `page_size` is zero.
    pub fn new(from: TableHandle, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(MigrateError::Config(
                "page size must be at least 1".into(),
            ));
        }
        Ok(Self {
            from,
            pipeline: Pipeline::new(),
            defers: Vec::new(),
            page_size,
            select: None,
        })
    }

    /// Append a row processor. Processors run in the order they are added.
    pub fn with_processor<P: RowProcessor + 'static>(mut self, processor: P) -> Self {
        self.pipeline.push(Box::new(processor));
        self
    }

    /// Append a cleanup action, run once when the migration ends whether it
    /// succeeded or not. Cleanup actions cannot fail the migration.
    pub fn with_defer<F, Fut>(mut self, cleanup: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.defers
            .push(Box::new(move || -> BoxFuture<'static, ()> { Box::pin(cleanup()) }));
        self
    }

    pub fn source(&self) -> &TableHandle {
        &self.from
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Copy every row of the source table through the pipeline.
    ///
    /// Returns the first error raised by a page fetch or a processor, after
    /// cleanup has run.
    pub async fn run(mut self) -> Result<MigrationStats> {
        info!(
            "Starting migration of {} (page size: {}, processors: {:?})",
            self.from, self.page_size, self.pipeline
        );

        let start = Instant::now();
        let mut stats = MigrationStats::default();
        let result = self.migrate_pages(&mut stats).await;
        self.finish().await;
        stats.elapsed = start.elapsed();

        match result {
            Ok(()) => {
                info!(
                    "{}: migrated {} rows ({} skipped) in {} pages, {:.1}s",
                    self.from,
                    stats.rows_read,
                    stats.rows_skipped,
                    stats.pages,
                    stats.elapsed.as_secs_f64()
                );
                Ok(stats)
            }
            Err(e) => {
                warn!(
                    "{}: migration failed after {} rows: {}",
                    self.from, stats.rows_read, e
                );
                Err(e)
            }
        }
    }

    async fn migrate_pages(&mut self, stats: &mut MigrationStats) -> Result<()> {
        let mut offset = 0usize;
        loop {
            let rows = self.migrate_page(offset, stats).await?;
            if rows == 0 {
                debug!("{}: no more rows at offset {}", self.from, offset);
                return Ok(());
            }
            offset += self.page_size;
        }
    }

    /// Fetch and process one page, returning the number of rows it held.
    async fn migrate_page(&mut self, offset: usize, stats: &mut MigrationStats) -> Result<u64> {
        let params = [
            SqlValue::U64(self.page_size as u64),
            SqlValue::U64(offset as u64),
        ];

        let mut rows = {
            let select = self.select_statement().await?;
            select.query(&params).await?
        };
        stats.pages += 1;

        if offset == 0 {
            let columns: Vec<&str> = rows.columns().iter().map(|c| c.name.as_str()).collect();
            debug!("{}: source columns {:?}", self.from, columns);
        }

        let result = process_page(&mut self.pipeline, rows.as_mut(), stats).await;
        if let Err(e) = rows.close().await {
            warn!("{}: failed to close row set: {}", self.from, e);
        }
        let count = result?;

        debug!("{}: page at offset {} held {} rows", self.from, offset, count);
        Ok(count)
    }

    async fn select_statement(&mut self) -> Result<&mut Box<dyn Statement>> {
        if self.select.is_none() {
            let sql = self
                .from
                .connection()
                .dialect()
                .build_page_query(self.from.database(), self.from.table());
            debug!("{}: preparing page query: {}", self.from, sql);
            self.select = Some(self.from.connection().prepare(&sql).await?);
        }
        self.select
            .as_mut()
            .ok_or_else(|| MigrateError::StatementClosed(self.from.to_string()))
    }

    /// Run cleanup actions, then release the select statement.
    async fn finish(&mut self) {
        for cleanup in self.defers.drain(..) {
            cleanup().await;
        }
        if let Some(select) = self.select.take() {
            if let Err(e) = select.close().await {
                warn!("{}: failed to close page query: {}", self.from, e);
            }
        }
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("from", &self.from)
            .field("page_size", &self.page_size)
            .field("pipeline", &self.pipeline)
            .field("defers", &self.defers.len())
            .finish()
    }
}

async fn process_page(
    pipeline: &mut Pipeline,
    rows: &mut dyn RowSet,
    stats: &mut MigrationStats,
) -> Result<u64> {
    let mut count = 0;
    while let Some(mut row) = rows.next_row().await? {
        count += 1;
        stats.rows_read += 1;
        if pipeline.process(&mut row).await? == RowAction::Skip {
            stats.rows_skipped += 1;
        }
    }
    Ok(count)
}
