//! Migration orchestrator - runs the configured table migrations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::{Config, TableSpec};
use crate::core::{Connection, TableHandle};
use crate::drivers;
use crate::engine::Migration;
use crate::error::Result;
use crate::pipeline::{DropColumns, RenameColumns, RowCounter, SkipNull};
use crate::statement::{RowWriter, StatementSlot};

/// Migration orchestrator.
pub struct Orchestrator {
    config: Config,
    source: Arc<dyn Connection>,
    target: Arc<dyn Connection>,
}

/// Outcome of one table migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableResult {
    /// Source table, qualified with its database when one is configured.
    pub source: String,

    /// Target table, qualified the same way.
    pub target: String,

    /// Rows read from the source.
    pub rows_read: u64,

    /// Rows skipped by a transform.
    pub rows_skipped: u64,

    /// Rows written to the target.
    pub rows_written: u64,

    /// Page queries issued.
    pub pages: u64,

    pub duration_seconds: f64,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Per-table results, in configuration order.
    pub tables: Vec<TableResult>,

    /// Total rows read.
    pub rows_read: u64,

    /// Total rows written.
    pub rows_written: u64,

    /// Average write throughput (rows/second).
    pub rows_per_second: u64,
}

impl Orchestrator {
    /// Validate the configuration and connect to both databases.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let max_conns = config.migration.max_connections();
        let source = drivers::connect(&config.source, max_conns).await?;
        let target = drivers::connect(&config.target, max_conns).await?;
        Ok(Self::with_connections(config, source, target))
    }

    /// Build an orchestrator over already open connections.
    pub fn with_connections(
        config: Config,
        source: Arc<dyn Connection>,
        target: Arc<dyn Connection>,
    ) -> Self {
        Self {
            config,
            source,
            target,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Migrate every configured table.
    ///
    /// Up to `migration.workers` tables run at once. The first table error
    /// stops the run: tables not yet started are not migrated, while migrations
    /// already in flight run to completion and release their statements. The
    /// first error to occur is returned.
    pub async fn run(self) -> Result<MigrationResult> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let start = Instant::now();
        let workers = self.config.migration.workers.max(1);

        info!(
            "Starting run {}: {} tables, {} workers, {} mode, page size {}",
            run_id,
            self.config.tables.len(),
            workers,
            self.config.migration.mode.as_str(),
            self.config.migration.page_size
        );

        let this = &self;
        let failed = AtomicBool::new(false);
        let failed = &failed;
        let outcomes: Vec<Option<(usize, Result<TableResult>)>> =
            stream::iter(self.config.tables.iter().enumerate())
                .map(|(i, table)| async move {
                    if failed.load(Ordering::SeqCst) {
                        return None;
                    }
                    let outcome = this.migrate_table(table).await;
                    if outcome.is_err() {
                        failed.store(true, Ordering::SeqCst);
                    }
                    Some((i, outcome))
                })
                .buffer_unordered(workers)
                .collect()
                .await;

        let mut tables = Vec::with_capacity(outcomes.len());
        for (i, outcome) in outcomes.into_iter().flatten() {
            match outcome {
                Ok(result) => tables.push((i, result)),
                Err(e) => {
                    error!("Run {} failed: {}", run_id, e);
                    return Err(e);
                }
            }
        }
        tables.sort_by_key(|(i, _)| *i);
        let tables: Vec<TableResult> = tables.into_iter().map(|(_, t)| t).collect();

        let duration = start.elapsed().as_secs_f64();
        let rows_read = tables.iter().map(|t| t.rows_read).sum();
        let rows_written: u64 = tables.iter().map(|t| t.rows_written).sum();
        let rows_per_second = if duration > 0.0 {
            (rows_written as f64 / duration) as u64
        } else {
            0
        };

        info!(
            "Run {} complete: {} rows written across {} tables in {:.1}s",
            run_id,
            rows_written,
            tables.len(),
            duration
        );

        Ok(MigrationResult {
            run_id,
            duration_seconds: duration,
            started_at,
            completed_at: Utc::now(),
            tables,
            rows_read,
            rows_written,
            rows_per_second,
        })
    }

    async fn migrate_table(&self, table: &TableSpec) -> Result<TableResult> {
        let from = TableHandle::new(
            Arc::clone(&self.source),
            &self.config.source.database,
            &table.source,
        );
        let to = TableHandle::new(
            Arc::clone(&self.target),
            &self.config.target.database,
            table.target_table(),
        );
        let (source, target) = (from.to_string(), to.to_string());

        let slot = StatementSlot::new();
        let written = RowCounter::new();

        let mut migration = Migration::new(from, self.config.migration.page_size)?;
        if !table.skip_null.is_empty() {
            migration = migration.with_processor(SkipNull::new(table.skip_null.iter().cloned()));
        }
        if !table.drop_columns.is_empty() {
            migration =
                migration.with_processor(DropColumns::new(table.drop_columns.iter().cloned()));
        }
        if !table.rename_columns.is_empty() {
            migration = migration.with_processor(RenameColumns::new(
                table.rename_columns
                    .iter()
                    .map(|(from, to)| (from.clone(), to.clone())),
            ));
        }
        let cleanup = slot.clone();
        let stats = migration
            .with_processor(RowWriter::new(slot, to, self.config.migration.mode))
            .with_processor(written.clone())
            .with_defer(move || async move { cleanup.close_quietly().await })
            .run()
            .await?;

        Ok(TableResult {
            source,
            target,
            rows_read: stats.rows_read,
            rows_skipped: stats.rows_skipped,
            rows_written: written.get(),
            pages: stats.pages,
            duration_seconds: stats.elapsed.as_secs_f64(),
        })
    }
}

impl MigrationResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
