//! Insert and upsert row writers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Row, SqlValue, TableHandle};
use crate::error::{MigrateError, Result};
use crate::pipeline::{RowAction, RowProcessor};

use super::slot::{PreparedWrite, StatementSlot};

/// How rows are written to the destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Plain `INSERT`; duplicate keys fail the migration.
    Insert,

    /// `INSERT ... ON DUPLICATE KEY UPDATE` every column.
    #[default]
    Upsert,
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::Insert => "insert",
            WriteMode::Upsert => "upsert",
        }
    }
}

impl std::str::FromStr for WriteMode {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "insert" => Ok(WriteMode::Insert),
            "upsert" => Ok(WriteMode::Upsert),
            other => Err(MigrateError::Config(format!(
                "Unknown write mode '{}'. Expected insert or upsert",
                other
            ))),
        }
    }
}

/// Row processor that writes each row to a destination table.
///
/// The statement is generated from the column names of the first row the
/// writer sees, prepared once, and reused for every later row. Every row must
/// have the same columns in the same order as that first row.
#[derive(Debug)]
pub struct RowWriter {
    slot: StatementSlot,
    to: TableHandle,
    mode: WriteMode,
}

impl RowWriter {
    pub fn new(slot: StatementSlot, to: TableHandle, mode: WriteMode) -> Self {
        Self { slot, to, mode }
    }

    /// Writer issuing `INSERT INTO t (c1, ..) VALUES (?, ..)`.
    pub fn insert(slot: StatementSlot, to: TableHandle) -> Self {
        Self::new(slot, to, WriteMode::Insert)
    }

    /// Writer issuing `INSERT ... ON DUPLICATE KEY UPDATE c1 = ?, ..`.
    pub fn upsert(slot: StatementSlot, to: TableHandle) -> Self {
        Self::new(slot, to, WriteMode::Upsert)
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Statement text for a row with the given columns.
    pub fn build_sql(&self, columns: &[String]) -> String {
        let dialect = self.to.connection().dialect();
        match self.mode {
            WriteMode::Insert => {
                dialect.build_insert_query(self.to.database(), self.to.table(), columns)
            }
            WriteMode::Upsert => {
                dialect.build_upsert_query(self.to.database(), self.to.table(), columns)
            }
        }
    }

    async fn prepare(&self, row: &Row) -> Result<PreparedWrite> {
        let columns: Vec<String> = row.column_names().map(str::to_string).collect();
        if columns.is_empty() {
            return Err(MigrateError::processor(format!(
                "cannot write a row with no columns to {}",
                self.to
            )));
        }
        let sql = self.build_sql(&columns);
        debug!("Preparing {} statement for {}: {}", self.mode.as_str(), self.to, sql);
        let statement = self.to.connection().prepare(&sql).await?;
        Ok(PreparedWrite { statement, columns })
    }

    /// Bind values for a row: the values in order, and for upserts the same
    /// values again for the update clause.
    fn binds(&self, row: &Row) -> Vec<SqlValue> {
        let mut binds: Vec<SqlValue> = row.values().cloned().collect();
        if self.mode == WriteMode::Upsert {
            binds.extend_from_within(..);
        }
        binds
    }
}

#[async_trait]
impl RowProcessor for RowWriter {
    async fn process(&mut self, row: &mut Row) -> Result<RowAction> {
        let mut guard = self.slot.lock().lock().await;
        if guard.is_none() {
            *guard = Some(self.prepare(row).await?);
        }
        let prepared = guard
            .as_mut()
            .ok_or_else(|| MigrateError::StatementClosed(self.to.to_string()))?;

        if !row.column_names().eq(prepared.columns.iter().map(String::as_str)) {
            return Err(MigrateError::ShapeMismatch {
                table: self.to.to_string(),
                expected: prepared.columns.join(", "),
                found: row.column_names().collect::<Vec<_>>().join(", "),
            });
        }

        prepared.statement.execute(&self.binds(row)).await?;
        Ok(RowAction::Continue)
    }

    fn name(&self) -> &str {
        self.mode.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ColumnInfo, ColumnType};
    use crate::testing::MemoryDatabase;

    fn columns(names: &[&str]) -> Vec<ColumnInfo> {
        names
            .iter()
            .map(|n| ColumnInfo::new(*n, ColumnType::named("VARCHAR")))
            .collect()
    }

    fn sample(id: i64) -> Row {
        Row::from_values(
            &columns(&["id", "name", "value"]),
            vec![
                SqlValue::I64(id),
                SqlValue::Text(format!("n{}", id)),
                SqlValue::F64(id as f64),
            ],
        )
    }

    #[tokio::test]
    async fn test_insert_prepares_once_and_binds_in_order() {
        let db = MemoryDatabase::new();
        let slot = StatementSlot::new();
        let mut writer = RowWriter::insert(slot.clone(), TableHandle::new(db.connection(), "dst", "users"));

        for id in 1..=3 {
            let action = writer.process(&mut sample(id)).await.unwrap();
            assert_eq!(action, RowAction::Continue);
        }

        assert_eq!(
            db.prepares(),
            vec!["INSERT INTO `dst`.`users` (`id`, `name`, `value`) VALUES (?, ?, ?)"]
        );
        let executes = db.executes();
        assert_eq!(executes.len(), 3);
        assert_eq!(
            executes[1],
            vec![SqlValue::I64(2), SqlValue::Text("n2".into()), SqlValue::F64(2.0)]
        );
        assert!(slot.is_prepared().await);
    }

    #[tokio::test]
    async fn test_upsert_binds_every_value_twice() {
        let db = MemoryDatabase::new();
        let mut writer = RowWriter::upsert(
            StatementSlot::new(),
            TableHandle::new(db.connection(), "dst", "users"),
        );

        writer.process(&mut sample(7)).await.unwrap();
        writer.process(&mut sample(8)).await.unwrap();

        assert_eq!(
            db.prepares(),
            vec![
                "INSERT INTO `dst`.`users` (`id`, `name`, `value`) VALUES (?, ?, ?) \
                 ON DUPLICATE KEY UPDATE `id` = ?, `name` = ?, `value` = ?"
            ]
        );
        let executes = db.executes();
        assert_eq!(
            executes[0],
            vec![
                SqlValue::I64(7),
                SqlValue::Text("n7".into()),
                SqlValue::F64(7.0),
                SqlValue::I64(7),
                SqlValue::Text("n7".into()),
                SqlValue::F64(7.0),
            ]
        );
        assert_eq!(executes[1].len(), 6);
    }

    #[tokio::test]
    async fn test_shape_change_is_rejected() {
        let db = MemoryDatabase::new();
        let mut writer = RowWriter::insert(
            StatementSlot::new(),
            TableHandle::new(db.connection(), "dst", "users"),
        );
        writer.process(&mut sample(1)).await.unwrap();

        let mut narrower = Row::from_values(&columns(&["id", "name"]), vec![SqlValue::I64(2), "x".into()]);
        let err = writer.process(&mut narrower).await.unwrap_err();
        assert!(matches!(err, MigrateError::ShapeMismatch { .. }));
        assert_eq!(db.executes().len(), 1);
    }

    #[tokio::test]
    async fn test_prepare_failure_is_returned() {
        let db = MemoryDatabase::new();
        db.fail_prepare("INSERT INTO");
        let slot = StatementSlot::new();
        let mut writer = RowWriter::insert(slot.clone(), TableHandle::new(db.connection(), "dst", "users"));

        let err = writer.process(&mut sample(1)).await.unwrap_err();
        assert!(matches!(err, MigrateError::Prepare { .. }));
        assert!(!slot.is_prepared().await);
        assert!(db.executes().is_empty());
    }

    #[tokio::test]
    async fn test_row_without_columns_is_rejected() {
        let db = MemoryDatabase::new();
        let slot = StatementSlot::new();
        for mode in [WriteMode::Insert, WriteMode::Upsert] {
            let mut writer = RowWriter::new(
                slot.clone(),
                TableHandle::new(db.connection(), "dst", "users"),
                mode,
            );
            let mut empty = Row::from_values(&[], Vec::new());
            let err = writer.process(&mut empty).await.unwrap_err();
            assert!(matches!(err, MigrateError::Processor(_)));
        }
        assert!(!slot.is_prepared().await);
        assert!(db.prepares().is_empty());
    }

    #[tokio::test]
    async fn test_execute_failure_is_returned() {
        let db = MemoryDatabase::new();
        db.fail_execute_call(2);
        let mut writer = RowWriter::insert(
            StatementSlot::new(),
            TableHandle::new(db.connection(), "dst", "users"),
        );

        writer.process(&mut sample(1)).await.unwrap();
        let err = writer.process(&mut sample(2)).await.unwrap_err();
        assert!(matches!(err, MigrateError::Execute { .. }));
    }

    #[tokio::test]
    async fn test_slot_close_releases_and_allows_reprepare() {
        let db = MemoryDatabase::new();
        let slot = StatementSlot::new();
        let mut writer = RowWriter::insert(slot.clone(), TableHandle::new(db.connection(), "dst", "users"));

        writer.process(&mut sample(1)).await.unwrap();
        slot.close().await.unwrap();
        assert!(!slot.is_prepared().await);
        assert_eq!(db.closed_statements().len(), 1);

        // Closing an empty slot is a no-op
        slot.close().await.unwrap();
        assert_eq!(db.closed_statements().len(), 1);

        writer.process(&mut sample(2)).await.unwrap();
        assert_eq!(db.prepares().len(), 2);
    }

    #[test]
    fn test_write_mode_parse() {
        assert_eq!("insert".parse::<WriteMode>().unwrap(), WriteMode::Insert);
        assert_eq!("UPSERT".parse::<WriteMode>().unwrap(), WriteMode::Upsert);
        assert!("merge".parse::<WriteMode>().is_err());
        assert_eq!(WriteMode::default(), WriteMode::Upsert);
    }
}
