//! Built-in row processors for common transformations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::Row;
use crate::error::{MigrateError, Result};

use super::processor::{RowAction, RowProcessor};

/// Counts the rows that reach it.
///
/// Clones share the same counter, so one clone can go into a pipeline while
/// another is kept to read the count afterwards. Rows skipped by earlier
/// processors are not counted.
#[derive(Debug, Clone, Default)]
pub struct RowCounter {
    count: Arc<AtomicU64>,
}

impl RowCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RowProcessor for RowCounter {
    async fn process(&mut self, _row: &mut Row) -> Result<RowAction> {
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(RowAction::Continue)
    }

    fn name(&self) -> &str {
        "row-counter"
    }
}

/// Skips rows where any of the listed columns is NULL or missing.
#[derive(Debug, Clone)]
pub struct SkipNull {
    columns: Vec<String>,
}

impl SkipNull {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl RowProcessor for SkipNull {
    async fn process(&mut self, row: &mut Row) -> Result<RowAction> {
        let has_null = self
            .columns
            .iter()
            .any(|c| row.value(c).map_or(true, |v| v.is_null()));
        Ok(if has_null {
            RowAction::Skip
        } else {
            RowAction::Continue
        })
    }

    fn name(&self) -> &str {
        "skip-null"
    }
}

/// Renames columns before they reach the writer.
///
/// Columns absent from a row are left alone. Renaming onto a column name the
/// row already has is an error, since it would make the row ambiguous.
#[derive(Debug, Clone)]
pub struct RenameColumns {
    renames: Vec<(String, String)>,
}

impl RenameColumns {
    pub fn new<I, A, B>(renames: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Self {
            renames: renames
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl RowProcessor for RenameColumns {
    async fn process(&mut self, row: &mut Row) -> Result<RowAction> {
        for (from, to) in &self.renames {
            if row.get(from).is_some() && !row.rename(from, to) {
                return Err(MigrateError::processor(format!(
                    "cannot rename column '{}' to '{}': column already exists",
                    from, to
                )));
            }
        }
        Ok(RowAction::Continue)
    }

    fn name(&self) -> &str {
        "rename-columns"
    }
}

/// Removes columns from every row.
#[derive(Debug, Clone)]
pub struct DropColumns {
    columns: Vec<String>,
}

impl DropColumns {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl RowProcessor for DropColumns {
    async fn process(&mut self, row: &mut Row) -> Result<RowAction> {
        for column in &self.columns {
            row.remove(column);
        }
        Ok(RowAction::Continue)
    }

    fn name(&self) -> &str {
        "drop-columns"
    }
}
