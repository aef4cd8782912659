//! Row processor contract and the ordered processor chain.

use std::fmt;

use async_trait::async_trait;

use crate::core::Row;
use crate::error::Result;

/// What the pipeline should do with a row after a processor accepted it.
///
/// Failures are reported through the `Err` side of the processor's result;
/// skipping is not a failure and is never reported as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    /// Row accepted, hand it to the next processor.
    Continue,
    /// Stop processing this row and move on to the next one.
    Skip,
}

/// A step applied to every row read from the source table.
///
/// Processors may keep state between rows (`&mut self`), may transform the
/// row for the processors after them, and own all of their side effects.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use data_migrate::core::Row;
/// use data_migrate::pipeline::{RowAction, RowProcessor};
/// use data_migrate::Result;
///
/// struct SkipOddIds;
///
/// #[async_trait]
/// impl RowProcessor for SkipOddIds {
///     async fn process(&mut self, row: &mut Row) -> Result<RowAction> {
///         match row.value("id").and_then(|v| v.as_i64()) {
///             Some(id) if id % 2 == 1 => Ok(RowAction::Skip),
///             _ => Ok(RowAction::Continue),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait RowProcessor: Send {
    /// Process one row.
    async fn process(&mut self, row: &mut Row) -> Result<RowAction>;

    /// Name used in log messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Processor backed by a synchronous closure. Built with [`processor_fn`].
pub struct FnProcessor<F> {
    name: String,
    f: F,
}

/// Turn a closure into a [`RowProcessor`].
///
/// ```rust
/// use data_migrate::pipeline::{processor_fn, RowAction};
///
/// let skip_null_values = processor_fn("skip-null-value", |row| {
///     if row.value("value").map_or(true, |v| v.is_null()) {
///         Ok(RowAction::Skip)
///     } else {
///         Ok(RowAction::Continue)
///     }
/// });
/// ```
pub fn processor_fn<F>(name: impl Into<String>, f: F) -> FnProcessor<F>
where
    F: FnMut(&mut Row) -> Result<RowAction> + Send,
{
    FnProcessor {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<F> RowProcessor for FnProcessor<F>
where
    F: FnMut(&mut Row) -> Result<RowAction> + Send,
{
    async fn process(&mut self, row: &mut Row) -> Result<RowAction> {
        (self.f)(row)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<P: RowProcessor + ?Sized> RowProcessor for Box<P> {
    async fn process(&mut self, row: &mut Row) -> Result<RowAction> {
        (**self).process(row).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Ordered chain of row processors.
#[derive(Default)]
pub struct Pipeline {
    processors: Vec<Box<dyn RowProcessor>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a processor; processors run in the order they were pushed.
    pub fn push(&mut self, processor: Box<dyn RowProcessor>) {
        self.processors.push(processor);
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Run every processor on the row, stopping at the first skip or error.
    ///
    /// An empty pipeline accepts every row.
    pub async fn process(&mut self, row: &mut Row) -> Result<RowAction> {
        for processor in &mut self.processors {
            if processor.process(row).await? == RowAction::Skip {
                tracing::trace!(processor = processor.name(), "row skipped");
                return Ok(RowAction::Skip);
            }
        }
        Ok(RowAction::Continue)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.processors.iter().map(|p| p.name()))
            .finish()
    }
}
