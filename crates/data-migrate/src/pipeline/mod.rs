//! Row processor pipeline.
//!
//! Every row read from the source table is handed to an ordered chain of
//! [`RowProcessor`]s:
//!
//! - A processor returns [`RowAction::Continue`] to pass the row on.
//! - [`RowAction::Skip`] drops the row without running later processors. It is
//!   not an error; the migration carries on with the next row.
//! - An `Err` aborts the whole migration and is returned to the caller as is.
//!
//! Writers (see [`statement`](crate::statement)) are ordinary processors, so
//! transforms must be registered before the writer they feed.

mod processor;
mod transform;

pub use processor::{processor_fn, FnProcessor, Pipeline, RowAction, RowProcessor};
pub use transform::{DropColumns, RenameColumns, RowCounter, SkipNull};
