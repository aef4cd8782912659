//! Destination statement builders.
//!
//! A [`RowWriter`] is a row processor that writes every row it receives to a
//! destination table. The destination schema does not need to be known up
//! front: the statement text is generated from the first row's columns,
//! prepared once, and kept in a [`StatementSlot`] for the rest of the run.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use data_migrate::core::{Connection, TableHandle};
//! # use data_migrate::engine::Migration;
//! # use data_migrate::statement::{RowWriter, StatementSlot};
//! # async fn example(src: Arc<dyn Connection>, dst: Arc<dyn Connection>) -> data_migrate::Result<()> {
//! let slot = StatementSlot::new();
//! let writer = RowWriter::upsert(slot.clone(), TableHandle::new(dst, "shop_v2", "users"));
//!
//! Migration::new(TableHandle::new(src, "shop", "users"), 50)?
//!     .with_processor(writer)
//!     .with_defer(move || async move { slot.close_quietly().await })
//!     .run()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod slot;
mod writer;

pub use slot::StatementSlot;
pub use writer::{RowWriter, WriteMode};
