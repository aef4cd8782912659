//! In-memory database used by unit tests.
//!
//! Implements the core database traits on top of plain vectors and records
//! every prepare, query, execute and close so tests can assert on the exact
//! sequence of statements the engine issued.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::traits::{Connection, Dialect, RowSet, Statement};
use crate::core::{ColumnInfo, ColumnType, Row, SqlValue};
use crate::dialect::MysqlDialect;
use crate::error::{MigrateError, Result};

/// Something the database was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Prepare(String),
    Query { sql: String, params: Vec<SqlValue> },
    Execute { sql: String, params: Vec<SqlValue> },
    CloseStatement(String),
    CloseRowSet,
}

#[derive(Default)]
struct MemTable {
    columns: Vec<ColumnInfo>,
    rows: Vec<Vec<SqlValue>>,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, MemTable>,
    events: Vec<Event>,
    fail_prepare: Option<String>,
    fail_query_at_offset: Option<i64>,
    fail_execute_call: Option<usize>,
    execute_calls: usize,
    yield_on_io: bool,
}

/// Shared in-memory database. Clones see the same state.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<State>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection handle to this database.
    pub fn connection(&self) -> Arc<dyn Connection> {
        Arc::new(MemoryConnection {
            state: Arc::clone(&self.state),
            dialect: MysqlDialect::new(),
        })
    }

    /// Create a table with `(name, type)` columns and the given rows.
    pub fn create_table(
        &self,
        database: &str,
        table: &str,
        columns: &[(&str, &str)],
        rows: Vec<Vec<SqlValue>>,
    ) {
        let key = MysqlDialect::new().qualify_table(database, table);
        let columns = columns
            .iter()
            .map(|(name, ty)| ColumnInfo::new(*name, ColumnType::named(*ty)))
            .collect();
        self.state
            .lock()
            .unwrap()
            .tables
            .insert(key, MemTable { columns, rows });
    }

    /// Create a `(id, name, value)` table holding `count` rows.
    ///
    /// Row `i` (1-based) has `value = NULL` when `null_value(i)` is true.
    pub fn create_sample_table(
        &self,
        database: &str,
        table: &str,
        count: i64,
        null_value: impl Fn(i64) -> bool,
    ) {
        let rows = (1..=count)
            .map(|i| {
                let value = if null_value(i) {
                    SqlValue::Null
                } else {
                    SqlValue::F64(i as f64 * 1.5)
                };
                vec![SqlValue::I64(i), SqlValue::Text(format!("row-{}", i)), value]
            })
            .collect();
        self.create_table(
            database,
            table,
            &[("id", "LONG"), ("name", "VARCHAR"), ("value", "DOUBLE")],
            rows,
        );
    }

    /// Fail any prepare whose SQL contains `pattern`.
    pub fn fail_prepare(&self, pattern: &str) {
        self.state.lock().unwrap().fail_prepare = Some(pattern.to_string());
    }

    /// Fail the page query issued at `offset`.
    pub fn fail_query_at_offset(&self, offset: i64) {
        self.state.lock().unwrap().fail_query_at_offset = Some(offset);
    }

    /// Fail the `n`th write (1-based, counted across all statements).
    pub fn fail_execute_call(&self, n: usize) {
        self.state.lock().unwrap().fail_execute_call = Some(n);
    }

    /// Yield to the scheduler before every query and write, so concurrent
    /// migrations on one task interleave.
    pub fn yield_on_io(&self) {
        self.state.lock().unwrap().yield_on_io = true;
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    /// SQL of every prepared statement, in order.
    pub fn prepares(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Prepare(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    /// Offsets of every page query, in order.
    pub fn page_offsets(&self) -> Vec<i64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Query { params, .. } => params.get(1).and_then(SqlValue::as_i64),
                _ => None,
            })
            .collect()
    }

    /// Parameters of every successful write, in order.
    pub fn executes(&self) -> Vec<Vec<SqlValue>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Execute { params, .. } => Some(params),
                _ => None,
            })
            .collect()
    }

    /// SQL of every closed statement, in order.
    pub fn closed_statements(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::CloseStatement(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn row_sets_closed(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::CloseRowSet))
            .count()
    }
}

struct MemoryConnection {
    state: Arc<Mutex<State>>,
    dialect: MysqlDialect,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>> {
        let mut state = self.state.lock().unwrap();
        if let Some(pattern) = &state.fail_prepare {
            if sql.contains(pattern.as_str()) {
                return Err(MigrateError::prepare(sql, "injected prepare failure"));
            }
        }
        state.events.push(Event::Prepare(sql.to_string()));
        Ok(Box::new(MemoryStatement {
            state: Arc::clone(&self.state),
            sql: sql.to_string(),
        }))
    }

    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn db_type(&self) -> &str {
        "memory"
    }
}

struct MemoryStatement {
    state: Arc<Mutex<State>>,
    sql: String,
}

impl MemoryStatement {
    async fn maybe_yield(&self) {
        let yielding = self.state.lock().unwrap().yield_on_io;
        if yielding {
            tokio::task::yield_now().await;
        }
    }

    fn table_key(&self) -> Option<&str> {
        let rest = self.sql.strip_prefix("SELECT * FROM ")?;
        rest.split(" LIMIT ").next()
    }
}

#[async_trait]
impl Statement for MemoryStatement {
    fn sql(&self) -> &str {
        &self.sql
    }

    async fn query(&mut self, params: &[SqlValue]) -> Result<Box<dyn RowSet>> {
        self.maybe_yield().await;
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Query {
            sql: self.sql.clone(),
            params: params.to_vec(),
        });

        let limit = params.first().and_then(SqlValue::as_i64).unwrap_or(0);
        let offset = params.get(1).and_then(SqlValue::as_i64).unwrap_or(0);
        if state.fail_query_at_offset == Some(offset) {
            return Err(MigrateError::query(&self.sql, "injected query failure"));
        }

        let key = self
            .table_key()
            .ok_or_else(|| MigrateError::query(&self.sql, "unsupported query"))?;
        let table = state
            .tables
            .get(key)
            .ok_or_else(|| MigrateError::query(&self.sql, format!("no such table {}", key)))?;

        let rows = table
            .rows
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(Box::new(MemoryRowSet {
            state: Arc::clone(&self.state),
            columns: table.columns.clone(),
            rows,
        }))
    }

    async fn execute(&mut self, params: &[SqlValue]) -> Result<()> {
        self.maybe_yield().await;
        let mut state = self.state.lock().unwrap();
        state.execute_calls += 1;
        if state.fail_execute_call == Some(state.execute_calls) {
            return Err(MigrateError::execute(&self.sql, "injected execute failure"));
        }
        state.events.push(Event::Execute {
            sql: self.sql.clone(),
            params: params.to_vec(),
        });
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .events
            .push(Event::CloseStatement(self.sql.clone()));
        Ok(())
    }
}

struct MemoryRowSet {
    state: Arc<Mutex<State>>,
    columns: Vec<ColumnInfo>,
    rows: VecDeque<Vec<SqlValue>>,
}

#[async_trait]
impl RowSet for MemoryRowSet {
    fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self
            .rows
            .pop_front()
            .map(|values| Row::from_values(&self.columns, values)))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.state.lock().unwrap().events.push(Event::CloseRowSet);
        Ok(())
    }
}
