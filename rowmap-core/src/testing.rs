//! Scripted connection and sample records shared by the unit tests

use crate::executor::{Connection, Executor, Transaction};
use crate::record::{BeforeInsert, BeforeUpdate};
use crate::row::Row;
use crate::{Error, Result, Value};
use chrono::NaiveDateTime;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// One statement seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Executed {
    pub sql: String,
    pub params: Vec<Value>,
    pub in_transaction: bool,
}

#[derive(Default)]
struct MockState {
    executed: Vec<Executed>,
    rows: VecDeque<Vec<Row>>,
    affected: VecDeque<u64>,
    fail_patterns: Vec<String>,
    begins: usize,
    commits: usize,
    rollbacks: usize,
    fail_rollback: bool,
}

/// Connection that records every statement and replays scripted results.
///
/// Queries pop the next scripted row set (empty when none is left); executes
/// pop the next scripted affected count (1 when none is left).
#[derive(Clone, Default)]
pub(crate) struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state().rows.push_back(rows);
    }

    pub fn push_affected(&self, affected: u64) {
        self.state().affected.push_back(affected);
    }

    /// Fail every statement whose SQL contains `pattern`
    pub fn fail_when(&self, pattern: &str) {
        self.state().fail_patterns.push(pattern.to_string());
    }

    pub fn fail_rollbacks(&self) {
        self.state().fail_rollback = true;
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.state().executed.clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.state().executed.iter().map(|e| e.sql.clone()).collect()
    }

    pub fn last(&self) -> Executed {
        self.state()
            .executed
            .last()
            .cloned()
            .expect("no statement executed")
    }

    pub fn begins(&self) -> usize {
        self.state().begins
    }

    pub fn commits(&self) -> usize {
        self.state().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state().rollbacks
    }

    fn record(&self, sql: &str, params: &[Value], in_transaction: bool) -> Result<()> {
        let mut state = self.state();
        state.executed.push(Executed {
            sql: sql.to_string(),
            params: params.to_vec(),
            in_transaction,
        });
        if state.fail_patterns.iter().any(|p| sql.contains(p.as_str())) {
            return Err(Error::database(format!("mock failure: {sql}")));
        }
        Ok(())
    }

    fn run_execute(&self, sql: &str, params: &[Value], in_transaction: bool) -> Result<u64> {
        self.record(sql, params, in_transaction)?;
        Ok(self.state().affected.pop_front().unwrap_or(1))
    }

    fn run_query(&self, sql: &str, params: &[Value], in_transaction: bool) -> Result<Vec<Row>> {
        self.record(sql, params, in_transaction)?;
        Ok(self.state().rows.pop_front().unwrap_or_default())
    }
}

impl Executor for MockConnection {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.run_execute(sql, params, false)
    }

    async fn query_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.run_query(sql, params, false)
    }
}

impl Connection for MockConnection {
    type Transaction = MockTransaction;

    async fn begin(&self) -> Result<MockTransaction> {
        self.state().begins += 1;
        Ok(MockTransaction { conn: self.clone() })
    }
}

pub(crate) struct MockTransaction {
    conn: MockConnection,
}

impl Executor for MockTransaction {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.conn.run_execute(sql, params, true)
    }

    async fn query_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.conn.run_query(sql, params, true)
    }
}

impl Transaction for MockTransaction {
    async fn commit(&self) -> Result<()> {
        self.conn.state().commits += 1;
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        let mut state = self.conn.state();
        state.rollbacks += 1;
        if state.fail_rollback {
            return Err(Error::database("mock failure: rollback"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Audit {
    pub created_by: String,
    pub created_at: Option<NaiveDateTime>,
}

crate::columns! {
    Audit {
        created_by => "created_by",
        created_at => "created_at",
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Widget {
    pub id: i64,
    pub name: String,
    pub qty: i32,
    pub price: f64,
    pub updated_at: Option<NaiveDateTime>,
    pub audit: Audit,
}

crate::record! {
    Widget {
        key id: i64 => "id",
        name => "name",
        qty => "qty",
        price => "price",
        updated_at => "updated_at" [auto],
    }
    embed audit;
    hooks [before_insert, before_update];
}

impl BeforeInsert for Widget {
    fn before_insert(&mut self) {
        if self.audit.created_by.is_empty() {
            self.audit.created_by = "system".to_string();
        }
    }
}

impl BeforeUpdate for Widget {
    fn before_update(&mut self) {
        self.name = self.name.trim().to_string();
    }
}

/// Record with a 32-bit key and no hooks
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Gadget {
    pub id: i32,
    pub label: String,
}

crate::record! {
    Gadget {
        key id: i32 => "id",
        label => "label",
    }
}
