//! Query builders
//!
//! A [`TableBinding`] is a reusable template bound to one table. It is never
//! mutated: every call on it starts a fresh [`Query`]. A `Query` accumulates
//! filters, ordering, pagination and transaction context by value, then runs
//! exactly one terminal operation.

pub mod common;
pub mod table;

mod delete;
mod insert;
mod raw;
mod select;
mod update;

pub use common::{OrderBy, SortDirection};
pub use table::TableBinding;

use crate::condition::{Condition, ConditionSet, ParamIndexer};
use crate::db::Shared;
use crate::executor::{Connection, Executor};
use crate::record::Record;
use crate::row::Row;
use crate::{dialect, Error, IntoParams, Result, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Rendered SQL text and the values bound to its markers, in marker order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// A scoped query: shaping calls consume and return it, terminal calls run it.
pub struct Query<C: Connection> {
    pub(crate) shared: Arc<Shared<C>>,
    pub(crate) tx: Option<Arc<C::Transaction>>,
    pub(crate) table: Option<String>,
    pub(crate) projection: String,
    pub(crate) conditions: ConditionSet,
    pub(crate) group_by: Option<String>,
    pub(crate) order_by: Option<OrderBy>,
    pub(crate) offset: i64,
    pub(crate) limit: i64,
    pub(crate) last_insert_id: Option<Value>,
    pub(crate) rows_affected: u64,
}

impl<C: Connection> Clone for Query<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            tx: self.tx.clone(),
            table: self.table.clone(),
            projection: self.projection.clone(),
            conditions: self.conditions.clone(),
            group_by: self.group_by.clone(),
            order_by: self.order_by.clone(),
            offset: self.offset,
            limit: self.limit,
            last_insert_id: self.last_insert_id.clone(),
            rows_affected: self.rows_affected,
        }
    }
}

impl<C: Connection> std::fmt::Debug for Query<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("table", &self.table)
            .field("projection", &self.projection)
            .field("conditions", &self.conditions)
            .field("group_by", &self.group_by)
            .field("order_by", &self.order_by)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("in_transaction", &self.tx.is_some())
            .finish()
    }
}

impl<C: Connection> Query<C> {
    pub(crate) fn new(shared: Arc<Shared<C>>, table: Option<String>) -> Self {
        let projection = shared.config.default_projection.clone();
        Self {
            shared,
            tx: None,
            table,
            projection,
            conditions: ConditionSet::new(),
            group_by: None,
            order_by: None,
            offset: 0,
            limit: 0,
            last_insert_id: None,
            rows_affected: 0,
        }
    }

    /// Bind the target table
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    /// Bind the table derived from `R` unless one is already bound
    pub fn model<R: Record>(mut self) -> Self {
        self.derive_table(Some(R::TYPE_NAME));
        self
    }

    /// Set the projection, e.g. `"id, name"`
    pub fn select(mut self, fields: impl Into<String>) -> Self {
        self.projection = fields.into();
        self
    }

    /// Add an AND condition with `?` placeholders
    pub fn filter(mut self, template: impl Into<String>, params: impl IntoParams) -> Self {
        self.conditions
            .push_and(Condition::new(template, params.into_params()));
        self
    }

    /// Add an OR condition with `?` placeholders
    pub fn or_filter(mut self, template: impl Into<String>, params: impl IntoParams) -> Self {
        self.conditions
            .push_or(Condition::new(template, params.into_params()));
        self
    }

    /// Add one `column = ?` AND condition per pair.
    ///
    /// Pairs are applied in ascending column order; empty text values are skipped.
    pub fn filter_map<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let sorted: BTreeMap<String, Value> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !matches!(v, Value::String(s) if s.is_empty()))
            .collect();
        for (column, value) in sorted {
            self.conditions
                .push_and(Condition::new(format!("{column} = ?"), vec![value]));
        }
        self
    }

    /// Set the IN-clause from a literal list, spliced in without binding
    pub fn filter_in(mut self, column: &str, list: &str) -> Self {
        self.conditions.set_in(Condition::in_literal(column, list));
        self
    }

    /// Set the IN-clause with every value bound
    pub fn filter_in_values(mut self, column: &str, values: impl IntoParams) -> Self {
        self.conditions
            .set_in(Condition::in_values(column, values.into_params()));
        self
    }

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by = Some(column.into());
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy::new(column, direction));
        self
    }

    pub fn order_by_asc(self, column: impl Into<String>) -> Self {
        self.order_by(column, SortDirection::Asc)
    }

    pub fn order_by_desc(self, column: impl Into<String>) -> Self {
        self.order_by(column, SortDirection::Desc)
    }

    /// Restrict reads to one page; `page_number` starts at 1.
    ///
    /// The window is `offset = (page_number - 1) * page_size` (never negative)
    /// and `limit = offset + page_size`.
    pub fn page(mut self, page_number: i64, page_size: i64) -> Self {
        let start = (page_number.saturating_sub(1))
            .saturating_mul(page_size)
            .max(0);
        self.offset = start;
        self.limit = start.saturating_add(page_size);
        self
    }

    /// Run every following statement on `tx`
    pub fn bind_transaction(mut self, tx: Arc<C::Transaction>) -> Self {
        self.tx = Some(tx);
        self
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Id resolved by the last successful insert
    pub fn last_insert_id(&self) -> Option<&Value> {
        self.last_insert_id.as_ref()
    }

    /// Row count reported by the last executed statement
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Shared handle of the bound transaction, to bind it to other queries
    pub fn transaction(&self) -> Option<Arc<C::Transaction>> {
        self.tx.clone()
    }

    pub(crate) fn require_table(&self) -> Result<&str> {
        self.table.as_deref().ok_or(Error::NoTableBound)
    }

    pub(crate) fn derive_table(&mut self, type_name: Option<&str>) {
        if self.table.is_none() {
            if let Some(name) = type_name {
                self.table = Some(self.shared.config.table_for(name));
            }
        }
    }

    fn tail_clauses(&self, with_order: bool) -> String {
        let mut sql = String::new();
        if let Some(group) = &self.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group);
        }
        if with_order {
            if let Some(order) = &self.order_by {
                sql.push_str(&order.to_sql());
            }
        }
        sql
    }

    /// The SELECT a `find` or `query_all` would run, paginated when a page is set
    pub fn select_statement(&self) -> Result<Statement> {
        let table = self.require_table()?;
        let mut params = Vec::new();
        let where_sql = self
            .conditions
            .render(&mut ParamIndexer::new(), &mut params)?;

        let mut sql = format!("SELECT {} FROM {}", self.projection, table);
        sql.push_str(&where_sql);
        sql.push_str(&self.tail_clauses(true));

        if self.limit > 0 {
            sql = dialect::paginate(&sql, self.offset, self.limit);
        }
        Ok(Statement::new(sql, params))
    }

    pub fn count_statement(&self) -> Result<Statement> {
        let table = self.require_table()?;
        let mut params = Vec::new();
        let where_sql = self
            .conditions
            .render(&mut ParamIndexer::new(), &mut params)?;

        let mut sql = format!("SELECT count({}) FROM {}", self.projection, table);
        sql.push_str(&where_sql);
        sql.push_str(&self.tail_clauses(false));
        Ok(Statement::new(sql, params))
    }

    /// SELECT limited by the first-row guard clause, optionally locking the row
    pub fn first_row_statement(&self, projection: &str, lock: bool) -> Result<Statement> {
        let table = self.require_table()?;
        let mut params = Vec::new();
        let mut where_sql = self
            .conditions
            .render(&mut ParamIndexer::new(), &mut params)?;
        dialect::append_guard(&mut where_sql);

        let mut sql = format!("SELECT {} FROM {}", projection, table);
        sql.push_str(&where_sql);
        sql.push_str(&self.tail_clauses(true));
        if lock {
            sql.push_str(dialect::ROW_LOCK);
        }
        Ok(Statement::new(sql, params))
    }

    pub fn delete_statement(&self) -> Result<Statement> {
        let table = self.require_table()?;
        let mut params = Vec::new();
        let where_sql = self
            .conditions
            .render(&mut ParamIndexer::new(), &mut params)?;
        Ok(Statement::new(format!("DELETE FROM {table}{where_sql}"), params))
    }

    /// UPDATE with an explicit SET fragment; its markers come before the WHERE markers
    pub fn update_statement(&self, assignments: &str, values: Vec<Value>) -> Result<Statement> {
        let table = self.require_table()?;
        let mut indexer = ParamIndexer::new();
        let mut params = Vec::new();
        let set_sql = Condition::new(assignments, values).render(&mut indexer, &mut params)?;
        let where_sql = self.conditions.render(&mut indexer, &mut params)?;
        Ok(Statement::new(
            format!("UPDATE {table} SET {set_sql}{where_sql}"),
            params,
        ))
    }

    pub(crate) async fn exec(&mut self, statement: &Statement) -> Result<u64> {
        self.shared.tracer.emit(&statement.sql, &statement.params);
        let affected = match &self.tx {
            Some(tx) => tx.execute(&statement.sql, &statement.params).await?,
            None => {
                self.shared
                    .conn
                    .execute(&statement.sql, &statement.params)
                    .await?
            }
        };
        debug!(target: "rowmap.sql", rows_affected = affected, "statement executed");
        self.rows_affected = affected;
        Ok(affected)
    }

    pub(crate) async fn fetch(&self, statement: &Statement) -> Result<Vec<Row>> {
        self.shared.tracer.emit(&statement.sql, &statement.params);
        let rows = match &self.tx {
            Some(tx) => tx.query_rows(&statement.sql, &statement.params).await?,
            None => {
                self.shared
                    .conn
                    .query_rows(&statement.sql, &statement.params)
                    .await?
            }
        };
        debug!(target: "rowmap.sql", rows = rows.len(), "query returned");
        Ok(rows)
    }
}
