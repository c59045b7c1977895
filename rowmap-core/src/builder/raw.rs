//! Hand-written statements and transaction lifecycle

use super::{Query, Statement};
use crate::executor::{Connection, Transaction};
use crate::row::Row;
use crate::{dialect, Error, IntoParams, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

impl<C: Connection> Query<C> {
    fn raw_statement(sql: &str, params: impl IntoParams) -> Statement {
        Statement::new(dialect::number_placeholders(sql), params.into_params())
    }

    /// Execute a hand-written statement; `?` placeholders become `:n` markers
    pub async fn raw_exec(&mut self, sql: &str, params: impl IntoParams) -> Result<u64> {
        self.exec(&Self::raw_statement(sql, params)).await
    }

    pub async fn raw_query_row(&mut self, sql: &str, params: impl IntoParams) -> Result<Option<Row>> {
        let mut rows = self.fetch(&Self::raw_statement(sql, params)).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.swap_remove(0)))
    }

    pub async fn raw_query_rows(&mut self, sql: &str, params: impl IntoParams) -> Result<Vec<Row>> {
        self.fetch(&Self::raw_statement(sql, params)).await
    }

    /// First row as a column-to-text map; NULL columns map to the empty string
    pub async fn raw_query_map(
        &mut self,
        sql: &str,
        params: impl IntoParams,
    ) -> Result<BTreeMap<String, String>> {
        let statement = Self::raw_statement(sql, params);
        let mut rows = self.fetch(&statement).await?;
        if rows.is_empty() {
            return Err(Error::not_found(statement.sql));
        }
        Ok(rows.swap_remove(0).into_map())
    }

    pub async fn raw_query_maps(
        &mut self,
        sql: &str,
        params: impl IntoParams,
    ) -> Result<Vec<BTreeMap<String, String>>> {
        let rows = self.fetch(&Self::raw_statement(sql, params)).await?;
        Ok(rows.into_iter().map(Row::into_map).collect())
    }

    /// Begin a transaction on the connection and bind it to this query
    pub async fn transaction_begin(mut self) -> Result<Self> {
        let tx = self.shared.conn.begin().await?;
        debug!(target: "rowmap.sql", "transaction started");
        self.tx = Some(Arc::new(tx));
        Ok(self)
    }

    /// Commit the bound transaction and unbind it
    pub async fn commit(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(Error::NoTransaction)?;
        tx.commit().await?;
        debug!(target: "rowmap.sql", "transaction committed");
        Ok(())
    }

    /// Roll the bound transaction back and unbind it
    pub async fn rollback(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(Error::NoTransaction)?;
        tx.rollback().await?;
        debug!(target: "rowmap.sql", "transaction rolled back");
        Ok(())
    }
}
