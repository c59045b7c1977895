//! Connection and transaction interface
//!
//! The database driver is supplied by the caller. It receives finished SQL
//! text with `:n` markers and the values bound to them, and hands rows back
//! with every column rendered as text.

use crate::row::{FromRow, Row};
use crate::{Result, Value};
use std::future::Future;

/// Statement execution shared by connections and transactions
pub trait Executor: Send + Sync + 'static {
    /// Execute a statement that returns no rows (INSERT, UPDATE, DELETE)
    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = Result<u64>> + Send;

    /// Execute a query and return every row
    fn query_rows(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<Row>>> + Send;

    /// Execute a query and decode its first row, if any
    fn query_scalar<T>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Option<T>>> + Send
    where
        T: FromRow + Send,
    {
        async move {
            let rows = self.query_rows(sql, params).await?;
            rows.first().map(T::from_row).transpose()
        }
    }
}

/// A database connection able to start transactions
pub trait Connection: Executor {
    type Transaction: Transaction;

    /// Begin a transaction
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction>> + Send;
}

/// A database transaction.
///
/// The handle is shared by every query bound to it, so commit and rollback
/// take `&self`. Only one statement may be in flight per handle at a time;
/// callers sharing a handle across tasks must serialize their use of it.
pub trait Transaction: Executor {
    /// Commit the transaction
    fn commit(&self) -> impl Future<Output = Result<()>> + Send;

    /// Roll back the transaction
    fn rollback(&self) -> impl Future<Output = Result<()>> + Send;
}
