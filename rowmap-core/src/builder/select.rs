//! Read terminals: counts, finds and single-row lookups

use super::{Query, Statement};
use crate::condition::ParamIndexer;
use crate::executor::Connection;
use crate::record::{decode_into, decode_many, Record};
use crate::row::{FromRow, Row};
use crate::{Error, Result, Value};

impl<C: Connection> Query<C> {
    /// `SELECT count(<projection>)` over the current filters.
    ///
    /// An empty result counts as zero rather than a missing row.
    pub async fn count(&mut self) -> Result<i64> {
        let statement = self.count_statement()?;
        let rows = self.fetch(&statement).await?;
        match rows.first() {
            Some(row) => Ok(Option::<i64>::from_row(row)?.unwrap_or(0)),
            None => Ok(0),
        }
    }

    /// Like [`count`](Self::count), deriving the table from `T` when none is bound
    pub async fn count_of<T: FromRow>(&mut self) -> Result<i64> {
        self.derive_table(T::record_type());
        self.count().await
    }

    /// Number of pages of `page_size` rows; 0 when nothing matches or the size is not positive
    pub async fn page_count(&mut self, page_size: i64) -> Result<i64> {
        if page_size <= 0 {
            return Ok(0);
        }
        let total = self.count().await?;
        if total <= 0 {
            return Ok(0);
        }
        Ok(total / page_size + i64::from(total % page_size != 0))
    }

    /// Run the SELECT (paginated when a page is set) and decode every row.
    pub async fn find<T: FromRow>(&mut self) -> Result<Vec<T>> {
        self.derive_table(T::record_type());
        let statement = self.select_statement()?;
        let rows = self.fetch(&statement).await?;
        decode_many(&rows)
    }

    /// Like [`find`](Self::find), filling an existing destination
    pub async fn find_into<T: FromRow>(&mut self, out: &mut Vec<T>) -> Result<()> {
        self.derive_table(T::record_type());
        let statement = self.select_statement()?;
        let rows = self.fetch(&statement).await?;
        decode_into(&rows, out)
    }

    /// First row under the guard clause
    pub async fn query_one(&mut self) -> Result<Row> {
        let statement = self.first_row_statement(&self.projection, false)?;
        let mut rows = self.fetch(&statement).await?;
        if rows.is_empty() {
            return Err(Error::not_found(statement.sql));
        }
        Ok(rows.swap_remove(0))
    }

    /// Every row, undecoded. Paginated results carry the extra `rn` column.
    pub async fn query_all(&mut self) -> Result<Vec<Row>> {
        let statement = self.select_statement()?;
        self.fetch(&statement).await
    }

    /// First row under the guard clause, decoded as a record or a scalar
    pub async fn get<T: FromRow>(&mut self) -> Result<T> {
        self.derive_table(T::record_type());
        let statement = self.first_row_statement(&self.projection, false)?;
        self.fetch_first(statement).await
    }

    /// [`get`](Self::get) with a row lock, inside the bound transaction
    pub async fn get_for_update<T: FromRow>(&mut self) -> Result<T> {
        if self.tx.is_none() {
            return Err(Error::NoTransaction);
        }
        self.derive_table(T::record_type());
        let statement = self.first_row_statement(&self.projection, true)?;
        self.fetch_first(statement).await
    }

    /// Look a record up by its key column; other filters are not applied
    pub async fn get_by_id<R: Record>(&mut self, id: impl Into<Value>) -> Result<R> {
        self.derive_table(Some(R::TYPE_NAME));
        let table = self.require_table()?;
        let marker = ParamIndexer::new().next_marker();
        let statement = Statement::new(
            format!(
                "SELECT {} FROM {} WHERE {} = {}",
                self.projection,
                table,
                R::ID_COLUMN,
                marker
            ),
            vec![id.into()],
        );
        self.fetch_first(statement).await
    }

    /// Single column of the first row under the guard clause
    pub async fn query_scalar<T: FromRow>(&mut self, field: &str) -> Result<T> {
        let statement = self.first_row_statement(field, false)?;
        self.fetch_first(statement).await
    }

    /// Whether any row matches the current filters
    pub async fn exists(&mut self) -> Result<bool> {
        let statement = self.first_row_statement("1", false)?;
        let rows = self.fetch(&statement).await?;
        Ok(!rows.is_empty())
    }

    async fn fetch_first<T: FromRow>(&self, statement: Statement) -> Result<T> {
        let rows = self.fetch(&statement).await?;
        match rows.first() {
            Some(row) => T::from_row(row),
            None => Err(Error::not_found(statement.sql)),
        }
    }
}
