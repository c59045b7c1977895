//! UPDATE terminals

use super::insert::split_fields;
use super::{Query, Statement};
use crate::condition::ParamIndexer;
use crate::executor::Connection;
use crate::record::{encode, Record};
use crate::row::ColumnType;
use crate::{dialect, Error, IntoParams, Result, Value};

impl<C: Connection> Query<C> {
    /// `UPDATE <table> SET <assignments>` over the current filters.
    ///
    /// Fails with [`Error::RowsAffectedZero`] when nothing matched.
    pub async fn update(&mut self, assignments: &str, params: impl IntoParams) -> Result<u64> {
        let statement = self.update_statement(assignments, params.into_params())?;
        let affected = self.exec(&statement).await?;
        if affected == 0 {
            let table = self.require_table()?;
            return Err(Error::rows_affected_zero(table));
        }
        Ok(affected)
    }

    /// Write every mapped, non-auto column of `record` back by its key.
    ///
    /// Filters on the query are not applied. Runs the `before_update` hook first.
    pub async fn flush<R: Record>(&mut self, record: &mut R) -> Result<u64> {
        record.before_update();
        self.derive_table(Some(R::TYPE_NAME));
        let table = self.require_table()?;

        let mut names = Vec::new();
        let mut params = Vec::new();
        for column in encode(&*record) {
            if column.auto || column.name == R::ID_COLUMN {
                continue;
            }
            names.push(column.name);
            params.push(column.value);
        }
        if names.is_empty() {
            return Err(Error::invalid_query(format!(
                "{} has no columns to update",
                R::TYPE_NAME
            )));
        }

        let mut indexer = ParamIndexer::new();
        let set_sql = dialect::assignments(&names, &mut indexer);
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            table,
            set_sql,
            R::ID_COLUMN,
            indexer.next_marker()
        );
        params.push(record.id().to_value());

        self.exec(&Statement::new(sql, params)).await
    }

    /// Flat UPDATE of comma-separated `fields` on the row whose `id` is `key`
    pub async fn save(
        &mut self,
        table: &str,
        fields: &str,
        key: impl Into<Value>,
        params: impl IntoParams,
    ) -> Result<u64> {
        let names = split_fields(fields)?;
        let mut values = params.into_params();
        if names.len() != values.len() {
            return Err(Error::invalid_query(format!(
                "{} fields but {} values for {}",
                names.len(),
                values.len(),
                table
            )));
        }

        let mut indexer = ParamIndexer::new();
        let set_sql = dialect::assignments(&names, &mut indexer);
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            table,
            set_sql,
            dialect::DEFAULT_ID_COLUMN,
            indexer.next_marker()
        );
        values.push(key.into());

        self.exec(&Statement::new(sql, values)).await
    }
}
