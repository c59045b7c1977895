//! DELETE terminals

use super::Query;
use crate::condition::{Condition, ConditionSet};
use crate::executor::Connection;
use crate::record::Record;
use crate::row::ColumnType;
use crate::Result;

impl<C: Connection> Query<C> {
    /// `DELETE FROM <table>` over the current filters
    pub async fn delete(&mut self) -> Result<u64> {
        let statement = self.delete_statement()?;
        self.exec(&statement).await
    }

    /// Delete the row holding `record`'s key.
    ///
    /// Only the key condition is applied; filters already on the query are dropped.
    pub async fn delete_record<R: Record>(&mut self, record: &R) -> Result<u64> {
        self.derive_table(Some(R::TYPE_NAME));
        let mut by_key = ConditionSet::new();
        by_key.push_and(Condition::new(
            format!("{} = ?", R::ID_COLUMN),
            vec![record.id().to_value()],
        ));
        self.conditions = by_key;
        self.delete().await
    }
}
