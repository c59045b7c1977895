//! Reusable table template

use super::{Query, SortDirection};
use crate::db::Shared;
use crate::executor::Connection;
use crate::record::Record;
use crate::row::FromRow;
use crate::{IntoParams, Result, Value};
use std::sync::Arc;

/// A template bound to one table.
///
/// It holds no query state and has no mutating methods: every call starts a
/// new [`Query`], so one binding can be cloned and shared freely between
/// tasks.
pub struct TableBinding<C: Connection> {
    shared: Arc<Shared<C>>,
    table: String,
}

impl<C: Connection> Clone for TableBinding<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            table: self.table.clone(),
        }
    }
}

impl<C: Connection> std::fmt::Debug for TableBinding<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableBinding")
            .field("table", &self.table)
            .finish()
    }
}

impl<C: Connection> TableBinding<C> {
    pub(crate) fn new(shared: Arc<Shared<C>>, table: String) -> Self {
        Self { shared, table }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Start an unfiltered query on this table
    pub fn query(&self) -> Query<C> {
        Query::new(Arc::clone(&self.shared), Some(self.table.clone()))
    }

    pub fn select(&self, fields: impl Into<String>) -> Query<C> {
        self.query().select(fields)
    }

    pub fn filter(&self, template: impl Into<String>, params: impl IntoParams) -> Query<C> {
        self.query().filter(template, params)
    }

    pub fn or_filter(&self, template: impl Into<String>, params: impl IntoParams) -> Query<C> {
        self.query().or_filter(template, params)
    }

    pub fn filter_map<I, K, V>(&self, pairs: I) -> Query<C>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.query().filter_map(pairs)
    }

    pub fn filter_in(&self, column: &str, list: &str) -> Query<C> {
        self.query().filter_in(column, list)
    }

    pub fn filter_in_values(&self, column: &str, values: impl IntoParams) -> Query<C> {
        self.query().filter_in_values(column, values)
    }

    pub fn group_by(&self, column: impl Into<String>) -> Query<C> {
        self.query().group_by(column)
    }

    pub fn order_by(&self, column: impl Into<String>, direction: SortDirection) -> Query<C> {
        self.query().order_by(column, direction)
    }

    pub fn order_by_asc(&self, column: impl Into<String>) -> Query<C> {
        self.query().order_by_asc(column)
    }

    pub fn order_by_desc(&self, column: impl Into<String>) -> Query<C> {
        self.query().order_by_desc(column)
    }

    pub fn page(&self, page_number: i64, page_size: i64) -> Query<C> {
        self.query().page(page_number, page_size)
    }

    pub fn bind_transaction(&self, tx: Arc<C::Transaction>) -> Query<C> {
        self.query().bind_transaction(tx)
    }

    /// Start a query on this table inside a new transaction
    pub async fn transaction_begin(&self) -> Result<Query<C>> {
        self.query().transaction_begin().await
    }

    pub async fn count(&self) -> Result<i64> {
        self.query().count().await
    }

    pub async fn page_count(&self, page_size: i64) -> Result<i64> {
        self.query().page_count(page_size).await
    }

    pub async fn find<T: FromRow>(&self) -> Result<Vec<T>> {
        self.query().find().await
    }

    pub async fn get<T: FromRow>(&self) -> Result<T> {
        self.query().get().await
    }

    pub async fn get_by_id<R: Record>(&self, id: impl Into<Value>) -> Result<R> {
        self.query().get_by_id(id).await
    }

    pub async fn exists(&self) -> Result<bool> {
        self.query().exists().await
    }

    pub async fn insert<R: Record>(&self, record: &mut R) -> Result<R::Id> {
        self.query().insert(record).await
    }

    pub async fn flush<R: Record>(&self, record: &mut R) -> Result<u64> {
        self.query().flush(record).await
    }

    pub async fn delete_record<R: Record>(&self, record: &R) -> Result<u64> {
        self.query().delete_record(record).await
    }
}

#[cfg(test)]
mod tests {
    use crate::row::Row;
    use crate::testing::{MockConnection, Widget};
    use crate::{Db, Value};

    #[tokio::test]
    async fn test_template_is_never_mutated() {
        let conn = MockConnection::new();
        let db = Db::new(conn.clone());
        let widgets = db.model::<Widget>();

        let filtered = widgets.filter("name = ?", "bolt").page(2, 10);
        assert_eq!(filtered.limit(), 20);

        widgets.count().await.unwrap();
        assert_eq!(conn.last().sql, "SELECT count(*) FROM tb_widget");
        assert!(conn.last().params.is_empty());

        let other = widgets.filter("qty > ?", 5);
        let statement = other.select_statement().unwrap();
        assert_eq!(statement.sql, "SELECT * FROM tb_widget WHERE qty > :1");
        assert_eq!(statement.params, vec![Value::I32(5)]);
    }

    #[tokio::test]
    async fn test_shared_template_across_tasks() {
        let conn = MockConnection::new();
        let db = Db::new(conn.clone());
        let widgets = db.model::<Widget>();

        let handles: Vec<_> = (0..8)
            .map(|qty| {
                let widgets = widgets.clone();
                tokio::spawn(async move {
                    widgets
                        .filter("qty = ?", qty)
                        .find::<Widget>()
                        .await
                        .map(|found| found.len())
                })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            assert_eq!(result.unwrap().unwrap(), 0);
        }

        let executed = conn.executed();
        assert_eq!(executed.len(), 8);
        for entry in executed {
            assert_eq!(entry.sql, "SELECT * FROM tb_widget WHERE qty = :1");
            assert_eq!(entry.params.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_convenience_terminals() {
        let conn = MockConnection::new();
        let db = Db::new(conn.clone());
        let widgets = db.table("tb_widget");

        conn.push_rows(vec![Row::new().with("id", "2").with("name", "nut")]);
        let widget: Widget = widgets.get_by_id(2i64).await.unwrap();
        assert_eq!(widget.name, "nut");

        let mut widget = widget;
        widget.qty = 12;
        widgets.flush(&mut widget).await.unwrap();
        widgets.delete_record(&widget).await.unwrap();
        assert_eq!(conn.last().sql, "DELETE FROM tb_widget WHERE id = :1");
        assert!(!widgets.exists().await.unwrap());
    }
}
