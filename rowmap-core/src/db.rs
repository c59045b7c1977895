//! Database handle: the root every template and query is derived from

use crate::builder::{Query, TableBinding};
use crate::config::Config;
use crate::executor::Connection;
use crate::record::Record;
use crate::row::Row;
use crate::trace::{SqlTracer, TraceSink};
use crate::{IntoParams, Result, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

/// State shared by reference with every derived builder
pub(crate) struct Shared<C> {
    pub(crate) conn: C,
    pub(crate) config: Config,
    pub(crate) tracer: TraceSink,
}

/// Entry point wrapping a caller-supplied [`Connection`].
///
/// Cloning is cheap; clones share the connection, configuration and tracer.
pub struct Db<C: Connection> {
    shared: Arc<Shared<C>>,
}

impl<C: Connection> Clone for Db<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Connection> std::fmt::Debug for Db<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("config", &self.shared.config)
            .field("tracer", &self.shared.tracer)
            .finish()
    }
}

impl<C: Connection> Db<C> {
    pub fn new(conn: C) -> Self {
        Self::with_config(conn, Config::default())
    }

    pub fn with_config(conn: C, config: Config) -> Self {
        Self {
            shared: Arc::new(Shared {
                conn,
                config,
                tracer: TraceSink::new(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    pub fn connection(&self) -> &C {
        &self.shared.conn
    }

    /// Install a statement tracer, replacing any previous one
    pub fn trace_on(&self, tracer: impl SqlTracer + 'static) {
        self.shared.tracer.install(Arc::new(tracer));
    }

    pub fn trace_off(&self) {
        self.shared.tracer.clear();
    }

    /// Template bound to `name`
    pub fn table(&self, name: impl Into<String>) -> TableBinding<C> {
        TableBinding::new(Arc::clone(&self.shared), name.into())
    }

    /// Template bound to the table derived from `R`
    pub fn model<R: Record>(&self) -> TableBinding<C> {
        self.table(self.shared.config.table_for(R::TYPE_NAME))
    }

    /// Query with no table bound yet
    pub fn query(&self) -> Query<C> {
        Query::new(Arc::clone(&self.shared), None)
    }

    /// Unbound query running inside a new transaction
    pub async fn transaction_begin(&self) -> Result<Query<C>> {
        self.query().transaction_begin().await
    }

    /// Run `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
    ///
    /// `f` receives a query bound to the transaction; use
    /// [`Query::transaction`] to bind the same handle to further queries.
    pub async fn transaction<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(Query<C>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut control = self.transaction_begin().await?;
        let scoped = control.clone();
        match f(scoped).await {
            Ok(value) => {
                control.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = control.rollback().await {
                    warn!(
                        target: "rowmap.sql",
                        error = %rollback_err,
                        "rollback after failed transaction body failed"
                    );
                }
                Err(e)
            }
        }
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

    pub async fn get_by_id<R: Record>(&self, id: impl Into<Value>) -> Result<R> {
        self.query().get_by_id(id).await
    }

    pub async fn save(
        &self,
        table: &str,
        fields: &str,
        key: impl Into<Value>,
        params: impl IntoParams,
    ) -> Result<u64> {
        self.query().save(table, fields, key, params).await
    }

    pub async fn add(&self, table: &str, fields: &str, params: impl IntoParams) -> Result<u64> {
        self.query().add(table, fields, params).await
    }

    pub async fn raw_exec(&self, sql: &str, params: impl IntoParams) -> Result<u64> {
        self.query().raw_exec(sql, params).await
    }

    pub async fn raw_query_row(&self, sql: &str, params: impl IntoParams) -> Result<Option<Row>> {
        self.query().raw_query_row(sql, params).await
    }

    pub async fn raw_query_rows(&self, sql: &str, params: impl IntoParams) -> Result<Vec<Row>> {
        self.query().raw_query_rows(sql, params).await
    }

    pub async fn raw_query_map(
        &self,
        sql: &str,
        params: impl IntoParams,
    ) -> Result<BTreeMap<String, String>> {
        self.query().raw_query_map(sql, params).await
    }

    pub async fn raw_query_maps(
        &self,
        sql: &str,
        params: impl IntoParams,
    ) -> Result<Vec<BTreeMap<String, String>>> {
        self.query().raw_query_maps(sql, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockConnection, Widget};
    use crate::trace::format_args;
    use crate::Error;
    use std::sync::Mutex;
    use tokio_test::assert_err;

    #[tokio::test]
    async fn test_tracer_sees_every_statement_until_removed() {
        let conn = MockConnection::new();
        let db = Db::new(conn.clone());
        let lines = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&lines);
        db.trace_on(move |sql: &str, args: &[String]| {
            sink.lock().unwrap().push(format!("{sql} [{}]", format_args(args)));
        });

        let widgets = db.model::<Widget>();
        widgets.filter("name = ?", "bolt").count().await.unwrap();
        db.raw_exec("DELETE FROM tb_widget WHERE qty = ?", 0).await.unwrap();

        db.trace_off();
        widgets.count().await.unwrap();

        assert_eq!(
            *lines.lock().unwrap(),
            vec![
                "SELECT count(*) FROM tb_widget WHERE name = :1 [1:\"bolt\"]".to_string(),
                "DELETE FROM tb_widget WHERE qty = :1 [1:0]".to_string(),
            ]
        );
        assert_eq!(conn.executed().len(), 3);
    }

    #[tokio::test]
    async fn test_custom_config_naming() {
        let conn = MockConnection::new();
        let config = Config::new()
            .with_table_prefix("app_")
            .with_sequence_prefix("sq_");
        let db = Db::with_config(conn.clone(), config);
        assert_eq!(db.model::<Widget>().table_name(), "app_widget");

        conn.push_rows(vec![Row::new().with("NEXTVAL", "1")]);
        db.insert(&mut Widget::default()).await.unwrap();
        assert_eq!(conn.statements()[0], "SELECT sq_app_widget.nextval FROM dual");
    }

    #[tokio::test]
    async fn test_transaction_commits_on_ok() {
        let conn = MockConnection::new();
        let db = Db::new(conn.clone());
        let affected = db
            .transaction(|mut q| async move {
                q.raw_exec("DELETE FROM tb_widget WHERE qty = ?", 0).await
            })
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(conn.commits(), 1);
        assert_eq!(conn.rollbacks(), 0);
        assert!(conn.last().in_transaction);
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_err() {
        let conn = MockConnection::new();
        let db = Db::new(conn.clone());
        conn.push_affected(0);
        let err = assert_err!(
            db.transaction(|q| async move {
                q.table("tb_widget")
                    .filter("id = ?", 1)
                    .update("qty = ?", 2)
                    .await
            })
            .await
        );
        assert!(err.is_rows_affected_zero());
        assert_eq!(conn.commits(), 0);
        assert_eq!(conn.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_failed_rollback_keeps_body_error() {
        let conn = MockConnection::new();
        let db = Db::new(conn.clone());
        conn.fail_rollbacks();
        let err = assert_err!(
            db.transaction(|mut q| async move {
                q.raw_query_map("SELECT * FROM tb_widget WHERE id = ?", 1).await
            })
            .await
        );
        assert!(err.is_not_found());
        assert_eq!(conn.commits(), 0);
        assert_eq!(conn.rollbacks(), 1);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Db::new(MockConnection::new());
        let err = assert_err!(db.get_by_id::<Widget>(1i64).await);
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
