//! INSERT terminals

use super::{Query, Statement};
use crate::executor::Connection;
use crate::record::{encode, Record};
use crate::row::{ColumnType, FromRow, IdType};
use crate::{dialect, Error, IntoParams, Result};
use tracing::warn;

impl<C: Connection> Query<C> {
    /// Insert `record`, taking its key from the table's sequence when unset.
    ///
    /// The record's `before_insert` hook runs first. A key fetched from the
    /// sequence is written back into the record only after the INSERT
    /// succeeds; a key already set is used as is.
    pub async fn insert<R: Record>(&mut self, record: &mut R) -> Result<R::Id> {
        record.before_insert();
        self.derive_table(Some(R::TYPE_NAME));
        let table = self.require_table()?.to_string();

        let assigned = if record.id().is_unset() {
            let next = self.next_sequence_value(&table).await?;
            Some(R::Id::from_sequence(next, R::ID_COLUMN)?)
        } else {
            None
        };

        let mut names = vec![R::ID_COLUMN];
        let mut params = vec![match &assigned {
            Some(id) => id.to_value(),
            None => record.id().to_value(),
        }];
        for column in encode(&*record) {
            if column.auto || column.name == R::ID_COLUMN {
                continue;
            }
            names.push(column.name);
            params.push(column.value);
        }

        let statement = Statement::new(dialect::insert_sql(&table, &names), params);
        self.exec(&statement).await?;

        if let Some(id) = assigned {
            record.set_id(id);
        }
        self.last_insert_id = Some(record.id().to_value());
        Ok(record.id().clone())
    }

    /// Flat INSERT of comma-separated `fields` with one bound value each
    pub async fn add(&mut self, table: &str, fields: &str, params: impl IntoParams) -> Result<u64> {
        let names = split_fields(fields)?;
        let values = params.into_params();
        if names.len() != values.len() {
            return Err(Error::invalid_query(format!(
                "{} fields but {} values for {}",
                names.len(),
                values.len(),
                table
            )));
        }
        let statement = Statement::new(dialect::insert_sql(table, &names), values);
        self.exec(&statement).await
    }

    async fn next_sequence_value(&self, table: &str) -> Result<i64> {
        let config = &self.shared.config;
        let sequence = config.sequence_for(table);
        let statement = Statement::new(
            dialect::next_id_sql(&sequence, &config.single_row_source),
            Vec::new(),
        );
        let fetched = self
            .fetch(&statement)
            .await
            .and_then(|rows| match rows.first() {
                Some(row) => i64::from_row(row),
                None => Err(Error::not_found(statement.sql.clone())),
            });
        fetched.map_err(|e| {
            warn!(target: "rowmap.sql", sequence = %sequence, error = %e, "sequence fetch failed");
            Error::sequence_fetch_failed(sequence.clone(), e)
        })
    }
}

/// Split a comma-separated field list, rejecting empty entries.
pub(crate) fn split_fields(fields: &str) -> Result<Vec<&str>> {
    let names: Vec<&str> = fields.split(',').map(str::trim).collect();
    if names.iter().any(|name| name.is_empty()) {
        return Err(Error::invalid_query(format!("malformed field list '{fields}'")));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use crate::row::Row;
    use crate::testing::{Gadget, MockConnection, Widget};
    use crate::{Db, Error, Value};
    use tokio_test::assert_err;

    fn setup() -> (Db<MockConnection>, MockConnection) {
        let conn = MockConnection::new();
        (Db::new(conn.clone()), conn)
    }

    #[tokio::test]
    async fn test_insert_fetches_sequence_for_unset_id() {
        let (db, conn) = setup();
        conn.push_rows(vec![Row::new().with("NEXTVAL", "41")]);

        let mut widget = Widget {
            name: "bolt".to_string(),
            qty: 3,
            ..Default::default()
        };
        let mut query = db.query();
        let id = query.insert(&mut widget).await.unwrap();

        assert_eq!(id, 41);
        assert_eq!(widget.id, 41);
        assert_eq!(query.last_insert_id(), Some(&Value::I64(41)));
        assert_eq!(widget.audit.created_by, "system");

        let statements = conn.statements();
        assert_eq!(statements[0], "SELECT seq_tb_widget.nextval FROM dual");
        assert_eq!(
            statements[1],
            "INSERT INTO tb_widget (id, name, qty, price, created_by, created_at) \
             VALUES (:1, :2, :3, :4, :5, :6)"
        );
        let params = conn.last().params;
        assert_eq!(params[0], Value::I64(41));
        assert_eq!(params[1], Value::from("bolt"));
        assert_eq!(params[4], Value::from("system"));
        assert_eq!(params[5], Value::Null);
    }

    #[tokio::test]
    async fn test_insert_with_preset_id_skips_sequence() {
        let (db, conn) = setup();
        let mut gadget = Gadget {
            id: 9,
            label: "dial".to_string(),
        };
        let id = db.model::<Gadget>().query().insert(&mut gadget).await.unwrap();
        assert_eq!(id, 9);
        assert_eq!(
            conn.statements(),
            vec!["INSERT INTO tb_gadget (id, label) VALUES (:1, :2)".to_string()]
        );
    }

    #[tokio::test]
    async fn test_insert_coerces_sequence_value_to_key_type() {
        let (db, conn) = setup();
        conn.push_rows(vec![Row::new().with("NEXTVAL", "12")]);
        let mut gadget = Gadget::default();
        db.query().insert(&mut gadget).await.unwrap();
        assert_eq!(gadget.id, 12i32);

        conn.push_rows(vec![Row::new().with("NEXTVAL", "99999999999")]);
        let mut overflow = Gadget::default();
        let err = assert_err!(db.query().insert(&mut overflow).await);
        assert!(matches!(err, Error::Coercion { .. }));
        assert_eq!(overflow.id, 0);
    }

    #[tokio::test]
    async fn test_sequence_failure_aborts_insert() {
        let (db, conn) = setup();
        conn.fail_when("nextval");
        let mut widget = Widget::default();
        let err = assert_err!(db.query().insert(&mut widget).await);
        match err {
            Error::SequenceFetchFailed { sequence, source } => {
                assert_eq!(sequence, "seq_tb_widget");
                assert!(matches!(*source, Error::Database(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(conn.statements().len(), 1);

        let empty = MockConnection::new();
        let db = Db::new(empty.clone());
        let err = assert_err!(db.query().insert(&mut Widget::default()).await);
        assert!(matches!(err, Error::SequenceFetchFailed { .. }));
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_record_id() {
        let (db, conn) = setup();
        conn.push_rows(vec![Row::new().with("NEXTVAL", "5")]);
        conn.fail_when("INSERT INTO");
        let mut widget = Widget::default();
        assert_err!(db.query().insert(&mut widget).await);
        assert_eq!(widget.id, 0);
    }

    #[tokio::test]
    async fn test_add_flat_fields() {
        let (db, conn) = setup();
        let affected = db.add("tb_widget", "name, qty", ("bolt", 4)).await.unwrap();
        assert_eq!(affected, 1);
        assert_eq!(
            conn.last().sql,
            "INSERT INTO tb_widget (name, qty) VALUES (:1, :2)"
        );

        let err = assert_err!(db.add("tb_widget", "name, qty", ["bolt"]).await);
        assert!(matches!(err, Error::InvalidQuery { .. }));
        let err = assert_err!(db.add("tb_widget", "name,,qty", ("a", "b")).await);
        assert!(matches!(err, Error::InvalidQuery { .. }));
    }
}
