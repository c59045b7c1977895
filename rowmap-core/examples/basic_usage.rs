use rowmap_core::{
    columns, record, BeforeInsert, Connection, Db, Executor, Result, Row, Transaction,
    TracingSqlTracer, Value,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

// Connection that prints each statement and answers sequence reads and counts
#[derive(Clone, Default)]
struct PrintingConnection {
    sequence: Arc<AtomicI64>,
}

impl Executor for PrintingConnection {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        println!("EXEC  {sql} {params:?}");
        Ok(1)
    }

    async fn query_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        println!("QUERY {sql} {params:?}");
        if sql.contains(".nextval") {
            let next = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            return Ok(vec![Row::new().with("NEXTVAL", next.to_string())]);
        }
        if sql.starts_with("SELECT count(") {
            return Ok(vec![Row::new().with("COUNT(*)", "23")]);
        }
        Ok(vec![Row::new()
            .with("id", "1")
            .with("name", "bolt")
            .with("qty", "150")
            .with("created_by", "demo")])
    }
}

impl Connection for PrintingConnection {
    type Transaction = PrintingTransaction;

    async fn begin(&self) -> Result<PrintingTransaction> {
        println!("BEGIN");
        Ok(PrintingTransaction { conn: self.clone() })
    }
}

struct PrintingTransaction {
    conn: PrintingConnection,
}

impl Executor for PrintingTransaction {
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.conn.execute(sql, params).await
    }

    async fn query_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.conn.query_rows(sql, params).await
    }
}

impl Transaction for PrintingTransaction {
    async fn commit(&self) -> Result<()> {
        println!("COMMIT");
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        println!("ROLLBACK");
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
struct Audit {
    created_by: String,
}

columns! { Audit { created_by => "created_by" } }

#[derive(Debug, Default, Clone)]
struct Widget {
    id: i64,
    name: String,
    qty: i32,
    audit: Audit,
}

record! {
    Widget {
        key id: i64 => "id",
        name => "name",
        qty => "qty",
    }
    embed audit;
    hooks [before_insert];
}

impl BeforeInsert for Widget {
    fn before_insert(&mut self) {
        if self.audit.created_by.is_empty() {
            self.audit.created_by = "basic_usage".to_string();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("rowmap=debug")
        .init();

    let db = Db::new(PrintingConnection::default());
    db.trace_on(TracingSqlTracer::new().with_prefix("[demo] "));

    // One template, many independent queries
    let widgets = db.model::<Widget>();

    let big: Vec<Widget> = widgets
        .filter("name = ?", "bolt")
        .or_filter("qty > ?", 100)
        .order_by_desc("qty")
        .page(2, 10)
        .find()
        .await?;
    println!("found {} widget(s): {:?}", big.len(), big);

    println!("pages of 5: {}", widgets.page_count(5).await?);

    let mut widget = Widget {
        name: "washer".to_string(),
        qty: 7,
        ..Default::default()
    };
    let id = widgets.insert(&mut widget).await?;
    println!("inserted id {id}, created_by {}", widget.audit.created_by);

    widget.qty = 8;
    widgets.flush(&mut widget).await?;

    let moved = db
        .transaction(|mut q| async move {
            q.raw_exec("UPDATE tb_widget SET qty = qty - ? WHERE id = ?", (1, 1)).await
        })
        .await?;
    println!("moved {moved} row(s)");

    db.trace_off();
    widgets.delete_record(&widget).await?;
    Ok(())
}
