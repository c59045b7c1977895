//! SQL fragments for the ROWNUM/sequence dialect

use crate::condition::ParamIndexer;

/// Guard clause limiting a read to its first row.
///
/// This is plain WHERE text, not a row-limiting operator: it is evaluated
/// before ORDER BY and binds only to the last term of an OR chain.
pub const FIRST_ROW_GUARD: &str = "ROWNUM <= 1";

/// Row-locking suffix for reads inside a transaction
pub const ROW_LOCK: &str = " FOR UPDATE";

/// Row-number column added by [`paginate`]
pub const ROW_NUMBER_COLUMN: &str = "rn";

/// Key column assumed by the flat `save` helper
pub const DEFAULT_ID_COLUMN: &str = "id";

pub fn bind_marker(index: usize) -> String {
    format!(":{index}")
}

/// Number the `?` placeholders of a hand-written statement as `:1..:k`.
pub fn number_placeholders(sql: &str) -> String {
    ParamIndexer::new().number(sql)
}

/// Wrap `base` in the double-nested ROWNUM window `[offset, limit]`.
pub fn paginate(base: &str, offset: i64, limit: i64) -> String {
    format!(
        "SELECT * FROM (SELECT paged_inner.*, ROWNUM AS {rn} FROM ({base}) paged_inner \
         WHERE ROWNUM <= {limit}) paged_outer WHERE paged_outer.{rn} >= {offset}",
        rn = ROW_NUMBER_COLUMN,
    )
}

/// Statement reading the next value of `sequence`.
pub fn next_id_sql(sequence: &str, single_row_source: &str) -> String {
    format!("SELECT {sequence}.nextval FROM {single_row_source}")
}

/// Append the first-row guard to rendered WHERE text (which may be empty).
pub fn append_guard(where_sql: &mut String) {
    if where_sql.is_empty() {
        where_sql.push_str(" WHERE ");
    } else {
        where_sql.push_str(" AND ");
    }
    where_sql.push_str(FIRST_ROW_GUARD);
}

/// `INSERT INTO table (a, b) VALUES (:1, :2)` for `columns.len()` bound values.
pub fn insert_sql<S: AsRef<str>>(table: &str, columns: &[S]) -> String {
    let mut indexer = ParamIndexer::new();
    let names: Vec<&str> = columns.iter().map(AsRef::as_ref).collect();
    let markers: Vec<String> = columns.iter().map(|_| indexer.next_marker()).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        names.join(", "),
        markers.join(", ")
    )
}

/// `a = :1, b = :2` assignments, numbered from `indexer`.
pub fn assignments<S: AsRef<str>>(columns: &[S], indexer: &mut ParamIndexer) -> String {
    columns
        .iter()
        .map(|column| format!("{} = {}", column.as_ref(), indexer.next_marker()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_markers() {
        assert_eq!(bind_marker(1), ":1");
        assert_eq!(
            number_placeholders("SELECT * FROM t WHERE a = ? AND b = ?"),
            "SELECT * FROM t WHERE a = :1 AND b = :2"
        );
        assert_eq!(number_placeholders("SELECT 1 FROM dual"), "SELECT 1 FROM dual");
    }

    #[test]
    fn test_paginate_wraps_base_select() {
        assert_eq!(
            paginate("SELECT * FROM tb_widget", 10, 20),
            "SELECT * FROM (SELECT paged_inner.*, ROWNUM AS rn FROM (SELECT * FROM tb_widget) paged_inner \
             WHERE ROWNUM <= 20) paged_outer WHERE paged_outer.rn >= 10"
        );
    }

    #[test]
    fn test_next_id_sql() {
        assert_eq!(
            next_id_sql("seq_tb_widget", "dual"),
            "SELECT seq_tb_widget.nextval FROM dual"
        );
    }

    #[test]
    fn test_guard_clause() {
        let mut empty = String::new();
        append_guard(&mut empty);
        assert_eq!(empty, " WHERE ROWNUM <= 1");

        let mut filtered = String::from(" WHERE a = :1 OR b = :2");
        append_guard(&mut filtered);
        assert_eq!(filtered, " WHERE a = :1 OR b = :2 AND ROWNUM <= 1");
    }

    #[test]
    fn test_insert_and_assignments() {
        assert_eq!(
            insert_sql("tb_widget", &["id", "name"]),
            "INSERT INTO tb_widget (id, name) VALUES (:1, :2)"
        );
        let mut indexer = ParamIndexer::new();
        assert_eq!(assignments(&["name", "qty"], &mut indexer), "name = :1, qty = :2");
        assert_eq!(indexer.next_marker(), ":3");
    }
}
