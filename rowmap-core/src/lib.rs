//! rowmap core - fluent SQL building and record mapping for ROWNUM/sequence dialects
//!
//! This crate composes parameterized statements with `:n` bind markers,
//! wraps reads in ROWNUM pagination, draws surrogate keys from per-table
//! sequences and converts between typed records and untyped text rows.
//! The database driver itself is supplied by the caller through
//! [`Connection`].

pub mod builder;
pub mod condition;
pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod record;
pub mod row;
pub mod trace;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use builder::{OrderBy, Query, SortDirection, Statement, TableBinding};
pub use condition::{Condition, ConditionSet, ParamIndexer};
pub use config::Config;
pub use db::Db;
pub use error::{Error, Result};
pub use executor::{Connection, Executor, Transaction};
pub use record::{BeforeInsert, BeforeUpdate, Column, Columns, Record};
pub use row::{ColumnType, FromRow, IdType, Row};
pub use trace::{SqlTracer, TracingSqlTracer};
pub use value::{IntoParams, Value};
