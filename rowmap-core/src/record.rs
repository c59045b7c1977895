//! Record codec: typed records to column lists and back
//!
//! A record type describes its column mapping once through [`record!`](crate::record!),
//! which generates the [`Columns`], [`FromRow`] and [`Record`] implementations.
//! One embedded part declared with [`columns!`](crate::columns!) can be flattened
//! into the same row namespace.
//!
//! ```
//! use rowmap_core::{columns, record, BeforeInsert};
//!
//! #[derive(Debug, Default, Clone)]
//! struct Audit {
//!     created_by: String,
//! }
//!
//! columns! { Audit { created_by => "created_by" } }
//!
//! #[derive(Debug, Default, Clone)]
//! struct Widget {
//!     id: i64,
//!     name: String,
//!     qty: i32,
//!     audit: Audit,
//! }
//!
//! record! {
//!     Widget {
//!         key id: i64 => "id",
//!         name => "name",
//!         qty => "qty",
//!     }
//!     embed audit;
//!     hooks [before_insert];
//! }
//!
//! impl BeforeInsert for Widget {
//!     fn before_insert(&mut self) {
//!         self.audit.created_by = "system".to_string();
//!     }
//! }
//!
//! let row = rowmap_core::record::to_row(&Widget { id: 3, name: "bolt".into(), ..Default::default() });
//! assert_eq!(row.get("name"), Some(Some("bolt")));
//! assert_eq!(row.get("created_by"), Some(Some("")));
//! ```

use crate::row::{FromRow, IdType, Row};
use crate::{Result, Value};

/// One encoded column of a record
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub value: Value,
    /// Assigned by the server; left out of INSERT and UPDATE payloads
    pub auto: bool,
}

/// Column mapping of a record or of an embedded part.
pub trait Columns {
    /// Append every mapped column, in declaration order.
    fn encode(&self, out: &mut Vec<Column>);

    /// Fill mapped fields from `row`; columns the row lacks leave fields untouched.
    fn decode(&mut self, row: &Row) -> Result<()>;
}

/// A table-backed record with a primary key.
pub trait Record: Columns + FromRow + Default + Send + Sync {
    type Id: IdType;

    /// Bare type name; the table is derived from it when none is given
    const TYPE_NAME: &'static str;
    const ID_COLUMN: &'static str;

    fn id(&self) -> &Self::Id;
    fn set_id(&mut self, id: Self::Id);

    /// Runs right before an INSERT is rendered
    fn before_insert(&mut self) {}

    /// Runs right before a flush UPDATE is rendered
    fn before_update(&mut self) {}
}

/// Pre-insert hook. Listed in `record!`'s `hooks [...]` to be wired in.
pub trait BeforeInsert {
    fn before_insert(&mut self);
}

/// Pre-update hook. Listed in `record!`'s `hooks [...]` to be wired in.
pub trait BeforeUpdate {
    fn before_update(&mut self);
}

pub fn encode<T: Columns + ?Sized>(record: &T) -> Vec<Column> {
    let mut columns = Vec::new();
    record.encode(&mut columns);
    columns
}

/// Render a record as a text row, the shape the connection would return.
pub fn to_row<T: Columns + ?Sized>(record: &T) -> Row {
    encode(record)
        .into_iter()
        .map(|column| (column.name.to_string(), column.value.to_text()))
        .collect()
}

/// Decode every row, in row order.
pub fn decode_many<T: FromRow>(rows: &[Row]) -> Result<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}

/// Decode into an existing destination, resized to the row count.
pub fn decode_into<T: FromRow>(rows: &[Row], out: &mut Vec<T>) -> Result<()> {
    out.clear();
    out.reserve(rows.len());
    for row in rows {
        out.push(T::from_row(row)?);
    }
    Ok(())
}

/// Implement [`Columns`] for a plain struct, usually an embedded part of a record.
#[macro_export]
macro_rules! columns {
    (
        $ty:ident {
            $($field:ident => $col:literal $([$flag:ident])?),* $(,)?
        }
    ) => {
        impl $crate::record::Columns for $ty {
            fn encode(&self, out: &mut ::std::vec::Vec<$crate::record::Column>) {
                $(
                    out.push($crate::record::Column {
                        name: $col,
                        value: $crate::row::ColumnType::to_value(&self.$field),
                        auto: $crate::__column_flag!($($flag)?),
                    });
                )*
                let _ = out;
            }

            fn decode(&mut self, row: &$crate::row::Row) -> $crate::Result<()> {
                $($crate::row::decode_column(row, $col, &mut self.$field)?;)*
                let _ = row;
                Ok(())
            }
        }
    };
}

/// Implement the record codec for a struct.
///
/// ```text
/// record! {
///     Widget {
///         key id: i64 => "id",
///         name => "name",
///         updated_at => "updated_at" [auto],
///     }
///     embed audit;                       // optional, one part
///     hooks [before_insert, before_update]; // optional
/// }
/// ```
#[macro_export]
macro_rules! record {
    (
        $ty:ident {
            key $id:ident : $id_ty:ty => $id_col:literal,
            $($field:ident => $col:literal $([$flag:ident])?),* $(,)?
        }
        $(embed $embed:ident;)?
        $(hooks [$($hook:ident),* $(,)?];)?
    ) => {
        impl $crate::record::Columns for $ty {
            fn encode(&self, out: &mut ::std::vec::Vec<$crate::record::Column>) {
                out.push($crate::record::Column {
                    name: $id_col,
                    value: $crate::row::ColumnType::to_value(&self.$id),
                    auto: false,
                });
                $(
                    out.push($crate::record::Column {
                        name: $col,
                        value: $crate::row::ColumnType::to_value(&self.$field),
                        auto: $crate::__column_flag!($($flag)?),
                    });
                )*
                $($crate::record::Columns::encode(&self.$embed, out);)?
            }

            fn decode(&mut self, row: &$crate::row::Row) -> $crate::Result<()> {
                $crate::row::decode_column(row, $id_col, &mut self.$id)?;
                $($crate::row::decode_column(row, $col, &mut self.$field)?;)*
                $($crate::record::Columns::decode(&mut self.$embed, row)?;)?
                Ok(())
            }
        }

        impl $crate::row::FromRow for $ty {
            fn from_row(row: &$crate::row::Row) -> $crate::Result<Self> {
                let mut record = <Self as ::std::default::Default>::default();
                $crate::record::Columns::decode(&mut record, row)?;
                Ok(record)
            }

            fn record_type() -> ::std::option::Option<&'static str> {
                ::std::option::Option::Some(stringify!($ty))
            }
        }

        impl $crate::record::Record for $ty {
            type Id = $id_ty;

            const TYPE_NAME: &'static str = stringify!($ty);
            const ID_COLUMN: &'static str = $id_col;

            fn id(&self) -> &Self::Id {
                &self.$id
            }

            fn set_id(&mut self, id: Self::Id) {
                self.$id = id;
            }

            $($($crate::__record_hook!($hook);)*)?
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __column_flag {
    () => {
        false
    };
    (auto) => {
        true
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_hook {
    (before_insert) => {
        fn before_insert(&mut self) {
            <Self as $crate::record::BeforeInsert>::before_insert(self)
        }
    };
    (before_update) => {
        fn before_update(&mut self) {
            <Self as $crate::record::BeforeUpdate>::before_update(self)
        }
    };
}
