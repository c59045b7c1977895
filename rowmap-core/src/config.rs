//! Naming conventions for derived tables and sequences

use crate::Result;
use serde::{Deserialize, Serialize};

/// Naming configuration shared by every builder created from one [`Db`](crate::Db).
///
/// All fields are optional when loaded from JSON:
///
/// ```
/// use rowmap_core::Config;
///
/// let config = Config::from_json(r#"{ "table_prefix": "app_" }"#).unwrap();
/// assert_eq!(config.table_for("Widget"), "app_widget");
/// assert_eq!(config.sequence_for("app_widget"), "seq_app_widget");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix of tables derived from record type names
    pub table_prefix: String,
    /// Prefix of the per-table id sequences
    pub sequence_prefix: String,
    /// One-row table used for sequence reads
    pub single_row_source: String,
    /// Projection used until `select` is called
    pub default_projection: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_prefix: "tb_".to_string(),
            sequence_prefix: "seq_".to_string(),
            single_row_source: "dual".to_string(),
            default_projection: "*".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn with_sequence_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.sequence_prefix = prefix.into();
        self
    }

    pub fn with_single_row_source(mut self, source: impl Into<String>) -> Self {
        self.single_row_source = source.into();
        self
    }

    pub fn with_default_projection(mut self, projection: impl Into<String>) -> Self {
        self.default_projection = projection.into();
        self
    }

    /// Table for a record type: prefix plus the lower-cased type name
    pub fn table_for(&self, type_name: &str) -> String {
        format!("{}{}", self.table_prefix, type_name.to_lowercase())
    }

    pub fn sequence_for(&self, table: &str) -> String {
        format!("{}{}", self.sequence_prefix, table)
    }
}
