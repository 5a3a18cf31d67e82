use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tables keyed by name. Iteration order is the name order, which is what
/// makes a sort pass reproducible for a given table set.
pub type TableMap = BTreeMap<String, Table>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub schema_name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default)]
    pub typ: String,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

/// An outgoing relationship: `columns` of the owning table reference
/// `referenced_columns` of `references`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    pub references: String,
    #[serde(default)]
    pub referenced_columns: Vec<String>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_name: schema_name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: &str, typ: &str, primary_key: bool) -> Self {
        self.columns.push(Column {
            name: name.to_string(),
            typ: typ.to_string(),
            primary_key,
            nullable: !primary_key,
        });
        self
    }

    pub fn with_foreign_key(mut self, column: &str, references: &str, referenced_column: &str) -> Self {
        self.foreign_keys.push(ForeignKey {
            name: None,
            columns: vec![column.to_string()],
            references: references.to_string(),
            referenced_columns: vec![referenced_column.to_string()],
        });
        self
    }

    /// Names of the tables this table references, self included when present.
    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.foreign_keys.iter().map(|fk| fk.references.as_str())
    }

    pub fn is_self_referencing(&self) -> bool {
        self.referenced_tables().any(|t| t == self.name)
    }
}

/// Build a [`TableMap`] from a list, keyed by table name.
pub fn table_map(tables: impl IntoIterator<Item = Table>) -> TableMap {
    tables.into_iter().map(|t| (t.name.clone(), t)).collect()
}
