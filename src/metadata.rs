//! Metadata sources: turn a connection into the table set of one schema.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::info;
use serde::Deserialize;

use crate::error::MetadataError;
use crate::model::{Table, TableMap, table_map};
use crate::session::ConnectionHandle;

/// Reads the tables of a schema through a connection.
pub trait MetadataSource: Send + Sync {
    fn get_tables(
        &self,
        connection: &ConnectionHandle,
        schema_label: &str,
    ) -> Result<TableMap, MetadataError>;
}

/// A catalog document: schema label -> tables.
///
/// ```json
/// { "schemas": { "shop": [ { "name": "users", "columns": [...] } ] } }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub schemas: IndexMap<String, Vec<Table>>,
}

/// Metadata source backed by an in-memory catalog, usually read from JSON.
#[derive(Debug, Clone, Default)]
pub struct CatalogSource {
    catalog: Catalog,
}

impl CatalogSource {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn from_json(source: &str) -> Result<Self, MetadataError> {
        let catalog: Catalog = serde_json::from_str(source)?;
        Ok(Self::new(catalog))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Schema labels in document order.
    pub fn schema_labels(&self) -> impl Iterator<Item = &str> {
        self.catalog.schemas.keys().map(String::as_str)
    }

    /// Insert or replace the tables of one schema.
    pub fn set_schema(&mut self, label: impl Into<String>, tables: Vec<Table>) {
        self.catalog.schemas.insert(label.into(), tables);
    }
}

impl MetadataSource for CatalogSource {
    fn get_tables(
        &self,
        connection: &ConnectionHandle,
        schema_label: &str,
    ) -> Result<TableMap, MetadataError> {
        let tables = self
            .catalog
            .schemas
            .get(schema_label)
            .ok_or_else(|| MetadataError::UnknownSchema(schema_label.to_string()))?;

        let tables = table_map(tables.iter().cloned().map(|mut t| {
            if t.schema_name.is_empty() {
                t.schema_name = schema_label.to_string();
            }
            t
        }));

        info!(
            schema = schema_label,
            locator = connection.locator,
            tables = tables.len();
            "Loaded tables"
        );
        Ok(tables)
    }
}
