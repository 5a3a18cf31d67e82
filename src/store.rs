//! Page and position persistence.
//!
//! A [`PositionStore`] hands out one [`StoreConnection`] per batch. Writes
//! made through a connection are staged and only become visible when the
//! connection is committed; dropping it discards them, so a batch is
//! persisted completely or not at all.
//!
//! Implementations:
//! - [`MemoryStore`]: process-local, for tests and the wasm entry point
//! - [`FileStore`]: a single JSON document on disk

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::layout::{SchemaPage, TableView};

/// Source of store connections.
pub trait PositionStore: Send + Sync {
    /// Check out a connection for one batch of reads or writes.
    fn connect(&self) -> Result<Box<dyn StoreConnection + '_>, StoreError>;
}

/// One checked-out connection. Released when dropped.
pub trait StoreConnection {
    /// Page definitions of a schema, in their stored order. Member lists are
    /// filled in by [`StoreConnection::read_table_page`].
    fn read_schema_pages(&mut self, schema: &str) -> Result<IndexMap<i32, SchemaPage>, StoreError>;

    /// Apply the stored position and page of `view`, if any, and register
    /// the view's table with its page.
    fn read_table_page(
        &mut self,
        schema: &str,
        view: &mut TableView,
        pages: &mut IndexMap<i32, SchemaPage>,
    ) -> Result<(), StoreError>;

    /// Stage an upsert of the view's position and page.
    fn insert_table(&mut self, schema: &str, view: &TableView) -> Result<(), StoreError>;

    /// Stage an upsert of a page definition.
    fn insert_page(&mut self, schema: &str, page: &SchemaPage) -> Result<(), StoreError>;

    /// Persist every staged write at once.
    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Serialized form shared by the bundled stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub schemas: BTreeMap<String, SchemaRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaRecord {
    #[serde(default)]
    pub pages: Vec<PageRecord>,
    #[serde(default)]
    pub tables: BTreeMap<String, PositionRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub page: Option<i32>,
}

#[derive(Debug, Clone)]
pub(crate) enum StagedWrite {
    Table {
        schema: String,
        table: String,
        record: PositionRecord,
    },
    Page {
        schema: String,
        page: PageRecord,
    },
}

impl StoreDocument {
    pub(crate) fn apply(&mut self, writes: &[StagedWrite]) {
        for write in writes {
            match write {
                StagedWrite::Table {
                    schema,
                    table,
                    record,
                } => {
                    let entry = self.schemas.entry(schema.clone()).or_default();
                    entry.tables.insert(table.clone(), *record);
                }
                StagedWrite::Page { schema, page } => {
                    let entry = self.schemas.entry(schema.clone()).or_default();
                    match entry.pages.iter_mut().find(|p| p.id == page.id) {
                        Some(existing) => existing.name = page.name.clone(),
                        None => entry.pages.push(page.clone()),
                    }
                }
            }
        }
    }

    fn schema_pages(&self, schema: &str) -> IndexMap<i32, SchemaPage> {
        self.schemas
            .get(schema)
            .map(|s| {
                s.pages
                    .iter()
                    .map(|p| (p.id, SchemaPage::new(p.id, p.name.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn table_record(&self, schema: &str, table: &str) -> Option<&PositionRecord> {
        self.schemas.get(schema)?.tables.get(table)
    }
}

/// Connection over a snapshot of a [`StoreDocument`]; `persist` receives the
/// staged writes on commit.
pub(crate) struct DocumentConnection<F>
where
    F: FnOnce(Vec<StagedWrite>) -> Result<(), StoreError>,
{
    snapshot: StoreDocument,
    staged: Vec<StagedWrite>,
    persist: F,
}

impl<F> DocumentConnection<F>
where
    F: FnOnce(Vec<StagedWrite>) -> Result<(), StoreError>,
{
    pub(crate) fn new(snapshot: StoreDocument, persist: F) -> Self {
        Self {
            snapshot,
            staged: Vec::new(),
            persist,
        }
    }
}

impl<F> StoreConnection for DocumentConnection<F>
where
    F: FnOnce(Vec<StagedWrite>) -> Result<(), StoreError>,
{
    fn read_schema_pages(&mut self, schema: &str) -> Result<IndexMap<i32, SchemaPage>, StoreError> {
        Ok(self.snapshot.schema_pages(schema))
    }

    fn read_table_page(
        &mut self,
        schema: &str,
        view: &mut TableView,
        pages: &mut IndexMap<i32, SchemaPage>,
    ) -> Result<(), StoreError> {
        let Some(record) = self.snapshot.table_record(schema, view.name()) else {
            return Ok(());
        };
        if !(record.x.is_finite() && record.y.is_finite()) {
            return Err(StoreError::Backend(format!(
                "non-finite position stored for {schema}.{}",
                view.name()
            )));
        }

        view.restore_position(record.x, record.y);
        if let Some(page) = record.page.and_then(|id| pages.get_mut(&id)) {
            page.add_table(view.name());
            view.set_page(Some(page.id));
        }
        Ok(())
    }

    fn insert_table(&mut self, schema: &str, view: &TableView) -> Result<(), StoreError> {
        self.staged.push(StagedWrite::Table {
            schema: schema.to_string(),
            table: view.name().to_string(),
            record: PositionRecord {
                x: view.x(),
                y: view.y(),
                page: view.page(),
            },
        });
        Ok(())
    }

    fn insert_page(&mut self, schema: &str, page: &SchemaPage) -> Result<(), StoreError> {
        self.staged.push(StagedWrite::Page {
            schema: schema.to_string(),
            page: PageRecord {
                id: page.id,
                name: page.name.clone(),
            },
        });
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        if this.staged.is_empty() {
            return Ok(());
        }
        (this.persist)(this.staged)
    }
}
