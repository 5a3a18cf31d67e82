pub mod config;
pub mod error;
pub mod layout;
pub mod measure;
pub mod metadata;
pub mod model;
pub mod schema;
pub mod session;
pub mod store;

use std::sync::Arc;

use wasm_bindgen::prelude::*;

pub use error::{LayoutError, LoadError, MetadataError, StoreError};
pub use metadata::{CatalogSource, MetadataSource};
pub use schema::{LayoutPhase, LayoutState, PrepareOutcome, SchemaViewModel, SortedSchema};
pub use session::{ConnectionHandle, SchemaSession};
pub use store::{FileStore, MemoryStore, PositionStore};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Lay out one schema of a JSON catalog and return the view model as JSON.
///
/// Without `schema` the first schema of the catalog is used. Positions are
/// kept in memory only.
#[wasm_bindgen(js_name = "layoutSchema")]
pub fn layout_schema(catalog: &str, schema: Option<String>) -> Result<String, String> {
    let source = CatalogSource::from_json(catalog).map_err(|e| e.to_string())?;
    let label = match schema {
        Some(label) => label,
        None => source
            .schema_labels()
            .next()
            .ok_or_else(|| "catalog has no schemas".to_string())?
            .to_string(),
    };

    let mut session = SchemaSession::new();
    session.register(label.clone(), ConnectionHandle::new(label.clone(), "wasm"));

    let mut sorted = SortedSchema::new(Arc::new(source), Arc::new(MemoryStore::new()));
    let outcome = sorted.prepare_schema(&mut session, &label);
    if let Some(err) = outcome.warning {
        return Err(err.to_string());
    }

    serde_json::to_string(&sorted.state().view_model()).map_err(|e| e.to_string())
}
