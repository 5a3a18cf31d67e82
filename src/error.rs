use std::path::PathBuf;

/// Errors surfaced by the layout orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Failed to load schema '{schema}': {source}")]
    SchemaLoadFailure {
        schema: String,
        #[source]
        source: LoadError,
    },
    #[error("Failed to persist table positions{}: {source}", table_suffix(.table))]
    PositionPersistenceFailure {
        table: Option<String>,
        #[source]
        source: StoreError,
    },
    #[error("Invalid position input {value:?}: {reason}")]
    InvalidPositionInput { value: String, reason: String },
    #[error("Relationship {from} -> {to} has no matching table view")]
    InconsistentRelationship { from: String, to: String },
    #[error("Unknown schema page: {0}")]
    UnknownPage(i32),
    #[error("Table view index {index} out of range ({len} views)")]
    UnknownTableView { index: usize, len: usize },
}

fn table_suffix(table: &Option<String>) -> String {
    table
        .as_ref()
        .map(|t| format!(" (table '{t}')"))
        .unwrap_or_default()
}

/// Causes of a failed schema load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no connection registered for '{0}'")]
    UnknownConnection(String),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Schema not found in catalog: {0}")]
    UnknownSchema(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Store lock poisoned")]
    Poisoned,
    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Top-level error for the command-line front end.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}
