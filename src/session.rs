//! Session-scoped state shared with the orchestrator.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How to reach one data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionHandle {
    /// Display title; also the schema label passed to the metadata source.
    pub title: String,
    /// Backend-specific address of the source (file path, URL, ...).
    #[serde(default)]
    pub locator: String,
}

impl ConnectionHandle {
    pub fn new(title: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            locator: locator.into(),
        }
    }
}

/// The schema a viewer currently has open plus its registered connections.
///
/// The connection registry is written by whoever owns the session; the
/// orchestrator only reads it and updates the active identifier after a
/// successful load.
#[derive(Debug, Clone, Default)]
pub struct SchemaSession {
    active: Option<String>,
    connections: IndexMap<String, ConnectionHandle>,
}

impl SchemaSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, handle: ConnectionHandle) {
        self.connections.insert(id.into(), handle);
    }

    pub fn connection(&self, id: &str) -> Option<&ConnectionHandle> {
        self.connections.get(id)
    }

    /// Registered identifiers, in registration order.
    pub fn connection_ids(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub(crate) fn set_active(&mut self, id: &str) {
        self.active = Some(id.to_string());
    }

    /// Forget the active schema so the next prepare reloads it.
    pub fn clear_active(&mut self) {
        self.active = None;
    }
}
