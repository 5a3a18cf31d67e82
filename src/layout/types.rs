//! Data structures shared by the sorter, the link line engine and the
//! orchestrator.

use serde::Serialize;

use crate::measure::TextMetrics;
use crate::model::Table;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned footprint of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// True when the interiors intersect; shared edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Visual placement of exactly one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    name: String,
    schema_name: String,
    x: f64,
    y: f64,
    size: Size,
    /// Whether `x`/`y` hold a real position (stored or sorted).
    placed: bool,
    dirty: bool,
    page: Option<i32>,
}

impl TableView {
    /// A fresh, unplaced view sized from the table's contents.
    pub fn for_table(table: &Table, metrics: &TextMetrics) -> Self {
        Self {
            name: table.name.clone(),
            schema_name: table.schema_name.clone(),
            x: 0.0,
            y: 0.0,
            size: metrics.node_size(table),
            placed: false,
            dirty: false,
            page: None,
        }
    }

    /// Name of the table this view projects.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.size.width,
            height: self.size.height,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.size.width / 2.0
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn page(&self) -> Option<i32> {
        self.page
    }

    /// Move the view. Its connectors are stale until recalculated.
    pub fn set_position(&mut self, x: f64, y: f64) {
        if self.placed && self.x == x && self.y == y {
            return;
        }
        self.x = x;
        self.y = y;
        self.placed = true;
        self.dirty = true;
    }

    /// Restore a persisted position without marking the view dirty.
    pub fn restore_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
        self.placed = true;
    }

    pub fn set_clean(&mut self) {
        self.dirty = false;
    }

    pub fn set_page(&mut self, page: Option<i32>) {
        self.page = page;
    }
}

/// A numbered partition of the table set.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct SchemaPage {
    pub id: i32,
    pub name: String,
    /// Member table names, in display order.
    #[serde(default)]
    pub tables: Vec<String>,
}

impl SchemaPage {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tables: Vec::new(),
        }
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t == table)
    }

    pub fn add_table(&mut self, table: &str) {
        if !self.contains(table) {
            self.tables.push(table.to_string());
        }
    }

    pub fn remove_table(&mut self, table: &str) {
        self.tables.retain(|t| t != table);
    }
}

/// A connector for one foreign key between two table views.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkLine {
    /// Referencing table.
    pub from: String,
    /// Referenced table.
    pub to: String,
    pub label: Option<String>,
    pub(crate) from_index: usize,
    pub(crate) to_index: usize,
    /// Orthogonal path points (start, turns, end)
    pub(crate) waypoints: Vec<(f64, f64)>,
    /// Endpoint positions the waypoints were computed against.
    pub(crate) from_seen: (f64, f64),
    pub(crate) to_seen: (f64, f64),
}

impl LinkLine {
    pub fn waypoints(&self) -> &[(f64, f64)] {
        &self.waypoints
    }

    pub fn is_self_ref(&self) -> bool {
        self.from_index == self.to_index
    }

    pub fn endpoints(&self) -> (usize, usize) {
        (self.from_index, self.to_index)
    }
}
