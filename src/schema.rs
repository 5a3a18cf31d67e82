//! Layout orchestration for one schema-viewing session.
//!
//! [`SortedSchema`] owns the [`LayoutState`] of the schema a session is
//! looking at. It decides per request whether the table set has to be
//! reloaded and fully sorted, or whether only the connectors of moved
//! tables need recalculating.

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::config::LayoutConfig;
use crate::error::{LayoutError, LoadError, StoreError};
use crate::layout::{
    Dimensions, LineEngine, LinkLine, Margins, SchemaPage, TableSorter, TableView,
    calc_dimensions,
};
use crate::metadata::MetadataSource;
use crate::model::TableMap;
use crate::session::SchemaSession;
use crate::store::PositionStore;

/// Where the layout stands relative to its table set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutPhase {
    /// Never sorted.
    Unsorted,
    /// Every view placed and every connector current.
    Sorted,
    /// A view moved or the table set changed since the last recompute.
    Dirty,
}

/// Result of [`SortedSchema::prepare_schema`].
#[derive(Debug)]
pub struct PrepareOutcome {
    /// Whether a new table set was loaded and fully sorted.
    pub new_tables: bool,
    /// Set when loading failed and the previous layout was kept.
    pub warning: Option<LayoutError>,
}

/// The computed view model of one schema.
#[derive(Debug, Clone, Default)]
pub struct LayoutState {
    name: String,
    dimensions: Dimensions,
    table_views: Vec<TableView>,
    pages: IndexMap<i32, SchemaPage>,
    lines: Vec<LinkLine>,
    tables: TableMap,
    sorted: bool,
    sort_passes: u64,
}

impl LayoutState {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> i32 {
        self.dimensions.width
    }

    pub fn height(&self) -> i32 {
        self.dimensions.height
    }

    pub fn translation_x(&self) -> i32 {
        self.dimensions.translation_x
    }

    pub fn translation_y(&self) -> i32 {
        self.dimensions.translation_y
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn table_views(&self) -> &[TableView] {
        &self.table_views
    }

    pub fn lines(&self) -> &[LinkLine] {
        &self.lines
    }

    pub fn pages(&self) -> &IndexMap<i32, SchemaPage> {
        &self.pages
    }

    pub fn tables(&self) -> &TableMap {
        &self.tables
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn phase(&self) -> LayoutPhase {
        if !self.sorted {
            if self.sort_passes == 0 {
                LayoutPhase::Unsorted
            } else {
                LayoutPhase::Dirty
            }
        } else if self.table_views.iter().any(TableView::is_dirty) {
            LayoutPhase::Dirty
        } else {
            LayoutPhase::Sorted
        }
    }

    /// Snapshot for the rendering layer.
    pub fn view_model(&self) -> SchemaViewModel {
        SchemaViewModel {
            name: self.name.clone(),
            width: self.dimensions.width,
            height: self.dimensions.height,
            translation_x: self.dimensions.translation_x,
            translation_y: self.dimensions.translation_y,
            phase: self.phase(),
            table_views: self
                .table_views
                .iter()
                .map(|v| TableViewModel {
                    name: v.name().to_string(),
                    schema_name: v.schema_name().to_string(),
                    x: v.x(),
                    y: v.y(),
                    width: v.size().width,
                    height: v.size().height,
                    page: v.page(),
                })
                .collect(),
            lines: self
                .lines
                .iter()
                .map(|l| LinkLineModel {
                    from: l.from.clone(),
                    to: l.to.clone(),
                    label: l.label.clone(),
                    waypoints: l.waypoints().to_vec(),
                })
                .collect(),
            pages: self.pages.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaViewModel {
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub translation_x: i32,
    pub translation_y: i32,
    pub phase: LayoutPhase,
    pub table_views: Vec<TableViewModel>,
    pub lines: Vec<LinkLineModel>,
    pub pages: IndexMap<i32, SchemaPage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableViewModel {
    pub name: String,
    pub schema_name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub page: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkLineModel {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub waypoints: Vec<(f64, f64)>,
}

/// A freshly read table set, not yet committed to the layout state.
struct LoadedSchema {
    name: String,
    tables: TableMap,
    views: Vec<TableView>,
    pages: IndexMap<i32, SchemaPage>,
}

/// Layout orchestrator for one schema-viewing session.
///
/// Each session owns its own instance; the collaborators behind the `Arc`s
/// may be shared.
pub struct SortedSchema {
    state: LayoutState,
    metadata: Arc<dyn MetadataSource>,
    store: Arc<dyn PositionStore>,
    sorter: TableSorter,
    line_engine: LineEngine,
    margins: Margins,
}

impl SortedSchema {
    pub fn new(metadata: Arc<dyn MetadataSource>, store: Arc<dyn PositionStore>) -> Self {
        Self::with_config(metadata, store, &LayoutConfig::default())
    }

    pub fn with_config(
        metadata: Arc<dyn MetadataSource>,
        store: Arc<dyn PositionStore>,
        config: &LayoutConfig,
    ) -> Self {
        Self {
            state: LayoutState::default(),
            metadata,
            store,
            sorter: config.sorter(),
            line_engine: config.line_engine(),
            margins: config.margins(),
        }
    }

    pub fn state(&self) -> &LayoutState {
        &self.state
    }

    /// Bring the layout up to date for schema `dbi`.
    ///
    /// The table set is reloaded only when `dbi` differs from the session's
    /// active schema. A failed load keeps the previous layout and reports the
    /// failure as `warning`.
    pub fn prepare_schema(&mut self, session: &mut SchemaSession, dbi: &str) -> PrepareOutcome {
        let mut warning = None;

        let new_tables = if session.active() == Some(dbi) {
            false
        } else {
            match self.read_tables(session, dbi) {
                Ok(loaded) => {
                    self.install(loaded);
                    session.set_active(dbi);
                    true
                }
                Err(err) => {
                    warn!(schema = dbi; "Keeping previous layout: {err}");
                    warning = Some(err);
                    false
                }
            }
        };

        self.prepare_table_views(new_tables);
        self.calc_dimensions();

        PrepareOutcome {
            new_tables,
            warning,
        }
    }

    fn read_tables(&self, session: &SchemaSession, dbi: &str) -> Result<LoadedSchema, LayoutError> {
        let fail = |source: LoadError| LayoutError::SchemaLoadFailure {
            schema: dbi.to_string(),
            source,
        };

        let handle = session
            .connection(dbi)
            .ok_or_else(|| fail(LoadError::UnknownConnection(dbi.to_string())))?;
        let name = handle.title.clone();

        let tables = self
            .metadata
            .get_tables(handle, &name)
            .map_err(|e| fail(e.into()))?;

        let mut views: Vec<TableView> = tables
            .values()
            .map(|t| TableView::for_table(t, self.sorter.metrics()))
            .collect();
        let pages = if tables.is_empty() {
            IndexMap::new()
        } else {
            self.read_stored_layout(&name, &mut views)
                .map_err(|e| fail(e.into()))?
        };

        Ok(LoadedSchema {
            name,
            tables,
            views,
            pages,
        })
    }

    /// Read pages and stored positions over one store connection.
    fn read_stored_layout(
        &self,
        name: &str,
        views: &mut [TableView],
    ) -> Result<IndexMap<i32, SchemaPage>, StoreError> {
        let mut conn = self.store.connect()?;
        let mut pages = conn.read_schema_pages(name)?;
        for view in views.iter_mut() {
            conn.read_table_page(name, view, &mut pages)?;
        }
        Ok(pages)
    }

    fn install(&mut self, loaded: LoadedSchema) {
        info!(
            schema = loaded.name,
            tables = loaded.tables.len(),
            pages = loaded.pages.len();
            "Loaded schema"
        );
        self.state.name = loaded.name;
        self.state.tables = loaded.tables;
        self.state.table_views = loaded.views;
        self.state.pages = loaded.pages;
        self.state.lines.clear();
        self.state.sorted = false;
    }

    /// Full sort when unsorted or the table set is new, otherwise recalculate
    /// only the connectors whose endpoints moved.
    pub fn prepare_table_views(&mut self, is_new_tables: bool) {
        if !self.state.sorted || is_new_tables {
            self.sort_and_link(None, false);
            return;
        }

        let views = &self.state.table_views;
        let engine = &self.line_engine;
        let mut touched = BTreeSet::new();

        self.state.lines.retain_mut(|line| match engine.recalculate(line, views) {
            Ok(changed) => {
                touched.extend(changed);
                true
            }
            Err(err) => {
                warn!("Dropping link line: {err}");
                false
            }
        });

        for &index in &touched {
            self.state.table_views[index].set_clean();
        }

        // Whatever is still dirty has no connectors left to recalculate.
        let mut lineless = 0;
        for view in self.state.table_views.iter_mut().filter(|v| v.is_dirty()) {
            view.set_clean();
            lineless += 1;
        }

        debug!(
            recalculated = touched.len(),
            lineless = lineless;
            "Incremental connector update"
        );
    }

    /// Explicit re-layout, optionally restricted to the tables of one page.
    ///
    /// With `resort` set, placed tables in scope are moved too; otherwise
    /// only unplaced tables receive positions.
    pub fn resort_table_views(
        &mut self,
        resort: bool,
        current_page: Option<i32>,
    ) -> Result<(), LayoutError> {
        if let Some(id) = current_page
            && !self.state.pages.contains_key(&id)
        {
            return Err(LayoutError::UnknownPage(id));
        }
        self.sort_and_link(current_page, resort);
        self.calc_dimensions();
        Ok(())
    }

    fn sort_and_link(&mut self, page: Option<i32>, resort: bool) {
        let page = page.and_then(|id| self.state.pages.get(&id));
        let views = self
            .sorter
            .sort(&self.state.tables, &self.state.table_views, page, resort);

        self.state.lines = self.line_engine.calc_lines(&views, &self.state.tables);
        self.state.table_views = views;
        self.state.sorted = true;
        self.state.sort_passes += 1;

        debug!(
            schema = self.state.name,
            views = self.state.table_views.len(),
            lines = self.state.lines.len();
            "Full sort"
        );
    }

    /// Recompute canvas size and translation from the current positions.
    pub fn calc_dimensions(&mut self) {
        self.state.dimensions = calc_dimensions(&self.state.table_views, &self.margins);
    }

    /// Persist every placed view's position in one transaction, along with
    /// the pages those views are assigned to.
    pub fn save_table_positions(&self) -> Result<(), LayoutError> {
        self.save_batch(false)
    }

    /// Persist page definitions and every placed view in one transaction.
    pub fn save_table_views(&self) -> Result<(), LayoutError> {
        self.save_batch(true)
    }

    fn save_batch(&self, include_pages: bool) -> Result<(), LayoutError> {
        let result = self.write_batch(include_pages);
        match &result {
            Ok(count) => info!(schema = self.state.name, views = *count; "Saved table positions"),
            Err(err) => error!(schema = self.state.name; "{err}"),
        }
        result.map(|_| ())
    }

    fn write_batch(&self, include_pages: bool) -> Result<usize, LayoutError> {
        let fail = |table: Option<&str>, source: StoreError| LayoutError::PositionPersistenceFailure {
            table: table.map(str::to_string),
            source,
        };
        let schema = &self.state.name;

        let mut conn = self.store.connect().map_err(|e| fail(None, e))?;

        // Pages referenced by a view always go along so the id resolves on reload.
        let pages = self.state.pages.values().filter(|page| {
            include_pages
                || self
                    .state
                    .table_views
                    .iter()
                    .any(|v| v.is_placed() && v.page() == Some(page.id))
        });
        for page in pages {
            conn.insert_page(schema, page).map_err(|e| fail(None, e))?;
        }

        let mut count = 0;
        for view in self.state.table_views.iter().filter(|v| v.is_placed()) {
            conn.insert_table(schema, view)
                .map_err(|e| fail(Some(view.name()), e))?;
            count += 1;
        }

        conn.commit().map_err(|e| fail(None, e))?;
        Ok(count)
    }

    /// Move view `index` to the parsed coordinates. Nothing changes when
    /// either string is not a finite number.
    pub fn set_table_view_position(
        &mut self,
        index: usize,
        x: &str,
        y: &str,
    ) -> Result<(), LayoutError> {
        let len = self.state.table_views.len();
        if index >= len {
            return Err(LayoutError::UnknownTableView { index, len });
        }
        let x = parse_coordinate(x)?;
        let y = parse_coordinate(y)?;

        self.state.table_views[index].set_position(x, y);
        self.calc_dimensions();
        Ok(())
    }

    /// Append an empty page and return its id.
    pub fn add_page(&mut self, name: &str) -> i32 {
        let id = self.state.pages.keys().max().map_or(1, |max| max + 1);
        self.state.pages.insert(id, SchemaPage::new(id, name));
        id
    }

    /// Move view `index` onto `page`, or off every page with `None`.
    pub fn assign_table_page(&mut self, index: usize, page: Option<i32>) -> Result<(), LayoutError> {
        let len = self.state.table_views.len();
        if index >= len {
            return Err(LayoutError::UnknownTableView { index, len });
        }
        if let Some(id) = page
            && !self.state.pages.contains_key(&id)
        {
            return Err(LayoutError::UnknownPage(id));
        }

        let view = &mut self.state.table_views[index];
        if let Some(old) = view.page().and_then(|id| self.state.pages.get_mut(&id)) {
            old.remove_table(view.name());
        }
        if let Some(new) = page.and_then(|id| self.state.pages.get_mut(&id)) {
            new.add_table(view.name());
        }
        view.set_page(page);
        Ok(())
    }
}

fn parse_coordinate(value: &str) -> Result<f64, LayoutError> {
    let invalid = |reason: String| LayoutError::InvalidPositionInput {
        value: value.to_string(),
        reason,
    };
    let parsed: f64 = value.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    if !parsed.is_finite() {
        return Err(invalid("coordinate must be finite".to_string()));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use crate::metadata::CatalogSource;
    use crate::model::{Table, TableMap};
    use crate::session::ConnectionHandle;
    use crate::store::{MemoryStore, StoreConnection};

    fn abc() -> Vec<Table> {
        vec![
            Table::new("A", "").with_column("id", "int", true),
            Table::new("B", "")
                .with_column("id", "int", true)
                .with_foreign_key("a_id", "A", "id"),
            Table::new("C", "")
                .with_column("id", "int", true)
                .with_foreign_key("b_id", "B", "id"),
        ]
    }

    fn source() -> Arc<CatalogSource> {
        let mut source = CatalogSource::default();
        source.set_schema("shop", abc());
        source.set_schema("empty", Vec::new());
        Arc::new(source)
    }

    fn session() -> SchemaSession {
        let mut session = SchemaSession::new();
        session.register("db-shop", ConnectionHandle::new("shop", "memory"));
        session.register("db-empty", ConnectionHandle::new("empty", "memory"));
        session.register("db-missing", ConnectionHandle::new("missing", "memory"));
        session
    }

    fn positions(schema: &SortedSchema) -> Vec<(String, f64, f64)> {
        schema
            .state()
            .table_views()
            .iter()
            .map(|v| (v.name().to_string(), v.x(), v.y()))
            .collect()
    }

    fn loaded() -> (SortedSchema, SchemaSession) {
        let mut schema = SortedSchema::new(source(), Arc::new(MemoryStore::new()));
        let mut session = session();
        schema.prepare_schema(&mut session, "db-shop");
        (schema, session)
    }

    #[test]
    fn test_first_load_sorts_everything() {
        let mut schema = SortedSchema::new(source(), Arc::new(MemoryStore::new()));
        let mut session = session();
        assert_eq!(schema.state().phase(), LayoutPhase::Unsorted);

        let outcome = schema.prepare_schema(&mut session, "db-shop");

        assert!(outcome.new_tables);
        assert!(outcome.warning.is_none());
        let state = schema.state();
        assert!(state.is_sorted());
        assert_eq!(state.name(), "shop");
        assert_eq!(state.table_views().len(), 3);
        let lines: Vec<(&str, &str)> = state.lines().iter().map(|l| (l.from.as_str(), l.to.as_str())).collect();
        assert_eq!(lines, vec![("B", "A"), ("C", "B")]);
        assert_eq!(state.phase(), LayoutPhase::Sorted);
        assert_eq!(session.active(), Some("db-shop"));
    }

    #[test]
    fn test_same_schema_skips_full_sort() {
        let (mut schema, mut session) = loaded();
        let before = positions(&schema);
        let lines_before = schema.state().lines().to_vec();

        let outcome = schema.prepare_schema(&mut session, "db-shop");

        assert!(!outcome.new_tables);
        assert!(outcome.warning.is_none());
        assert_eq!(positions(&schema), before);
        assert_eq!(schema.state().lines(), lines_before.as_slice());
        assert_eq!(schema.state().sort_passes, 1);
    }

    #[test]
    fn test_incremental_update_is_idempotent() {
        let (mut schema, _) = loaded();
        schema.set_table_view_position(1, "500", "700").unwrap();
        assert_eq!(schema.state().phase(), LayoutPhase::Dirty);

        schema.prepare_table_views(false);
        let first = schema.state().lines().to_vec();
        schema.prepare_table_views(false);

        assert_eq!(schema.state().lines(), first.as_slice());
        assert!(schema.state().table_views().iter().all(|v| !v.is_dirty()));
        assert_eq!(schema.state().phase(), LayoutPhase::Sorted);
        assert_eq!(schema.state().sort_passes, 1);
    }

    #[test]
    fn test_moved_view_reroutes_its_lines_only() {
        let (mut schema, _) = loaded();
        let untouched = schema.state().lines()[1].clone();

        // A only takes part in B -> A.
        schema.set_table_view_position(0, "900", "-300").unwrap();
        schema.prepare_table_views(false);

        let lines = schema.state().lines();
        let a = &schema.state().table_views()[0];
        assert_eq!(lines[0].waypoints().last().unwrap().0, a.center_x());
        assert_eq!(lines[1], untouched);
    }

    #[test]
    fn test_invalid_position_input_leaves_view_alone() {
        let (mut schema, _) = loaded();
        let before = positions(&schema);

        let err = schema.set_table_view_position(0, "not-a-number", "5").unwrap_err();
        assert!(matches!(err, LayoutError::InvalidPositionInput { ref value, .. } if value == "not-a-number"));

        let err = schema.set_table_view_position(0, "5", "NaN").unwrap_err();
        assert!(matches!(err, LayoutError::InvalidPositionInput { .. }));

        assert_eq!(positions(&schema), before);
        assert!(!schema.state().table_views()[0].is_dirty());
    }

    #[test]
    fn test_position_index_out_of_range() {
        let (mut schema, _) = loaded();
        let err = schema.set_table_view_position(3, "1", "1").unwrap_err();
        assert!(matches!(err, LayoutError::UnknownTableView { index: 3, len: 3 }));
    }

    #[test]
    fn test_far_away_position_saturates_dimensions() {
        let (mut schema, _) = loaded();

        schema.set_table_view_position(0, "3000000000", "0").unwrap();
        let dims = schema.state().dimensions();
        assert_eq!(dims.width, i32::MAX);
        assert!(dims.height >= 0);

        schema.set_table_view_position(0, "-3000000000", "0").unwrap();
        let dims = schema.state().dimensions();
        assert!(dims.width >= 0 && dims.height >= 0);
        assert_eq!(dims.translation_x, i32::MAX);
    }

    #[test]
    fn test_position_input_trims_whitespace() {
        let (mut schema, _) = loaded();
        schema.set_table_view_position(2, " 12.5 ", "-4").unwrap();
        let view = &schema.state().table_views()[2];
        assert_eq!((view.x(), view.y()), (12.5, -4.0));
    }

    #[test]
    fn test_load_failure_keeps_previous_layout() {
        let (mut schema, mut session) = loaded();
        let before = positions(&schema);

        let outcome = schema.prepare_schema(&mut session, "db-missing");

        assert!(!outcome.new_tables);
        let Some(LayoutError::SchemaLoadFailure { schema: id, source }) = outcome.warning else {
            panic!("expected a load failure");
        };
        assert_eq!(id, "db-missing");
        assert!(matches!(source, LoadError::Metadata(MetadataError::UnknownSchema(_))));
        assert_eq!(schema.state().name(), "shop");
        assert_eq!(positions(&schema), before);
        assert_eq!(session.active(), Some("db-shop"));
    }

    #[test]
    fn test_unregistered_connection() {
        let mut schema = SortedSchema::new(source(), Arc::new(MemoryStore::new()));
        let mut session = session();
        let outcome = schema.prepare_schema(&mut session, "nowhere");

        assert!(matches!(
            outcome.warning,
            Some(LayoutError::SchemaLoadFailure {
                source: LoadError::UnknownConnection(_),
                ..
            })
        ));
        assert!(session.active().is_none());
        assert!(schema.state().table_views().is_empty());
    }

    #[test]
    fn test_empty_schema_dimensions() {
        let mut schema = SortedSchema::new(source(), Arc::new(MemoryStore::new()));
        let mut session = session();
        schema.prepare_schema(&mut session, "db-empty");

        let state = schema.state();
        assert!(state.is_sorted());
        assert_eq!(state.dimensions(), Dimensions::default());
    }

    #[test]
    fn test_dimensions_follow_positions() {
        let (mut schema, _) = loaded();
        assert!(schema.state().width() >= 0 && schema.state().height() >= 0);

        schema.set_table_view_position(0, "-1000", "-1000").unwrap();
        let state = schema.state();
        assert_eq!(state.translation_x(), 1020);
        assert!(state.width() > 1000);
    }

    #[test]
    fn test_save_then_reload_reproduces_positions() {
        let store = Arc::new(MemoryStore::new());
        let mut schema = SortedSchema::new(source(), store.clone());
        let mut session = session();
        schema.prepare_schema(&mut session, "db-shop");
        schema.set_table_view_position(2, "321.5", "654.25").unwrap();
        schema.prepare_table_views(false);
        schema.save_table_positions().unwrap();

        let mut reloaded = SortedSchema::new(source(), store);
        let mut fresh_session = self::session();
        let outcome = reloaded.prepare_schema(&mut fresh_session, "db-shop");

        assert!(outcome.new_tables);
        for (a, b) in positions(&schema).iter().zip(positions(&reloaded).iter()) {
            assert_eq!(a.0, b.0);
            assert!((a.1 - b.1).abs() < 1e-9);
            assert!((a.2 - b.2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_resort_moves_stored_positions_back_to_grid() {
        let (mut schema, _) = loaded();
        let sorted = positions(&schema);
        schema.set_table_view_position(0, "5000", "5000").unwrap();

        schema.prepare_table_views(false);
        assert_ne!(positions(&schema), sorted);

        schema.resort_table_views(true, None).unwrap();
        assert_eq!(positions(&schema), sorted);
        assert_eq!(schema.state().lines().len(), 2);
    }

    #[test]
    fn test_resort_within_page() {
        let (mut schema, _) = loaded();
        let page = schema.add_page("core");
        schema.assign_table_page(1, Some(page)).unwrap();
        schema.set_table_view_position(0, "3000", "0").unwrap();
        schema.set_table_view_position(1, "3000", "3000").unwrap();

        schema.resort_table_views(true, Some(page)).unwrap();

        let views = schema.state().table_views();
        assert_eq!((views[0].x(), views[0].y()), (3000.0, 0.0));
        assert_ne!((views[1].x(), views[1].y()), (3000.0, 3000.0));
        assert!(!views[1].rect().overlaps(&views[0].rect()));
        assert!(!views[1].rect().overlaps(&views[2].rect()));
    }

    #[test]
    fn test_resort_unknown_page() {
        let (mut schema, _) = loaded();
        assert!(matches!(
            schema.resort_table_views(false, Some(42)),
            Err(LayoutError::UnknownPage(42))
        ));
    }

    #[test]
    fn test_page_assignment_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let mut schema = SortedSchema::new(source(), store.clone());
        let mut session = session();
        schema.prepare_schema(&mut session, "db-shop");

        let first = schema.add_page("accounts");
        let second = schema.add_page("orders");
        assert_eq!((first, second), (1, 2));
        schema.assign_table_page(0, Some(first)).unwrap();
        schema.assign_table_page(2, Some(first)).unwrap();
        schema.assign_table_page(2, Some(second)).unwrap();
        assert_eq!(schema.state().pages()[&first].tables, vec!["A"]);
        assert_eq!(schema.state().pages()[&second].tables, vec!["C"]);
        schema.save_table_views().unwrap();

        let mut reloaded = SortedSchema::new(source(), store);
        let mut fresh_session = self::session();
        reloaded.prepare_schema(&mut fresh_session, "db-shop");

        let pages = reloaded.state().pages();
        assert_eq!(pages.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(pages[&1].name, "accounts");
        assert_eq!(pages[&2].tables, vec!["C"]);
        assert_eq!(reloaded.state().table_views()[0].page(), Some(1));
        assert_eq!(reloaded.state().table_views()[1].page(), None);
    }

    #[test]
    fn test_save_positions_keeps_assigned_pages() {
        let store = Arc::new(MemoryStore::new());
        let mut schema = SortedSchema::new(source(), store.clone());
        let mut session = session();
        schema.prepare_schema(&mut session, "db-shop");

        let billing = schema.add_page("billing");
        schema.add_page("unused");
        schema.assign_table_page(1, Some(billing)).unwrap();
        schema.save_table_positions().unwrap();

        let mut reloaded = SortedSchema::new(source(), store);
        let mut fresh_session = self::session();
        reloaded.prepare_schema(&mut fresh_session, "db-shop");

        let pages = reloaded.state().pages();
        assert_eq!(pages.keys().copied().collect::<Vec<_>>(), vec![billing]);
        assert_eq!(pages[&billing].tables, vec!["B"]);
        assert_eq!(reloaded.state().table_views()[1].page(), Some(billing));
    }

    /// Delegates to a [`MemoryStore`] but fails the n-th staged table write.
    struct FlakyStore {
        inner: MemoryStore,
        fail_at: usize,
    }

    struct FlakyConnection<'a> {
        inner: Box<dyn StoreConnection + 'a>,
        remaining: usize,
    }

    impl PositionStore for FlakyStore {
        fn connect(&self) -> Result<Box<dyn StoreConnection + '_>, StoreError> {
            Ok(Box::new(FlakyConnection {
                inner: self.inner.connect()?,
                remaining: self.fail_at,
            }))
        }
    }

    impl StoreConnection for FlakyConnection<'_> {
        fn read_schema_pages(&mut self, schema: &str) -> Result<IndexMap<i32, SchemaPage>, StoreError> {
            self.inner.read_schema_pages(schema)
        }

        fn read_table_page(
            &mut self,
            schema: &str,
            view: &mut TableView,
            pages: &mut IndexMap<i32, SchemaPage>,
        ) -> Result<(), StoreError> {
            self.inner.read_table_page(schema, view, pages)
        }

        fn insert_table(&mut self, schema: &str, view: &TableView) -> Result<(), StoreError> {
            if self.remaining == 0 {
                return Err(StoreError::Backend("disk full".to_string()));
            }
            self.remaining -= 1;
            self.inner.insert_table(schema, view)
        }

        fn insert_page(&mut self, schema: &str, page: &SchemaPage) -> Result<(), StoreError> {
            self.inner.insert_page(schema, page)
        }

        fn commit(self: Box<Self>) -> Result<(), StoreError> {
            self.inner.commit()
        }
    }

    #[test]
    fn test_failed_save_persists_nothing() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            fail_at: 2,
        });
        let mut schema = SortedSchema::new(source(), store.clone());
        let mut session = session();
        schema.prepare_schema(&mut session, "db-shop");

        let err = schema.save_table_positions().unwrap_err();
        let LayoutError::PositionPersistenceFailure { table, .. } = err else {
            panic!("expected a persistence failure");
        };
        assert_eq!(table.as_deref(), Some("C"));
        assert!(store.inner.snapshot().unwrap().schemas.is_empty());
    }

    #[test]
    fn test_self_referencing_table() {
        let mut source = CatalogSource::default();
        source.set_schema(
            "hr",
            vec![
                Table::new("employee", "hr")
                    .with_column("id", "int", true)
                    .with_foreign_key("manager_id", "employee", "id"),
            ],
        );
        let mut session = SchemaSession::new();
        session.register("hr", ConnectionHandle::new("hr", ""));
        let mut schema = SortedSchema::new(Arc::new(source), Arc::new(MemoryStore::new()));
        schema.prepare_schema(&mut session, "hr");

        let lines = schema.state().lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_self_ref());

        schema.set_table_view_position(0, "10", "10").unwrap();
        schema.prepare_table_views(false);
        assert_eq!(schema.state().phase(), LayoutPhase::Sorted);
    }

    #[test]
    fn test_switching_schema_reloads() {
        let (mut schema, mut session) = loaded();
        let outcome = schema.prepare_schema(&mut session, "db-empty");
        assert!(outcome.new_tables);
        assert!(schema.state().table_views().is_empty());
        assert!(schema.state().lines().is_empty());
        let tables: &TableMap = schema.state().tables();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_view_model_serializes() {
        let (schema, _) = loaded();
        let json = serde_json::to_value(schema.state().view_model()).unwrap();

        assert_eq!(json["name"], "shop");
        assert_eq!(json["phase"], "sorted");
        assert_eq!(json["table_views"].as_array().unwrap().len(), 3);
        assert_eq!(json["table_views"][0]["schema_name"], "shop");
        assert_eq!(json["lines"][0]["from"], "B");
        assert!(json["width"].as_i64().unwrap() > 0);
    }
}
