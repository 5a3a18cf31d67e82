//! Table sorter: assigns a position to every table view.

use std::collections::HashMap;

use log::debug;

use crate::measure::TextMetrics;
use crate::model::TableMap;

use super::analysis::{build_table_levels, group_by_level};
use super::placement::{Grid, place_levels};
use super::types::{Rect, SchemaPage, Size, TableView};

/// Sorter configuration and computation.
#[derive(Debug, Clone)]
pub struct TableSorter {
    pub(crate) metrics: TextMetrics,
    pub(crate) origin_x: f64,
    pub(crate) origin_y: f64,
    pub(crate) node_gap_x: f64,
    pub(crate) node_gap_y: f64,
    pub(crate) max_per_row: usize,
}

impl Default for TableSorter {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
            origin_x: 40.0,
            origin_y: 40.0,
            node_gap_x: 60.0,
            node_gap_y: 60.0,
            max_per_row: 6,
        }
    }
}

impl TableSorter {
    pub fn metrics(&self) -> &TextMetrics {
        &self.metrics
    }

    /// Produce one placed view per table, in table-name order.
    ///
    /// `prior` supplies existing views (stored or earlier positions and page
    /// assignments). A table is repositioned when it has no prior position,
    /// or when `force_resort` is set and it lies within `page` (every table
    /// when `page` is `None`). All other tables keep their prior position.
    pub fn sort(
        &self,
        tables: &TableMap,
        prior: &[TableView],
        page: Option<&SchemaPage>,
        force_resort: bool,
    ) -> Vec<TableView> {
        let prior: HashMap<&str, &TableView> = prior.iter().map(|v| (v.name(), v)).collect();

        let mut views: Vec<TableView> = tables
            .values()
            .map(|table| match prior.get(table.name.as_str()) {
                Some(&view) => view.clone(),
                None => TableView::for_table(table, &self.metrics),
            })
            .collect();

        let in_scope = |name: &str| page.is_none_or(|p| p.contains(name));
        let needs_position: Vec<bool> = views
            .iter()
            .map(|v| !v.is_placed() || (force_resort && in_scope(v.name())))
            .collect();

        let occupied: Vec<Rect> = views
            .iter()
            .zip(&needs_position)
            .filter(|(_, fresh)| !**fresh)
            .map(|(v, _)| v.rect())
            .collect();

        let node_sizes: HashMap<&str, Size> = views
            .iter()
            .zip(&needs_position)
            .filter(|(_, fresh)| **fresh)
            .map(|(v, _)| (v.name(), v.size()))
            .collect();

        debug!(
            tables = tables.len(),
            repositioned = node_sizes.len(),
            force_resort = force_resort;
            "Sorting table views"
        );

        if !node_sizes.is_empty() {
            let levels = build_table_levels(tables);
            let grouped = group_by_level(&levels, |name| node_sizes.contains_key(name));
            let all_sizes: Vec<Size> = views.iter().map(|v| v.size()).collect();
            let grid = Grid::for_sizes(
                &all_sizes,
                (self.origin_x, self.origin_y),
                (self.node_gap_x, self.node_gap_y),
                self.max_per_row,
            );

            let positions: HashMap<String, (f64, f64)> =
                place_levels(&grouped, &node_sizes, &occupied, &grid)
                    .into_iter()
                    .map(|(name, x, y)| (name, (x, y)))
                    .collect();

            for view in views.iter_mut() {
                if let Some(&(x, y)) = positions.get(view.name()) {
                    view.restore_position(x, y);
                }
            }
        }

        for view in views.iter_mut() {
            view.set_clean();
        }
        views
    }
}
