//! Link line construction and incremental recalculation.

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::LayoutError;
use crate::model::TableMap;

use super::anchors::{route_between, route_self_ref};
use super::types::{LinkLine, TableView};

/// Builds connectors for the foreign keys between table views.
#[derive(Debug, Clone)]
pub struct LineEngine {
    pub(crate) self_loop_offset: f64,
}

impl Default for LineEngine {
    fn default() -> Self {
        Self {
            self_loop_offset: 25.0,
        }
    }
}

impl LineEngine {
    /// One line per foreign key whose two tables both have a view.
    ///
    /// Keys into tables outside `tables` are not drawn. A key into a table
    /// that is loaded but has no view is an integrity violation: the line is
    /// dropped and logged.
    pub fn calc_lines(&self, views: &[TableView], tables: &TableMap) -> Vec<LinkLine> {
        let index: HashMap<&str, usize> = views
            .iter()
            .enumerate()
            .map(|(i, v)| (v.name(), i))
            .collect();

        let mut lines = Vec::new();

        for (from_index, view) in views.iter().enumerate() {
            let Some(table) = tables.get(view.name()) else {
                continue;
            };

            for fk in &table.foreign_keys {
                if !tables.contains_key(&fk.references) {
                    debug!(from = table.name, to = fk.references; "Skipping key into unloaded table");
                    continue;
                }
                let Some(&to_index) = index.get(fk.references.as_str()) else {
                    let err = LayoutError::InconsistentRelationship {
                        from: table.name.clone(),
                        to: fk.references.clone(),
                    };
                    warn!("Dropping link line: {err}");
                    continue;
                };

                let mut line = LinkLine {
                    from: table.name.clone(),
                    to: fk.references.clone(),
                    label: fk.name.clone(),
                    from_index,
                    to_index,
                    waypoints: Vec::new(),
                    from_seen: (f64::NAN, f64::NAN),
                    to_seen: (f64::NAN, f64::NAN),
                };
                self.route(&mut line, views);
                lines.push(line);
            }
        }

        lines
    }

    /// Recalculate `line` if an endpoint is dirty or moved since the line was
    /// last routed. Returns the indices of the views whose geometry changed.
    pub fn recalculate(
        &self,
        line: &mut LinkLine,
        views: &[TableView],
    ) -> Result<Vec<usize>, LayoutError> {
        let (Some(from), Some(to)) = (views.get(line.from_index), views.get(line.to_index)) else {
            return Err(line.inconsistency());
        };
        if from.name() != line.from || to.name() != line.to {
            return Err(line.inconsistency());
        }

        let from_changed = from.is_dirty() || (from.x(), from.y()) != line.from_seen;
        let to_changed = to.is_dirty() || (to.x(), to.y()) != line.to_seen;

        let mut touched = Vec::new();
        if from_changed {
            touched.push(line.from_index);
        }
        if to_changed && line.to_index != line.from_index {
            touched.push(line.to_index);
        }

        if !touched.is_empty() {
            self.route(line, views);
        }
        Ok(touched)
    }

    fn route(&self, line: &mut LinkLine, views: &[TableView]) {
        let from = &views[line.from_index];
        let to = &views[line.to_index];

        line.waypoints = if line.is_self_ref() {
            route_self_ref(from, self.self_loop_offset)
        } else {
            route_between(from, to)
        };
        line.from_seen = (from.x(), from.y());
        line.to_seen = (to.x(), to.y());
    }
}

impl LinkLine {
    fn inconsistency(&self) -> LayoutError {
        LayoutError::InconsistentRelationship {
            from: self.from.clone(),
            to: self.to.clone(),
        }
    }
}
