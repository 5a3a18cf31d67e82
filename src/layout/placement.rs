//! Node placement on a level grid.

use std::collections::{BTreeMap, HashMap};

use super::types::{Rect, Size};

/// Grid geometry for one placement pass.
#[derive(Debug, Clone)]
pub struct Grid {
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_width: f64,
    pub cell_height: f64,
    pub max_per_row: usize,
}

impl Grid {
    /// Size cells from the largest footprint so no two cells' nodes touch.
    pub fn for_sizes<'a>(
        sizes: impl IntoIterator<Item = &'a Size>,
        origin: (f64, f64),
        gap: (f64, f64),
        max_per_row: usize,
    ) -> Self {
        let (max_w, max_h) = sizes
            .into_iter()
            .fold((0.0_f64, 0.0_f64), |(w, h), s| (w.max(s.width), h.max(s.height)));
        Self {
            origin_x: origin.0,
            origin_y: origin.1,
            cell_width: max_w + gap.0,
            cell_height: max_h + gap.1,
            max_per_row: max_per_row.max(1),
        }
    }

    fn cell(&self, row: usize, col: usize, size: Size) -> Rect {
        Rect {
            x: self.origin_x + col as f64 * self.cell_width,
            y: self.origin_y + row as f64 * self.cell_height,
            width: size.width,
            height: size.height,
        }
    }
}

/// Place the nodes of each level in consecutive grid rows, skipping any cell
/// whose footprint would intersect an occupied rectangle.
///
/// Every level starts a new row and wraps after `max_per_row` cells. The
/// result is fully determined by the iteration order of `levels`.
pub fn place_levels(
    levels: &BTreeMap<usize, Vec<&str>>,
    node_sizes: &HashMap<&str, Size>,
    occupied: &[Rect],
    grid: &Grid,
) -> Vec<(String, f64, f64)> {
    let mut occupied = occupied.to_vec();
    let mut placed = Vec::new();
    let mut row = 0;

    for names in levels.values() {
        let mut col = 0;

        for &name in names {
            let Some(&size) = node_sizes.get(name) else {
                continue;
            };

            // Cells only advance and the occupied set is finite.
            let rect = loop {
                if col == grid.max_per_row {
                    row += 1;
                    col = 0;
                }
                let candidate = grid.cell(row, col, size);
                col += 1;
                if !occupied.iter().any(|r| r.overlaps(&candidate)) {
                    break candidate;
                }
            };

            placed.push((name.to_string(), rect.x, rect.y));
            occupied.push(rect);
        }

        if col > 0 {
            row += 1;
        }
    }

    placed
}
