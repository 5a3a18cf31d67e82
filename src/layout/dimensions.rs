//! Canvas size and translation from node positions.

use serde::Serialize;

use super::types::TableView;

/// Canvas pixel size plus the offset that makes every position non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: i32,
    pub height: i32,
    pub translation_x: i32,
    pub translation_y: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct Margins {
    pub horizontal: i32,
    pub vertical: i32,
    pub edge: i32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            horizontal: 300,
            vertical: 500,
            edge: 20,
        }
    }
}

/// Bounding box of all view positions, widened by the fixed margins.
///
/// An empty view list yields all zeros.
pub fn calc_dimensions(views: &[TableView], margins: &Margins) -> Dimensions {
    if views.is_empty() {
        return Dimensions::default();
    }

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for view in views {
        min_x = min_x.min(view.x());
        min_y = min_y.min(view.y());
        max_x = max_x.max(view.x());
        max_y = max_y.max(view.y());
    }

    Dimensions {
        width: extent(max_x - min_x, margins.horizontal),
        height: extent(max_y - min_y, margins.vertical),
        translation_x: extent(-min_x, margins.edge),
        translation_y: extent(-min_y, margins.edge),
    }
}

/// Truncate `span`, add `margin`, and saturate at the `i32` range.
fn extent(span: f64, margin: i32) -> i32 {
    let value = span.trunc() + f64::from(margin);
    value.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}
