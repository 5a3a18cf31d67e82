//! Connector waypoint generation between two placed views.

use super::types::TableView;

/// Waypoints for a connector from `from` to `to`.
///
/// Vertically separated views are joined bottom-to-top through their
/// midline; overlapping rows are joined side-to-side.
pub fn route_between(from: &TableView, to: &TableView) -> Vec<(f64, f64)> {
    let from_rect = from.rect();
    let to_rect = to.rect();

    if from_rect.y + from_rect.height <= to_rect.y {
        route_vertical(from, to, true)
    } else if to_rect.y + to_rect.height <= from_rect.y {
        route_vertical(from, to, false)
    } else {
        route_horizontal(from, to)
    }
}

/// Generate waypoints for a self-referential connector.
pub fn route_self_ref(view: &TableView, loop_offset: f64) -> Vec<(f64, f64)> {
    let rect = view.rect();
    let x = rect.x + rect.width;
    let y_top = rect.y + rect.height * 0.3;
    let y_bottom = rect.y + rect.height * 0.7;

    vec![
        (x, y_top),
        (x + loop_offset, y_top),
        (x + loop_offset, y_bottom),
        (x, y_bottom),
    ]
}

fn route_vertical(from: &TableView, to: &TableView, going_down: bool) -> Vec<(f64, f64)> {
    let (from_cx, to_cx) = (from.center_x(), to.center_x());
    let from_rect = from.rect();
    let to_rect = to.rect();

    let (start_y, end_y) = if going_down {
        (from_rect.y + from_rect.height, to_rect.y)
    } else {
        (from_rect.y, to_rect.y + to_rect.height)
    };

    if from_cx == to_cx {
        return vec![(from_cx, start_y), (to_cx, end_y)];
    }

    let mid_y = (start_y + end_y) / 2.0;
    vec![
        (from_cx, start_y),
        (from_cx, mid_y),
        (to_cx, mid_y),
        (to_cx, end_y),
    ]
}

fn route_horizontal(from: &TableView, to: &TableView) -> Vec<(f64, f64)> {
    let from_rect = from.rect();
    let to_rect = to.rect();
    let from_y = from_rect.y + from_rect.height / 2.0;
    let to_y = to_rect.y + to_rect.height / 2.0;

    let (start_x, end_x) = if from_rect.x <= to_rect.x {
        (from_rect.x + from_rect.width, to_rect.x)
    } else {
        (from_rect.x, to_rect.x + to_rect.width)
    };
    let mid_x = (start_x + end_x) / 2.0;

    vec![
        (start_x, from_y),
        (mid_x, from_y),
        (mid_x, to_y),
        (end_x, to_y),
    ]
}
