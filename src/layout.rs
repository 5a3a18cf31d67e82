//! Layout computation: table placement, connectors and canvas dimensions.

mod analysis;
mod anchors;
mod dimensions;
mod lines;
mod placement;
mod sorter;
mod types;

pub use dimensions::{Dimensions, Margins, calc_dimensions};
pub use lines::LineEngine;
pub use sorter::TableSorter;
pub use types::{LinkLine, Rect, SchemaPage, Size, TableView};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Table, table_map};

    #[test]
    fn test_sort_lines_dimensions_pipeline() {
        let tables = table_map([
            Table::new("User", "app").with_column("id", "int", true),
            Table::new("Order", "app")
                .with_column("id", "int", true)
                .with_foreign_key("user_id", "User", "id"),
        ]);

        let views = TableSorter::default().sort(&tables, &[], None, false);
        let lines = LineEngine::default().calc_lines(&views, &tables);
        let dims = calc_dimensions(&views, &Margins::default());

        assert_eq!(views.len(), 2);
        assert_eq!(lines.len(), 1);
        assert!(dims.width > 0);
        assert!(dims.height > 0);

        let user = views.iter().find(|v| v.name() == "User").unwrap();
        let order = views.iter().find(|v| v.name() == "Order").unwrap();
        assert!(user.y() < order.y());
    }
}
