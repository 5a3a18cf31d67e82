use crate::layout::Size;
use crate::model::{Column, Table};
use unicode_width::UnicodeWidthStr;

/// Approximate text metrics used to give each table node a fixed footprint.
#[derive(Debug, Clone)]
pub struct TextMetrics {
    pub char_width: f64,
    pub line_height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    pub header_padding: f64,
    pub min_node_width: f64,
    pub min_node_height: f64,
    /// Reserved in front of primary-key columns for the key marker.
    pub key_marker_width: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 20.0,
            padding_x: 12.0,
            padding_y: 8.0,
            header_padding: 4.0,
            min_node_width: 100.0,
            min_node_height: 60.0,
            key_marker_width: 16.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    /// Width of one column row: name, gap, type, plus the key marker.
    pub fn column_width(&self, column: &Column) -> f64 {
        let marker = if column.primary_key {
            self.key_marker_width
        } else {
            0.0
        };
        marker + self.text_width(&column.name) + self.char_width * 2.0 + self.text_width(&column.typ)
    }

    /// Footprint of a table node: a header line plus one line per column.
    pub fn node_size(&self, table: &Table) -> Size {
        let header_width = self.text_width(&table.name);
        let max_col_width = table
            .columns
            .iter()
            .map(|c| self.column_width(c))
            .fold(0.0, f64::max);

        let content_width = header_width.max(max_col_width) + self.padding_x * 2.0;
        let width = content_width.max(self.min_node_width);

        let header_height = self.line_height + self.header_padding * 2.0;
        let body_height = if table.columns.is_empty() {
            0.0
        } else {
            table.columns.len() as f64 * self.line_height + self.padding_y * 2.0
        };

        let height = (header_height + body_height).max(self.min_node_height);

        Size { width, height }
    }
}
