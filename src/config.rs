use crate::error::ConfigError;
use crate::layout::{LineEngine, Margins, TableSorter};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Application configuration loaded from a TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Position store section
    #[serde(default)]
    pub store: StoreConfig,
}

/// Layout configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub origin_x: f64,
    pub origin_y: f64,
    pub node_gap_x: f64,
    pub node_gap_y: f64,
    /// Nodes per grid row before wrapping
    pub max_per_row: usize,
    /// Added to the bounding box width
    pub horizontal_margin: i32,
    /// Added to the bounding box height
    pub vertical_margin: i32,
    /// Space kept between the canvas edge and the nearest node
    pub edge_margin: i32,
    pub self_loop_offset: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 40.0,
            origin_y: 40.0,
            node_gap_x: 60.0,
            node_gap_y: 60.0,
            max_per_row: 6,
            horizontal_margin: 300,
            vertical_margin: 500,
            edge_margin: 20,
            self_loop_offset: 25.0,
        }
    }
}

/// Position store section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding pages and positions
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

impl LayoutConfig {
    pub fn sorter(&self) -> TableSorter {
        TableSorter {
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            node_gap_x: self.node_gap_x,
            node_gap_y: self.node_gap_y,
            max_per_row: self.max_per_row,
            ..TableSorter::default()
        }
    }

    pub fn line_engine(&self) -> LineEngine {
        LineEngine {
            self_loop_offset: self.self_loop_offset,
        }
    }

    pub fn margins(&self) -> Margins {
        Margins {
            horizontal: self.horizontal_margin,
            vertical: self.vertical_margin,
            edge: self.edge_margin,
        }
    }
}
