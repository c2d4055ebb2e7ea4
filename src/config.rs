//! Startup configuration.
//!
//! Values come from an optional JSON file; command-line flags override
//! whatever the file sets.

use clap::ValueEnum;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::tiling::{with_padding, HorizontalSplit, Insets, SliceAndDice, Tiler, VerticalSplit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TilerKind {
    /// Alternate rows and columns by depth.
    #[default]
    SliceAndDice,
    /// Columns only.
    Vertical,
    /// Rows only.
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial depth cap, 0 for unlimited.
    pub max_depth: usize,
    pub tiler: TilerKind,
    /// Space kept free on each side of a cell, in terminal cells.
    pub padding: f64,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 0,
            tiler: TilerKind::default(),
            padding: 1.0,
            log_file: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn tiler(&self) -> Box<dyn Tiler> {
        let insets = Insets::uniform(self.padding.max(0.0));
        match self.tiler {
            TilerKind::SliceAndDice => Box::new(with_padding(SliceAndDice, insets)),
            TilerKind::Vertical => Box::new(with_padding(VerticalSplit, insets)),
            TilerKind::Horizontal => Box::new(with_padding(HorizontalSplit, insets)),
        }
    }
}
