use crate::constants::DEFAULT_OVERLAP_PERCENT;
use crate::formats;
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Grid generation settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TilingConfig {
    /// Share of a tile edge repeated in the neighbouring tile, in percent
    pub overlap_percent: f64,
    /// Catalog name of the tile format
    pub mask_format: String,
    /// Whether tiles are laid out landscape
    pub landscape: bool,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            overlap_percent: DEFAULT_OVERLAP_PERCENT,
            mask_format: "A4".to_string(),
            landscape: false,
        }
    }
}

impl TilingConfig {
    pub fn new(overlap_percent: f64, mask_format: impl Into<String>, landscape: bool) -> Self {
        Self {
            overlap_percent,
            mask_format: mask_format.into(),
            landscape,
        }
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from_landscape(self.landscape)
    }

    /// Tile (width, height) in points with orientation applied
    pub fn tile_size_pt(&self) -> (f64, f64) {
        formats::resolve(&self.mask_format).size_with_orientation(self.orientation())
    }

    /// Load a configuration from a JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let config = serde_json::from_slice(&bytes)
            .map_err(|e| TileError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Save the configuration to a JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TileError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the configuration.
    ///
    /// An overlap of 100% or more leaves no forward step between tiles, so the
    /// grid would never terminate.
    pub fn validate(&self) -> Result<()> {
        if !self.overlap_percent.is_finite() {
            return Err(TileError::Config(
                "Overlap must be a finite number".to_string(),
            ));
        }

        if !(0.0..100.0).contains(&self.overlap_percent) {
            return Err(TileError::Config(format!(
                "Overlap must be at least 0% and below 100%, got {}%",
                self.overlap_percent
            )));
        }

        Ok(())
    }
}

/// What to do with the remaining tiles after one fails to export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FailurePolicy {
    /// Export every tile and report failures individually
    #[default]
    Continue,
    /// Start no further tiles once one has failed
    StopOnFirstError,
}

/// Export settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExportOptions {
    /// Tiles built and written at the same time (at least 1)
    pub max_concurrency: usize,
    pub failure_policy: FailurePolicy,
    /// Base name for output files; defaults to the source file stem
    pub base_name: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            failure_policy: FailurePolicy::Continue,
            base_name: None,
        }
    }
}

impl ExportOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(TileError::Config(
                "Export concurrency must be at least 1".to_string(),
            ));
        }

        if let Some(name) = &self.base_name {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(TileError::Config(format!(
                    "Invalid output base name '{}'",
                    name
                )));
            }
        }

        Ok(())
    }
}
