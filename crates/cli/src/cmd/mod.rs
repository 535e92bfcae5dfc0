//! CLI command implementations

pub mod example;
pub mod replay;
pub mod resolve;

use anyhow::{Context, Result};
use clickgate_core::ConfigLayer;
use std::path::Path;

/// Load a standalone ambient layer file
pub(crate) fn load_layer(path: &Path) -> Result<ConfigLayer> {
    ConfigLayer::load(path).with_context(|| format!("Failed to load ambient layer {}", path.display()))
}
