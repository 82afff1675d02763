//! `--config` file handling.

use anyhow::{Context, Result};
use ddigraph_graph::{LayoutConfig, QueryConfig};
use ddigraph_storage::StorageConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything a run can be configured with; any section may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub storage: StorageConfig,
    pub query: QueryConfig,
    pub layout: LayoutConfig,
}

impl PipelineConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
