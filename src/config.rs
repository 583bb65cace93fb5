//! Editor configuration loaded from TOML.
//!
//! ```toml
//! [autolink]
//! match-mode = "name-only"
//! skip-fact-pairs = false
//!
//! [routing]
//! max-curvature = 100.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::autolink::AutoLinkOptions;
use crate::layout::{LayoutEngine, RoutingConfig, TableGeometry};
use crate::persist::STORAGE_KEY;
use crate::state::DiagramState;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: STORAGE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PlannerConfig {
    pub autolink: AutoLinkOptions,
    pub geometry: TableGeometry,
    pub routing: RoutingConfig,
    pub storage: StorageConfig,
}

impl PlannerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn layout_engine(&self) -> LayoutEngine {
        LayoutEngine::new(self.geometry, self.routing)
    }

    /// Apply the configured auto-link options to a loaded state.
    pub fn configure(&self, state: DiagramState) -> DiagramState {
        state.with_autolink(self.autolink.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autolink::{LinkGranularity, MatchMode};

    #[test]
    fn test_empty_config_is_default() {
        let config = PlannerConfig::from_toml_str("").unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.routing.max_curvature, 120.0);
        assert_eq!(config.storage.key, "sql-planner-state-v2");
    }

    #[test]
    fn test_partial_sections() {
        let config = PlannerConfig::from_toml_str(
            r#"
            [autolink]
            match-mode = "name-only"
            granularity = "table"

            [geometry]
            row-height = 28.0
            "#,
        )
        .unwrap();
        assert_eq!(config.autolink.match_mode, MatchMode::NameOnly);
        assert_eq!(config.autolink.granularity, LinkGranularity::Table);
        assert!(config.autolink.skip_fact_pairs);
        assert_eq!(config.geometry.row_height, 28.0);
        assert_eq!(config.geometry.width, 240.0);
    }

    #[test]
    fn test_invalid_config() {
        let err = PlannerConfig::from_toml_str("[autolink]\nmatch-mode = \"fuzzy\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = PlannerConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("here.toml"));
    }
}
