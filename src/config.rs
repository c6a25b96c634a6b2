//! Rebuild configuration, stored as TOML.
//!
//! ```toml
//! [graph]
//! include_topics = true
//!
//! [similarity]
//! run_jaccard = true
//! run_semantic = true
//! jaccard_threshold = 0.0
//! min_shared_neighbors = 2
//! semantic_threshold = 0.77
//! model = "all-MiniLM-L6-v2"
//! batch_size = 256
//! mode = "idempotent"
//!
//! [tables]
//! path = "my-citations.toml"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::citation::CitationTables;
use crate::embed::DEFAULT_MODEL;
use crate::error::{ConfigError, ConfigResult};
use crate::graph::AugmentMode;

/// Top-level rebuild configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub graph: GraphConfig,
    pub similarity: SimilarityConfig,
    pub tables: TablesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Create topic nodes and their edges.
    pub include_topics: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            include_topics: true,
        }
    }
}

/// Similarity augmentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub run_jaccard: bool,
    pub run_semantic: bool,
    /// Jaccard scores must exceed this.
    pub jaccard_threshold: f64,
    /// Minimum shared neighbors for a Jaccard candidate.
    pub min_shared_neighbors: usize,
    /// Angular similarity must exceed this.
    pub semantic_threshold: f64,
    /// Sentence model for the text pass (`sentence-model` feature).
    pub model: String,
    pub batch_size: usize,
    pub mode: AugmentMode,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            run_jaccard: true,
            run_semantic: true,
            jaccard_threshold: 0.0,
            min_shared_neighbors: 2,
            semantic_threshold: 0.77,
            model: DEFAULT_MODEL.to_string(),
            batch_size: 256,
            mode: AugmentMode::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    /// Replacement citation tables. The bundled tables are used when unset.
    pub path: Option<PathBuf>,
}

impl PipelineConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let s = &self.similarity;
        if !(0.0..=1.0).contains(&s.jaccard_threshold) {
            return Err(ConfigError::Invalid {
                message: format!("jaccard_threshold {} is outside [0, 1]", s.jaccard_threshold),
            });
        }
        if !(0.0..=1.0).contains(&s.semantic_threshold) {
            return Err(ConfigError::Invalid {
                message: format!("semantic_threshold {} is outside [0, 1]", s.semantic_threshold),
            });
        }
        if s.batch_size == 0 {
            return Err(ConfigError::Invalid {
                message: "batch_size must be positive".into(),
            });
        }
        if s.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "similarity.model must name a sentence model".into(),
            });
        }
        Ok(())
    }

    /// The configured citation tables, or the bundled ones.
    pub fn citation_tables(&self) -> ConfigResult<CitationTables> {
        match &self.tables.path {
            Some(path) => CitationTables::load(path),
            None => CitationTables::bundled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert!(config.graph.include_topics);
        assert_eq!(config.similarity.min_shared_neighbors, 2);
        assert_eq!(config.similarity.semantic_threshold, 0.77);
        assert_eq!(config.similarity.mode, AugmentMode::Idempotent);
        assert_eq!(config.similarity.model, "all-MiniLM-L6-v2");
        assert!(config.tables.path.is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/pipeline.toml");
        let mut config = PipelineConfig::default();
        config.similarity.mode = AugmentMode::Additive;
        config.graph.include_topics = false;
        config.save(&path).unwrap();

        let loaded = PipelineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "[similarity]\nrun_semantic = false\nmode = \"additive\"\n").unwrap();
        let loaded = PipelineConfig::load(&path).unwrap();
        assert!(!loaded.similarity.run_semantic);
        assert!(loaded.similarity.run_jaccard);
        assert_eq!(loaded.similarity.mode, AugmentMode::Additive);
        assert!(loaded.graph.include_topics);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "[similarity]\nsemantic_threshold = 1.5\n").unwrap();
        assert!(matches!(
            PipelineConfig::load(&path),
            Err(ConfigError::Invalid { .. })
        ));

        std::fs::write(&path, "[similarity]\nmode = \"sometimes\"\n").unwrap();
        assert!(matches!(
            PipelineConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            PipelineConfig::load(&dir.path().join("absent.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
