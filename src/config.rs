//! Recommender run configuration.
//!
//! Values come from, in increasing precedence: [`RecommenderConfig::default`],
//! a TOML file (explicit path or `<config dir>/gremlite/config.toml`), and
//! command-line overrides applied by the binary.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// How graph-based strategies turn co-occurrences into scores.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScoreWeighting {
    /// Every candidate scores 1.0 regardless of how often it was reached.
    Uniform,
    /// A candidate scores the number of similar profiles that bookmarked it.
    #[default]
    Frequency,
}

/// Settings shared by every recommender strategy in a batch run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Maximum number of listings persisted per profile.
    pub top_n: usize,
    /// Score assignment for graph-based strategies.
    pub weighting: ScoreWeighting,
    /// Strategies run by the batch runner, in order.
    pub strategies: Vec<String>,
    /// Skip disabled, deleted, unapproved and out-of-agency private listings.
    pub respect_visibility: bool,
    /// `tracing` filter directive used by the binary.
    pub log_level: String,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            weighting: ScoreWeighting::Frequency,
            strategies: vec!["graph_cf".to_owned()],
            respect_visibility: true,
            log_level: "info".to_owned(),
        }
    }
}

impl RecommenderConfig {
    /// Short lists from every built-in strategy; suited to smoke runs.
    pub fn quick() -> Self {
        Self {
            top_n: 3,
            strategies: vec!["graph_cf".to_owned(), "popularity".to_owned()],
            ..Self::default()
        }
    }

    /// Long, unweighted lists with visibility rules off; suited to offline
    /// evaluation of raw traversal output.
    pub fn exhaustive() -> Self {
        Self {
            top_n: 100,
            weighting: ScoreWeighting::Uniform,
            respect_visibility: false,
            ..Self::default()
        }
    }

    /// Loads the configuration from `explicit`, or from the default location.
    /// A missing file yields the defaults.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self> {
        match explicit.or_else(default_config_path) {
            Some(path) if path.exists() => Self::from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parses a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|err| GraphError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let config: Self = toml::from_str(&contents).map_err(|err| GraphError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.strategies.is_empty() {
            return Err(GraphError::Config {
                path: path.to_path_buf(),
                message: "at least one strategy must be configured".to_owned(),
            });
        }
        Ok(())
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| GraphError::Config {
            path: PathBuf::new(),
            message: err.to_string(),
        })
    }
}

/// Default configuration file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("gremlite").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RecommenderConfig::load(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, RecommenderConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "top_n = 5\nweighting = \"uniform\"").unwrap();
        let config = RecommenderConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.top_n, 5);
        assert_eq!(config.weighting, ScoreWeighting::Uniform);
        assert_eq!(config.strategies, vec!["graph_cf".to_owned()]);
        assert!(config.respect_visibility);
    }

    #[test]
    fn invalid_file_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "top_n = \"many\"").unwrap();
        let err = RecommenderConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, GraphError::Config { path, .. } if path == file.path()));
    }

    #[test]
    fn empty_strategy_list_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "strategies = []").unwrap();
        assert!(RecommenderConfig::from_path(file.path()).is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let config = RecommenderConfig::quick();
        let text = config.to_toml().unwrap();
        let parsed: RecommenderConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
