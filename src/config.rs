//! Service configuration, persisted as TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration that looks for artifacts in `$XDG_DATA_HOME/dinq/`.
//! Lookup tables (cluster display names, region membership) live here as data
//! rather than as branches in the analytics code.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analytics::lookup::{ClusterProfile, Region};
use crate::paths::DinqPaths;

/// Errors from configuration loading.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(dinq::config::read),
        help("Ensure the config file exists and is readable, or omit `--config` to use defaults.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(dinq::config::parse),
        help("Check the TOML syntax. Unknown keys are rejected.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(dinq::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(dinq::config::invalid), help("{message}"))]
    Invalid { message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub artifacts: ArtifactConfig,
    pub prediction: PredictionConfig,
    pub analytics: AnalyticsConfig,
    pub server: ServerConfig,
}

/// Locations of the externally produced artifacts.
///
/// `None` means "use the default file name inside the XDG data directory".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactConfig {
    /// Classifier weights (JSON or bincode, optionally `.gz`).
    pub model: Option<PathBuf>,
    /// Historical graph: node features, edges, optional `node_offset` table.
    pub historical_graph: Option<PathBuf>,
    /// Future graph: node features, edges, per-node years and country list.
    pub future_graph: Option<PathBuf>,
    /// Long-format indicator dataset (`Economy,Year,Indicator,Value`).
    pub dataset: Option<PathBuf>,
}

/// Fully resolved artifact paths.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub historical_graph: PathBuf,
    pub future_graph: PathBuf,
    pub dataset: PathBuf,
}

impl ArtifactConfig {
    /// Fill unset paths from the data directory.
    pub fn resolve(&self, paths: &DinqPaths) -> ArtifactPaths {
        let pick = |explicit: &Option<PathBuf>, file_name: &str| {
            explicit
                .clone()
                .unwrap_or_else(|| paths.artifact(file_name))
        };
        ArtifactPaths {
            model: pick(&self.model, "gcn_weights.json"),
            historical_graph: pick(&self.historical_graph, "historical_graph.json"),
            future_graph: pick(&self.future_graph, "future_graph.json"),
            dataset: pick(&self.dataset, "cleaned_final_dataset.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PredictionConfig {
    /// Years below this use the historical graph; the rest use the future graph.
    pub future_threshold: i32,
    /// The future graph's country list is truncated to this many entries.
    pub future_country_limit: usize,
    /// Memoize `predict_clusters` results per year.
    pub cache_predictions: bool,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            future_threshold: 2025,
            future_country_limit: 99,
            cache_predictions: false,
        }
    }
}

/// How cluster stability is computed for years with history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StabilityMode {
    /// Share of the cluster's current members that were in it the year before.
    #[default]
    YearOverYear,
    /// Prior-year membership compared with itself: 1.0 for a non-empty cluster,
    /// 0.0 otherwise. Reproduces the reference service's output.
    Legacy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Last year of every trend window.
    pub current_year: i32,
    /// First year with a usable prior year for stability and transitions.
    pub history_start: i32,
    /// Stability reported for years before `history_start`.
    pub early_history_stability: f64,
    /// Stability reported when the prior year has no predictions.
    pub missing_history_stability: f64,
    pub stability_mode: StabilityMode,
    /// Indicators whose std-dev across members falls below this are dropped.
    pub min_indicator_std: f64,
    pub max_indicators: usize,
    /// Length of the top/bottom country slices.
    pub ranking_size: usize,
    pub fallback_color: String,
    pub clusters: Vec<ClusterProfile>,
    pub regions: Vec<Region>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            current_year: 2025,
            history_start: 2015,
            early_history_stability: 0.7,
            missing_history_stability: 0.5,
            stability_mode: StabilityMode::default(),
            min_indicator_std: 0.001,
            max_indicators: 10,
            ranking_size: 5,
            fallback_color: "#666666".into(),
            clusters: ClusterProfile::defaults(),
            regions: Region::defaults(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Inclusive lower bound accepted for `year` path parameters.
    pub min_year: i32,
    /// Inclusive upper bound accepted for `year` path parameters.
    pub max_year: i32,
    /// Cluster ids accepted by `/cluster-stats` are `0..cluster_count`.
    pub cluster_count: u32,
    pub default_years_back: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8000,
            min_year: 2014,
            max_year: 2028,
            cluster_count: 3,
            default_years_back: 5,
        }
    }
}

impl ServiceConfig {
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

    /// Load `path` if given, else `$DINQ_CONFIG`, else the XDG config file if it
    /// exists, else defaults.
    pub fn discover(path: Option<&Path>, paths: &DinqPaths) -> ConfigResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        if let Ok(env_path) = std::env::var("DINQ_CONFIG") {
            return Self::load(Path::new(&env_path));
        }
        let xdg = paths.config_file();
        if xdg.exists() {
            return Self::load(&xdg);
        }
        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
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

    /// Reject values the core cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        let a = &self.analytics;
        if a.max_indicators == 0 {
            return Err(ConfigError::Invalid {
                message: "analytics.max_indicators must be > 0".into(),
            });
        }
        if a.min_indicator_std < 0.0 {
            return Err(ConfigError::Invalid {
                message: "analytics.min_indicator_std must be >= 0".into(),
            });
        }
        for value in [a.early_history_stability, a.missing_history_stability] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    message: format!("stability fallbacks must lie in [0, 1], got {value}"),
                });
            }
        }
        if self.server.min_year > self.server.max_year {
            return Err(ConfigError::Invalid {
                message: format!(
                    "server.min_year ({}) is after server.max_year ({})",
                    self.server.min_year, self.server.max_year
                ),
            });
        }
        Ok(())
    }
}
