//! Response types produced by the core and serialized by the HTTP layer and CLI.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete cluster label (arg-max class index).
pub type ClusterId = u32;

/// One country's cluster assignment in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryCluster {
    pub country: String,
    pub cluster: ClusterId,
    /// Softmax probability of the chosen class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub year: i32,
}

/// Result of `predict_clusters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub year: i32,
    pub total_countries: usize,
    pub clusters: Vec<CountryCluster>,
    /// Number of countries per cluster id.
    pub cluster_distribution: BTreeMap<ClusterId, usize>,
}

impl PredictionResponse {
    /// Build a response, deriving the totals from the assignment list.
    pub fn new(year: i32, clusters: Vec<CountryCluster>) -> Self {
        let mut cluster_distribution = BTreeMap::new();
        for item in &clusters {
            *cluster_distribution.entry(item.cluster).or_insert(0) += 1;
        }
        Self {
            year,
            total_countries: clusters.len(),
            clusters,
            cluster_distribution,
        }
    }

    /// Response for a year that resolves to no nodes.
    pub fn empty(year: i32) -> Self {
        Self::new(year, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Case-insensitive country lookup.
    pub fn find_country(&self, country: &str) -> Option<&CountryCluster> {
        self.clusters
            .iter()
            .find(|c| c.country.to_lowercase() == country.to_lowercase())
    }

    /// Members of one cluster, in prediction order.
    pub fn members(&self, cluster: ClusterId) -> Vec<&CountryCluster> {
        self.clusters.iter().filter(|c| c.cluster == cluster).collect()
    }
}

/// One point of a country's cluster history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTrend {
    pub year: i32,
    pub cluster: ClusterId,
}

/// Direction of a country's movement between the first and last year of a window.
///
/// A higher cluster id counts as more developed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
        };
        f.write_str(s)
    }
}

/// Result of `country_trends`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryTrendResponse {
    pub country: String,
    pub trends: Vec<ClusterTrend>,
    pub cluster_changes: usize,
    pub stability_score: f64,
    pub current_trend: TrendDirection,
}

/// Descriptive statistics of one indicator over a cluster's members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterIndicatorStats {
    pub indicator: String,
    pub avg_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub std_dev: f64,
}

/// Result of `cluster_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStatsResponse {
    pub cluster: ClusterId,
    pub name: String,
    pub color: String,
    pub countries_count: usize,
    /// First members in prediction order. Not ranked by any metric.
    pub top_countries: Vec<String>,
    /// Last members in prediction order.
    pub bottom_countries: Vec<String>,
    pub stability: f64,
    pub indicators: Vec<ClusterIndicatorStats>,
    /// `from_<id>` for moves into this cluster, `to_<id>` for moves out.
    pub transitions: BTreeMap<String, usize>,
    pub regional_distribution: BTreeMap<String, usize>,
}
