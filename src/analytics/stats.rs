//! Statistics for one cluster in one year.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::StabilityMode;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::schema::{
    ClusterId, ClusterIndicatorStats, ClusterStatsResponse, CountryCluster, PredictionResponse,
};

use super::ClusterAnalytics;

impl ClusterAnalytics {
    /// Summary of `cluster` in `year`. Fails with
    /// [`AnalyticsError::EmptyCluster`] when no country was assigned to it.
    pub fn cluster_stats(
        &self,
        year: i32,
        cluster: ClusterId,
    ) -> AnalyticsResult<ClusterStatsResponse> {
        let current = self.predictor.predict_clusters(year)?;
        let members = current.members(cluster);
        if members.is_empty() {
            return Err(AnalyticsError::EmptyCluster { year, cluster });
        }

        let prior = if year >= self.config.history_start {
            Some(self.predictor.predict_clusters(year - 1)?)
        } else {
            None
        };

        let stability = match prior.as_deref() {
            None => self.config.early_history_stability,
            Some(prior) if prior.is_empty() => self.config.missing_history_stability,
            Some(prior) => stability_ratio(
                &countries_in(&current, cluster),
                &countries_in(prior, cluster),
                self.config.stability_mode,
            ),
        };
        let transitions = prior
            .as_deref()
            .map(|prior| transitions(cluster, prior, &current))
            .unwrap_or_default();

        let ranking = self.config.ranking_size;
        let top_countries = members
            .iter()
            .take(ranking)
            .map(|c| c.country.clone())
            .collect();
        let bottom_countries = members[members.len().saturating_sub(ranking)..]
            .iter()
            .map(|c| c.country.clone())
            .collect();

        tracing::debug!(year, cluster, members = members.len(), stability, "cluster stats");
        Ok(ClusterStatsResponse {
            cluster,
            name: self.labels.name(cluster),
            color: self.labels.color(cluster),
            countries_count: members.len(),
            top_countries,
            bottom_countries,
            stability,
            indicators: self.cluster_indicators(&members, year),
            transitions,
            regional_distribution: self
                .regions
                .distribution(members.iter().map(|c| c.country.as_str())),
        })
    }

    /// Feature statistics over the member nodes, most variable first.
    fn cluster_indicators(
        &self,
        members: &[&CountryCluster],
        year: i32,
    ) -> Vec<ClusterIndicatorStats> {
        let nodes: Vec<usize> = members
            .iter()
            .filter_map(|m| self.predictor.node_for(&m.country, year))
            .map(|(_, node)| node)
            .collect();
        if nodes.is_empty() {
            return Vec::new();
        }

        let features = self.predictor.graph(self.predictor.mode_for(year)).features();
        let mut stats: Vec<ClusterIndicatorStats> = self
            .catalog
            .feature_mapping()
            .iter()
            .filter(|&(&idx, _)| idx < features.ncols())
            .filter_map(|(&idx, name)| {
                let values: Vec<f64> = nodes.iter().map(|&n| features[[n, idx]] as f64).collect();
                summarize(name, &values)
            })
            .filter(|s| s.std_dev >= self.config.min_indicator_std)
            .collect();

        stats.sort_by(|a, b| b.std_dev.total_cmp(&a.std_dev));
        stats.truncate(self.config.max_indicators);
        stats
    }
}

fn countries_in(prediction: &PredictionResponse, cluster: ClusterId) -> BTreeSet<&str> {
    prediction
        .members(cluster)
        .into_iter()
        .map(|c| c.country.as_str())
        .collect()
}

/// Share of a cluster's membership that carried over from the prior year.
///
/// [`StabilityMode::Legacy`] compares the prior-year set with itself, so it
/// only distinguishes an empty prior cluster (0.0) from a populated one (1.0).
pub fn stability_ratio(
    current: &BTreeSet<&str>,
    prior: &BTreeSet<&str>,
    mode: StabilityMode,
) -> f64 {
    let (base, other) = match mode {
        StabilityMode::YearOverYear => (current, prior),
        StabilityMode::Legacy => (prior, prior),
    };
    if base.is_empty() {
        return 0.0;
    }
    base.intersection(other).count() as f64 / base.len() as f64
}

/// Moves into `cluster` keyed `from_<prior>`, moves out keyed `to_<new>`,
/// counted over countries predicted in both years.
pub fn transitions(
    cluster: ClusterId,
    prior: &PredictionResponse,
    current: &PredictionResponse,
) -> BTreeMap<String, usize> {
    let previous: BTreeMap<&str, ClusterId> = prior
        .clusters
        .iter()
        .map(|c| (c.country.as_str(), c.cluster))
        .collect();

    let mut moves = BTreeMap::new();
    for now in &current.clusters {
        let Some(&before) = previous.get(now.country.as_str()) else {
            continue;
        };
        if before == now.cluster {
            continue;
        }
        let key = if now.cluster == cluster {
            format!("from_{before}")
        } else if before == cluster {
            format!("to_{}", now.cluster)
        } else {
            continue;
        };
        *moves.entry(key).or_insert(0) += 1;
    }
    moves
}

/// Mean, min, max and population standard deviation. `None` for empty input
/// or a non-finite deviation.
pub fn summarize(indicator: &str, values: &[f64]) -> Option<ClusterIndicatorStats> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if !std_dev.is_finite() {
        return None;
    }
    Some(ClusterIndicatorStats {
        indicator: indicator.to_string(),
        avg_value: mean,
        min_value: values.iter().copied().fold(f64::INFINITY, f64::min),
        max_value: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        std_dev,
    })
}
