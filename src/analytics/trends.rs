//! Per-country cluster history.

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::schema::{ClusterTrend, CountryTrendResponse, TrendDirection};

use super::ClusterAnalytics;

impl ClusterAnalytics {
    /// Cluster history of `country` over
    /// `[current_year - years_back, current_year]`, with the start clamped to
    /// the earliest served year.
    ///
    /// Countries are matched case-insensitively; years without a match are
    /// skipped. Fails with [`AnalyticsError::CountryNotFound`] when no year
    /// matches.
    pub fn country_trends(
        &self,
        country: &str,
        years_back: u32,
    ) -> AnalyticsResult<CountryTrendResponse> {
        let to = self.config.current_year;
        let from = to
            .saturating_sub(i32::try_from(years_back).unwrap_or(i32::MAX))
            .max(self.earliest_year);

        let mut trends = Vec::new();
        for year in from..=to {
            let prediction = self.predictor.predict_clusters(year)?;
            if let Some(hit) = prediction.find_country(country) {
                trends.push(ClusterTrend {
                    year,
                    cluster: hit.cluster,
                });
            }
        }

        if trends.is_empty() {
            return Err(AnalyticsError::CountryNotFound {
                country: country.to_string(),
                from,
                to,
            });
        }

        tracing::debug!(country, from, to, points = trends.len(), "country trends");
        Ok(CountryTrendResponse {
            country: country.to_string(),
            cluster_changes: cluster_changes(&trends),
            stability_score: stability_score(&trends),
            current_trend: trend_direction(&trends),
            trends,
        })
    }
}

/// Number of adjacent entries whose cluster differs.
pub fn cluster_changes(trends: &[ClusterTrend]) -> usize {
    trends
        .windows(2)
        .filter(|pair| pair[0].cluster != pair[1].cluster)
        .count()
}

/// `1 - changes / (len - 1)`; a history of one point or fewer is fully stable.
pub fn stability_score(trends: &[ClusterTrend]) -> f64 {
    if trends.len() <= 1 {
        return 1.0;
    }
    1.0 - cluster_changes(trends) as f64 / (trends.len() - 1) as f64
}

/// Last cluster against first. Higher ids rank as more developed.
pub fn trend_direction(trends: &[ClusterTrend]) -> TrendDirection {
    match (trends.first(), trends.last()) {
        (Some(first), Some(last)) if trends.len() >= 2 => {
            match last.cluster.cmp(&first.cluster) {
                std::cmp::Ordering::Greater => TrendDirection::Improving,
                std::cmp::Ordering::Less => TrendDirection::Declining,
                std::cmp::Ordering::Equal => TrendDirection::Stable,
            }
        }
        _ => TrendDirection::Stable,
    }
}
