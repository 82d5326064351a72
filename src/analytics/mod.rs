//! Derived views over per-year predictions.
//!
//! Every query here is answered by calling
//! [`ClusterPredictor::predict_clusters`] for the years it needs; nothing is
//! carried between calls except the predictor's own optional cache.

pub mod lookup;
pub mod stats;
pub mod trends;

use std::sync::Arc;

use crate::catalog::FeatureCatalog;
use crate::config::AnalyticsConfig;
use crate::predictor::ClusterPredictor;

use self::lookup::{ClusterLabels, RegionTable};

/// Trend and cluster-statistics queries on top of a [`ClusterPredictor`].
pub struct ClusterAnalytics {
    predictor: Arc<ClusterPredictor>,
    catalog: Arc<FeatureCatalog>,
    config: AnalyticsConfig,
    labels: ClusterLabels,
    regions: RegionTable,
    /// First year any trend window may reach back to.
    earliest_year: i32,
}

impl ClusterAnalytics {
    pub fn new(
        predictor: Arc<ClusterPredictor>,
        catalog: Arc<FeatureCatalog>,
        config: AnalyticsConfig,
        earliest_year: i32,
    ) -> Self {
        let labels = ClusterLabels::new(&config.clusters, config.fallback_color.clone());
        let regions = RegionTable::new(&config.regions);
        Self {
            predictor,
            catalog,
            config,
            labels,
            regions,
            earliest_year,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn labels(&self) -> &ClusterLabels {
        &self.labels
    }
}
