//! Service facade: the top-level API of the prediction core.
//!
//! [`PredictionService`] owns the classifier, both graphs, the dataset index
//! and the derived analytics, all immutable after construction. Build it from
//! in-memory parts with [`PredictionService::new`] or from artifacts on disk
//! with [`PredictionService::load`]. Every query takes `&self`, so one instance
//! is shared behind an `Arc` across request handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::analytics::ClusterAnalytics;
use crate::catalog::FeatureCatalog;
use crate::config::ServiceConfig;
use crate::dataset::PivotTable;
use crate::error::{DinqResult, ModelError};
use crate::graph::{FutureGraph, GraphArtifact, HistoricalGraph};
use crate::model::{GcnClassifier, GraphClassifier};
use crate::paths::DinqPaths;
use crate::predictor::ClusterPredictor;
use crate::schema::{ClusterId, ClusterStatsResponse, CountryTrendResponse, PredictionResponse};

/// Everything a service needs, already in memory.
pub struct ServiceParts {
    pub model: Arc<dyn GraphClassifier>,
    pub historical: HistoricalGraph,
    pub future: FutureGraph,
    pub dataset: PivotTable,
    pub config: ServiceConfig,
}

/// Summary of what a running service holds.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub version: &'static str,
    pub historical_nodes: usize,
    pub historical_edges: usize,
    pub historical_years: Vec<i32>,
    pub future_nodes: usize,
    pub future_years: Vec<i32>,
    pub future_threshold: i32,
    pub features: usize,
    pub classes: usize,
    pub dataset_rows: usize,
}

/// Cluster prediction and analytics over one loaded model.
pub struct PredictionService {
    config: ServiceConfig,
    model: Arc<dyn GraphClassifier>,
    historical: Arc<HistoricalGraph>,
    future: Arc<FutureGraph>,
    dataset: Arc<PivotTable>,
    catalog: Arc<FeatureCatalog>,
    predictor: Arc<ClusterPredictor>,
    analytics: ClusterAnalytics,
}

impl PredictionService {
    /// Assemble a service from in-memory parts.
    pub fn new(parts: ServiceParts) -> DinqResult<Self> {
        let ServiceParts {
            model,
            historical,
            future,
            dataset,
            config,
        } = parts;
        config.validate()?;

        let features = historical.graph().feature_count();
        if model.in_channels() != features {
            return Err(ModelError::ShapeMismatch {
                layer: 0,
                expected: model.in_channels(),
                actual: features,
            }
            .into());
        }

        let historical = Arc::new(historical);
        let future = Arc::new(future);
        let dataset = Arc::new(dataset);
        let catalog = Arc::new(FeatureCatalog::new(dataset.columns()));
        let predictor = Arc::new(ClusterPredictor::new(
            Arc::clone(&model),
            Arc::clone(&historical),
            Arc::clone(&future),
            Arc::clone(&dataset),
            config.prediction.clone(),
        ));
        let analytics = ClusterAnalytics::new(
            Arc::clone(&predictor),
            Arc::clone(&catalog),
            config.analytics.clone(),
            config.server.min_year,
        );

        tracing::info!(
            historical_nodes = historical.graph().node_count(),
            historical_years = historical.offsets().len(),
            future_nodes = future.graph().node_count(),
            features,
            "prediction service ready"
        );

        Ok(Self {
            config,
            model,
            historical,
            future,
            dataset,
            catalog,
            predictor,
            analytics,
        })
    }

    /// Load the model, graphs and dataset named by `config`.
    ///
    /// The historical year offsets are rebuilt from the dataset; an offset
    /// table stored in the graph artifact takes precedence. A missing future
    /// graph file leaves the service with no future years.
    pub fn load(config: ServiceConfig, paths: &DinqPaths) -> DinqResult<Self> {
        let artifacts = config.artifacts.resolve(paths);

        let model = GcnClassifier::load(&artifacts.model)?;
        let dataset = PivotTable::load(&artifacts.dataset)?;

        let historical = HistoricalGraph::from_artifact(
            GraphArtifact::load(&artifacts.historical_graph)?,
            Some(dataset.year_offsets()),
        )?;
        tracing::info!(
            path = %artifacts.historical_graph.display(),
            nodes = historical.graph().node_count(),
            edges = historical.graph().edges().len(),
            years = historical.offsets().len(),
            "loaded historical graph"
        );

        let future = if artifacts.future_graph.exists() {
            let future = FutureGraph::from_artifact(
                GraphArtifact::load(&artifacts.future_graph)?,
                config.prediction.future_country_limit,
            )?;
            tracing::info!(
                path = %artifacts.future_graph.display(),
                nodes = future.graph().node_count(),
                years = future.years().years().len(),
                "loaded future graph"
            );
            future
        } else {
            tracing::warn!(
                path = %artifacts.future_graph.display(),
                "future graph not found; future years will be empty"
            );
            FutureGraph::empty(historical.graph().feature_count())
        };

        Self::new(ServiceParts {
            model: Arc::new(model),
            historical,
            future,
            dataset,
            config,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn predictor(&self) -> &ClusterPredictor {
        &self.predictor
    }

    /// Cluster assignments for every country in `year`.
    pub fn predict_clusters(&self, year: i32) -> DinqResult<Arc<PredictionResponse>> {
        Ok(self.predictor.predict_clusters(year)?)
    }

    /// Cluster history for `country`; see [`ClusterAnalytics::country_trends`].
    pub fn country_trends(
        &self,
        country: &str,
        years_back: u32,
    ) -> DinqResult<CountryTrendResponse> {
        Ok(self.analytics.country_trends(country, years_back)?)
    }

    /// Statistics for `cluster` in `year`; see [`ClusterAnalytics::cluster_stats`].
    pub fn cluster_stats(&self, year: i32, cluster: ClusterId) -> DinqResult<ClusterStatsResponse> {
        Ok(self.analytics.cluster_stats(year, cluster)?)
    }

    /// Feature-matrix column → indicator name.
    pub fn feature_mapping(&self) -> &BTreeMap<usize, String> {
        self.catalog.feature_mapping()
    }

    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            version: env!("CARGO_PKG_VERSION"),
            historical_nodes: self.historical.graph().node_count(),
            historical_edges: self.historical.graph().edges().len(),
            historical_years: self.historical.offsets().years(),
            future_nodes: self.future.graph().node_count(),
            future_years: self.future.years().years(),
            future_threshold: self.config.prediction.future_threshold,
            features: self.catalog.len(),
            classes: self.model.num_classes(),
            dataset_rows: self.dataset.len(),
        }
    }
}
