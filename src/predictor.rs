//! Per-year cluster prediction over the full graph.
//!
//! `predict_clusters(year)`:
//!
//! 1. picks historical or future mode from the configured threshold,
//! 2. resolves the year's nodes through the mode's [`YearIndex`],
//! 3. scores the *entire* graph of that mode in one forward pass,
//! 4. keeps the selected rows, takes the arg-max class per node,
//! 5. pairs labels with countries in node order.
//!
//! A year that selects no nodes yields an empty response without running the
//! classifier.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::PredictionConfig;
use crate::dataset::PivotTable;
use crate::error::{ModelError, PredictError, PredictResult};
use crate::graph::year_index::YearIndex;
use crate::graph::{FutureGraph, Graph, HistoricalGraph};
use crate::model::{GraphClassifier, argmax, class_probability};
use crate::schema::{ClusterId, CountryCluster, PredictionResponse};

/// Which graph a year is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Historical,
    Future,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Historical => f.write_str("historical"),
            Self::Future => f.write_str("future"),
        }
    }
}

/// Runs the classifier and turns per-node scores into country assignments.
pub struct ClusterPredictor {
    model: Arc<dyn GraphClassifier>,
    historical: Arc<HistoricalGraph>,
    future: Arc<FutureGraph>,
    dataset: Arc<PivotTable>,
    config: PredictionConfig,
    cache: Option<DashMap<i32, Arc<PredictionResponse>>>,
}

impl ClusterPredictor {
    pub fn new(
        model: Arc<dyn GraphClassifier>,
        historical: Arc<HistoricalGraph>,
        future: Arc<FutureGraph>,
        dataset: Arc<PivotTable>,
        config: PredictionConfig,
    ) -> Self {
        let cache = config.cache_predictions.then(DashMap::new);
        Self {
            model,
            historical,
            future,
            dataset,
            config,
            cache,
        }
    }

    pub fn mode_for(&self, year: i32) -> Mode {
        if year < self.config.future_threshold {
            Mode::Historical
        } else {
            Mode::Future
        }
    }

    pub fn graph(&self, mode: Mode) -> &Graph {
        match mode {
            Mode::Historical => self.historical.graph(),
            Mode::Future => self.future.graph(),
        }
    }

    fn index(&self, mode: Mode) -> YearIndex<'_> {
        match mode {
            Mode::Historical => self.historical.index(),
            Mode::Future => self.future.index(),
        }
    }

    /// Node holding (`country`, `year`) in that year's graph, if any.
    ///
    /// Historical nodes sit at the year's range start plus the country's
    /// position among that year's dataset rows.
    pub fn node_for(&self, country: &str, year: i32) -> Option<(Mode, usize)> {
        match self.mode_for(year) {
            Mode::Historical => {
                let range = self.historical.offsets().range_for_year(year).ok()?;
                let pos = self.dataset.position_in_year(country, year)?;
                let node = range.start + pos;
                range.contains(&node).then_some((Mode::Historical, node))
            }
            Mode::Future => self
                .future
                .node_for(country, year)
                .map(|node| (Mode::Future, node)),
        }
    }

    /// Cluster assignments for every country in `year`.
    pub fn predict_clusters(&self, year: i32) -> PredictResult<Arc<PredictionResponse>> {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&year)) {
            return Ok(Arc::clone(hit.value()));
        }

        let response = Arc::new(self.compute(year)?);
        if let Some(cache) = &self.cache {
            cache.insert(year, Arc::clone(&response));
        }
        Ok(response)
    }

    fn compute(&self, year: i32) -> PredictResult<PredictionResponse> {
        let mode = self.mode_for(year);
        let selected = self.index(mode).select(year);
        tracing::debug!(year, %mode, nodes = selected.len(), "predicting clusters");
        if selected.is_empty() {
            return Ok(PredictionResponse::empty(year));
        }

        let graph = self.graph(mode);
        let scores = self.model.forward(graph)?;
        if scores.nrows() != graph.node_count() {
            return Err(ModelError::OutputRows {
                expected: graph.node_count(),
                actual: scores.nrows(),
            }
            .into());
        }

        let countries: Vec<&str> = match mode {
            Mode::Historical => self.dataset.countries_for_year(year),
            Mode::Future => self.future.countries().iter().map(String::as_str).collect(),
        };
        if countries.len() != selected.len() {
            return Err(PredictError::Misaligned {
                year,
                labels: selected.len(),
                countries: countries.len(),
            });
        }

        let clusters = selected
            .iter()
            .zip(countries)
            .map(|(&node, country)| {
                let row = scores.row(node);
                let class = argmax(row);
                CountryCluster {
                    country: country.to_string(),
                    cluster: class as ClusterId,
                    confidence: Some(class_probability(row, class)),
                    year,
                }
            })
            .collect();
        Ok(PredictionResponse::new(year, clusters))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ndarray::Array2;

    use super::*;
    use crate::error::ModelResult;
    use crate::graph::EdgeSet;

    /// Class = column 0 of the node's features, rounded. Counts forward passes.
    struct FeatureLabel {
        calls: AtomicUsize,
    }

    impl GraphClassifier for FeatureLabel {
        fn forward(&self, graph: &Graph) -> ModelResult<Array2<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let n = graph.node_count();
            Ok(Array2::from_shape_fn((n, 3), |(i, c)| {
                if graph.features()[[i, 0]].round() as usize == c {
                    1.0
                } else {
                    0.0
                }
            }))
        }
        fn in_channels(&self) -> usize {
            1
        }
        fn num_classes(&self) -> usize {
            3
        }
    }

    fn predictor(cache: bool) -> (ClusterPredictor, Arc<FeatureLabel>) {
        let dataset = PivotTable::from_observations([
            ("Chile", 2020, "x", Some(1.0)),
            ("Chile", 2021, "x", Some(1.0)),
            ("Fiji", 2020, "x", Some(1.0)),
            ("Fiji", 2021, "x", Some(1.0)),
            ("Oman", 2020, "x", Some(1.0)),
        ]);
        // 2020: Chile, Fiji, Oman; 2021: Chile, Fiji.
        let labels = [[0.0f32], [1.0], [0.0], [2.0], [2.0]];
        let features = Array2::from_shape_fn((5, 1), |(i, _)| labels[i][0]);
        let graph = Graph::new(features, EdgeSet::default()).unwrap();
        let historical = HistoricalGraph::new(graph, dataset.year_offsets()).unwrap();

        let future_graph = Graph::new(
            Array2::from_shape_vec((4, 1), vec![1.0, 1.0, 2.0, 0.0]).unwrap(),
            EdgeSet::default(),
        )
        .unwrap();
        let future = FutureGraph::new(
            future_graph,
            vec![2025, 2025, 2026, 2026],
            vec!["Chile".into(), "Fiji".into(), "Chile".into(), "Fiji".into()],
            2,
        )
        .unwrap();

        let model = Arc::new(FeatureLabel {
            calls: AtomicUsize::new(0),
        });
        let config = PredictionConfig {
            cache_predictions: cache,
            ..Default::default()
        };
        (
            ClusterPredictor::new(
                model.clone(),
                Arc::new(historical),
                Arc::new(future),
                Arc::new(dataset),
                config,
            ),
            model,
        )
    }

    #[test]
    fn historical_year_aligns_with_dataset_rows() {
        let (p, _) = predictor(false);
        let resp = p.predict_clusters(2020).unwrap();
        let got: Vec<(&str, ClusterId)> = resp
            .clusters
            .iter()
            .map(|c| (c.country.as_str(), c.cluster))
            .collect();
        assert_eq!(got, vec![("Chile", 0), ("Fiji", 1), ("Oman", 0)]);
        assert_eq!(resp.total_countries, 3);
        assert_eq!(resp.cluster_distribution.get(&0), Some(&2));
        assert_eq!(resp.cluster_distribution.get(&1), Some(&1));
    }

    #[test]
    fn future_year_uses_year_attribute() {
        let (p, _) = predictor(false);
        assert_eq!(p.mode_for(2026), Mode::Future);
        let resp = p.predict_clusters(2026).unwrap();
        let got: Vec<ClusterId> = resp.clusters.iter().map(|c| c.cluster).collect();
        assert_eq!(got, vec![2, 0]);
        assert_eq!(resp.clusters[0].country, "Chile");
    }

    #[test]
    fn unknown_year_is_empty_without_forward_pass() {
        let (p, model) = predictor(false);
        let resp = p.predict_clusters(2010).unwrap();
        assert!(resp.is_empty());
        assert!(resp.cluster_distribution.is_empty());
        let future_gap = p.predict_clusters(2030).unwrap();
        assert!(future_gap.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn confidence_is_a_probability() {
        let (p, _) = predictor(false);
        let resp = p.predict_clusters(2021).unwrap();
        for c in &resp.clusters {
            let conf = c.confidence.unwrap();
            assert!(conf > 0.0 && conf <= 1.0);
        }
    }

    #[test]
    fn cache_reuses_results() {
        let (p, model) = predictor(true);
        let first = p.predict_clusters(2020).unwrap();
        let second = p.predict_clusters(2020).unwrap();
        assert_eq!(first, second);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn uncached_runs_every_time() {
        let (p, model) = predictor(false);
        p.predict_clusters(2020).unwrap();
        p.predict_clusters(2020).unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn node_lookup_per_mode() {
        let (p, _) = predictor(false);
        assert_eq!(p.node_for("Fiji", 2021), Some((Mode::Historical, 4)));
        assert_eq!(p.node_for("Oman", 2021), None);
        assert_eq!(p.node_for("Fiji", 2026), Some((Mode::Future, 3)));
    }
}
