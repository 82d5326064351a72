//! Shared fixtures: a small world of four countries with known clusters.
//!
//! Historical years 2018..=2024 (Kenya first appears in 2019); future years
//! 2026 and 2027. Feature columns are the dataset's indicators in sorted
//! order: `Broadband` (carries the cluster label), `Internet users` (varies
//! per node), `Mobile` (constant).

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::Array2;

use dinq::config::ServiceConfig;
use dinq::dataset::PivotTable;
use dinq::error::ModelResult;
use dinq::graph::year_index::YearOffsetTable;
use dinq::graph::{EdgeSet, FutureGraph, Graph, HistoricalGraph};
use dinq::model::GraphClassifier;
use dinq::service::{PredictionService, ServiceParts};

pub const COUNTRIES: [&str; 4] = ["Brazil", "France", "Germany", "Kenya"];
pub const HISTORICAL_YEARS: std::ops::RangeInclusive<i32> = 2018..=2024;
pub const FUTURE_YEARS: [i32; 2] = [2026, 2027];

/// Scores each node one-hot on the class stored in feature column 0.
/// Counts forward passes.
pub struct LabelFromFeature {
    classes: usize,
    width: usize,
    calls: AtomicUsize,
}

impl LabelFromFeature {
    pub fn new(classes: usize) -> Self {
        Self::with_width(classes, 3)
    }

    pub fn with_width(classes: usize, width: usize) -> Self {
        Self {
            classes,
            width,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GraphClassifier for LabelFromFeature {
    fn forward(&self, graph: &Graph) -> ModelResult<Array2<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let features = graph.features();
        Ok(Array2::from_shape_fn(
            (graph.node_count(), self.classes),
            |(node, class)| {
                if features[[node, 0]].round() as usize == class {
                    4.0
                } else {
                    0.0
                }
            },
        ))
    }

    fn in_channels(&self) -> usize {
        self.width
    }

    fn num_classes(&self) -> usize {
        self.classes
    }
}

/// Cluster of `country` in `year`, or `None` if the country has no node.
pub fn label(country: &str, year: i32) -> Option<u32> {
    match country {
        "Brazil" => Some(if year >= 2026 { 2 } else { 1 }),
        "France" => Some(2),
        "Germany" => Some(if year >= 2021 { 2 } else { 1 }),
        "Kenya" if year == 2018 => None,
        "Kenya" if year == 2022 => Some(1),
        "Kenya" => Some(if year >= 2026 { 1 } else { 0 }),
        _ => None,
    }
}

pub fn internet_users(country: &str, year: i32) -> f64 {
    let idx = COUNTRIES.iter().position(|c| *c == country).unwrap_or(0);
    10.0 * label(country, year).unwrap_or(0) as f64 + (year - 2018) as f64 + 3.0 * idx as f64
}

fn feature_row(country: &str, year: i32) -> Vec<f32> {
    vec![
        label(country, year).unwrap_or(0) as f32,
        internet_users(country, year) as f32,
        50.0,
    ]
}

pub fn dataset() -> PivotTable {
    let mut observations = Vec::new();
    for country in COUNTRIES {
        for year in HISTORICAL_YEARS {
            if label(country, year).is_none() {
                continue;
            }
            let row = feature_row(country, year);
            for (name, value) in ["Broadband", "Internet users", "Mobile"].iter().zip(row) {
                observations.push((country.to_string(), year, name.to_string(), Some(value as f64)));
            }
        }
    }
    PivotTable::from_observations(observations)
}

/// Historical nodes packed year by year, countries alphabetical within a year.
pub fn historical_graph(dataset: &PivotTable) -> HistoricalGraph {
    let mut rows = Vec::new();
    for year in HISTORICAL_YEARS {
        for country in dataset.countries_for_year(year) {
            rows.push(feature_row(country, year));
        }
    }
    let graph = Graph::from_rows(rows, EdgeSet::default()).unwrap();
    HistoricalGraph::new(graph, dataset.year_offsets()).unwrap()
}

/// Future nodes: one block of all four countries per future year.
pub fn future_graph(country_limit: usize) -> FutureGraph {
    let mut rows = Vec::new();
    let mut years = Vec::new();
    let mut countries = Vec::new();
    for year in FUTURE_YEARS {
        for country in COUNTRIES {
            rows.push(feature_row(country, year));
            years.push(year);
            countries.push(country.to_string());
        }
    }
    let graph = Graph::from_rows(rows, EdgeSet::default()).unwrap();
    FutureGraph::new(graph, years, countries, country_limit).unwrap()
}

pub fn fixture_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.prediction.future_country_limit = COUNTRIES.len();
    config
}

pub fn service_with(config: ServiceConfig) -> (PredictionService, Arc<LabelFromFeature>) {
    let model = Arc::new(LabelFromFeature::new(3));
    let dataset = dataset();
    let historical = historical_graph(&dataset);
    let future = future_graph(config.prediction.future_country_limit);
    let service = PredictionService::new(ServiceParts {
        model: model.clone(),
        historical,
        future,
        dataset,
        config,
    })
    .unwrap();
    (service, model)
}

pub fn service() -> PredictionService {
    service_with(fixture_config()).0
}

/// Offsets the fixture's historical graph is packed with.
pub fn offsets() -> YearOffsetTable {
    dataset().year_offsets()
}
