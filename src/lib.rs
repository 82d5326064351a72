// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # digital-inequality
//!
//! Serves a pretrained graph convolution classifier that sorts countries into
//! digital-development clusters per year, plus analytics derived from those
//! predictions.
//!
//! ## Architecture
//!
//! - **Graph** (`graph`): node features, edges, and year addressing. Historical
//!   years map to contiguous node ranges, future years to a per-node attribute.
//! - **Model** (`model`): full-graph GCN forward pass from exported weights.
//! - **Prediction** (`predictor`): score the whole graph, slice the year, take
//!   the arg-max class, pair it with the year's countries.
//! - **Analytics** (`analytics`): country trends and per-cluster statistics.
//! - **Service** (`service`): owns everything above; the HTTP server
//!   (`server`, feature `server`) and the `dinq` CLI sit on top of it.
//!
//! ## Library usage
//!
//! ```no_run
//! use dinq::config::ServiceConfig;
//! use dinq::paths::DinqPaths;
//! use dinq::service::PredictionService;
//!
//! let paths = DinqPaths::resolve().unwrap();
//! let config = ServiceConfig::discover(None, &paths).unwrap();
//! let service = PredictionService::load(config, &paths).unwrap();
//! let clusters = service.predict_clusters(2020).unwrap();
//! println!("{} countries", clusters.total_countries);
//! ```

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod error;
pub mod graph;
pub mod model;
pub mod paths;
pub mod predictor;
pub mod request;
pub mod schema;
#[cfg(feature = "server")]
pub mod server;
pub mod service;
