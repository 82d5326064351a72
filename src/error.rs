//! Rich diagnostic error types for the dinq prediction service.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so callers know exactly
//! what went wrong and how to fix it. [`DinqError::kind`] collapses everything
//! into the three outcomes the HTTP layer cares about.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::paths::PathError;
use crate::request::RequestError;

/// Top-level error type for the dinq service.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum DinqError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Predict(#[from] PredictError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),
}

/// Coarse classification of a failure, as seen by a caller of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No data for the requested year/country/cluster combination.
    NotFound,
    /// Year or cluster outside the documented domain.
    InvalidInput,
    /// Classifier, tensor, or artifact failure. Fatal to the request.
    ComputationFailure,
}

impl DinqError {
    /// Classify this error for the request-handling layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Graph(e) => e.kind(),
            Self::Predict(e) => e.kind(),
            Self::Analytics(e) => e.kind(),
            Self::Request(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::ComputationFailure,
        }
    }
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("year {year} has no node range in the offset table")]
    #[diagnostic(
        code(dinq::graph::year_not_indexed),
        help(
            "The historical graph has no nodes for this year. \
             Check the years listed by `dinq info`, or rebuild the offset table \
             with `dinq offsets`."
        )
    )]
    YearNotIndexed { year: i32 },

    #[error("edge ({source_node}, {target_node}) references a node outside 0..{node_count}")]
    #[diagnostic(
        code(dinq::graph::edge_out_of_bounds),
        help(
            "The edge index of the graph artifact does not match its feature matrix. \
             Re-export the artifact so that every edge endpoint is a valid node row."
        )
    )]
    EdgeOutOfBounds {
        source_node: usize,
        target_node: usize,
        node_count: usize,
    },

    #[error("feature matrix is ragged: row {row} has {actual} columns, expected {expected}")]
    #[diagnostic(
        code(dinq::graph::ragged_features),
        help("Every node must carry the same number of features.")
    )]
    RaggedFeatures {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("edge index rows differ in length: {sources} sources, {targets} targets")]
    #[diagnostic(
        code(dinq::graph::edge_index_shape),
        help("The edge index must be two parallel rows: sources and targets.")
    )]
    EdgeIndexShape { sources: usize, targets: usize },

    #[error("offset table covers {covered} nodes but the graph has {node_count}")]
    #[diagnostic(
        code(dinq::graph::offset_coverage),
        help(
            "Year ranges must be contiguous from 0 and cover every node exactly once. \
             Rebuild them from the dataset with `dinq offsets`."
        )
    )]
    OffsetCoverage { covered: usize, node_count: usize },

    #[error("offset range for {year} starts at {actual}, expected {expected}")]
    #[diagnostic(
        code(dinq::graph::offset_gap),
        help(
            "Year ranges must be packed in ascending year order with no gaps or overlaps. \
             Rebuild them from the dataset with `dinq offsets`."
        )
    )]
    OffsetGap {
        year: i32,
        expected: usize,
        actual: usize,
    },

    #[error("offset range for {year} is inverted: [{start}, {end})")]
    #[diagnostic(
        code(dinq::graph::inverted_range),
        help("Each year range is half-open `[start, end)` with `start <= end`.")
    )]
    InvertedRange { year: i32, start: usize, end: usize },

    #[error("year attribute has {years} entries but the graph has {node_count} nodes")]
    #[diagnostic(
        code(dinq::graph::year_attribute_length),
        help("The future graph artifact needs exactly one year value per node.")
    )]
    YearAttributeLength { years: usize, node_count: usize },

    #[error("graph artifact is missing `{field}`")]
    #[diagnostic(
        code(dinq::graph::missing_field),
        help("The future graph artifact must carry per-node `years` and a `countries` list.")
    )]
    MissingField { field: &'static str },

    #[error("failed to read artifact {path}: {source}")]
    #[diagnostic(
        code(dinq::graph::io),
        help("Check that the artifact path exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode artifact {path}: {message}")]
    #[diagnostic(
        code(dinq::graph::decode),
        help(
            "Artifacts are JSON (`.json`) or bincode (`.bin`), optionally gzip-compressed (`.gz`). \
             The file may be truncated or produced by an incompatible exporter."
        )
    )]
    Decode { path: String, message: String },

    #[error("failed to encode artifact {path}: {message}")]
    #[diagnostic(
        code(dinq::graph::encode),
        help("JSON artifacts need string-keyed maps; use a `.bin` path for other key types.")
    )]
    Encode { path: String, message: String },

    #[error("feature matrix has an invalid shape: {message}")]
    #[diagnostic(code(dinq::graph::feature_shape))]
    FeatureShape { message: String },
}

// ---------------------------------------------------------------------------
// Model errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("classifier has no layers")]
    #[diagnostic(
        code(dinq::model::empty),
        help("The weights artifact must contain at least one convolution layer.")
    )]
    NoLayers,

    #[error("layer {layer} expects {expected} input channels, got {actual}")]
    #[diagnostic(
        code(dinq::model::shape_mismatch),
        help(
            "The classifier was trained for a different feature width or its layers \
             do not chain. Check that the weights match the graph artifact."
        )
    )]
    ShapeMismatch {
        layer: usize,
        expected: usize,
        actual: usize,
    },

    #[error("layer {layer} weight matrix is malformed: {message}")]
    #[diagnostic(
        code(dinq::model::malformed_layer),
        help("Weights are stored row-major as [in_channels][out_channels] with one bias per output.")
    )]
    MalformedLayer { layer: usize, message: String },

    #[error("classifier produced {actual} score rows for {expected} nodes")]
    #[diagnostic(
        code(dinq::model::output_rows),
        help("A full-graph classifier must emit exactly one score row per node.")
    )]
    OutputRows { expected: usize, actual: usize },

    #[error("failed to load classifier weights from {path}: {message}")]
    #[diagnostic(
        code(dinq::model::load),
        help("Check the weights artifact path and encoding (JSON or bincode, optionally gzipped).")
    )]
    Load { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Dataset errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {message}")]
    #[diagnostic(
        code(dinq::dataset::read),
        help("The dataset must be a CSV file with header `Economy,Year,Indicator,Value`.")
    )]
    Read { path: String, message: String },

    #[error("dataset is missing column `{column}`")]
    #[diagnostic(
        code(dinq::dataset::missing_column),
        help("Required columns are Economy, Year, Indicator and Value.")
    )]
    MissingColumn { column: &'static str },

    #[error("invalid value on line {line}: {message}")]
    #[diagnostic(
        code(dinq::dataset::invalid_value),
        help("Year must be an integer and Value a number (empty means missing).")
    )]
    InvalidValue { line: u64, message: String },
}

// ---------------------------------------------------------------------------
// Prediction errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PredictError {
    #[error("year {year}: {labels} predicted nodes but {countries} country labels")]
    #[diagnostic(
        code(dinq::predict::misaligned),
        help(
            "Node order in the graph must match the dataset's country order for each year. \
             Rebuild the offset table from the dataset, or check `future_country_limit`."
        )
    )]
    Misaligned {
        year: i32,
        labels: usize,
        countries: usize,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

// ---------------------------------------------------------------------------
// Analytics errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum AnalyticsError {
    #[error("no trend data for \"{country}\" between {from} and {to}")]
    #[diagnostic(
        code(dinq::analytics::country_not_found),
        help("The country did not appear in any predicted year of the window. Check the spelling.")
    )]
    CountryNotFound { country: String, from: i32, to: i32 },

    #[error("cluster {cluster} has no members in {year}")]
    #[diagnostic(
        code(dinq::analytics::empty_cluster),
        help("No country was assigned to this cluster for the requested year.")
    )]
    EmptyCluster { year: i32, cluster: u32 },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Predict(#[from] PredictError),
}

/// Convenience alias for functions returning dinq results.
pub type DinqResult<T> = std::result::Result<T, DinqError>;

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Result type for classifier operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Result type for prediction operations.
pub type PredictResult<T> = std::result::Result<T, PredictError>;

/// Result type for analytics operations.
pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::YearNotIndexed { .. } => ErrorKind::NotFound,
            _ => ErrorKind::ComputationFailure,
        }
    }
}

impl PredictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Graph(e) => e.kind(),
            _ => ErrorKind::ComputationFailure,
        }
    }
}

impl AnalyticsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CountryNotFound { .. } | Self::EmptyCluster { .. } => ErrorKind::NotFound,
            Self::Predict(e) => e.kind(),
        }
    }
}
