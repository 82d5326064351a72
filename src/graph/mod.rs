//! Node/edge tensors: the immutable graph the classifier runs over.
//!
//! A [`Graph`] is a dense node-feature matrix plus a directed edge list.
//! [`HistoricalGraph`] pairs it with a year offset table; [`FutureGraph`] pairs
//! it with a per-node year attribute and the country list for future nodes.
//! Both are loaded once and shared read-only for the life of the process.

pub mod artifact;
pub mod propagation;
pub mod year_index;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, GraphResult};

use self::propagation::Propagation;
use self::year_index::{YearAttribute, YearIndex, YearOffsetTable};

// ---------------------------------------------------------------------------
// Edge set
// ---------------------------------------------------------------------------

/// Directed edges as parallel source/target index rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeSet {
    sources: Vec<usize>,
    targets: Vec<usize>,
}

impl EdgeSet {
    pub fn new(sources: Vec<usize>, targets: Vec<usize>) -> GraphResult<Self> {
        if sources.len() != targets.len() {
            return Err(GraphError::EdgeIndexShape {
                sources: sources.len(),
                targets: targets.len(),
            });
        }
        Ok(Self { sources, targets })
    }

    /// Each pair inserted in both directions.
    pub fn undirected(pairs: &[(usize, usize)]) -> Self {
        let mut sources = Vec::with_capacity(pairs.len() * 2);
        let mut targets = Vec::with_capacity(pairs.len() * 2);
        for &(a, b) in pairs {
            sources.extend([a, b]);
            targets.extend([b, a]);
        }
        Self { sources, targets }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.sources.iter().copied().zip(self.targets.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Node features and topology. Immutable once built.
#[derive(Debug)]
pub struct Graph {
    features: Array2<f32>,
    edges: EdgeSet,
    propagation: OnceLock<Propagation>,
}

impl Graph {
    /// Build a graph, rejecting edges that point outside the feature matrix.
    pub fn new(features: Array2<f32>, edges: EdgeSet) -> GraphResult<Self> {
        let node_count = features.nrows();
        if let Some((source, target)) = edges
            .iter()
            .find(|&(s, t)| s >= node_count || t >= node_count)
        {
            return Err(GraphError::EdgeOutOfBounds {
                source_node: source,
                target_node: target,
                node_count,
            });
        }
        Ok(Self {
            features,
            edges,
            propagation: OnceLock::new(),
        })
    }

    /// Build from row vectors, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<f32>>, edges: EdgeSet) -> GraphResult<Self> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(GraphError::RaggedFeatures {
                row,
                expected: width,
                actual: r.len(),
            });
        }
        let node_count = rows.len();
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let features = Array2::from_shape_vec((node_count, width), flat).map_err(|e| {
            GraphError::FeatureShape {
                message: e.to_string(),
            }
        })?;
        Self::new(features, edges)
    }

    pub fn features(&self) -> &Array2<f32> {
        &self.features
    }

    pub fn edges(&self) -> &EdgeSet {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.features.nrows()
    }

    pub fn feature_count(&self) -> usize {
        self.features.ncols()
    }

    /// Normalized aggregation operator, built on first use.
    pub fn propagation(&self) -> &Propagation {
        self.propagation
            .get_or_init(|| Propagation::gcn(self.node_count(), &self.edges))
    }
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// On-disk graph layout shared by the historical and future artifacts.
///
/// Optional fields stay present (as `null` in JSON) so the bincode encoding,
/// which is not self-describing, decodes the same struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphArtifact {
    /// Node features, one row per node.
    pub x: Vec<Vec<f32>>,
    /// `[sources, targets]`.
    pub edge_index: [Vec<usize>; 2],
    /// Historical only: year → `(start, end)` node range.
    #[serde(default)]
    pub node_offset: Option<BTreeMap<i32, (usize, usize)>>,
    /// Future only: year of each node.
    #[serde(default)]
    pub years: Option<Vec<i32>>,
    /// Future only: country of each node, in node order.
    #[serde(default)]
    pub countries: Option<Vec<String>>,
}

impl GraphArtifact {
    pub fn load(path: &Path) -> GraphResult<Self> {
        artifact::read_artifact(path)
    }

    pub fn save(&self, path: &Path) -> GraphResult<()> {
        artifact::write_artifact(path, self)
    }

    /// Split into a validated graph plus the mode-specific attributes.
    fn into_graph(self) -> GraphResult<(Graph, ArtifactExtras)> {
        let [sources, targets] = self.edge_index;
        let edges = EdgeSet::new(sources, targets)?;
        let graph = Graph::from_rows(self.x, edges)?;
        Ok((
            graph,
            ArtifactExtras {
                node_offset: self.node_offset,
                years: self.years,
                countries: self.countries,
            },
        ))
    }
}

struct ArtifactExtras {
    node_offset: Option<BTreeMap<i32, (usize, usize)>>,
    years: Option<Vec<i32>>,
    countries: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Historical and future graphs
// ---------------------------------------------------------------------------

/// Graph of observed (country, year) nodes addressed by contiguous year ranges.
#[derive(Debug)]
pub struct HistoricalGraph {
    graph: Graph,
    offsets: YearOffsetTable,
}

impl HistoricalGraph {
    pub fn new(graph: Graph, offsets: YearOffsetTable) -> GraphResult<Self> {
        offsets.validate(graph.node_count())?;
        Ok(Self { graph, offsets })
    }

    /// Build from an artifact. A `node_offset` table stored in the artifact wins;
    /// otherwise `derived` (rebuilt from the dataset) is used.
    pub fn from_artifact(
        artifact: GraphArtifact,
        derived: Option<YearOffsetTable>,
    ) -> GraphResult<Self> {
        let (graph, extras) = artifact.into_graph()?;
        let offsets = match (extras.node_offset, derived) {
            (Some(stored), derived) => {
                let stored = YearOffsetTable::from_ranges(&stored)?;
                if derived.is_some_and(|d| d != stored) {
                    tracing::warn!(
                        years = stored.len(),
                        "artifact node_offset differs from the dataset-derived table; using the artifact's"
                    );
                }
                stored
            }
            (None, Some(derived)) => derived,
            (None, None) => return Err(GraphError::MissingField { field: "node_offset" }),
        };
        Self::new(graph, offsets)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn offsets(&self) -> &YearOffsetTable {
        &self.offsets
    }

    pub fn index(&self) -> YearIndex<'_> {
        YearIndex::Historical(&self.offsets)
    }
}

/// Graph of projected future nodes addressed by a per-node year attribute.
#[derive(Debug)]
pub struct FutureGraph {
    graph: Graph,
    years: YearAttribute,
    /// Per-node country list as stored in the artifact.
    node_countries: Vec<String>,
    /// Country labels for one future year: the first `limit` entries.
    countries: Vec<String>,
}

impl FutureGraph {
    pub fn new(
        graph: Graph,
        years: Vec<i32>,
        node_countries: Vec<String>,
        country_limit: usize,
    ) -> GraphResult<Self> {
        if years.len() != graph.node_count() {
            return Err(GraphError::YearAttributeLength {
                years: years.len(),
                node_count: graph.node_count(),
            });
        }
        let countries = node_countries.iter().take(country_limit).cloned().collect();
        Ok(Self {
            graph,
            years: YearAttribute::new(years),
            node_countries,
            countries,
        })
    }

    pub fn from_artifact(artifact: GraphArtifact, country_limit: usize) -> GraphResult<Self> {
        let (graph, extras) = artifact.into_graph()?;
        let years = extras
            .years
            .ok_or(GraphError::MissingField { field: "years" })?;
        let countries = extras
            .countries
            .ok_or(GraphError::MissingField { field: "countries" })?;
        Self::new(graph, years, countries, country_limit)
    }

    /// A graph with no nodes, for deployments without future projections.
    pub fn empty(feature_count: usize) -> Self {
        Self {
            graph: Graph {
                features: Array2::zeros((0, feature_count)),
                edges: EdgeSet::default(),
                propagation: OnceLock::new(),
            },
            years: YearAttribute::default(),
            node_countries: Vec::new(),
            countries: Vec::new(),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn years(&self) -> &YearAttribute {
        &self.years
    }

    /// Country labels aligned with the nodes of any one future year.
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// First node tagged with (`country`, `year`).
    pub fn node_for(&self, country: &str, year: i32) -> Option<usize> {
        self.node_countries
            .iter()
            .enumerate()
            .find(|&(idx, c)| c == country && self.years.year_of(idx) == Some(year))
            .map(|(idx, _)| idx)
    }

    pub fn index(&self) -> YearIndex<'_> {
        YearIndex::Future(&self.years)
    }
}
