//! Graph convolution classifier driven by exported weights.
//!
//! Each layer computes `H' = Â · H · W + b` with the symmetric-normalized
//! adjacency `Â` (see [`crate::graph::propagation`]); ReLU sits between layers
//! and the last layer's output is used as raw class scores. Dropout is a
//! training-time concern and does not appear here.

use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::graph::Graph;
use crate::graph::artifact::read_artifact;

use super::GraphClassifier;

/// One exported convolution layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcnLayer {
    /// Row-major `[in_channels][out_channels]`.
    pub weight: Vec<Vec<f32>>,
    /// One entry per output channel.
    pub bias: Vec<f32>,
}

/// Weights artifact: convolution layers in forward order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcnWeights {
    pub layers: Vec<GcnLayer>,
}

#[derive(Debug, Clone)]
struct DenseLayer {
    weight: Array2<f32>,
    bias: Array1<f32>,
}

/// Stacked graph convolutions with ReLU between layers.
#[derive(Debug, Clone)]
pub struct GcnClassifier {
    layers: Vec<DenseLayer>,
}

impl GcnClassifier {
    /// Validate layer shapes and chain them.
    pub fn from_weights(weights: GcnWeights) -> ModelResult<Self> {
        if weights.layers.is_empty() {
            return Err(ModelError::NoLayers);
        }

        let mut layers = Vec::with_capacity(weights.layers.len());
        let mut prev_out: Option<usize> = None;
        for (idx, layer) in weights.layers.into_iter().enumerate() {
            let in_ch = layer.weight.len();
            let out_ch = layer.bias.len();
            if in_ch == 0 || out_ch == 0 {
                return Err(ModelError::MalformedLayer {
                    layer: idx,
                    message: format!("empty layer ({in_ch} x {out_ch})"),
                });
            }
            if let Some(row) = layer.weight.iter().position(|r| r.len() != out_ch) {
                return Err(ModelError::MalformedLayer {
                    layer: idx,
                    message: format!(
                        "weight row {row} has {} entries but bias has {out_ch}",
                        layer.weight[row].len()
                    ),
                });
            }
            if let Some(expected) = prev_out.filter(|&e| e != in_ch) {
                return Err(ModelError::ShapeMismatch {
                    layer: idx,
                    expected,
                    actual: in_ch,
                });
            }

            let flat: Vec<f32> = layer.weight.into_iter().flatten().collect();
            let weight = Array2::from_shape_vec((in_ch, out_ch), flat).map_err(|e| {
                ModelError::MalformedLayer {
                    layer: idx,
                    message: e.to_string(),
                }
            })?;
            layers.push(DenseLayer {
                weight,
                bias: Array1::from(layer.bias),
            });
            prev_out = Some(out_ch);
        }
        Ok(Self { layers })
    }

    /// Load a weights artifact (JSON or bincode, optionally gzipped).
    pub fn load(path: &Path) -> ModelResult<Self> {
        let weights: GcnWeights = read_artifact(path).map_err(|e| ModelError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let model = Self::from_weights(weights)?;
        tracing::info!(
            path = %path.display(),
            layers = model.layers.len(),
            in_channels = model.in_channels(),
            classes = model.num_classes(),
            "loaded GCN classifier"
        );
        Ok(model)
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

impl GraphClassifier for GcnClassifier {
    fn forward(&self, graph: &Graph) -> ModelResult<Array2<f32>> {
        let features = graph.features();
        if features.ncols() != self.in_channels() {
            return Err(ModelError::ShapeMismatch {
                layer: 0,
                expected: self.in_channels(),
                actual: features.ncols(),
            });
        }

        let propagation = graph.propagation();
        let last = self.layers.len() - 1;
        let mut h = features.to_owned();
        for (idx, layer) in self.layers.iter().enumerate() {
            // Â(HW) == (ÂH)W; project before aggregating.
            let projected = h.dot(&layer.weight);
            h = propagation.apply(&projected) + &layer.bias;
            if idx < last {
                h.mapv_inplace(|v| v.max(0.0));
            }
        }
        Ok(h)
    }

    fn in_channels(&self) -> usize {
        self.layers.first().map(|l| l.weight.nrows()).unwrap_or(0)
    }

    fn num_classes(&self) -> usize {
        self.layers.last().map(|l| l.bias.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;
    use crate::graph::EdgeSet;

    fn identity_layer(width: usize) -> GcnLayer {
        GcnLayer {
            weight: (0..width)
                .map(|i| (0..width).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
                .collect(),
            bias: vec![0.0; width],
        }
    }

    #[test]
    fn rejects_empty_weights() {
        assert!(matches!(
            GcnClassifier::from_weights(GcnWeights { layers: vec![] }),
            Err(ModelError::NoLayers)
        ));
    }

    #[test]
    fn rejects_unchained_layers() {
        let weights = GcnWeights {
            layers: vec![identity_layer(3), identity_layer(2)],
        };
        assert!(matches!(
            GcnClassifier::from_weights(weights),
            Err(ModelError::ShapeMismatch {
                layer: 1,
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn rejects_bias_width_mismatch() {
        let weights = GcnWeights {
            layers: vec![GcnLayer {
                weight: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                bias: vec![0.0],
            }],
        };
        assert!(matches!(
            GcnClassifier::from_weights(weights),
            Err(ModelError::MalformedLayer { layer: 0, .. })
        ));
    }

    #[test]
    fn rejects_wrong_feature_width() {
        let model = GcnClassifier::from_weights(GcnWeights {
            layers: vec![identity_layer(3)],
        })
        .unwrap();
        let graph = Graph::new(array![[1.0f32, 2.0]], EdgeSet::default()).unwrap();
        assert!(matches!(
            model.forward(&graph),
            Err(ModelError::ShapeMismatch { layer: 0, expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn single_layer_on_isolated_nodes_is_affine() {
        let model = GcnClassifier::from_weights(GcnWeights {
            layers: vec![GcnLayer {
                weight: vec![vec![2.0, 0.0], vec![0.0, -1.0]],
                bias: vec![0.5, 0.0],
            }],
        })
        .unwrap();
        let graph = Graph::new(array![[1.0f32, 1.0], [0.0, 3.0]], EdgeSet::default()).unwrap();
        let out = model.forward(&graph).unwrap();
        assert_abs_diff_eq!(out[[0, 0]], 2.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out[[0, 1]], -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out[[1, 1]], -3.0, epsilon = 1e-6);
    }

    #[test]
    fn relu_applies_between_layers_only() {
        let model = GcnClassifier::from_weights(GcnWeights {
            layers: vec![
                GcnLayer {
                    weight: vec![vec![-1.0]],
                    bias: vec![0.0],
                },
                GcnLayer {
                    weight: vec![vec![1.0]],
                    bias: vec![-2.0],
                },
            ],
        })
        .unwrap();
        let graph = Graph::new(array![[3.0f32]], EdgeSet::default()).unwrap();
        // Layer 1: -3 -> ReLU -> 0. Layer 2: 0 - 2 = -2 (no ReLU on output).
        let out = model.forward(&graph).unwrap();
        assert_abs_diff_eq!(out[[0, 0]], -2.0, epsilon = 1e-6);
    }

    #[test]
    fn neighbors_influence_scores() {
        let model = GcnClassifier::from_weights(GcnWeights {
            layers: vec![identity_layer(1)],
        })
        .unwrap();
        let alone = Graph::new(array![[0.0f32], [4.0]], EdgeSet::default()).unwrap();
        let linked = Graph::new(array![[0.0f32], [4.0]], EdgeSet::undirected(&[(0, 1)])).unwrap();
        assert_abs_diff_eq!(model.forward(&alone).unwrap()[[0, 0]], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(model.forward(&linked).unwrap()[[0, 0]], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn load_from_json_artifact() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("weights.json");
        let weights = GcnWeights {
            layers: vec![identity_layer(4), identity_layer(4)],
        };
        crate::graph::artifact::write_artifact(&path, &weights).unwrap();
        let model = GcnClassifier::load(&path).unwrap();
        assert_eq!(model.depth(), 2);
        assert_eq!(model.in_channels(), 4);
        assert_eq!(model.num_classes(), 4);
    }
}
