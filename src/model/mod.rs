//! Pretrained full-graph classifiers.
//!
//! A [`GraphClassifier`] maps the whole node table of a [`Graph`] to one row of
//! class scores per node. Message passing mixes information across every node
//! regardless of year, so callers always score the full graph and select rows
//! afterwards; scoring a year-sliced subgraph gives different answers.

pub mod gcn;

use ndarray::{Array2, ArrayView1};

use crate::error::ModelResult;
use crate::graph::Graph;

pub use gcn::{GcnClassifier, GcnLayer, GcnWeights};

/// A fixed, pretrained node classifier.
pub trait GraphClassifier: Send + Sync {
    /// Score every node of `graph`. Returns an `N × K` matrix for `K` classes.
    fn forward(&self, graph: &Graph) -> ModelResult<Array2<f32>>;

    /// Expected node feature width.
    fn in_channels(&self) -> usize;

    /// Number of output classes.
    fn num_classes(&self) -> usize;
}

/// Index of the largest score. Ties go to the lowest index; NaN never wins.
pub fn argmax(scores: ArrayView1<'_, f32>) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (idx, &score) in scores.iter().enumerate() {
        if score > best_score {
            best = idx;
            best_score = score;
        }
    }
    best
}

/// Softmax probability of class `class` within `scores`.
pub fn class_probability(scores: ArrayView1<'_, f32>, class: usize) -> f64 {
    let max = scores
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max) as f64;
    let denom: f64 = scores.iter().map(|&s| (s as f64 - max).exp()).sum();
    match scores.get(class) {
        Some(&s) if denom > 0.0 => (s as f64 - max).exp() / denom,
        _ => 0.0,
    }
}
