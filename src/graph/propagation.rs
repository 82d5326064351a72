//! Symmetric-normalized neighborhood aggregation used by graph convolution.
//!
//! For edges `source → target` the operator computes
//! `out[t] = Σ_s  deg(s)^-½ · deg(t)^-½ · h[s]`, where the sum runs over the
//! incoming edges of `t` plus exactly one self loop, and `deg` counts incoming
//! edges including that loop. Explicit self loops in the edge list are replaced
//! by the single implicit one; duplicate edges count twice.

use ndarray::Array2;

use super::EdgeSet;

/// Sparse `N × N` propagation matrix stored as per-target incoming lists.
#[derive(Debug, Clone)]
pub struct Propagation {
    incoming: Vec<Vec<(usize, f32)>>,
}

impl Propagation {
    /// Build the normalized operator for `node_count` nodes.
    ///
    /// Edge endpoints must already be validated against `node_count`.
    pub fn gcn(node_count: usize, edges: &EdgeSet) -> Self {
        let mut degree = vec![1.0f32; node_count];
        for (source, target) in edges.iter() {
            if source != target {
                degree[target] += 1.0;
            }
        }
        let inv_sqrt: Vec<f32> = degree.iter().map(|d| d.powf(-0.5)).collect();

        let mut incoming: Vec<Vec<(usize, f32)>> = (0..node_count)
            .map(|node| vec![(node, inv_sqrt[node] * inv_sqrt[node])])
            .collect();
        for (source, target) in edges.iter() {
            if source != target {
                incoming[target].push((source, inv_sqrt[source] * inv_sqrt[target]));
            }
        }
        Self { incoming }
    }

    pub fn node_count(&self) -> usize {
        self.incoming.len()
    }

    /// Aggregate node rows of `h` (`N × C`) along the normalized edges.
    pub fn apply(&self, h: &Array2<f32>) -> Array2<f32> {
        let mut out = Array2::<f32>::zeros(h.raw_dim());
        for (target, sources) in self.incoming.iter().enumerate() {
            let mut row = out.row_mut(target);
            for &(source, weight) in sources {
                row.scaled_add(weight, &h.row(source));
            }
        }
        out
    }
}
