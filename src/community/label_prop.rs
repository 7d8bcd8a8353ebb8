//! Label propagation for community detection.
//!
//! Very fast O(E) algorithm where nodes adopt the label carrying the most
//! edge weight among their neighbors.

use super::compact_labels;
use super::traits::CommunityOracle;
use crate::error::{Error, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rand::prelude::*;
use std::collections::HashMap;

/// Label propagation community detection.
///
/// The requested community count is only used for the singleton contract;
/// label propagation picks its own granularity otherwise.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct LabelPropagation {
    /// Maximum iterations.
    max_iter: usize,
    /// Random seed.
    seed: Option<u64>,
}

impl LabelPropagation {
    /// Create a new label propagation detector.
    pub fn new() -> Self {
        Self {
            max_iter: 100,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for LabelPropagation {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityOracle for LabelPropagation {
    fn partition<N>(&self, graph: &UnGraph<N, f64>, desired: usize) -> Result<Vec<usize>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if desired >= n {
            return Ok((0..n).collect());
        }

        let mut labels: Vec<usize> = (0..n).collect();

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        for _iter in 0..self.max_iter {
            let mut changed = false;

            let mut order: Vec<usize> = (0..n).collect();
            order.shuffle(&mut rng);

            for &node in &order {
                let node_idx = NodeIndex::new(node);

                let mut label_weights: HashMap<usize, f64> = HashMap::new();
                for edge in graph.edges(node_idx) {
                    let neighbor = if edge.target() == node_idx {
                        edge.source()
                    } else {
                        edge.target()
                    };
                    if neighbor == node_idx {
                        continue;
                    }
                    *label_weights.entry(labels[neighbor.index()]).or_insert(0.0) +=
                        *edge.weight();
                }

                let Some(max_weight) = label_weights.values().copied().reduce(f64::max) else {
                    continue;
                };

                let mut candidates: Vec<usize> = label_weights
                    .iter()
                    .filter(|(_, &w)| w == max_weight)
                    .map(|(&label, _)| label)
                    .collect();
                // HashMap order is arbitrary; sort so a seed reproduces.
                candidates.sort_unstable();

                if candidates.contains(&labels[node]) {
                    continue;
                }
                let new_label = if candidates.len() == 1 {
                    candidates[0]
                } else {
                    candidates[rng.random_range(0..candidates.len())]
                };

                labels[node] = new_label;
                changed = true;
            }

            if !changed {
                break;
            }
        }

        Ok(compact_labels(&labels))
    }
}
