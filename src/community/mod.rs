//! Community detection on the working graph.
//!
//! Every pass of the assignment engine asks an oracle to split the people
//! still waiting for a group into densely connected communities. Any
//! algorithm implementing [`CommunityOracle`] can be plugged in; two are
//! provided.
//!
//! ## Louvain
//!
//! Greedy multi-level modularity optimisation ([Blondel et al. 2008](https://arxiv.org/abs/0803.0476)).
//! Modularity compares the weight inside communities against what a random
//! graph with the same degrees would have:
//!
//! ```text
//! Q = (1/2m) × Σ[A_ij - γ(k_i × k_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! The requested community count acts as a floor: merges that would drop the
//! partition below it are refused. Asking for at least as many communities as
//! there are nodes therefore yields singletons, which is what the engine
//! relies on when it escalates after a stalled pass.
//!
//! ## Label Propagation
//!
//! O(E) randomised algorithm: each node adopts the most common label among
//! its neighbours. Fast, approximate and non-deterministic unless seeded.
//!
//! ## Usage
//!
//! ```rust
//! use petgraph::graph::UnGraph;
//! use billet::community::{CommunityOracle, Louvain};
//!
//! let mut graph = UnGraph::<(), f64>::new_undirected();
//! let a = graph.add_node(());
//! let b = graph.add_node(());
//! let c = graph.add_node(());
//! graph.add_edge(a, b, 1.0);
//! graph.add_edge(b, c, 1.0);
//!
//! let labels = Louvain::new().partition(&graph, 1).unwrap();
//! assert_eq!(labels.len(), 3);
//! ```

mod label_prop;
mod louvain;
mod traits;

pub use label_prop::LabelPropagation;
pub use louvain::Louvain;
pub use traits::CommunityOracle;

use std::collections::HashMap;

/// Group node indices by community label.
///
/// Communities are returned in order of first appearance.
pub fn communities_from_labels(labels: &[usize]) -> Vec<Vec<usize>> {
    let mut slot: HashMap<usize, usize> = HashMap::new();
    let mut communities: Vec<Vec<usize>> = Vec::new();
    for (node, &label) in labels.iter().enumerate() {
        let i = *slot.entry(label).or_insert_with(|| {
            communities.push(Vec::new());
            communities.len() - 1
        });
        communities[i].push(node);
    }
    communities
}

/// Renumber labels to consecutive integers, preserving their relative order.
pub(crate) fn compact_labels(labels: &[usize]) -> Vec<usize> {
    let mut unique: Vec<usize> = labels.to_vec();
    unique.sort_unstable();
    unique.dedup();
    labels
        .iter()
        .map(|l| unique.binary_search(l).unwrap_or(0))
        .collect()
}
