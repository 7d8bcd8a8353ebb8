//! Louvain algorithm for community detection.
//!
//! Fast modularity optimization through local node moves and graph aggregation.
//!
//! ## The Algorithm (Blondel et al. 2008)
//!
//! 1. **Phase 1 (Local Moving)**: Start with each node in its own community.
//!    Repeatedly move nodes to the neighbouring community with the highest
//!    modularity gain until no move improves it.
//!
//! 2. **Phase 2 (Aggregation)**: Build a meta-graph where communities become
//!    single nodes. Edge weights are sums of edges between communities;
//!    self-loops carry the weight inside a community.
//!
//! 3. **Iterate**: Repeat on the meta-graph until modularity stops improving.
//!
//! ## Community Floor
//!
//! The requested community count is honoured as a lower bound. A move that
//! would empty a community is refused once the partition is down to the
//! floor, so asking for `n` communities on an `n`-node graph returns
//! singletons.
//!
//! ## References
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.

use super::compact_labels;
use super::traits::CommunityOracle;
use crate::error::{Error, Result};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Weighted edge list: `(i, j, w)` with `i < j`.
type EdgeList = Vec<(usize, usize, f64)>;

/// Louvain community detection algorithm.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct Louvain {
    /// Resolution parameter (gamma).
    resolution: f64,
    /// Maximum iterations per level.
    max_iter: usize,
    /// Maximum levels of aggregation.
    max_levels: usize,
    /// Minimum modularity improvement to continue.
    min_modularity_gain: f64,
}

impl Louvain {
    /// Create a new Louvain detector with default settings.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_iter: 100,
            max_levels: 10,
            min_modularity_gain: 1e-7,
        }
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set maximum iterations per level.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set maximum aggregation levels.
    pub fn with_max_levels(mut self, levels: usize) -> Self {
        self.max_levels = levels;
        self
    }

    /// Resolution parameter.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    fn weighted_degrees(n: usize, edges: &[(usize, usize, f64)], self_loops: &[f64]) -> Vec<f64> {
        let mut degrees = vec![0.0; n];
        for &(i, j, w) in edges {
            degrees[i] += w;
            degrees[j] += w;
        }
        for (i, &sl) in self_loops.iter().enumerate() {
            degrees[i] += 2.0 * sl;
        }
        degrees
    }

    /// Compute modularity of a weighted graph partition.
    fn modularity_weighted(
        &self,
        n: usize,
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        communities: &[usize],
    ) -> f64 {
        let m: f64 = edges.iter().map(|(_, _, w)| w).sum::<f64>() + self_loops.iter().sum::<f64>();
        if m == 0.0 {
            return 0.0;
        }
        let degrees = Self::weighted_degrees(n, edges, self_loops);

        let mut q = 0.0;
        for &(i, j, w) in edges {
            if communities[i] == communities[j] {
                let expected = degrees[i] * degrees[j] / (2.0 * m);
                q += w - self.resolution * expected;
            }
        }
        for (i, &sl) in self_loops.iter().enumerate() {
            if sl > 0.0 {
                let expected = degrees[i] * degrees[i] / (2.0 * m);
                q += sl - self.resolution * expected / 2.0;
            }
        }

        q / m
    }

    /// Phase 1: Local moving on weighted graph, never going below `floor`
    /// communities.
    /// Returns (communities, improved).
    fn local_moving(
        &self,
        n: usize,
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        floor: usize,
    ) -> (Vec<usize>, bool) {
        let mut adj: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];
        for &(i, j, w) in edges {
            *adj[i].entry(j).or_insert(0.0) += w;
            *adj[j].entry(i).or_insert(0.0) += w;
        }

        let m: f64 = edges.iter().map(|(_, _, w)| w).sum::<f64>() + self_loops.iter().sum::<f64>();
        if m == 0.0 {
            return ((0..n).collect(), false);
        }
        let degrees = Self::weighted_degrees(n, edges, self_loops);

        let mut communities: Vec<usize> = (0..n).collect();
        let mut community_degrees = degrees.clone();
        let mut community_sizes = vec![1usize; n];
        let mut live = n;
        let mut any_improved = false;

        for _iter in 0..self.max_iter {
            let mut improved = false;

            for node in 0..n {
                let current_community = communities[node];
                let ki = degrees[node];

                // Leaving a singleton would drop a community.
                if community_sizes[current_community] == 1 && live <= floor {
                    continue;
                }

                community_degrees[current_community] -= ki;

                let mut community_weights: HashMap<usize, f64> = HashMap::new();
                for (&neighbor, &w) in &adj[node] {
                    let nc = communities[neighbor];
                    *community_weights.entry(nc).or_insert(0.0) += w;
                }

                let stay_gain = community_weights
                    .get(&current_community)
                    .map(|&ki_in| {
                        ki_in / m
                            - self.resolution * community_degrees[current_community] * ki
                                / (2.0 * m * m)
                    })
                    .unwrap_or(0.0);

                let mut best_community = current_community;
                let mut best_gain = stay_gain.max(0.0);

                for (&target_comm, &ki_in) in &community_weights {
                    if target_comm == current_community {
                        continue;
                    }
                    let sigma_tot = community_degrees[target_comm];
                    let gain = ki_in / m - self.resolution * sigma_tot * ki / (2.0 * m * m);
                    if gain > best_gain {
                        best_gain = gain;
                        best_community = target_comm;
                    }
                }

                if best_community != current_community {
                    community_sizes[current_community] -= 1;
                    if community_sizes[current_community] == 0 {
                        live -= 1;
                    }
                    communities[node] = best_community;
                    community_sizes[best_community] += 1;
                    community_degrees[best_community] += ki;
                    improved = true;
                    any_improved = true;
                } else {
                    community_degrees[current_community] += ki;
                }
            }

            if !improved {
                break;
            }
        }

        (communities, any_improved)
    }

    /// Phase 2: Aggregate graph based on communities.
    /// Returns (new_edges, new_self_loops, node_to_original_mapping).
    fn aggregate(
        edges: &[(usize, usize, f64)],
        self_loops: &[f64],
        communities: &[usize],
    ) -> (EdgeList, Vec<f64>, Vec<Vec<usize>>) {
        let compact = compact_labels(communities);
        let n_new = compact.iter().copied().max().map_or(0, |c| c + 1);

        let mut new_to_old: Vec<Vec<usize>> = vec![Vec::new(); n_new];
        for (node, &comm) in compact.iter().enumerate() {
            new_to_old[comm].push(node);
        }

        let mut new_self_loops = vec![0.0; n_new];
        for (i, &sl) in self_loops.iter().enumerate() {
            new_self_loops[compact[i]] += sl;
        }

        let mut new_edge_weights: HashMap<(usize, usize), f64> = HashMap::new();
        for &(i, j, w) in edges {
            let ci = compact[i];
            let cj = compact[j];
            if ci == cj {
                new_self_loops[ci] += w;
                continue;
            }
            let key = if ci < cj { (ci, cj) } else { (cj, ci) };
            *new_edge_weights.entry(key).or_insert(0.0) += w;
        }

        let new_edges: EdgeList = new_edge_weights
            .into_iter()
            .map(|((i, j), w)| (i, j, w))
            .collect();

        (new_edges, new_self_loops, new_to_old)
    }

    /// Expand partition from aggregated level to original nodes.
    fn expand_partition(partition: &[usize], node_mapping: &[Vec<usize>]) -> Vec<usize> {
        let max_node = node_mapping.iter().flatten().copied().max().unwrap_or(0);
        let mut result = vec![0; max_node + 1];

        for (agg_node, original_nodes) in node_mapping.iter().enumerate() {
            let comm = partition[agg_node];
            for &orig in original_nodes {
                result[orig] = comm;
            }
        }
        result
    }
}

impl Default for Louvain {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityOracle for Louvain {
    fn partition<N>(&self, graph: &UnGraph<N, f64>, desired: usize) -> Result<Vec<usize>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let floor = desired.max(1);
        if floor >= n || graph.edge_count() == 0 {
            return Ok((0..n).collect());
        }

        // Non-positive weights carry no attraction.
        let edges: EdgeList = graph
            .edge_references()
            .filter(|e| *e.weight() > 0.0)
            .filter_map(|e| {
                let (i, j) = (e.source().index(), e.target().index());
                match i.cmp(&j) {
                    std::cmp::Ordering::Less => Some((i, j, *e.weight())),
                    std::cmp::Ordering::Greater => Some((j, i, *e.weight())),
                    std::cmp::Ordering::Equal => None,
                }
            })
            .collect();

        let mut current_n = n;
        let mut current_edges = edges;
        let mut current_self_loops = vec![0.0; n];
        let mut mapping_stack: Vec<Vec<Vec<usize>>> = Vec::new();
        let mut prev_modularity = f64::NEG_INFINITY;

        for level in 0..self.max_levels {
            let (partition, improved) =
                self.local_moving(current_n, &current_edges, &current_self_loops, floor);
            if !improved {
                break;
            }

            let mod_now = self.modularity_weighted(
                current_n,
                &current_edges,
                &current_self_loops,
                &partition,
            );
            if mod_now - prev_modularity < self.min_modularity_gain {
                break;
            }
            prev_modularity = mod_now;

            let (new_edges, new_self_loops, node_mapping) =
                Self::aggregate(&current_edges, &current_self_loops, &partition);

            if node_mapping.len() == current_n {
                break;
            }
            log::trace!(
                "louvain level {level}: {} -> {} nodes, modularity {mod_now:.4}",
                current_n,
                node_mapping.len()
            );

            current_n = node_mapping.len();
            mapping_stack.push(node_mapping);
            current_edges = new_edges;
            current_self_loops = new_self_loops;

            if current_n <= floor {
                break;
            }
        }

        let mut result: Vec<usize> = (0..current_n).collect();
        while let Some(mapping) = mapping_stack.pop() {
            result = Self::expand_partition(&result, &mapping);
        }
        result.resize(n, 0);

        Ok(compact_labels(&result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::communities_from_labels;

    fn two_triangles() -> UnGraph<(), f64> {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let a: Vec<_> = (0..3).map(|_| graph.add_node(())).collect();
        let b: Vec<_> = (0..3).map(|_| graph.add_node(())).collect();
        for tri in [&a, &b] {
            let _ = graph.add_edge(tri[0], tri[1], 1.0);
            let _ = graph.add_edge(tri[1], tri[2], 1.0);
            let _ = graph.add_edge(tri[0], tri[2], 1.0);
        }
        // Bridge
        let _ = graph.add_edge(a[2], b[0], 1.0);
        graph
    }

    #[test]
    fn test_louvain_triangle() {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let n0 = graph.add_node(());
        let n1 = graph.add_node(());
        let n2 = graph.add_node(());
        let _ = graph.add_edge(n0, n1, 1.0);
        let _ = graph.add_edge(n1, n2, 1.0);
        let _ = graph.add_edge(n0, n2, 1.0);

        let communities = Louvain::new().partition(&graph, 1).unwrap();

        assert_eq!(communities.len(), 3);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
    }

    #[test]
    fn test_louvain_two_cliques() {
        let graph = two_triangles();
        let communities = Louvain::new().partition(&graph, 2).unwrap();

        assert_eq!(communities.len(), 6);
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
        assert_eq!(communities[3], communities[4]);
        assert_eq!(communities[4], communities[5]);
        assert_ne!(communities[0], communities[3]);
    }

    #[test]
    fn test_reversed_edge_endpoints_are_kept() {
        // Edges added high -> low must still count.
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let nodes: Vec<_> = (0..4).map(|_| graph.add_node(())).collect();
        let _ = graph.add_edge(nodes[1], nodes[0], 1.0);
        let _ = graph.add_edge(nodes[3], nodes[2], 1.0);

        let communities = Louvain::new().partition(&graph, 1).unwrap();
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[2], communities[3]);
        assert_ne!(communities[0], communities[2]);
    }

    #[test]
    fn test_floor_is_respected() {
        let graph = two_triangles();
        for desired in 1..=6 {
            let labels = Louvain::new().partition(&graph, desired).unwrap();
            let count = communities_from_labels(&labels).len();
            assert!(count >= desired, "asked {desired}, got {count}");
        }
    }

    #[test]
    fn test_desired_at_node_count_gives_singletons() {
        let graph = two_triangles();
        let labels = Louvain::new().partition(&graph, 6).unwrap();
        assert_eq!(labels, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_louvain_empty_graph() {
        let graph = UnGraph::<(), f64>::new_undirected();
        let result = Louvain::new().partition(&graph, 1);
        assert!(matches!(result, Err(Error::EmptyInput)));
    }

    #[test]
    fn test_louvain_disconnected() {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let _ = graph.add_node(());
        let _ = graph.add_node(());

        let communities = Louvain::new().partition(&graph, 1).unwrap();
        assert_eq!(communities.len(), 2);
        assert_ne!(communities[0], communities[1]);
    }

    #[test]
    fn test_weights_steer_merges() {
        // Path a-b-c-d with a heavy middle edge: b and c belong together.
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let n: Vec<_> = (0..4).map(|_| graph.add_node(())).collect();
        let _ = graph.add_edge(n[0], n[1], 0.1);
        let _ = graph.add_edge(n[1], n[2], 5.0);
        let _ = graph.add_edge(n[2], n[3], 0.1);

        let labels = Louvain::new().partition(&graph, 1).unwrap();
        assert_eq!(labels[1], labels[2]);
    }
}
