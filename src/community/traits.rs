//! Community oracle trait.

use crate::error::Result;
use petgraph::graph::UnGraph;

/// Trait for community detection algorithms used by the assignment engine.
///
/// The engine treats implementations as black boxes: it hands over a dense
/// snapshot of the people still waiting for a group, together with how many
/// communities it would like, and packs whatever partition comes back.
pub trait CommunityOracle {
    /// Partition a graph into communities.
    ///
    /// Returns a community label per node index. `desired` is a hint: an
    /// implementation may return fewer or more communities, but when
    /// `desired >= graph.node_count()` it must return all singletons.
    fn partition<N>(&self, graph: &UnGraph<N, f64>, desired: usize) -> Result<Vec<usize>>;
}

impl<O: CommunityOracle> CommunityOracle for &O {
    fn partition<N>(&self, graph: &UnGraph<N, f64>, desired: usize) -> Result<Vec<usize>> {
        (**self).partition(graph, desired)
    }
}
