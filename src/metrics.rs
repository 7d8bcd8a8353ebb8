//! Assignment quality metrics.
//!
//! Measures how much of the social graph an assignment keeps together.
//!
//! # Metrics Overview
//!
//! | Metric | Range | Best | Properties |
//! |--------|-------|------|------------|
//! | [`edges_saved`] | [0, 1] | 1 | Share of all connections kept inside a group |
//! | [`mean_satisfaction`] | [0, 1] | 1 | Per-group density, averaged over groups |
//!
//! # Example
//!
//! ```rust
//! use billet::graph::{PersonRecord, SocialGraph};
//! use billet::group::{Category, Group};
//! use billet::metrics::{edges_saved, mean_satisfaction};
//!
//! let records = vec![
//!     PersonRecord { id: 1, connections: vec![2], category: None, answers: vec![] },
//!     PersonRecord { id: 2, connections: vec![], category: None, answers: vec![] },
//! ];
//! let graph = SocialGraph::from_records(&records).unwrap();
//! let mut room = Group::new("r1", 2, Category::Unrestricted).unwrap();
//! room.add_members([1, 2]).unwrap();
//!
//! assert_eq!(edges_saved(&graph, &[room.clone()]), 1.0);
//! assert_eq!(mean_satisfaction(&graph, &[room]), 1.0);
//! ```

use crate::graph::SocialGraph;
use crate::group::Group;
use std::fmt::{self, Debug};
use std::hash::Hash;

/// Connections kept inside each group, in group order.
pub fn internal_connections<P>(graph: &SocialGraph<P>, groups: &[Group<P>]) -> Vec<usize>
where
    P: Clone + Eq + Hash + Debug,
{
    groups
        .iter()
        .map(|g| graph.internal_edges(g.members()))
        .collect()
}

/// Density of one group: kept connections over the most its members could have.
///
/// ```text
/// satisfaction = internal / (n × (n - 1) / 2)
/// ```
///
/// A group with at most one member cannot hold a connection and scores 1.
pub fn group_satisfaction<P>(graph: &SocialGraph<P>, group: &Group<P>) -> f64
where
    P: Clone + Eq + Hash + Debug,
{
    let n = group.occupied();
    if n <= 1 {
        return 1.0;
    }
    let max_connections = n * (n - 1) / 2;
    graph.internal_edges(group.members()) as f64 / max_connections as f64
}

/// Mean [`group_satisfaction`] over `groups`; 0 for no groups.
pub fn mean_satisfaction<P>(graph: &SocialGraph<P>, groups: &[Group<P>]) -> f64
where
    P: Clone + Eq + Hash + Debug,
{
    if groups.is_empty() {
        return 0.0;
    }
    let total: f64 = groups.iter().map(|g| group_satisfaction(graph, g)).sum();
    total / groups.len() as f64
}

/// Share of the graph's connections kept inside a group.
///
/// An edgeless graph loses nothing and scores 1.
pub fn edges_saved<P>(graph: &SocialGraph<P>, groups: &[Group<P>]) -> f64
where
    P: Clone + Eq + Hash + Debug,
{
    let total = graph.edge_count();
    if total == 0 {
        return 1.0;
    }
    let kept: usize = internal_connections(graph, groups).iter().sum();
    kept as f64 / total as f64
}

/// Headline numbers of an assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignmentSummary {
    /// Groups evaluated.
    pub groups: usize,
    /// People placed.
    pub placed: usize,
    /// Connections kept inside groups.
    pub kept_connections: usize,
    /// See [`mean_satisfaction`].
    pub mean_satisfaction: f64,
    /// See [`edges_saved`].
    pub edges_saved: f64,
}

impl AssignmentSummary {
    /// Evaluate `groups` against the original `graph`.
    pub fn evaluate<P>(graph: &SocialGraph<P>, groups: &[Group<P>]) -> Self
    where
        P: Clone + Eq + Hash + Debug,
    {
        Self {
            groups: groups.len(),
            placed: groups.iter().map(Group::occupied).sum(),
            kept_connections: internal_connections(graph, groups).iter().sum(),
            mean_satisfaction: mean_satisfaction(graph, groups),
            edges_saved: edges_saved(graph, groups),
        }
    }
}

impl fmt::Display for AssignmentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Groups: {}, people placed: {}", self.groups, self.placed)?;
        writeln!(
            f,
            "Mean group satisfaction: {:.2}%",
            100.0 * self.mean_satisfaction
        )?;
        write!(
            f,
            "Percentage of edges saved: {:.2}% ({} kept)",
            100.0 * self.edges_saved,
            self.kept_connections
        )
    }
}
