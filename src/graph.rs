//! The social graph people are assigned from.
//!
//! [`SocialGraph`] keys nodes by caller-supplied person ids and keeps one
//! undirected, weighted edge per connected pair. It is backed by a
//! `StableUnGraph` so that the assignment engine can remove placed people from
//! a working copy without invalidating the indices of everyone else.
//!
//! Oracles never see person ids: [`SocialGraph::snapshot`] compacts the
//! current node set into a dense `UnGraph` and returns the index → person
//! table needed to translate a partition back.

use crate::error::{Error, Result};
use crate::group::Category;
use petgraph::algo::dijkstra;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::stable_graph::StableUnGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::io::Read;

/// One participant as read from input files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord<P> {
    /// Unique person id.
    pub id: P,
    /// People this person wants to be grouped with.
    #[serde(default = "Vec::new", alias = "subscriber_ids")]
    pub connections: Vec<P>,
    /// Restricted category, when groups are category-restricted.
    #[serde(default)]
    pub category: Option<Category>,
    /// Questionnaire answers, compared by [`crate::similarity`].
    #[serde(default, alias = "option")]
    pub answers: Vec<f64>,
}

/// Read a JSON array of [`PersonRecord`]s.
pub fn load_records<P, R>(reader: R) -> Result<Vec<PersonRecord<P>>>
where
    P: DeserializeOwned,
    R: Read,
{
    Ok(serde_json::from_reader(reader)?)
}

/// Dense copy of a graph handed to a community oracle.
#[derive(Debug, Clone)]
pub struct Snapshot<P> {
    /// Compact graph; node `i` is `people[i]`.
    pub graph: UnGraph<(), f64>,
    /// Index → person table.
    pub people: Vec<P>,
}

/// Undirected social graph over person ids.
#[derive(Debug, Clone)]
pub struct SocialGraph<P> {
    graph: StableUnGraph<P, f64>,
    index: HashMap<P, NodeIndex>,
}

impl<P> Default for SocialGraph<P> {
    fn default() -> Self {
        Self {
            graph: StableUnGraph::default(),
            index: HashMap::new(),
        }
    }
}

impl<P> SocialGraph<P>
where
    P: Clone + Eq + Hash + Debug,
{
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the unweighted graph described by `records`.
    ///
    /// Every person must appear once, and every connection must name a
    /// person present in `records`.
    pub fn from_records(records: &[PersonRecord<P>]) -> Result<Self> {
        let mut graph = Self::new();
        for record in records {
            graph.add_person(record.id.clone())?;
        }
        for record in records {
            for other in &record.connections {
                graph.connect(&record.id, other, 1.0)?;
            }
        }
        Ok(graph)
    }

    /// Build a weighted graph from a pairwise similarity matrix.
    ///
    /// `matrix[i][j]` scores `ids[i]` against `ids[j]`. Pairs with a finite,
    /// strictly positive score in either direction are connected, weighted by
    /// the larger of the two scores.
    pub fn from_similarity(ids: &[P], matrix: &[Vec<f64>]) -> Result<Self> {
        if matrix.len() != ids.len() {
            return Err(Error::InvalidParameter {
                name: "matrix",
                message: "row count must match the number of ids",
            });
        }
        if matrix.iter().any(|row| row.len() != ids.len()) {
            return Err(Error::InvalidParameter {
                name: "matrix",
                message: "matrix must be square",
            });
        }

        let mut graph = Self::new();
        for id in ids {
            graph.add_person(id.clone())?;
        }
        for (i, row) in matrix.iter().enumerate() {
            for (j, &score) in row.iter().enumerate() {
                if i != j && score.is_finite() && score > 0.0 {
                    graph.connect(&ids[i], &ids[j], score)?;
                }
            }
        }
        Ok(graph)
    }

    /// Add a person with no connections.
    pub fn add_person(&mut self, person: P) -> Result<()> {
        if self.index.contains_key(&person) {
            return Err(Error::DuplicatePerson(format!("{person:?}")));
        }
        let idx = self.graph.add_node(person.clone());
        self.index.insert(person, idx);
        Ok(())
    }

    /// Connect two people.
    ///
    /// Self-connections are ignored. Connecting an already connected pair
    /// keeps the larger weight.
    pub fn connect(&mut self, a: &P, b: &P, weight: f64) -> Result<()> {
        let ia = self.node(a)?;
        let ib = self.node(b)?;
        if ia == ib {
            return Ok(());
        }
        match self.graph.find_edge(ia, ib) {
            Some(edge) => {
                if let Some(w) = self.graph.edge_weight_mut(edge) {
                    *w = w.max(weight);
                }
            }
            None => {
                let _ = self.graph.add_edge(ia, ib, weight);
            }
        }
        Ok(())
    }

    fn node(&self, person: &P) -> Result<NodeIndex> {
        self.index
            .get(person)
            .copied()
            .ok_or_else(|| Error::UnknownPerson(format!("{person:?}")))
    }

    /// Number of people.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of connected pairs.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether no person is left.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether `person` is in the graph.
    pub fn contains(&self, person: &P) -> bool {
        self.index.contains_key(person)
    }

    /// Whether `a` and `b` are connected.
    pub fn connected(&self, a: &P, b: &P) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&ia), Some(&ib)) => self.graph.find_edge(ia, ib).is_some(),
            _ => false,
        }
    }

    /// Every person, in no particular order.
    pub fn people(&self) -> impl Iterator<Item = &P> + '_ {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Hop count from `from` to everyone reachable from them, `from` included.
    pub fn hop_distances(&self, from: &P) -> Result<HashMap<P, usize>> {
        let start = self.node(from)?;
        let hops = dijkstra(&self.graph, start, None, |_| 1usize);
        Ok(hops
            .into_iter()
            .map(|(idx, d)| (self.graph[idx].clone(), d))
            .collect())
    }

    /// Remove a person and their connections. Returns whether they were present.
    pub fn remove_person(&mut self, person: &P) -> bool {
        match self.index.remove(person) {
            Some(idx) => self.graph.remove_node(idx).is_some(),
            None => false,
        }
    }

    /// Subgraph induced by the people `keep` accepts.
    pub fn induced<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&P) -> bool,
    {
        let mut sub = self.clone();
        let dropped: Vec<P> = self.people().filter(|p| !keep(p)).cloned().collect();
        for person in &dropped {
            let _ = sub.remove_person(person);
        }
        sub
    }

    /// Dense copy of the current graph for community detection.
    pub fn snapshot(&self) -> Snapshot<P> {
        let mut dense = UnGraph::with_capacity(self.graph.node_count(), self.graph.edge_count());
        let mut people = Vec::with_capacity(self.graph.node_count());
        let mut compact: HashMap<NodeIndex, NodeIndex> = HashMap::new();

        for idx in self.graph.node_indices() {
            compact.insert(idx, dense.add_node(()));
            people.push(self.graph[idx].clone());
        }
        for edge in self.graph.edge_references() {
            let _ = dense.add_edge(
                compact[&edge.source()],
                compact[&edge.target()],
                *edge.weight(),
            );
        }

        Snapshot {
            graph: dense,
            people,
        }
    }

    /// Number of edges with both endpoints in `members`.
    ///
    /// Ids not in the graph are ignored.
    pub fn internal_edges(&self, members: &[P]) -> usize {
        let inside: HashSet<NodeIndex> = members
            .iter()
            .filter_map(|p| self.index.get(p).copied())
            .collect();
        inside
            .iter()
            .map(|&a| {
                self.graph
                    .neighbors(a)
                    .filter(|b| a.index() < b.index() && inside.contains(b))
                    .count()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, connections: &[u32]) -> PersonRecord<u32> {
        PersonRecord {
            id,
            connections: connections.to_vec(),
            category: None,
            answers: Vec::new(),
        }
    }

    #[test]
    fn test_from_records_merges_mutual_connections() {
        let records = vec![record(1, &[2]), record(2, &[1, 3]), record(3, &[])];
        let graph = SocialGraph::from_records(&records).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.connected(&1, &2));
        assert!(graph.connected(&3, &2));
        assert!(!graph.connected(&1, &3));
    }

    #[test]
    fn test_duplicate_person_rejected() {
        let records = vec![record(1, &[]), record(1, &[])];
        let result = SocialGraph::from_records(&records);
        assert!(matches!(result, Err(Error::DuplicatePerson(_))));
    }

    #[test]
    fn test_unknown_connection_rejected() {
        let records = vec![record(1, &[9])];
        let result = SocialGraph::from_records(&records);
        assert!(matches!(result, Err(Error::UnknownPerson(_))));
    }

    #[test]
    fn test_self_connection_ignored() {
        let records = vec![record(1, &[1])];
        let graph = SocialGraph::from_records(&records).unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_from_similarity_thresholds() {
        let ids = ["a", "b", "c"];
        let matrix = vec![
            vec![0.0, 0.4, f64::INFINITY],
            vec![0.9, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ];
        let graph = SocialGraph::from_similarity(&ids, &matrix).unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.connected(&"a", &"b"));
        let snap = graph.snapshot();
        let weight = snap.graph.raw_edges()[0].weight;
        assert!((weight - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_from_similarity_shape_checked() {
        let ids = [1, 2];
        let matrix = vec![vec![0.0, 1.0]];
        assert!(SocialGraph::from_similarity(&ids, &matrix).is_err());
    }

    #[test]
    fn test_snapshot_after_removal_is_dense() {
        let records = vec![
            record(10, &[20]),
            record(20, &[30]),
            record(30, &[40]),
            record(40, &[]),
        ];
        let mut graph = SocialGraph::from_records(&records).unwrap();
        assert!(graph.remove_person(&20));
        assert!(!graph.remove_person(&20));

        let snap = graph.snapshot();
        assert_eq!(snap.graph.node_count(), 3);
        assert_eq!(snap.graph.edge_count(), 1);
        assert_eq!(snap.people.len(), 3);
        for edge in snap.graph.edge_references() {
            let a = snap.people[edge.source().index()];
            let b = snap.people[edge.target().index()];
            assert!(graph.connected(&a, &b));
        }
    }

    #[test]
    fn test_hop_distances() {
        let records = vec![record(1, &[2]), record(2, &[3]), record(3, &[]), record(4, &[])];
        let graph = SocialGraph::from_records(&records).unwrap();
        let hops = graph.hop_distances(&1).unwrap();

        assert_eq!(hops[&1], 0);
        assert_eq!(hops[&2], 1);
        assert_eq!(hops[&3], 2);
        assert!(!hops.contains_key(&4));
        assert!(graph.hop_distances(&9).is_err());
    }

    #[test]
    fn test_induced_subgraph() {
        let records = vec![record(1, &[2, 3]), record(2, &[3]), record(3, &[]), record(4, &[1])];
        let graph = SocialGraph::from_records(&records).unwrap();
        let sub = graph.induced(|p| *p != 3);

        assert_eq!(sub.node_count(), 3);
        assert_eq!(sub.edge_count(), 2);
        assert!(!sub.contains(&3));
        // Original untouched.
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn test_internal_edges() {
        let records = vec![record(1, &[2, 3]), record(2, &[3]), record(3, &[4]), record(4, &[])];
        let graph = SocialGraph::from_records(&records).unwrap();

        assert_eq!(graph.internal_edges(&[1, 2, 3]), 3);
        assert_eq!(graph.internal_edges(&[1, 4]), 0);
        assert_eq!(graph.internal_edges(&[3, 4, 99]), 1);
    }

    #[test]
    fn test_load_records_accepts_subscriber_alias() {
        let json = r#"[
            {"id": 1, "subscriber_ids": [2], "category": "category_a"},
            {"id": 2}
        ]"#;
        let records: Vec<PersonRecord<u32>> = load_records(json.as_bytes()).unwrap();

        assert_eq!(records[0].connections, vec![2]);
        assert_eq!(records[0].category, Some(Category::A));
        assert!(records[1].connections.is_empty());
    }

    /// Ids without a `Default` impl deserialize too.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
    struct Handle(String);

    #[test]
    fn test_load_records_with_non_default_ids() {
        let json = r#"[
            {"id": "ann", "connections": ["bob"], "option": [1.0, 0.0]},
            {"id": "bob"}
        ]"#;
        let records: Vec<PersonRecord<Handle>> = load_records(json.as_bytes()).unwrap();

        assert_eq!(records[0].connections, vec![Handle("bob".into())]);
        assert_eq!(records[0].answers, vec![1.0, 0.0]);
        assert!(records[1].connections.is_empty());
        assert!(records[1].answers.is_empty());

        let graph = SocialGraph::from_records(&records).unwrap();
        assert!(graph.connected(&Handle("ann".into()), &Handle("bob".into())));
    }
}
