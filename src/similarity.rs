//! Pairwise similarity between people, for weighted graphs.
//!
//! The plain [`SocialGraph::from_records`] graph only knows who listed whom.
//! A [`Similarity`] scores every pair instead, and [`Similarity::build_graph`]
//! turns the scores into a weighted graph through
//! [`SocialGraph::from_similarity`]:
//!
//! | Variant | Score of a pair |
//! |---------|-----------------|
//! | [`Similarity::Graph`] | `1 / (d(a, b) + d(b, a))` over hop counts; 0 when unreachable |
//! | [`Similarity::Content`] | cosine of the answer vectors, shorter one zero-padded |
//! | [`Similarity::Hybrid`] | `w · graph + (1 - w) · content` |
//!
//! # Example
//!
//! ```rust
//! use billet::graph::PersonRecord;
//! use billet::similarity::Similarity;
//!
//! let records = vec![
//!     PersonRecord { id: 1, connections: vec![2], category: None, answers: vec![1.0, 0.0] },
//!     PersonRecord { id: 2, connections: vec![], category: None, answers: vec![1.0] },
//!     PersonRecord { id: 3, connections: vec![], category: None, answers: vec![0.0, 1.0] },
//! ];
//! let graph = Similarity::default().build_graph(&records).unwrap();
//!
//! assert!(graph.connected(&1, &2));
//! assert!(!graph.connected(&1, &3));
//! ```

use crate::error::{Error, Result};
use crate::graph::{PersonRecord, SocialGraph};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// How pairs of people are scored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    /// Reciprocal round-trip hop count in the connection graph.
    Graph,
    /// Cosine similarity of questionnaire answers.
    Content,
    /// Weighted mix of the two.
    Hybrid {
        /// Share of the graph score, in `[0, 1]`.
        graph_weight: f64,
    },
}

impl Default for Similarity {
    fn default() -> Self {
        Similarity::Hybrid { graph_weight: 0.7 }
    }
}

impl Similarity {
    /// Score matrix over `records`, in record order.
    pub fn matrix<P>(&self, records: &[PersonRecord<P>]) -> Result<Vec<Vec<f64>>>
    where
        P: Clone + Eq + Hash + Debug,
    {
        match *self {
            Similarity::Graph => graph_similarity(records),
            Similarity::Content => Ok(content_similarity(records)),
            Similarity::Hybrid { graph_weight } => {
                if !(0.0..=1.0).contains(&graph_weight) {
                    return Err(Error::InvalidParameter {
                        name: "graph_weight",
                        message: "must be in [0, 1]",
                    });
                }
                let mut matrix = graph_similarity(records)?;
                let content = content_similarity(records);
                for (row, content_row) in matrix.iter_mut().zip(&content) {
                    for (score, c) in row.iter_mut().zip(content_row) {
                        *score = graph_weight * *score + (1.0 - graph_weight) * c;
                    }
                }
                Ok(matrix)
            }
        }
    }

    /// Weighted graph over `records`; see [`SocialGraph::from_similarity`].
    pub fn build_graph<P>(&self, records: &[PersonRecord<P>]) -> Result<SocialGraph<P>>
    where
        P: Clone + Eq + Hash + Debug,
    {
        let matrix = self.matrix(records)?;
        let ids: Vec<P> = records.iter().map(|r| r.id.clone()).collect();
        SocialGraph::from_similarity(&ids, &matrix)
    }
}

/// Reciprocal round-trip hop counts between every pair of records.
///
/// Connections are undirected, so the round trip is twice the shortest
/// path. Unreachable pairs and the diagonal score 0.
pub fn graph_similarity<P>(records: &[PersonRecord<P>]) -> Result<Vec<Vec<f64>>>
where
    P: Clone + Eq + Hash + Debug,
{
    let graph = SocialGraph::from_records(records)?;
    let position: HashMap<&P, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (&r.id, i))
        .collect();

    let n = records.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for (i, record) in records.iter().enumerate() {
        for (other, hops) in graph.hop_distances(&record.id)? {
            if let Some(&j) = position.get(&other) {
                if i != j && hops > 0 {
                    matrix[i][j] = 1.0 / (2 * hops) as f64;
                }
            }
        }
    }
    Ok(matrix)
}

/// Cosine similarity of every pair of answer vectors.
///
/// The shorter vector is padded with zeros. An all-zero vector scores 0
/// against everyone.
pub fn content_similarity<P>(records: &[PersonRecord<P>]) -> Vec<Vec<f64>> {
    let n = records.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for (i, a) in records.iter().enumerate() {
        for (j, b) in records.iter().enumerate().skip(i + 1) {
            let score = cosine(&a.answers, &b.answers);
            matrix[i][j] = score;
            matrix[j][i] = score;
        }
    }
    matrix
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    // Zero padding adds nothing to the dot product or the norms.
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, connections: &[u32], answers: &[f64]) -> PersonRecord<u32> {
        PersonRecord {
            id,
            connections: connections.to_vec(),
            category: None,
            answers: answers.to_vec(),
        }
    }

    #[test]
    fn test_cosine_pads_shorter_vector() {
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
        assert!((cosine(&[1.0, 1.0], &[1.0]) - 1.0 / 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine(&[], &[1.0]), 0.0);
    }

    #[test]
    fn test_content_matrix_is_symmetric() {
        let records = vec![
            record(1, &[], &[1.0, 2.0]),
            record(2, &[], &[2.0, 4.0]),
            record(3, &[], &[-2.0, 1.0]),
        ];
        let m = content_similarity(&records);

        assert_eq!(m[0][0], 0.0);
        assert!((m[0][1] - 1.0).abs() < 1e-12);
        assert!(m[0][2].abs() < 1e-12);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(m[i][j], m[j][i]);
            }
        }
    }

    #[test]
    fn test_graph_similarity_decays_with_distance() {
        // 1 - 2 - 3, 4 isolated.
        let records = vec![
            record(1, &[2], &[]),
            record(2, &[3], &[]),
            record(3, &[], &[]),
            record(4, &[], &[]),
        ];
        let m = graph_similarity(&records).unwrap();

        assert!((m[0][1] - 0.5).abs() < 1e-12);
        assert!((m[0][2] - 0.25).abs() < 1e-12);
        assert!((m[2][0] - 0.25).abs() < 1e-12);
        assert_eq!(m[0][3], 0.0);
        assert_eq!(m[1][1], 0.0);
    }

    #[test]
    fn test_graph_similarity_rejects_unknown_connection() {
        let records = vec![record(1, &[7], &[])];
        assert!(matches!(
            graph_similarity(&records),
            Err(Error::UnknownPerson(_))
        ));
    }

    #[test]
    fn test_hybrid_mixes_scores() {
        let records = vec![record(1, &[2], &[1.0, 0.0]), record(2, &[], &[1.0, 0.0])];
        let m = Similarity::Hybrid { graph_weight: 0.7 }.matrix(&records).unwrap();
        // graph 0.5, content 1.0
        assert!((m[0][1] - (0.7 * 0.5 + 0.3)).abs() < 1e-12);

        let bad = Similarity::Hybrid { graph_weight: 1.5 }.matrix(&records);
        assert!(matches!(bad, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_build_graph_weights_edges() {
        let records = vec![
            record(1, &[2], &[1.0, 0.0]),
            record(2, &[], &[0.0, 1.0]),
            record(3, &[], &[1.0, 0.0]),
        ];
        let graph = Similarity::Content.build_graph(&records).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.connected(&1, &3));

        let graph = Similarity::Graph.build_graph(&records).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.connected(&1, &2));
    }

    #[test]
    fn test_similarity_from_json() {
        let s: Similarity = serde_json::from_str(r#""content""#).unwrap();
        assert_eq!(s, Similarity::Content);
        let s: Similarity = serde_json::from_str(r#"{"hybrid": {"graph_weight": 0.5}}"#).unwrap();
        assert_eq!(s, Similarity::Hybrid { graph_weight: 0.5 });
    }
}
