//! # billet
//!
//! Place people connected by a social graph into capacity-limited groups
//! (rooms, tables, cabins) so that as many connections as possible end up
//! inside a group.
//!
//! The [`Assigner`] alternates community detection on the people still
//! waiting with a greedy packing of those communities into the groups that
//! still have room, until everyone is placed. Category-restricted groups are
//! handled by [`split`]ting the group pool first and assigning each category
//! on its own subgraph ([`assign_by_category`]).
//!
//! ```rust
//! use billet::{assign, edges_saved, Category, Group, PersonRecord, SocialGraph};
//!
//! let records: Vec<PersonRecord<u32>> = vec![
//!     PersonRecord { id: 1, connections: vec![2], category: None, answers: vec![] },
//!     PersonRecord { id: 2, connections: vec![], category: None, answers: vec![] },
//!     PersonRecord { id: 3, connections: vec![4], category: None, answers: vec![] },
//!     PersonRecord { id: 4, connections: vec![], category: None, answers: vec![] },
//! ];
//! let graph = SocialGraph::from_records(&records).unwrap();
//! let mut rooms = vec![
//!     Group::new("north", 2, Category::Unrestricted).unwrap(),
//!     Group::new("south", 2, Category::Unrestricted).unwrap(),
//! ];
//!
//! assign(&graph, &mut rooms).unwrap();
//! assert!(rooms.iter().all(|r| r.is_full()));
//! println!("edges saved: {:.0}%", 100.0 * edges_saved(&graph, &rooms));
//! ```

pub mod assign;
pub mod baseline;
pub mod community;
/// Error types used across `billet`.
pub mod error;
pub mod graph;
pub mod group;
pub mod metrics;
pub mod similarity;
pub mod split;


pub use assign::{assign, AssignConfig, AssignReport, Assigner};
pub use baseline::{assign_randomly, GroupGenerator};
pub use community::{CommunityOracle, LabelPropagation, Louvain};
pub use error::{Error, Result};
pub use graph::{load_records, PersonRecord, SocialGraph};
pub use group::{Category, Group, GroupSpec};
pub use metrics::{edges_saved, mean_satisfaction, AssignmentSummary};
pub use similarity::Similarity;
pub use split::{
    assign_by_category, categories_of, split, CategorizedAssignment, CategoryFailure,
    CategoryShortfall, SplitConfig, SplitOutcome,
};
