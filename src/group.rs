//! Capacity-limited groups (rooms, tables, cabins).
//!
//! A [`Group`] holds an ordered list of members that only ever grows during an
//! assignment run. Its free space drives every packing decision: groups are
//! filled nearest-to-full first, see [`fill_order`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who may occupy a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Open to anyone; handed to a restricted category by the pre-splitter.
    #[default]
    Unrestricted,
    /// Reserved for the first restricted category.
    #[serde(rename = "category_a")]
    A,
    /// Reserved for the second restricted category.
    #[serde(rename = "category_b")]
    B,
}

impl Category {
    /// The restricted categories, in tie-break order.
    pub const fn restricted() -> [Category; 2] {
        [Category::A, Category::B]
    }

    /// Whether this category reserves a group.
    pub fn is_restricted(self) -> bool {
        self != Category::Unrestricted
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Unrestricted => write!(f, "unrestricted"),
            Category::A => write!(f, "category_a"),
            Category::B => write!(f, "category_b"),
        }
    }
}

/// Declarative group description, as read from input files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Optional label; generated from the position when absent.
    #[serde(default)]
    pub label: Option<String>,
    /// Number of places.
    pub capacity: usize,
    /// Category restriction.
    #[serde(default)]
    pub category: Category,
}

/// A capacity-limited container of people.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<P> {
    label: String,
    capacity: usize,
    category: Category,
    members: Vec<P>,
}

impl<P> Group<P> {
    /// Create an empty group.
    ///
    /// Fails with [`Error::InvalidCapacity`] when `capacity` is zero.
    pub fn new(label: impl Into<String>, capacity: usize, category: Category) -> Result<Self> {
        let label = label.into();
        if capacity == 0 {
            return Err(Error::InvalidCapacity { label });
        }
        Ok(Self {
            label,
            capacity,
            category,
            members: Vec::new(),
        })
    }

    /// Build the `index`-th group of an input list from its spec.
    pub fn from_spec(spec: &GroupSpec, index: usize) -> Result<Self> {
        let label = spec
            .label
            .clone()
            .unwrap_or_else(|| format!("group-{index}"));
        Self::new(label, spec.capacity, spec.category)
    }

    /// Build every group of an input list.
    pub fn from_specs(specs: &[GroupSpec]) -> Result<Vec<Self>> {
        specs
            .iter()
            .enumerate()
            .map(|(i, spec)| Self::from_spec(spec, i))
            .collect()
    }

    /// Label used in logs and errors.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of places.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Category restriction.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Members in assignment order.
    pub fn members(&self) -> &[P] {
        &self.members
    }

    /// Occupied places.
    pub fn occupied(&self) -> usize {
        self.members.len()
    }

    /// Free places; never negative.
    pub fn remaining_space(&self) -> usize {
        self.capacity - self.members.len()
    }

    /// Whether no place is left.
    pub fn is_full(&self) -> bool {
        self.remaining_space() == 0
    }

    /// Append a batch of members.
    ///
    /// All-or-nothing: if the batch does not fit, the group is left untouched
    /// and [`Error::CapacityExceeded`] is returned.
    pub fn add_members<I>(&mut self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
    {
        let batch: Vec<P> = ids.into_iter().collect();
        let remaining = self.remaining_space();
        if batch.len() > remaining {
            return Err(Error::CapacityExceeded {
                label: self.label.clone(),
                remaining,
                requested: batch.len(),
            });
        }
        self.members.extend(batch);
        Ok(())
    }

    /// Drop all members, for a restarted run.
    pub fn reset(&mut self) {
        self.members.clear();
    }
}

impl<P> fmt::Display for Group<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{}, {})",
            self.label,
            self.occupied(),
            self.capacity,
            self.category
        )
    }
}

/// Indices of `groups` ordered by ascending remaining space.
///
/// Stable: groups with equal free space keep their input order. Full groups
/// sort to the front.
pub fn fill_order<P>(groups: &[Group<P>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..groups.len()).collect();
    order.sort_by_key(|&i| groups[i].remaining_space());
    order
}

/// Free places summed over `groups`.
pub fn total_remaining<P>(groups: &[Group<P>]) -> usize {
    groups.iter().map(Group::remaining_space).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        let result = Group::<u32>::new("empty", 0, Category::Unrestricted);
        assert!(matches!(result, Err(Error::InvalidCapacity { .. })));
    }

    #[test]
    fn test_add_members_tracks_space() {
        let mut group = Group::new("r1", 3, Category::A).unwrap();
        assert_eq!(group.remaining_space(), 3);

        group.add_members([1, 2]).unwrap();
        assert_eq!(group.remaining_space(), 1);
        assert_eq!(group.members(), &[1, 2]);
        assert!(!group.is_full());

        group.add_members([3]).unwrap();
        assert!(group.is_full());
    }

    #[test]
    fn test_overflow_leaves_group_untouched() {
        let mut group = Group::new("r1", 2, Category::Unrestricted).unwrap();
        group.add_members([7]).unwrap();

        let err = group.add_members([8, 9]).unwrap_err();
        match err {
            Error::CapacityExceeded {
                remaining,
                requested,
                ..
            } => {
                assert_eq!(remaining, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(group.members(), &[7]);
    }

    #[test]
    fn test_fill_order_is_stable() {
        let mut groups: Vec<Group<u32>> = vec![
            Group::new("a", 4, Category::Unrestricted).unwrap(),
            Group::new("b", 2, Category::Unrestricted).unwrap(),
            Group::new("c", 4, Category::Unrestricted).unwrap(),
            Group::new("d", 1, Category::Unrestricted).unwrap(),
        ];
        groups[3].add_members([0]).unwrap();

        // d is full (0), b has 2, a and c tie at 4 and keep input order.
        assert_eq!(fill_order(&groups), vec![3, 1, 0, 2]);
        assert_eq!(total_remaining(&groups), 10);
    }

    #[test]
    fn test_reset() {
        let mut group = Group::new("r", 2, Category::B).unwrap();
        group.add_members(["x", "y"]).unwrap();
        group.reset();
        assert_eq!(group.remaining_space(), 2);
    }

    #[test]
    fn test_spec_deserialization() {
        let specs: Vec<GroupSpec> = serde_json::from_str(
            r#"[{"capacity": 4, "category": "category_a"}, {"label": "attic", "capacity": 2}]"#,
        )
        .unwrap();
        let groups = Group::<u32>::from_specs(&specs).unwrap();

        assert_eq!(groups[0].label(), "group-0");
        assert_eq!(groups[0].category(), Category::A);
        assert_eq!(groups[1].label(), "attic");
        assert_eq!(groups[1].category(), Category::Unrestricted);
        assert_eq!(groups[1].capacity(), 2);
    }
}
