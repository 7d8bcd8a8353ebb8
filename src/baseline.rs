//! Graph-blind baselines.
//!
//! [`GroupGenerator`] draws random group lists for experiments, and
//! [`assign_randomly`] fills groups with a random permutation of people.
//! Comparing [`crate::metrics`] of a random assignment against the engine's
//! shows how much the community structure buys.

use crate::assign::check_capacity;
use crate::error::{Error, Result};
use crate::graph::SocialGraph;
use crate::group::{Category, Group};
use rand::prelude::*;
use serde::Deserialize;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::RangeInclusive;

/// Random group-list generator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GroupGenerator {
    /// Smallest capacity drawn.
    min_capacity: usize,
    /// Largest capacity drawn.
    max_capacity: usize,
    /// Relative weights of unrestricted, A and B groups.
    category_weights: [f64; 3],
    /// Category forced on every group.
    category: Option<Category>,
    /// Random seed.
    seed: Option<u64>,
}

impl GroupGenerator {
    /// Create a generator with capacities 1..=5 and mixed categories.
    pub fn new() -> Self {
        Self {
            min_capacity: 1,
            max_capacity: 5,
            category_weights: [0.45, 0.30, 0.25],
            category: None,
            seed: None,
        }
    }

    /// Set the capacity range.
    pub fn with_capacity_range(mut self, range: RangeInclusive<usize>) -> Self {
        self.min_capacity = *range.start();
        self.max_capacity = *range.end();
        self
    }

    /// Set the relative weights of unrestricted, A and B groups.
    pub fn with_category_weights(mut self, unrestricted: f64, a: f64, b: f64) -> Self {
        self.category_weights = [unrestricted, a, b];
        self
    }

    /// Give every group the same category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Groups whose capacities add up to exactly `people`.
    ///
    /// Random capacities are drawn while more than the maximum capacity is
    /// left to cover; a last group takes the remainder.
    pub fn generate<P>(&self, people: usize) -> Result<Vec<Group<P>>> {
        if self.min_capacity == 0 || self.min_capacity > self.max_capacity {
            return Err(Error::InvalidParameter {
                name: "capacity_range",
                message: "must be a non-empty range of positive capacities",
            });
        }
        let weights = &self.category_weights;
        let valid = weights.iter().all(|w| w.is_finite() && *w >= 0.0);
        if !valid || weights.iter().sum::<f64>() <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "category_weights",
                message: "must be non-negative with a positive sum",
            });
        }

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut groups = Vec::new();
        let mut left = people;
        while left > self.max_capacity {
            let capacity = rng.random_range(self.min_capacity..=self.max_capacity);
            let category = self.draw_category(rng.as_mut());
            groups.push(Group::new(format!("group-{}", groups.len()), capacity, category)?);
            left -= capacity;
        }
        if left > 0 {
            let category = self.draw_category(rng.as_mut());
            groups.push(Group::new(format!("group-{}", groups.len()), left, category)?);
        }
        Ok(groups)
    }

    fn draw_category(&self, rng: &mut dyn RngCore) -> Category {
        if let Some(category) = self.category {
            return category;
        }
        let total: f64 = self.category_weights.iter().sum();
        let mut roll = rng.random::<f64>() * total;
        let choices = [Category::Unrestricted, Category::A, Category::B];
        for (category, weight) in choices.into_iter().zip(self.category_weights) {
            if roll < weight {
                return category;
            }
            roll -= weight;
        }
        Category::Unrestricted
    }
}

impl Default for GroupGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill `groups` in order with a random permutation of the people of `graph`.
pub fn assign_randomly<P>(graph: &SocialGraph<P>, groups: &mut [Group<P>], seed: Option<u64>) -> Result<()>
where
    P: Clone + Eq + Hash + Debug,
{
    check_capacity(graph, groups)?;

    let mut rng: Box<dyn RngCore> = match seed {
        Some(s) => Box::new(StdRng::seed_from_u64(s)),
        None => Box::new(rand::rng()),
    };
    let mut people: Vec<P> = graph.people().cloned().collect();
    people.shuffle(&mut rng);

    let mut people = people.into_iter();
    for group in groups.iter_mut() {
        let batch: Vec<P> = people.by_ref().take(group.remaining_space()).collect();
        if batch.is_empty() {
            break;
        }
        group.add_members(batch)?;
    }
    Ok(())
}
