//! Category pre-splitting.
//!
//! Category-restricted groups can only take people of their category, so a
//! mixed population is assigned one category at a time. [`split`] hands every
//! unrestricted group to a restricted category before that happens, and
//! [`assign_by_category`] runs the whole split → induce → assign pipeline.

use crate::assign::{check_capacity, AssignReport, Assigner};
use crate::community::CommunityOracle;
use crate::error::{Error, Result};
use crate::graph::{PersonRecord, SocialGraph};
use crate::group::{total_remaining, Category, Group};
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug};
use std::hash::Hash;

/// Pre-splitter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Places a category may be over-provisioned by when it takes an
    /// unrestricted group.
    pub tolerance: usize,
    /// Assign the categories that fit and skip the ones whose pool is too
    /// small, instead of failing the whole run.
    pub allow_partial: bool,
}

impl SplitConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self {
            tolerance: 10,
            allow_partial: false,
        }
    }

    /// Skip categories whose pool cannot hold them.
    pub fn with_partial(mut self, allow_partial: bool) -> Self {
        self.allow_partial = allow_partial;
        self
    }

    /// Set the over-provisioning tolerance.
    pub fn with_tolerance(mut self, tolerance: usize) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A category whose pool cannot hold its head count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryShortfall {
    /// Category short of places.
    pub category: Category,
    /// People of the category.
    pub target: usize,
    /// Free places in its pool.
    pub available: usize,
}

impl CategoryShortfall {
    /// Missing places.
    pub fn deficit(&self) -> usize {
        self.target.saturating_sub(self.available)
    }
}

impl fmt::Display for CategoryShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} needs {} more places ({} people, {} places)",
            self.category,
            self.deficit(),
            self.target,
            self.available
        )
    }
}

/// Result of [`split`].
#[derive(Debug, Clone)]
pub struct SplitOutcome<P> {
    /// Groups per restricted category.
    pub pools: BTreeMap<Category, Vec<Group<P>>>,
    /// Unrestricted groups no category could take within tolerance.
    pub unused: Vec<Group<P>>,
    /// Categories left short of places.
    pub shortfalls: Vec<CategoryShortfall>,
}

impl<P> SplitOutcome<P> {
    /// Groups handed to `category`.
    pub fn pool(&self, category: Category) -> &[Group<P>] {
        self.pools.get(&category).map_or(&[][..], Vec::as_slice)
    }
}

/// Split `groups` into one pool per restricted category.
///
/// `targets` gives the head count of each restricted category. Restricted
/// groups go to their own pool. Unrestricted groups are visited from most to
/// least free space; each goes to the category with the largest unmet
/// deficit (ties go to the earlier category in [`Category::restricted`]) as
/// long as that keeps the category within `target + tolerance`, and is left
/// unused otherwise.
pub fn split<P>(
    groups: Vec<Group<P>>,
    targets: &BTreeMap<Category, usize>,
    config: &SplitConfig,
) -> SplitOutcome<P> {
    let mut pools: BTreeMap<Category, Vec<Group<P>>> = BTreeMap::new();
    let mut committed: BTreeMap<Category, usize> = BTreeMap::new();
    for category in Category::restricted() {
        pools.insert(category, Vec::new());
        committed.insert(category, 0);
    }

    let mut exchange = Vec::new();
    for group in groups {
        let category = group.category();
        if category.is_restricted() {
            *committed.entry(category).or_insert(0) += group.remaining_space();
            pools.entry(category).or_default().push(group);
        } else {
            exchange.push(group);
        }
    }

    exchange.sort_by_key(|g| Reverse(g.remaining_space()));

    let target_of = |c: &Category| targets.get(c).copied().unwrap_or(0);
    let mut unused = Vec::new();
    for group in exchange {
        let mut best: Option<(Category, i64)> = None;
        for category in Category::restricted() {
            let deficit = target_of(&category) as i64 - committed[&category] as i64;
            if best.map_or(true, |(_, d)| deficit > d) {
                best = Some((category, deficit));
            }
        }
        let Some((category, _)) = best else {
            unused.push(group);
            continue;
        };

        let space = group.remaining_space();
        let current = committed[&category];
        if current + space <= target_of(&category) + config.tolerance {
            log::trace!("{} -> {category}", group.label());
            *committed.entry(category).or_insert(0) += space;
            pools.entry(category).or_default().push(group);
        } else {
            log::trace!("{} left unused", group.label());
            unused.push(group);
        }
    }

    let mut shortfalls = Vec::new();
    for (&category, &available) in &committed {
        let target = target_of(&category);
        if available < target {
            let shortfall = CategoryShortfall {
                category,
                target,
                available,
            };
            log::warn!("category requirements not met: {shortfall}");
            shortfalls.push(shortfall);
        }
    }

    SplitOutcome {
        pools,
        unused,
        shortfalls,
    }
}

/// Result of [`assign_by_category`].
#[derive(Debug, Clone)]
pub struct CategorizedAssignment<P> {
    /// Filled groups per restricted category.
    pub pools: BTreeMap<Category, Vec<Group<P>>>,
    /// Unrestricted groups that received no category.
    pub unused: Vec<Group<P>>,
    /// Categories the split left short.
    pub shortfalls: Vec<CategoryShortfall>,
    /// Categories left unassigned because their pool was too small.
    pub skipped: Vec<Category>,
    /// Engine statistics per category.
    pub reports: BTreeMap<Category, AssignReport>,
}

impl<P> CategorizedAssignment<P> {
    /// Every group, pools first then unused.
    pub fn groups(&self) -> impl Iterator<Item = &Group<P>> + '_ {
        self.pools.values().flatten().chain(self.unused.iter())
    }

    /// Sorted members of every group of `category`.
    pub fn pool_members(&self, category: Category) -> Vec<P>
    where
        P: Clone + Ord,
    {
        let mut members: Vec<P> = self
            .pools
            .get(&category)
            .into_iter()
            .flatten()
            .flat_map(|g| g.members().iter().cloned())
            .collect();
        members.sort();
        members
    }

    /// Consume into a flat group list.
    pub fn into_groups(self) -> Vec<Group<P>> {
        let mut all: Vec<Group<P>> = self.pools.into_values().flatten().collect();
        all.extend(self.unused);
        all
    }
}

/// Category of each record, for use with [`assign_by_category`].
pub fn categories_of<P>(records: &[PersonRecord<P>]) -> HashMap<P, Category>
where
    P: Clone + Eq + Hash,
{
    records
        .iter()
        .filter_map(|r| r.category.map(|c| (r.id.clone(), c)))
        .collect()
}

/// Failed [`assign_by_category`] run.
///
/// Carries every group back to the caller, with whatever placements were
/// made before the failure.
#[derive(Debug)]
pub struct CategoryFailure<P> {
    /// Category being assigned, or `None` when the run failed up front.
    pub category: Option<Category>,
    /// What went wrong.
    pub error: Error,
    /// Every group: category pools first, then unused groups.
    pub groups: Vec<Group<P>>,
}

impl<P> fmt::Display for CategoryFailure<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.category {
            Some(category) => write!(f, "assigning {category}: {}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl<P: Debug> std::error::Error for CategoryFailure<P> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<P> From<CategoryFailure<P>> for Error {
    fn from(failure: CategoryFailure<P>) -> Self {
        failure.error
    }
}

/// Split `groups` by category and assign each category's people to its pool.
///
/// `category_of` must map every person of `graph` to a restricted category.
/// Every feasibility check (overall and per category) runs before any group
/// is filled, so an [`Error::InfeasibleCapacity`] leaves all groups empty.
/// With [`SplitConfig::allow_partial`], categories short of places are
/// skipped and listed in [`CategorizedAssignment::skipped`] instead. On
/// failure the groups come back in [`CategoryFailure::groups`].
pub fn assign_by_category<P, O, F>(
    graph: &SocialGraph<P>,
    category_of: F,
    groups: Vec<Group<P>>,
    assigner: &Assigner<O>,
    config: &SplitConfig,
) -> std::result::Result<CategorizedAssignment<P>, CategoryFailure<P>>
where
    P: Clone + Eq + Hash + Debug,
    O: CommunityOracle,
    F: Fn(&P) -> Option<Category>,
{
    if let Err(error) = check_capacity(graph, &groups) {
        return Err(CategoryFailure {
            category: None,
            error,
            groups,
        });
    }

    let mut targets: BTreeMap<Category, usize> =
        Category::restricted().into_iter().map(|c| (c, 0)).collect();
    for person in graph.people() {
        match category_of(person) {
            Some(category) if category.is_restricted() => {
                *targets.entry(category).or_insert(0) += 1;
            }
            _ => {
                return Err(CategoryFailure {
                    category: None,
                    error: Error::UncategorizedPerson(format!("{person:?}")),
                    groups,
                })
            }
        }
    }

    let SplitOutcome {
        pools,
        unused,
        shortfalls,
    } = split(groups, &targets, config);

    let subgraphs: Vec<(Category, SocialGraph<P>)> = pools
        .keys()
        .map(|&category| (category, graph.induced(|p| category_of(p) == Some(category))))
        .collect();

    let mut assignment = CategorizedAssignment {
        pools,
        unused,
        shortfalls,
        skipped: Vec::new(),
        reports: BTreeMap::new(),
    };

    for (category, sub) in &subgraphs {
        let pool = assignment.pools.get(category).map_or(&[][..], Vec::as_slice);
        let places = total_remaining(pool);
        if let Err(error) = check_capacity(sub, pool) {
            if config.allow_partial {
                log::warn!(
                    "skipping {category}: {} people, {places} places",
                    sub.node_count()
                );
                assignment.skipped.push(*category);
                continue;
            }
            log::error!("{category}: {} people, {places} places", sub.node_count());
            return Err(CategoryFailure {
                category: Some(*category),
                error,
                groups: assignment.into_groups(),
            });
        }
    }

    for (category, sub) in &subgraphs {
        if assignment.skipped.contains(category) {
            continue;
        }
        let Some(pool) = assignment.pools.get_mut(category) else {
            continue;
        };
        log::info!("assigning {} people of {category}", sub.node_count());
        match assigner.assign(sub, pool) {
            Ok(report) => {
                assignment.reports.insert(*category, report);
            }
            Err(error) => {
                log::error!("assigning {category} failed: {error}");
                return Err(CategoryFailure {
                    category: Some(*category),
                    error,
                    groups: assignment.into_groups(),
                });
            }
        }
    }

    Ok(assignment)
}
