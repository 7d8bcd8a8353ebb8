//! Capacity-constrained assignment of people to groups.
//!
//! The engine repeatedly partitions the people who still need a group and
//! packs the resulting communities into the groups that still have room:
//!
//! 1. Ask the oracle for as many communities as there are non-full groups.
//! 2. Sort communities by ascending size and groups by ascending free space.
//! 3. Walk both lists with two cursors. A community that fits the current
//!    group is committed whole and its people leave the working graph; one
//!    that does not fit moves the group cursor on to a roomier group.
//! 4. Repeat on whatever is left.
//!
//! Communities too large for any open group are broken up implicitly: once
//! their neighbours are placed, the oracle sees a smaller, sparser graph and
//! finds smaller communities. When a whole pass places nobody, the next pass
//! requests a finer partition (doubling the request per consecutive stall,
//! capped at the node count, and jumping to the node count on the last pass
//! the stall bound allows). Oracles must return singletons when asked for at
//! least one community per node, and singletons always fit somewhere when
//! capacity is sufficient, so escalation guarantees termination.

use crate::community::{communities_from_labels, CommunityOracle, Louvain};
use crate::error::{Error, Result};
use crate::graph::SocialGraph;
use crate::group::{fill_order, total_remaining, Group};
use serde::Deserialize;
use std::fmt::Debug;
use std::hash::Hash;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AssignConfig {
    /// Consecutive passes without a placement tolerated before giving up.
    pub max_stalled_passes: usize,
    /// Request a finer partition after a stalled pass.
    pub escalate_on_stall: bool,
    /// Absolute cap on oracle invocations.
    pub max_passes: Option<usize>,
}

impl AssignConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self {
            max_stalled_passes: 8,
            escalate_on_stall: true,
            max_passes: None,
        }
    }

    /// Set the stalled-pass bound.
    pub fn with_max_stalled_passes(mut self, passes: usize) -> Self {
        self.max_stalled_passes = passes;
        self
    }

    /// Enable or disable escalation after stalled passes.
    pub fn with_escalation(mut self, escalate: bool) -> Self {
        self.escalate_on_stall = escalate;
        self
    }

    /// Cap the total number of passes.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes);
        self
    }
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignReport {
    /// Oracle invocations.
    pub passes: usize,
    /// Passes that placed nobody.
    pub stalled_passes: usize,
    /// People placed.
    pub placed: usize,
}

/// Assignment engine over a pluggable community oracle.
#[derive(Debug, Clone, Default)]
pub struct Assigner<O> {
    oracle: O,
    config: AssignConfig,
}

impl<O: CommunityOracle> Assigner<O> {
    /// Create an engine with the default configuration.
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            config: AssignConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: AssignConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &AssignConfig {
        &self.config
    }

    /// The oracle used for every pass.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Place every person of `graph` into `groups`.
    ///
    /// `graph` is not modified; the engine depletes a private copy. Fails
    /// with [`Error::InfeasibleCapacity`] before touching any group when the
    /// free space cannot hold everyone, and with [`Error::NoProgress`] when
    /// the stall bound is exceeded (groups then keep the placements made so
    /// far).
    pub fn assign<P>(&self, graph: &SocialGraph<P>, groups: &mut [Group<P>]) -> Result<AssignReport>
    where
        P: Clone + Eq + Hash + Debug,
    {
        check_capacity(graph, groups)?;

        let mut working = graph.clone();
        let mut report = AssignReport::default();
        let mut stalls = 0usize;

        while !working.is_empty() {
            if let Some(max) = self.config.max_passes {
                if report.passes >= max {
                    return Err(Error::NoProgress {
                        stalled_passes: stalls,
                        remaining: working.node_count(),
                    });
                }
            }
            report.passes += 1;

            let active = groups.iter().filter(|g| !g.is_full()).count();
            let requested = self.requested_count(active, stalls, working.node_count());

            let snapshot = working.snapshot();
            let labels = self.oracle.partition(&snapshot.graph, requested)?;
            if labels.len() != snapshot.people.len() {
                return Err(Error::MalformedPartition {
                    expected: snapshot.people.len(),
                    found: labels.len(),
                });
            }

            let mut communities: Vec<Vec<P>> = communities_from_labels(&labels)
                .into_iter()
                .map(|members| {
                    members
                        .into_iter()
                        .map(|i| snapshot.people[i].clone())
                        .collect()
                })
                .collect();
            communities.sort_by_key(Vec::len);
            let found = communities.len();

            let placed = pack(&mut communities, groups, active, &mut working)?;
            log::debug!(
                "pass {}: requested {requested}, got {found} communities, placed {placed}, {} left",
                report.passes,
                working.node_count()
            );

            if placed == 0 {
                stalls += 1;
                report.stalled_passes += 1;
                log::warn!(
                    "pass {} placed nobody ({stalls} consecutive stalls)",
                    report.passes
                );
                if stalls > self.config.max_stalled_passes {
                    return Err(Error::NoProgress {
                        stalled_passes: stalls,
                        remaining: working.node_count(),
                    });
                }
            } else {
                stalls = 0;
                report.placed += placed;
            }
        }

        log::info!(
            "assigned {} people in {} passes ({} stalled)",
            report.placed,
            report.passes,
            report.stalled_passes
        );
        Ok(report)
    }

    fn requested_count(&self, active: usize, stalls: usize, remaining: usize) -> usize {
        let base = active.max(1);
        if stalls == 0 || !self.config.escalate_on_stall {
            return base.min(remaining);
        }
        // Last pass before giving up: ask for singletons.
        if stalls >= self.config.max_stalled_passes {
            return remaining;
        }
        let factor = 1usize.checked_shl(stalls as u32).unwrap_or(usize::MAX);
        base.saturating_mul(factor).min(remaining)
    }
}

/// Fail unless the groups' free space can hold every person of `graph`.
pub fn check_capacity<P>(graph: &SocialGraph<P>, groups: &[Group<P>]) -> Result<()>
where
    P: Clone + Eq + Hash + Debug,
{
    let capacity = total_remaining(groups);
    let required = graph.node_count();
    if capacity < required {
        log::error!("cannot place {required} people into {capacity} free places");
        return Err(Error::InfeasibleCapacity { capacity, required });
    }
    Ok(())
}

/// One two-cursor walk: commit every community that fits, smallest first.
///
/// `communities` must be sorted by ascending size. Returns the number of
/// people placed.
fn pack<P>(
    communities: &mut [Vec<P>],
    groups: &mut [Group<P>],
    active: usize,
    working: &mut SocialGraph<P>,
) -> Result<usize>
where
    P: Clone + Eq + Hash + Debug,
{
    let order = fill_order(groups);
    let mut g = order.len() - active;
    let mut c = 0;
    let mut placed = 0;

    while g < order.len() && c < communities.len() {
        let group = &mut groups[order[g]];
        let community = std::mem::take(&mut communities[c]);

        if community.len() <= group.remaining_space() {
            for person in &community {
                // Each waiting person is placed exactly once.
                if !working.remove_person(person) {
                    return Err(Error::UnknownPerson(format!("{person:?}")));
                }
            }
            placed += community.len();
            group.add_members(community)?;
            c += 1;
            if group.is_full() {
                g += 1;
            }
        } else {
            communities[c] = community;
            g += 1;
        }
    }

    Ok(placed)
}

/// Assign with [`Louvain`] and the default configuration.
pub fn assign<P>(graph: &SocialGraph<P>, groups: &mut [Group<P>]) -> Result<AssignReport>
where
    P: Clone + Eq + Hash + Debug,
{
    Assigner::new(Louvain::new()).assign(graph, groups)
}
