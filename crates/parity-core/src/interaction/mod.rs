//! Interaction Handlers
//!
//! A handler decides who plays whom each round and how a pair of choices is
//! scored. Pairing defaults to the topology-driven algorithm in
//! [`matching`]; scoring is split into separate row and column entry points
//! so asymmetric games can be expressed.

pub mod matching;
pub mod payoff;

use std::collections::{BTreeMap, BTreeSet};

use parity_events::{AgentId, Anomaly, Choice, ConnectionId, Feedback, PairingSource};

use crate::population::Population;

pub use matching::pair_by_topology;
pub use payoff::{CoordinationHandler, PayoffMatrixHandler, PayoffTable};

/// Pluggable pairing and payoff strategy
pub trait InteractionHandler: Send {
    /// Registry name of this handler.
    fn name(&self) -> &str;

    /// Produces this round's pairings. Marks on `population` have already
    /// been reset when this is called.
    fn determine_interactions(&self, population: &mut Population) -> MatchingOutcome {
        pair_by_topology(population)
    }

    /// Feedback for the agent that contributed the row choice.
    fn row_feedback(&self, row: Choice, column: Choice) -> Feedback;

    /// Feedback for the agent that contributed the column choice.
    fn column_feedback(&self, row: Choice, column: Choice) -> Feedback;

    /// Row and column feedback for one played game.
    fn feedback(&self, row: Choice, column: Choice) -> (Feedback, Feedback) {
        (
            self.row_feedback(row, column),
            self.column_feedback(row, column),
        )
    }
}

/// The column partner of a row agent and where the pair came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    pub column: AgentId,
    pub source: PairingSource,
}

/// One round's pairing result, keyed and iterated by row agent id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pairings {
    pairs: BTreeMap<AgentId, Pairing>,
    involved: BTreeSet<AgentId>,
}

impl Pairings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pair. Refuses (returns `false`) if either agent is already
    /// paired or both sides are the same agent.
    pub fn insert(&mut self, row: AgentId, column: AgentId, source: PairingSource) -> bool {
        if row == column || self.involved.contains(&row) || self.involved.contains(&column) {
            return false;
        }
        self.involved.insert(row);
        self.involved.insert(column);
        self.pairs.insert(row, Pairing { column, source });
        true
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &Pairing)> + '_ {
        self.pairs.iter().map(|(row, pairing)| (*row, pairing))
    }

    /// Whether the agent appears on either side of any pair.
    pub fn contains_agent(&self, agent: AgentId) -> bool {
        self.involved.contains(&agent)
    }

    pub fn partner_of(&self, agent: AgentId) -> Option<AgentId> {
        if let Some(pairing) = self.pairs.get(&agent) {
            return Some(pairing.column);
        }
        self.pairs
            .iter()
            .find(|(_, p)| p.column == agent)
            .map(|(row, _)| *row)
    }

    /// Number of pairs drawn from the given source.
    pub fn count_from(&self, source: PairingSource) -> usize {
        self.pairs.values().filter(|p| p.source == source).count()
    }
}

/// A connection attempt that could not produce a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub connection: ConnectionId,
    /// Zero-based attempt index on that connection
    pub attempt: u32,
    pub first_exhausted: bool,
    pub second_exhausted: bool,
    /// Agent drawn from the side that was not exhausted
    pub stranded: Option<AgentId>,
    /// Remaining attempts not made because both endpoints were exhausted
    pub skipped: u32,
}

impl From<Shortfall> for Anomaly {
    fn from(s: Shortfall) -> Self {
        Anomaly::Shortfall {
            connection: s.connection,
            attempt: s.attempt,
            first_exhausted: s.first_exhausted,
            second_exhausted: s.second_exhausted,
            stranded: s.stranded,
            skipped: s.skipped,
        }
    }
}

/// What the pairing step hands back to the round driver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchingOutcome {
    pub pairings: Pairings,
    pub shortfalls: Vec<Shortfall>,
}
