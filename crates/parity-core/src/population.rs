//! Population
//!
//! Owns the communities, the connections between them and the single random
//! stream of a run, and drives the round loop. Every topology edit takes
//! `&mut self`, so edits can never overlap a round in progress.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use parity_events::{
    AgentId, Anomaly, Capacity, Choice, CommunityId, ConnectionId, Feedback, InteractionRecord,
    PopulationSnapshot, RoundRecord,
};

use crate::agent::Agent;
use crate::community::Community;
use crate::completion::CompletionCondition;
use crate::connection::{capacity_is_valid, Connection};
use crate::interaction::InteractionHandler;

/// Structural errors raised when topology is built or edited
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    #[error("{0} is not part of this population")]
    UnknownCommunity(CommunityId),

    #[error("{0} is not part of this population")]
    UnknownConnection(ConnectionId),

    #[error("{0} is not part of this population")]
    UnknownAgent(AgentId),

    #[error("{agent} already belongs to {community}")]
    DuplicateAgent {
        agent: AgentId,
        community: CommunityId,
    },

    #[error("capacity fraction {0} must lie in [0, 1]")]
    InvalidCapacity(f64),
}

/// Caller-side switch for stopping [`Population::run`] between rounds
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Limits for [`Population::run`]
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Upper bound on rounds for this call, `None` for unbounded
    pub max_rounds: Option<u64>,
    pub stop: Option<StopHandle>,
}

impl RunOptions {
    pub fn with_max_rounds(mut self, max_rounds: u64) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }

    pub fn with_stop(mut self, stop: StopHandle) -> Self {
        self.stop = Some(stop);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The completion condition reported completion
    Completed,
    MaxRounds,
    /// The stop handle was raised
    Stopped,
}

/// Totals for one call to [`Population::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub rounds: u64,
    pub stop_reason: StopReason,
    pub total_pairings: usize,
    pub total_anomalies: usize,
}

#[derive(Debug)]
pub struct Population {
    communities: Vec<Community>,
    connections: Vec<Connection>,
    /// Which community owns each agent
    membership: BTreeMap<AgentId, CommunityId>,
    rng: SmallRng,
    rounds_completed: u64,
    next_agent_id: u64,
    next_community_id: u32,
    next_connection_id: u32,
}

impl Population {
    /// Creates an empty population whose random stream is seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: SmallRng) -> Self {
        Self {
            communities: Vec::new(),
            connections: Vec::new(),
            membership: BTreeMap::new(),
            rng,
            rounds_completed: 0,
            next_agent_id: 0,
            next_community_id: 0,
            next_connection_id: 0,
        }
    }

    // ---- topology editing ----

    pub fn add_community(&mut self, name: impl Into<String>) -> CommunityId {
        let id = CommunityId(self.next_community_id);
        self.next_community_id += 1;
        self.communities.push(Community::new(id, name));
        id
    }

    /// Removes a community together with its agents and every connection
    /// touching it.
    pub fn remove_community(&mut self, id: CommunityId) -> Result<Community, TopologyError> {
        let idx = self
            .communities
            .iter()
            .position(|c| c.id() == id)
            .ok_or(TopologyError::UnknownCommunity(id))?;
        let community = self.communities.remove(idx);

        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(id));
        let dropped = before - self.connections.len();
        if dropped > 0 {
            tracing::debug!(community = %id, dropped, "removed connections with community");
        }

        self.membership.retain(|_, owner| *owner != id);
        Ok(community)
    }

    /// Connects two communities. Both must already belong to this population.
    pub fn add_connection(
        &mut self,
        first: CommunityId,
        second: CommunityId,
        capacity: Capacity,
    ) -> Result<ConnectionId, TopologyError> {
        for end in [first, second] {
            if self.community(end).is_none() {
                return Err(TopologyError::UnknownCommunity(end));
            }
        }
        if let Capacity::Proportional { fraction } = capacity {
            if !capacity_is_valid(&capacity) {
                return Err(TopologyError::InvalidCapacity(fraction));
            }
        }

        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;
        self.connections
            .push(Connection::new(id, first, second, capacity));
        Ok(id)
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Result<Connection, TopologyError> {
        let idx = self
            .connections
            .iter()
            .position(|c| c.id() == id)
            .ok_or(TopologyError::UnknownConnection(id))?;
        Ok(self.connections.remove(idx))
    }

    /// Adds an agent under a freshly allocated id.
    pub fn add_agent(
        &mut self,
        community: CommunityId,
        agent: Box<dyn Agent>,
    ) -> Result<AgentId, TopologyError> {
        let id = AgentId(self.next_agent_id);
        self.insert_agent(community, id, agent)?;
        Ok(id)
    }

    /// Adds an agent under a caller-chosen id. Fails if the id is already
    /// owned by any community.
    pub fn insert_agent(
        &mut self,
        community: CommunityId,
        id: AgentId,
        agent: Box<dyn Agent>,
    ) -> Result<(), TopologyError> {
        if let Some(owner) = self.membership.get(&id) {
            return Err(TopologyError::DuplicateAgent {
                agent: id,
                community: *owner,
            });
        }
        let target = self
            .communities
            .iter_mut()
            .find(|c| c.id() == community)
            .ok_or(TopologyError::UnknownCommunity(community))?;

        target.add_agent(id, agent);
        self.membership.insert(id, community);
        self.next_agent_id = self.next_agent_id.max(id.0 + 1);
        Ok(())
    }

    pub fn remove_agent(&mut self, id: AgentId) -> Result<Box<dyn Agent>, TopologyError> {
        let owner = *self
            .membership
            .get(&id)
            .ok_or(TopologyError::UnknownAgent(id))?;
        let agent = self
            .community_mut(owner)
            .and_then(|c| c.remove_agent(id))
            .ok_or(TopologyError::UnknownAgent(id))?;
        self.membership.remove(&id);
        Ok(agent)
    }

    // ---- read access ----

    pub fn community(&self, id: CommunityId) -> Option<&Community> {
        self.communities.iter().find(|c| c.id() == id)
    }

    fn community_mut(&mut self, id: CommunityId) -> Option<&mut Community> {
        self.communities.iter_mut().find(|c| c.id() == id)
    }

    /// Communities in insertion order.
    pub fn communities(&self) -> &[Community] {
        &self.communities
    }

    pub fn community_ids(&self) -> Vec<CommunityId> {
        self.communities.iter().map(|c| c.id()).collect()
    }

    /// Looks a community up by display name. Names are not required to be
    /// unique; the first match wins.
    pub fn community_by_name(&self, name: &str) -> Option<&Community> {
        self.communities.iter().find(|c| c.name() == name)
    }

    /// Connections in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id() == id)
    }

    pub fn community_of(&self, agent: AgentId) -> Option<CommunityId> {
        self.membership.get(&agent).copied()
    }

    pub fn agent(&self, id: AgentId) -> Option<&dyn Agent> {
        let owner = self.community_of(id)?;
        self.community(owner)?.agent(id)
    }

    pub fn agent_count(&self) -> usize {
        self.membership.len()
    }

    /// Every agent id, in id order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.membership.keys().copied()
    }

    /// Every agent, in id order.
    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &dyn Agent)> + '_ {
        self.membership
            .keys()
            .filter_map(move |id| self.agent(*id).map(|agent| (*id, agent)))
    }

    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed
    }

    /// Mean primary opinion across every agent, `None` when empty.
    pub fn mean_opinion(&self) -> Option<f64> {
        if self.membership.is_empty() {
            return None;
        }
        let sum: f64 = self.agents().map(|(_, agent)| agent.opinion()).sum();
        Some(sum / self.membership.len() as f64)
    }

    pub fn snapshot(&self) -> PopulationSnapshot {
        PopulationSnapshot {
            round: self.rounds_completed,
            communities: self.communities.iter().map(|c| c.snapshot()).collect(),
            connections: self.connections.iter().map(|c| c.snapshot()).collect(),
        }
    }

    // ---- matching primitives ----

    /// Clears every community's marks.
    pub fn reset_marking(&mut self) {
        for community in &mut self.communities {
            community.reset_marking();
        }
    }

    /// Draws and marks a random unmarked agent from `community` using the
    /// population's random stream.
    pub fn mark_random_agent(&mut self, community: CommunityId) -> Option<AgentId> {
        let rng = &mut self.rng;
        self.communities
            .iter_mut()
            .find(|c| c.id() == community)?
            .mark_random_agent_for_interaction(rng)
    }

    pub fn available_count(&self, community: CommunityId) -> usize {
        self.community(community)
            .map(|c| c.available_count())
            .unwrap_or(0)
    }

    /// Evaluates a connection's capacity against current membership sizes.
    pub fn possible_interactions(&self, connection: &Connection) -> usize {
        let size = |id| self.community(id).map(|c| c.len()).unwrap_or(0);
        connection.possible_interactions(size(connection.first()), size(connection.second()))
    }

    /// The run's random stream, for strategies that need extra draws.
    /// Draws made here shift every later draw of the run.
    pub fn rng_mut(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    // ---- round loop ----

    /// Plays one round: reset marks, pair agents, then for each pair in row
    /// id order let the row agent choose, the column agent choose, score the
    /// pair and deliver row and column feedback.
    ///
    /// Round-local anomalies are logged and collected in the returned record;
    /// they never abort the round.
    pub fn run_round(&mut self, handler: &dyn InteractionHandler) -> RoundRecord {
        let round = self.rounds_completed + 1;
        self.reset_marking();

        let outcome = handler.determine_interactions(self);
        let mut record = RoundRecord::new(round);
        record
            .anomalies
            .extend(outcome.shortfalls.into_iter().map(Anomaly::from));

        for (row, pairing) in outcome.pairings.iter() {
            let column = pairing.column;
            if !(self.membership.contains_key(&row) && self.membership.contains_key(&column)) {
                tracing::warn!(
                    round,
                    %row,
                    %column,
                    handler = handler.name(),
                    "pairing names an agent outside the population, skipped"
                );
                continue;
            }
            let (Some(row_choice), Some(column_choice)) = (self.choose(row), self.choose(column))
            else {
                continue;
            };

            let (row_feedback, column_feedback) = handler.feedback(row_choice, column_choice);
            self.deliver(row, row_feedback, &mut record);
            self.deliver(column, column_feedback, &mut record);

            record.interactions.push(InteractionRecord {
                row,
                column,
                source: pairing.source,
                row_choice,
                column_choice,
                row_feedback,
                column_feedback,
            });
        }

        let involved: BTreeSet<AgentId> = record
            .interactions
            .iter()
            .flat_map(|i| [i.row, i.column])
            .collect();
        record.unpaired = self
            .membership
            .keys()
            .filter(|id| !involved.contains(id))
            .copied()
            .collect();

        self.rounds_completed = round;
        tracing::debug!(
            round,
            pairs = record.pair_count(),
            unpaired = record.unpaired.len(),
            anomalies = record.anomalies.len(),
            "round complete"
        );
        record
    }

    /// Plays rounds until `condition` reports completion, the round limit is
    /// reached or the stop handle is raised. `observer` sees every record.
    pub fn run<F>(
        &mut self,
        handler: &dyn InteractionHandler,
        condition: &mut dyn CompletionCondition,
        options: &RunOptions,
        mut observer: F,
    ) -> RunSummary
    where
        F: FnMut(&RoundRecord),
    {
        tracing::info!(
            handler = handler.name(),
            condition = condition.name(),
            agents = self.agent_count(),
            communities = self.communities.len(),
            connections = self.connections.len(),
            "starting run"
        );

        let mut summary = RunSummary {
            rounds: 0,
            stop_reason: StopReason::MaxRounds,
            total_pairings: 0,
            total_anomalies: 0,
        };

        loop {
            if options.stop.as_ref().is_some_and(|s| s.is_stopped()) {
                summary.stop_reason = StopReason::Stopped;
                break;
            }
            if options.max_rounds.is_some_and(|max| summary.rounds >= max) {
                summary.stop_reason = StopReason::MaxRounds;
                break;
            }

            let record = self.run_round(handler);
            summary.rounds += 1;
            summary.total_pairings += record.pair_count();
            summary.total_anomalies += record.anomalies.len();
            observer(&record);

            if condition.is_complete(self) {
                summary.stop_reason = StopReason::Completed;
                break;
            }
        }

        tracing::info!(
            rounds = summary.rounds,
            reason = ?summary.stop_reason,
            pairings = summary.total_pairings,
            anomalies = summary.total_anomalies,
            "run finished"
        );
        summary
    }

    fn choose(&mut self, id: AgentId) -> Option<Choice> {
        let owner = self.community_of(id)?;
        let rng = &mut self.rng;
        let agent = self
            .communities
            .iter_mut()
            .find(|c| c.id() == owner)?
            .agent_mut(id)?;
        Some(agent.choose_action(rng))
    }

    fn deliver(&mut self, id: AgentId, feedback: Feedback, record: &mut RoundRecord) {
        let Some(owner) = self.community_of(id) else {
            return;
        };
        let Some(agent) = self.community_mut(owner).and_then(|c| c.agent_mut(id)) else {
            return;
        };
        if let Err(err) = agent.update_opinion(feedback) {
            tracing::warn!(
                round = record.round,
                agent = %id,
                %feedback,
                "feedback rejected: {}",
                err
            );
            record.anomalies.push(Anomaly::RejectedFeedback {
                agent: id,
                feedback,
                reason: err.to_string(),
            });
        }
    }
}
