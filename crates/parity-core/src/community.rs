//! Communities
//!
//! A community is an arena of agent slots with a parallel marking vector.
//! Marks record who has already been selected this round; the pool of
//! unmarked slot indices makes a uniform draw O(1).

use rand::Rng;

use parity_events::{AgentId, CommunityId, CommunitySnapshot};

use crate::agent::Agent;

#[derive(Debug)]
struct AgentSlot {
    id: AgentId,
    agent: Box<dyn Agent>,
}

/// An unordered pool of agents that can be paired with each other
#[derive(Debug)]
pub struct Community {
    id: CommunityId,
    name: String,
    slots: Vec<AgentSlot>,
    /// Parallel to `slots`
    marked: Vec<bool>,
    /// Indices into `slots` that are still unmarked this round
    available: Vec<usize>,
}

impl Community {
    pub fn new(id: CommunityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            slots: Vec::new(),
            marked: Vec::new(),
            available: Vec::new(),
        }
    }

    pub fn id(&self) -> CommunityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Selects one unmarked member uniformly at random, marks it and
    /// returns its id. Returns `None` once every member is marked.
    pub fn mark_random_agent_for_interaction<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Option<AgentId> {
        if self.available.is_empty() {
            return None;
        }
        let pick = rng.gen_range(0..self.available.len());
        let slot = self.available.swap_remove(pick);
        self.marked[slot] = true;
        Some(self.slots[slot].id)
    }

    /// Number of members not yet selected this round.
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Clears every mark. Called once at the start of each round.
    pub fn reset_marking(&mut self) {
        self.marked.iter_mut().for_each(|m| *m = false);
        self.available.clear();
        self.available.extend(0..self.slots.len());
    }

    pub fn is_marked(&self, agent_id: AgentId) -> Option<bool> {
        self.position(agent_id).map(|idx| self.marked[idx])
    }

    /// Adds a member. The new member starts unmarked.
    pub(crate) fn add_agent(&mut self, id: AgentId, agent: Box<dyn Agent>) {
        self.available.push(self.slots.len());
        self.slots.push(AgentSlot { id, agent });
        self.marked.push(false);
    }

    /// Removes a member and resets marking for the remaining ones.
    pub(crate) fn remove_agent(&mut self, id: AgentId) -> Option<Box<dyn Agent>> {
        let idx = self.position(id)?;
        let slot = self.slots.remove(idx);
        self.marked.remove(idx);
        self.reset_marking();
        Some(slot.agent)
    }

    pub fn contains(&self, agent_id: AgentId) -> bool {
        self.position(agent_id).is_some()
    }

    pub fn agent(&self, agent_id: AgentId) -> Option<&dyn Agent> {
        self.slots
            .iter()
            .find(|s| s.id == agent_id)
            .map(|s| s.agent.as_ref())
    }

    pub fn agent_mut(&mut self, agent_id: AgentId) -> Option<&mut dyn Agent> {
        for slot in &mut self.slots {
            if slot.id == agent_id {
                return Some(slot.agent.as_mut());
            }
        }
        None
    }

    /// Members in insertion order.
    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &dyn Agent)> + '_ {
        self.slots.iter().map(|s| (s.id, s.agent.as_ref()))
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.slots.iter().map(|s| s.id)
    }

    /// Mean primary opinion, `None` when the community is empty.
    pub fn mean_opinion(&self) -> Option<f64> {
        if self.slots.is_empty() {
            return None;
        }
        let sum: f64 = self.slots.iter().map(|s| s.agent.opinion()).sum();
        Some(sum / self.slots.len() as f64)
    }

    pub fn snapshot(&self) -> CommunitySnapshot {
        CommunitySnapshot {
            community_id: self.id,
            name: self.name.clone(),
            agents: self.slots.iter().map(|s| s.agent.snapshot(s.id)).collect(),
        }
    }

    fn position(&self, agent_id: AgentId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == agent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::BasicAgent;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn community_of(size: u64) -> Community {
        let mut community = Community::new(CommunityId(0), "test");
        for i in 0..size {
            community.add_agent(AgentId(i), Box::new(BasicAgent::default()));
        }
        community
    }

    #[test]
    fn test_marks_until_exhausted() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut community = community_of(4);
        let mut seen = HashSet::new();

        for expected_left in (0..4).rev() {
            let id = community.mark_random_agent_for_interaction(&mut rng).unwrap();
            assert!(seen.insert(id), "agent {} selected twice", id);
            assert_eq!(community.is_marked(id), Some(true));
            assert_eq!(community.available_count(), expected_left);
        }

        assert!(community.mark_random_agent_for_interaction(&mut rng).is_none());
        assert!(community.mark_random_agent_for_interaction(&mut rng).is_none());
    }

    #[test]
    fn test_reset_restores_full_membership() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut community = community_of(3);
        community.mark_random_agent_for_interaction(&mut rng);
        community.mark_random_agent_for_interaction(&mut rng);
        assert_eq!(community.available_count(), 1);

        community.reset_marking();
        assert_eq!(community.available_count(), 3);
        assert!(community.agent_ids().all(|id| community.is_marked(id) == Some(false)));
    }

    #[test]
    fn test_empty_community_yields_none() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut community = community_of(0);
        assert!(community.is_empty());
        assert!(community.mark_random_agent_for_interaction(&mut rng).is_none());
    }

    #[test]
    fn test_selection_is_roughly_uniform() {
        let mut rng = SmallRng::seed_from_u64(99);
        let mut community = community_of(4);
        let mut counts = [0usize; 4];

        for _ in 0..4000 {
            community.reset_marking();
            let id = community.mark_random_agent_for_interaction(&mut rng).unwrap();
            counts[id.0 as usize] += 1;
        }

        for count in counts {
            assert!(count > 800 && count < 1200, "count {} far from 1000", count);
        }
    }

    #[test]
    fn test_remove_agent() {
        let mut community = community_of(3);
        assert!(community.remove_agent(AgentId(1)).is_some());
        assert!(!community.contains(AgentId(1)));
        assert_eq!(community.len(), 2);
        assert_eq!(community.available_count(), 2);
        assert!(community.remove_agent(AgentId(1)).is_none());
    }

    #[test]
    fn test_mean_opinion_and_snapshot() {
        let mut community = Community::new(CommunityId(2), "valley");
        assert!(community.mean_opinion().is_none());
        community.add_agent(AgentId(0), Box::new(BasicAgent::new(0.2)));
        community.add_agent(AgentId(1), Box::new(BasicAgent::new(0.6)));

        assert!((community.mean_opinion().unwrap() - 0.4).abs() < 1e-12);

        let snapshot = community.snapshot();
        assert_eq!(snapshot.name, "valley");
        assert_eq!(snapshot.agents.len(), 2);
        assert_eq!(snapshot.agents[1].agent_id, AgentId(1));
    }
}
