//! Population Snapshots
//!
//! Read-only view of a population between rounds: membership, opinions and
//! topology. This is what an editor or plotting script consumes.

use serde::{Deserialize, Serialize};

use crate::game::{Capacity, Choice};
use crate::ids::{AgentId, CommunityId, ConnectionId};

/// One agent's observable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: AgentId,
    pub kind: String,
    pub opinions: Vec<f64>,
    pub last_choice: Option<Choice>,
}

impl AgentSnapshot {
    /// Primary opinion dimension, or 0.0 for an agent with no opinions.
    pub fn opinion(&self) -> f64 {
        self.opinions.first().copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySnapshot {
    pub community_id: CommunityId,
    pub name: String,
    pub agents: Vec<AgentSnapshot>,
}

impl CommunitySnapshot {
    /// Mean primary opinion of the members, `None` when empty.
    pub fn mean_opinion(&self) -> Option<f64> {
        if self.agents.is_empty() {
            return None;
        }
        let sum: f64 = self.agents.iter().map(|a| a.opinion()).sum();
        Some(sum / self.agents.len() as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSnapshot {
    pub connection_id: ConnectionId,
    pub first: CommunityId,
    pub second: CommunityId,
    pub capacity: Capacity,
}

/// Complete population state after a given round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    /// Number of rounds completed when the snapshot was taken
    pub round: u64,
    pub communities: Vec<CommunitySnapshot>,
    pub connections: Vec<ConnectionSnapshot>,
}

impl PopulationSnapshot {
    /// Finds an agent by ID.
    pub fn find_agent(&self, agent_id: AgentId) -> Option<&AgentSnapshot> {
        self.communities
            .iter()
            .flat_map(|c| c.agents.iter())
            .find(|a| a.agent_id == agent_id)
    }

    /// Finds a community by ID.
    pub fn find_community(&self, community_id: CommunityId) -> Option<&CommunitySnapshot> {
        self.communities
            .iter()
            .find(|c| c.community_id == community_id)
    }

    pub fn agent_count(&self) -> usize {
        self.communities.iter().map(|c| c.agents.len()).sum()
    }

    /// Mean primary opinion across every agent, `None` when there are no agents.
    pub fn mean_opinion(&self) -> Option<f64> {
        let count = self.agent_count();
        if count == 0 {
            return None;
        }
        let sum: f64 = self
            .communities
            .iter()
            .flat_map(|c| c.agents.iter())
            .map(|a| a.opinion())
            .sum();
        Some(sum / count as f64)
    }

    /// Serializes the snapshot to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: u64, opinion: f64) -> AgentSnapshot {
        AgentSnapshot {
            agent_id: AgentId(id),
            kind: "basic".to_string(),
            opinions: vec![opinion],
            last_choice: None,
        }
    }

    fn sample() -> PopulationSnapshot {
        PopulationSnapshot {
            round: 10,
            communities: vec![
                CommunitySnapshot {
                    community_id: CommunityId(0),
                    name: "north".to_string(),
                    agents: vec![agent(0, 0.2), agent(1, 0.4)],
                },
                CommunitySnapshot {
                    community_id: CommunityId(1),
                    name: "south".to_string(),
                    agents: vec![],
                },
            ],
            connections: vec![ConnectionSnapshot {
                connection_id: ConnectionId(0),
                first: CommunityId(0),
                second: CommunityId(1),
                capacity: Capacity::fixed(1),
            }],
        }
    }

    #[test]
    fn test_lookup() {
        let snapshot = sample();
        assert_eq!(snapshot.agent_count(), 2);
        assert_eq!(snapshot.find_agent(AgentId(1)).unwrap().opinion(), 0.4);
        assert!(snapshot.find_agent(AgentId(9)).is_none());
        assert_eq!(snapshot.find_community(CommunityId(1)).unwrap().name, "south");
    }

    #[test]
    fn test_mean_opinion() {
        let snapshot = sample();
        let mean = snapshot.mean_opinion().unwrap();
        assert!((mean - 0.3).abs() < 1e-12);
        assert!(snapshot.communities[1].mean_opinion().is_none());
    }

    #[test]
    fn test_json_round_trip_preserves_topology() {
        let snapshot = sample();
        let json = snapshot.to_json_pretty().unwrap();
        let parsed = PopulationSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed.connections[0].capacity, Capacity::fixed(1));
    }
}
