//! Identifiers
//!
//! Agents, communities and connections are addressed by small integer ids
//! allocated by the population. Ids are totally ordered so sorted maps keyed
//! by them iterate in a reproducible order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an agent, stable for the lifetime of a population
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u64);

/// Identifier for a community within a population
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityId(pub u32);

/// Identifier for a connection within a population
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent_{:06}", self.0)
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "community_{:03}", self.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection_{:03}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        assert_eq!(AgentId(42).to_string(), "agent_000042");
        assert_eq!(CommunityId(3).to_string(), "community_003");
        assert_eq!(ConnectionId(12).to_string(), "connection_012");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&AgentId(7)).unwrap(), "7");
        let id: CommunityId = serde_json::from_str("5").unwrap();
        assert_eq!(id, CommunityId(5));
    }

    #[test]
    fn test_agent_id_ordering() {
        let mut ids = vec![AgentId(9), AgentId(1), AgentId(4)];
        ids.sort();
        assert_eq!(ids, vec![AgentId(1), AgentId(4), AgentId(9)]);
    }
}
