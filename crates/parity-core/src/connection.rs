//! Connections
//!
//! Capacity-bounded edges between two communities. A connection whose ends
//! are the same community is a self-loop and pairs members of that community
//! with each other.

use parity_events::{Capacity, CommunityId, ConnectionId, ConnectionSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    id: ConnectionId,
    first: CommunityId,
    second: CommunityId,
    capacity: Capacity,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        first: CommunityId,
        second: CommunityId,
        capacity: Capacity,
    ) -> Self {
        Self {
            id,
            first,
            second,
            capacity,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Endpoint whose agent takes the row role.
    pub fn first(&self) -> CommunityId {
        self.first
    }

    pub fn second(&self) -> CommunityId {
        self.second
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn is_self_loop(&self) -> bool {
        self.first == self.second
    }

    pub fn touches(&self, community: CommunityId) -> bool {
        self.first == community || self.second == community
    }

    /// Pairings this connection may attempt this round, given the
    /// membership size of each endpoint.
    ///
    /// A proportional capacity takes its share of the smaller endpoint and
    /// rounds down.
    pub fn possible_interactions(&self, first_len: usize, second_len: usize) -> usize {
        match self.capacity {
            Capacity::Fixed { pairings } => pairings as usize,
            Capacity::Proportional { fraction } => {
                let base = first_len.min(second_len) as f64;
                (fraction * base).floor().max(0.0) as usize
            }
        }
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            connection_id: self.id,
            first: self.first,
            second: self.second,
            capacity: self.capacity,
        }
    }
}

/// Whether a capacity setting can be evaluated. Proportional capacities
/// need a fraction in `[0, 1]`.
pub fn capacity_is_valid(capacity: &Capacity) -> bool {
    match capacity {
        Capacity::Fixed { .. } => true,
        Capacity::Proportional { fraction } => (0.0..=1.0).contains(fraction),
    }
}
