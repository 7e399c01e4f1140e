//! Shared record types for the parity opinion-dynamics engine.
//!
//! This crate contains pure data structures with no simulation logic:
//! identifiers, game alphabets, per-round records and population snapshots.
//! Anything that observes a run (loggers, editors, plotting scripts) can
//! depend on it without pulling in the engine.

pub mod game;
pub mod ids;
pub mod round;
pub mod snapshot;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

pub use game::{Capacity, Choice, Feedback};
pub use ids::{AgentId, CommunityId, ConnectionId};
pub use round::{Anomaly, InteractionRecord, PairingSource, RoundRecord};
pub use snapshot::{AgentSnapshot, CommunitySnapshot, ConnectionSnapshot, PopulationSnapshot};
