//! Parity: round-based opinion dynamics engine.
//!
//! Agents live in communities; connections between communities bound how
//! many cross-community games can be played per round. Every round the
//! population pairs agents, each side makes a sealed choice, an interaction
//! handler scores the pair, and each agent updates its opinion from the
//! feedback it received.
//!
//! # Modules
//!
//! - [`agent`]: the agent capability and the built-in variants
//! - [`community`]: agent pools with per-round availability marks
//! - [`connection`]: capacity-bounded edges between communities
//! - [`population`]: topology ownership and the round loop
//! - [`interaction`]: pairing and payoff strategies
//! - [`completion`]: stopping rules
//! - [`registry`]: name-to-factory tables for every strategy
//! - [`config`] / [`setup`]: TOML scenarios and turning them into populations
//! - [`logger`]: JSONL round log and snapshot output

pub mod agent;
pub mod community;
pub mod completion;
pub mod config;
pub mod connection;
pub mod interaction;
pub mod logger;
pub mod population;
pub mod registry;
pub mod setup;

pub use agent::{Agent, BasicAgent, FeedbackError, StubbornAgent};
pub use community::Community;
pub use completion::{CompletionCondition, Consensus, FixedRounds};
pub use config::{default_config_toml, ConfigError, SimulationConfig};
pub use connection::Connection;
pub use interaction::{
    pair_by_topology, CoordinationHandler, InteractionHandler, MatchingOutcome, Pairing,
    Pairings, PayoffMatrixHandler, Shortfall,
};
pub use logger::{write_snapshot, LogError, RoundLogger};
pub use population::{
    Population, RunOptions, RunSummary, StopHandle, StopReason, TopologyError,
};
pub use registry::StrategyRegistry;
pub use setup::{build_population, build_scenario, Scenario, SetupError};

pub use parity_events::{
    AgentId, Anomaly, Capacity, Choice, CommunityId, ConnectionId, Feedback, PairingSource,
    PopulationSnapshot, RoundRecord,
};
