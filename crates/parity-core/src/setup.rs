//! Scenario Setup
//!
//! Turns a [`SimulationConfig`] into a ready-to-run population plus the
//! strategies that drive it.

use std::collections::HashMap;
use thiserror::Error;

use parity_events::{Capacity, CommunityId};

use crate::completion::CompletionCondition;
use crate::config::{ConnectionConfig, SimulationConfig};
use crate::interaction::InteractionHandler;
use crate::population::{Population, TopologyError};
use crate::registry::StrategyRegistry;

/// Errors raised while building a scenario from configuration
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("unknown {category} '{name}'")]
    UnknownStrategy { category: &'static str, name: String },

    #[error("community '{0}' is declared more than once")]
    DuplicateCommunity(String),

    #[error("connection refers to undeclared community '{0}'")]
    UnknownCommunity(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),
}

/// Everything needed to run a configured simulation
pub struct Scenario {
    pub population: Population,
    pub handler: Box<dyn InteractionHandler>,
    pub completion: Box<dyn CompletionCondition>,
    pub max_rounds: u64,
}

/// Builds the population, handler and completion condition described by
/// `config`, resolving strategy names through `registry`.
pub fn build_scenario(
    config: &SimulationConfig,
    registry: &StrategyRegistry,
) -> Result<Scenario, SetupError> {
    let handler = registry.create_handler(&config.handler)?;
    let completion = registry.create_completion(&config.completion)?;
    let population = build_population(config, registry)?;

    Ok(Scenario {
        population,
        handler,
        completion,
        max_rounds: config.simulation.max_rounds,
    })
}

/// Builds only the population: communities in declaration order, their
/// agents, then the connections.
pub fn build_population(
    config: &SimulationConfig,
    registry: &StrategyRegistry,
) -> Result<Population, SetupError> {
    let mut population = Population::new(config.simulation.seed);
    let mut by_name: HashMap<&str, CommunityId> = HashMap::new();

    for community in &config.communities {
        if by_name.contains_key(community.name.as_str()) {
            return Err(SetupError::DuplicateCommunity(community.name.clone()));
        }
        let id = population.add_community(community.name.clone());
        by_name.insert(community.name.as_str(), id);

        for spec in &community.agents {
            for _ in 0..spec.count {
                let agent = registry.create_agent(spec)?;
                population.add_agent(id, agent)?;
            }
        }
    }

    for connection in &config.connections {
        let resolve = |name: &String| {
            by_name
                .get(name.as_str())
                .copied()
                .ok_or_else(|| SetupError::UnknownCommunity(name.clone()))
        };
        let first = resolve(&connection.between[0])?;
        let second = resolve(&connection.between[1])?;
        population.add_connection(first, second, capacity_of(connection)?)?;
    }

    tracing::debug!(
        communities = population.communities().len(),
        connections = population.connections().len(),
        agents = population.agent_count(),
        "population built"
    );
    Ok(population)
}

fn capacity_of(connection: &ConnectionConfig) -> Result<Capacity, SetupError> {
    match (connection.capacity, connection.fraction) {
        (Some(_), Some(_)) => Err(SetupError::InvalidParameter(format!(
            "connection {:?} sets both capacity and fraction",
            connection.between
        ))),
        (Some(pairings), None) => Ok(Capacity::fixed(pairings)),
        (None, Some(fraction)) => Ok(Capacity::proportional(fraction)),
        (None, None) => Ok(Capacity::fixed(0)),
    }
}
