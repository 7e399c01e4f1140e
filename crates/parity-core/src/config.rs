//! Configuration loading for simulation runs.
//!
//! A run is described by a TOML file: the seed and round limit, the
//! interaction handler, the completion condition, the communities with their
//! agents, and the connections between communities.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::interaction::PayoffTable;

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// General run settings
    #[serde(default)]
    pub simulation: GeneralConfig,
    /// Interaction handler selection
    #[serde(default)]
    pub handler: HandlerConfig,
    /// Completion condition selection
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub communities: Vec<CommunityConfig>,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

impl SimulationConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Total number of agents the configuration will create.
    pub fn agent_count(&self) -> usize {
        self.communities
            .iter()
            .flat_map(|c| c.agents.iter())
            .map(|a| a.count)
            .sum()
    }
}

/// General run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Seed for the run's random stream
    pub seed: u64,
    /// Hard cap on rounds, whatever the completion condition says
    pub max_rounds: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_rounds: 10_000,
        }
    }
}

/// Interaction handler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    /// Registry name of the handler
    pub kind: String,
    /// Row payoffs for `payoff_matrix`, indexed `[row][column]`, left = 0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_payoffs: Option<PayoffTable>,
    /// Column payoffs for `payoff_matrix`; defaults to the row table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_payoffs: Option<PayoffTable>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            kind: "coordination".to_string(),
            row_payoffs: None,
            column_payoffs: None,
        }
    }
}

/// Completion condition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Registry name of the condition
    pub kind: String,
    /// Round count for `fixed_rounds`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u64>,
    /// Opinion threshold for `consensus`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            kind: "fixed_rounds".to_string(),
            rounds: Some(100),
            threshold: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityConfig {
    pub name: String,
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
}

/// A batch of identical agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Registry name of the agent variant
    #[serde(default = "default_agent_kind")]
    pub kind: String,
    /// Starting opinion; the variant's default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opinion: Option<f64>,
    /// Opinion step for variants that learn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default = "default_agent_count")]
    pub count: usize,
}

impl AgentSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            opinion: None,
            step: None,
            count: 1,
        }
    }

    pub fn with_opinion(mut self, opinion: f64) -> Self {
        self.opinion = Some(opinion);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

fn default_agent_kind() -> String {
    "basic".to_string()
}

fn default_agent_count() -> usize {
    1
}

/// A connection between two named communities. Exactly one of `capacity`
/// and `fraction` should be set; neither means a capacity of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub between: [String; 2],
    /// Fixed number of pairings per round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    /// Share of the smaller endpoint's membership paired per round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction: Option<f64>,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Parity simulation configuration

[simulation]
seed = 42
max_rounds = 10000

[handler]
kind = "coordination"

[completion]
kind = "consensus"
threshold = 0.95

[[communities]]
name = "hill"

[[communities.agents]]
kind = "basic"
opinion = 0.5
count = 20

[[communities.agents]]
kind = "stubborn"
opinion = 0.9
count = 2

[[communities]]
name = "river"

[[communities.agents]]
kind = "basic"
opinion = 0.3
count = 15

[[connections]]
between = ["hill", "river"]
capacity = 4

[[connections]]
between = ["river", "river"]
fraction = 0.2
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();

        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.max_rounds, 10_000);
        assert_eq!(config.handler.kind, "coordination");
        assert_eq!(config.completion.kind, "fixed_rounds");
        assert_eq!(config.completion.rounds, Some(100));
        assert!(config.communities.is_empty());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
            [simulation]
            seed = 7
        "#;

        let config = SimulationConfig::from_str(toml).unwrap();

        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.max_rounds, 10_000);
        assert_eq!(config.handler.kind, "coordination");
    }

    #[test]
    fn test_parse_communities_and_connections() {
        let toml = r#"
            [[communities]]
            name = "a"
            agents = [{ kind = "basic", opinion = 0.2, count = 3 }]

            [[communities]]
            name = "b"
            agents = [{ count = 2 }]

            [[connections]]
            between = ["a", "b"]
            capacity = 2
        "#;

        let config = SimulationConfig::from_str(toml).unwrap();

        assert_eq!(config.communities.len(), 2);
        assert_eq!(config.communities[0].agents[0].opinion, Some(0.2));
        assert_eq!(config.communities[1].agents[0].kind, "basic");
        assert_eq!(config.communities[1].agents[0].count, 2);
        assert_eq!(config.connections[0].between, ["a".to_string(), "b".to_string()]);
        assert_eq!(config.connections[0].capacity, Some(2));
        assert_eq!(config.agent_count(), 5);
    }

    #[test]
    fn test_payoff_tables() {
        let toml = r#"
            [handler]
            kind = "payoff_matrix"
            row_payoffs = [[1, -1], [-1, 2]]
        "#;

        let config = SimulationConfig::from_str(toml).unwrap();

        assert_eq!(config.handler.row_payoffs, Some([[1, -1], [-1, 2]]));
        assert!(config.handler.column_payoffs.is_none());
    }

    #[test]
    fn test_default_config_toml_parses() {
        let config = SimulationConfig::from_str(&default_config_toml()).unwrap();

        assert_eq!(config.completion.kind, "consensus");
        assert_eq!(config.completion.threshold, Some(0.95));
        assert_eq!(config.communities.len(), 2);
        assert_eq!(config.connections[1].fraction, Some(0.2));
        assert_eq!(config.agent_count(), 37);
    }

    #[test]
    fn test_config_to_toml_and_back() {
        let config = SimulationConfig::from_str(&default_config_toml()).unwrap();
        let toml = config.to_toml().unwrap();

        assert!(toml.contains("[simulation]"));
        let reparsed = SimulationConfig::from_str(&toml).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[simulation]\nseed = 99\n").unwrap();

        let config = SimulationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.simulation.seed, 99);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let err = SimulationConfig::from_str("[simulation\nseed = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
