//! Strategy Registry
//!
//! Maps strategy names to factory functions for interaction handlers,
//! completion conditions and agent variants. Populated explicitly at
//! startup with whatever strategies are compiled in.

use std::collections::BTreeMap;

use crate::agent::{Agent, BasicAgent, StubbornAgent};
use crate::completion::{CompletionCondition, Consensus, FixedRounds};
use crate::config::{AgentSpec, CompletionConfig, HandlerConfig};
use crate::interaction::{CoordinationHandler, InteractionHandler, PayoffMatrixHandler};
use crate::setup::SetupError;

pub type HandlerFactory = fn(&HandlerConfig) -> Result<Box<dyn InteractionHandler>, SetupError>;
pub type CompletionFactory =
    fn(&CompletionConfig) -> Result<Box<dyn CompletionCondition>, SetupError>;
pub type AgentFactory = fn(&AgentSpec) -> Result<Box<dyn Agent>, SetupError>;

/// Name-to-factory tables for every pluggable strategy
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    handlers: BTreeMap<String, HandlerFactory>,
    completions: BTreeMap<String, CompletionFactory>,
    agents: BTreeMap<String, AgentFactory>,
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in strategy.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_handler(CoordinationHandler::NAME, build_coordination);
        registry.register_handler(PayoffMatrixHandler::NAME, build_payoff_matrix);
        registry.register_completion(FixedRounds::NAME, build_fixed_rounds);
        registry.register_completion(Consensus::NAME, build_consensus);
        registry.register_agent(BasicAgent::KIND, build_basic_agent);
        registry.register_agent(StubbornAgent::KIND, build_stubborn_agent);
        registry
    }

    /// Registers a handler factory, replacing any previous one of that name.
    pub fn register_handler(&mut self, name: impl Into<String>, factory: HandlerFactory) {
        self.handlers.insert(name.into(), factory);
    }

    pub fn register_completion(&mut self, name: impl Into<String>, factory: CompletionFactory) {
        self.completions.insert(name.into(), factory);
    }

    pub fn register_agent(&mut self, name: impl Into<String>, factory: AgentFactory) {
        self.agents.insert(name.into(), factory);
    }

    pub fn create_handler(
        &self,
        config: &HandlerConfig,
    ) -> Result<Box<dyn InteractionHandler>, SetupError> {
        let factory = self
            .handlers
            .get(&config.kind)
            .ok_or_else(|| unknown("interaction handler", &config.kind))?;
        factory(config)
    }

    pub fn create_completion(
        &self,
        config: &CompletionConfig,
    ) -> Result<Box<dyn CompletionCondition>, SetupError> {
        let factory = self
            .completions
            .get(&config.kind)
            .ok_or_else(|| unknown("completion condition", &config.kind))?;
        factory(config)
    }

    pub fn create_agent(&self, spec: &AgentSpec) -> Result<Box<dyn Agent>, SetupError> {
        let factory = self
            .agents
            .get(&spec.kind)
            .ok_or_else(|| unknown("agent", &spec.kind))?;
        factory(spec)
    }

    /// Registered handler names, sorted.
    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn completion_names(&self) -> Vec<&str> {
        self.completions.keys().map(String::as_str).collect()
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.keys().map(String::as_str).collect()
    }
}

fn unknown(category: &'static str, name: &str) -> SetupError {
    SetupError::UnknownStrategy {
        category,
        name: name.to_string(),
    }
}

fn build_coordination(_: &HandlerConfig) -> Result<Box<dyn InteractionHandler>, SetupError> {
    Ok(Box::new(CoordinationHandler::new()))
}

fn build_payoff_matrix(config: &HandlerConfig) -> Result<Box<dyn InteractionHandler>, SetupError> {
    let row = config.row_payoffs.ok_or_else(|| {
        SetupError::InvalidParameter("payoff_matrix handler needs row_payoffs".to_string())
    })?;
    let column = config.column_payoffs.unwrap_or(row);
    Ok(Box::new(PayoffMatrixHandler::new(row, column)))
}

fn build_fixed_rounds(
    config: &CompletionConfig,
) -> Result<Box<dyn CompletionCondition>, SetupError> {
    let rounds = config.rounds.ok_or_else(|| {
        SetupError::InvalidParameter("fixed_rounds completion needs rounds".to_string())
    })?;
    Ok(Box::new(FixedRounds::new(rounds)))
}

fn build_consensus(config: &CompletionConfig) -> Result<Box<dyn CompletionCondition>, SetupError> {
    let threshold = config.threshold.unwrap_or(0.95);
    if !(0.5..=1.0).contains(&threshold) {
        return Err(SetupError::InvalidParameter(format!(
            "consensus threshold {} must lie in [0.5, 1.0]",
            threshold
        )));
    }
    Ok(Box::new(Consensus::new(threshold)))
}

fn checked_opinion(spec: &AgentSpec) -> Result<Option<f64>, SetupError> {
    match spec.opinion {
        Some(opinion) if !(0.0..=1.0).contains(&opinion) => Err(SetupError::InvalidParameter(
            format!("agent opinion {} must lie in [0, 1]", opinion),
        )),
        other => Ok(other),
    }
}

fn build_basic_agent(spec: &AgentSpec) -> Result<Box<dyn Agent>, SetupError> {
    let mut agent = match checked_opinion(spec)? {
        Some(opinion) => BasicAgent::new(opinion),
        None => BasicAgent::default(),
    };
    if let Some(step) = spec.step {
        if !(step.is_finite() && step > 0.0 && step <= 1.0) {
            return Err(SetupError::InvalidParameter(format!(
                "agent step {} must lie in (0, 1]",
                step
            )));
        }
        agent = agent.with_step(step);
    }
    Ok(Box::new(agent))
}

fn build_stubborn_agent(spec: &AgentSpec) -> Result<Box<dyn Agent>, SetupError> {
    let opinion = checked_opinion(spec)?.ok_or_else(|| {
        SetupError::InvalidParameter("stubborn agents need an opinion".to_string())
    })?;
    Ok(Box::new(StubbornAgent::new(opinion)))
}
