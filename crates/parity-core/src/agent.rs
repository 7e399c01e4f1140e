//! Agents
//!
//! The capability every agent variant provides, plus the two built-in
//! variants. Agents never see their partner: a choice is a function of the
//! agent's own opinion and the shared random stream.

use rand::{Rng, RngCore};
use std::fmt;
use thiserror::Error;

use parity_events::{AgentSnapshot, AgentId, Choice, Feedback};

/// Constants for the reference opinion update
pub mod opinion_constants {
    /// Opinion assigned when none is configured
    pub const DEFAULT_OPINION: f64 = 0.5;
    /// How far one round of feedback moves the opinion
    pub const OPINION_STEP: f64 = 0.05;
    pub const MIN_OPINION: f64 = 0.0;
    pub const MAX_OPINION: f64 = 1.0;
}

use opinion_constants::{DEFAULT_OPINION, MAX_OPINION, MIN_OPINION, OPINION_STEP};

/// Reasons an agent refuses a feedback value. State is never changed when
/// one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedbackError {
    #[error("feedback {feedback} is not understood by {kind} agents")]
    Unrecognized { feedback: Feedback, kind: String },

    #[error("feedback {0} arrived before any choice was made")]
    NoChoiceRecorded(Feedback),
}

/// Fixed capability interface for every agent variant
pub trait Agent: fmt::Debug + Send {
    /// Registry name of this variant.
    fn kind(&self) -> &str;

    /// Makes and records a sealed choice for the current interaction.
    fn choose_action(&mut self, rng: &mut dyn RngCore) -> Choice;

    /// Adjusts opinion state from the feedback for the last recorded choice.
    fn update_opinion(&mut self, feedback: Feedback) -> Result<(), FeedbackError>;

    /// All opinion dimensions, primary first.
    fn opinions(&self) -> &[f64];

    fn last_choice(&self) -> Option<Choice>;

    /// Primary opinion dimension.
    fn opinion(&self) -> f64 {
        self.opinions().first().copied().unwrap_or(DEFAULT_OPINION)
    }

    fn snapshot(&self, agent_id: AgentId) -> AgentSnapshot {
        AgentSnapshot {
            agent_id,
            kind: self.kind().to_string(),
            opinions: self.opinions().to_vec(),
            last_choice: self.last_choice(),
        }
    }
}

/// Draw a uniform value and pick `Left` when it exceeds the opinion.
/// An opinion of 1.0 therefore always picks `Right`, 0.0 almost always `Left`.
fn choose_by_opinion(opinion: f64, rng: &mut dyn RngCore) -> Choice {
    let draw: f64 = rng.gen();
    if draw > opinion {
        Choice::Left
    } else {
        Choice::Right
    }
}

fn clamp_opinion(opinion: f64) -> f64 {
    if opinion.is_nan() {
        DEFAULT_OPINION
    } else {
        opinion.clamp(MIN_OPINION, MAX_OPINION)
    }
}

/// Reference agent: a single opinion in [0, 1] read as the probability of
/// choosing `Right`, reinforced by positive feedback and weakened by negative.
#[derive(Debug, Clone)]
pub struct BasicAgent {
    opinions: Vec<f64>,
    last_choice: Option<Choice>,
    step: f64,
}

impl BasicAgent {
    pub const KIND: &'static str = "basic";

    pub fn new(opinion: f64) -> Self {
        Self {
            opinions: vec![clamp_opinion(opinion)],
            last_choice: None,
            step: OPINION_STEP,
        }
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step.abs();
        self
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    fn nudge(&mut self, toward_right: bool) {
        let current = self.opinions[0];
        self.opinions[0] = if toward_right {
            (current + self.step).min(MAX_OPINION)
        } else {
            (current - self.step).max(MIN_OPINION)
        };
    }
}

impl Default for BasicAgent {
    fn default() -> Self {
        Self::new(DEFAULT_OPINION)
    }
}

impl Agent for BasicAgent {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn choose_action(&mut self, rng: &mut dyn RngCore) -> Choice {
        let choice = choose_by_opinion(self.opinion(), rng);
        self.last_choice = Some(choice);
        choice
    }

    fn update_opinion(&mut self, feedback: Feedback) -> Result<(), FeedbackError> {
        if !feedback.is_positive() && !feedback.is_negative() {
            return Err(FeedbackError::Unrecognized {
                feedback,
                kind: Self::KIND.to_string(),
            });
        }
        let choice = self
            .last_choice
            .ok_or(FeedbackError::NoChoiceRecorded(feedback))?;

        // Positive feedback reinforces the choice made, negative pushes toward the other one.
        let toward_right = (choice == Choice::Right) == feedback.is_positive();
        self.nudge(toward_right);
        Ok(())
    }

    fn opinions(&self) -> &[f64] {
        &self.opinions
    }

    fn last_choice(&self) -> Option<Choice> {
        self.last_choice
    }
}

/// An agent whose opinion never moves. Chooses like [`BasicAgent`] and
/// accepts the reference feedback values without reacting to them.
#[derive(Debug, Clone)]
pub struct StubbornAgent {
    opinions: Vec<f64>,
    last_choice: Option<Choice>,
}

impl StubbornAgent {
    pub const KIND: &'static str = "stubborn";

    pub fn new(opinion: f64) -> Self {
        Self {
            opinions: vec![clamp_opinion(opinion)],
            last_choice: None,
        }
    }
}

impl Agent for StubbornAgent {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn choose_action(&mut self, rng: &mut dyn RngCore) -> Choice {
        let choice = choose_by_opinion(self.opinion(), rng);
        self.last_choice = Some(choice);
        choice
    }

    fn update_opinion(&mut self, feedback: Feedback) -> Result<(), FeedbackError> {
        if feedback.is_positive() || feedback.is_negative() {
            Ok(())
        } else {
            Err(FeedbackError::Unrecognized {
                feedback,
                kind: Self::KIND.to_string(),
            })
        }
    }

    fn opinions(&self) -> &[f64] {
        &self.opinions
    }

    fn last_choice(&self) -> Option<Choice> {
        self.last_choice
    }
}
