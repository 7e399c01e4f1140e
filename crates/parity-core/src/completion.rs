//! Completion Conditions
//!
//! Evaluated by the round driver after every round to decide whether the
//! run is over.

use crate::population::Population;

/// Pluggable stopping rule
pub trait CompletionCondition: Send {
    /// Registry name of this condition.
    fn name(&self) -> &str;

    fn is_complete(&mut self, population: &Population) -> bool;
}

/// Stops once the population has completed a number of rounds
#[derive(Debug, Clone, Copy)]
pub struct FixedRounds {
    rounds: u64,
}

impl FixedRounds {
    pub const NAME: &'static str = "fixed_rounds";

    pub fn new(rounds: u64) -> Self {
        Self { rounds }
    }
}

impl CompletionCondition for FixedRounds {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_complete(&mut self, population: &Population) -> bool {
        population.rounds_completed() >= self.rounds
    }
}

/// Stops when every agent leans the same way by at least `threshold`:
/// all opinions `>= threshold`, or all opinions `<= 1 - threshold`.
/// An empty population counts as converged.
#[derive(Debug, Clone, Copy)]
pub struct Consensus {
    threshold: f64,
}

impl Consensus {
    pub const NAME: &'static str = "consensus";

    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl CompletionCondition for Consensus {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_complete(&mut self, population: &Population) -> bool {
        let low = 1.0 - self.threshold;
        let mut all_high = true;
        let mut all_low = true;
        for (_, agent) in population.agents() {
            let opinion = agent.opinion();
            all_high &= opinion >= self.threshold;
            all_low &= opinion <= low;
            if !all_high && !all_low {
                return false;
            }
        }
        true
    }
}
