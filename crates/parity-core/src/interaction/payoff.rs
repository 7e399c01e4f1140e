//! Payoff Rules
//!
//! The reference coordination game and a general 2x2 payoff-matrix game.

use parity_events::{Choice, Feedback};

use super::InteractionHandler;

/// Reward when both sides coordinate
pub const POSITIVE_REWARD: Feedback = Feedback::POSITIVE;
/// Reward when the sides miscoordinate
pub const NEGATIVE_REWARD: Feedback = Feedback::NEGATIVE;

/// Symmetric coordination game: both sides are rewarded for matching
/// choices and punished otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinationHandler;

impl CoordinationHandler {
    pub const NAME: &'static str = "coordination";

    pub fn new() -> Self {
        Self
    }
}

impl InteractionHandler for CoordinationHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn row_feedback(&self, row: Choice, column: Choice) -> Feedback {
        self.column_feedback(row, column)
    }

    fn column_feedback(&self, row: Choice, column: Choice) -> Feedback {
        if row == column {
            POSITIVE_REWARD
        } else {
            NEGATIVE_REWARD
        }
    }
}

/// Rewards indexed as `table[row_choice][column_choice]`
pub type PayoffTable = [[i32; 2]; 2];

/// Arbitrary two-player, two-choice game with separate row and column
/// payoff tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoffMatrixHandler {
    row_payoffs: PayoffTable,
    column_payoffs: PayoffTable,
}

impl PayoffMatrixHandler {
    pub const NAME: &'static str = "payoff_matrix";

    pub fn new(row_payoffs: PayoffTable, column_payoffs: PayoffTable) -> Self {
        Self {
            row_payoffs,
            column_payoffs,
        }
    }

    /// Both sides share one table.
    pub fn symmetric(payoffs: PayoffTable) -> Self {
        Self::new(payoffs, payoffs)
    }

    /// Same rewards as [`CoordinationHandler`].
    pub fn coordination() -> Self {
        Self::symmetric([[1, -1], [-1, 1]])
    }

    /// Rewards for choosing differently from the partner.
    pub fn anti_coordination() -> Self {
        Self::symmetric([[-1, 1], [1, -1]])
    }

    pub fn row_payoffs(&self) -> &PayoffTable {
        &self.row_payoffs
    }

    pub fn column_payoffs(&self) -> &PayoffTable {
        &self.column_payoffs
    }
}

impl InteractionHandler for PayoffMatrixHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn row_feedback(&self, row: Choice, column: Choice) -> Feedback {
        Feedback(self.row_payoffs[row.index()][column.index()])
    }

    fn column_feedback(&self, row: Choice, column: Choice) -> Feedback {
        Feedback(self.column_payoffs[row.index()][column.index()])
    }
}
