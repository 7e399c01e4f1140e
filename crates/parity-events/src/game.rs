//! Game Alphabets
//!
//! The discrete choices agents make, the rewards the payoff rule hands back,
//! and the capacity setting carried by connections.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A sealed, simultaneous choice made by one side of a pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Left,
    Right,
}

impl Choice {
    /// Returns all choice variants in index order.
    pub fn all() -> &'static [Choice] {
        &[Choice::Left, Choice::Right]
    }

    /// Row/column index of this choice in a payoff table.
    pub fn index(&self) -> usize {
        match self {
            Choice::Left => 0,
            Choice::Right => 1,
        }
    }

    /// The other choice.
    pub fn opposite(&self) -> Choice {
        match self {
            Choice::Left => Choice::Right,
            Choice::Right => Choice::Left,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Left => write!(f, "LEFT"),
            Choice::Right => write!(f, "RIGHT"),
        }
    }
}

/// Reward handed to one side of a pairing by the payoff rule.
///
/// The reference games only use [`Feedback::POSITIVE`] and
/// [`Feedback::NEGATIVE`]; other payoff tables may hand out any integer and
/// agents decide which values they understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feedback(pub i32);

impl Feedback {
    pub const POSITIVE: Feedback = Feedback(1);
    pub const NEGATIVE: Feedback = Feedback(-1);

    pub fn is_positive(&self) -> bool {
        *self == Self::POSITIVE
    }

    pub fn is_negative(&self) -> bool {
        *self == Self::NEGATIVE
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

/// How many pairings a connection permits per round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Capacity {
    /// A configured constant
    Fixed { pairings: u32 },
    /// A share of the smaller endpoint's membership, rounded down
    Proportional { fraction: f64 },
}

impl Capacity {
    pub fn fixed(pairings: u32) -> Self {
        Capacity::Fixed { pairings }
    }

    pub fn proportional(fraction: f64) -> Self {
        Capacity::Proportional { fraction }
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::Fixed { pairings: 0 }
    }
}
