//! Sample data fixtures for testing.
//!
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! ```ignore
//! // [dev-dependencies]
//! // parity-events = { path = "../parity-events", features = ["test-fixtures"] }
//!
//! let rounds = parity_events::fixtures::sample_rounds();
//! ```

use crate::{PopulationSnapshot, RoundRecord};

/// Returns sample round records from the fixtures file.
///
/// Three rounds over two communities joined by one connection of capacity 2:
/// round 1 is clean, round 2 has a rejected feedback value, round 3 has a
/// shortfall that stranded one agent.
pub fn sample_rounds() -> Vec<RoundRecord> {
    let jsonl = include_str!("../tests/fixtures/sample_rounds.jsonl");
    jsonl
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            RoundRecord::from_jsonl(l).unwrap_or_else(|e| {
                panic!("Failed to parse round line: {}\nError: {}", l, e)
            })
        })
        .collect()
}

/// Returns a sample population snapshot from the fixtures file.
///
/// Two communities ("hill" with 3 agents, "river" with 3 agents) and one
/// connection between them.
pub fn sample_snapshot() -> PopulationSnapshot {
    let json = include_str!("../tests/fixtures/sample_snapshot.json");
    PopulationSnapshot::from_json(json).expect("Failed to parse sample_snapshot.json")
}
