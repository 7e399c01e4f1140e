//! Round Records
//!
//! One [`RoundRecord`] is produced per simulated round: who was paired, what
//! each side chose, what feedback came back, and any non-fatal anomalies.

use serde::{Deserialize, Serialize};

use crate::game::{Choice, Feedback};
use crate::ids::{AgentId, CommunityId, ConnectionId};

/// Where a pairing was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PairingSource {
    /// Drawn across (or along, for a self-loop) a connection
    Connection(ConnectionId),
    /// Drawn from the leftovers of a single community
    Community(CommunityId),
}

/// A single played game between a row agent and a column agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub row: AgentId,
    pub column: AgentId,
    pub source: PairingSource,
    pub row_choice: Choice,
    pub column_choice: Choice,
    pub row_feedback: Feedback,
    pub column_feedback: Feedback,
}

impl InteractionRecord {
    /// Whether both sides made the same choice.
    pub fn coordinated(&self) -> bool {
        self.row_choice == self.column_choice
    }
}

/// Round-local problems that are reported but never abort a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Anomaly {
    /// A connection attempt found one or both endpoints out of available agents
    Shortfall {
        connection: ConnectionId,
        attempt: u32,
        first_exhausted: bool,
        second_exhausted: bool,
        /// Agent drawn from the non-exhausted side; it stays marked and sits out the round
        stranded: Option<AgentId>,
        /// Further attempts dropped once both endpoints were exhausted
        #[serde(default)]
        skipped: u32,
    },
    /// An agent refused a feedback value; its state was left unchanged
    RejectedFeedback {
        agent: AgentId,
        feedback: Feedback,
        reason: String,
    },
}

/// Everything that happened in one round
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u64,
    pub interactions: Vec<InteractionRecord>,
    /// Agents left without a partner, in id order
    pub unpaired: Vec<AgentId>,
    pub anomalies: Vec<Anomaly>,
}

impl RoundRecord {
    pub fn new(round: u64) -> Self {
        Self {
            round,
            ..Default::default()
        }
    }

    pub fn pair_count(&self) -> usize {
        self.interactions.len()
    }

    /// Number of shortfall anomalies in this round.
    pub fn shortfall_count(&self) -> usize {
        self.anomalies
            .iter()
            .filter(|a| matches!(a, Anomaly::Shortfall { .. }))
            .count()
    }

    /// Share of interactions where both sides chose the same action.
    pub fn coordination_rate(&self) -> f64 {
        if self.interactions.is_empty() {
            return 0.0;
        }
        let coordinated = self.interactions.iter().filter(|i| i.coordinated()).count();
        coordinated as f64 / self.interactions.len() as f64
    }

    /// Serializes the record as a single JSON line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a record from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(row_choice: Choice, column_choice: Choice) -> InteractionRecord {
        InteractionRecord {
            row: AgentId(1),
            column: AgentId(2),
            source: PairingSource::Community(CommunityId(0)),
            row_choice,
            column_choice,
            row_feedback: Feedback::POSITIVE,
            column_feedback: Feedback::POSITIVE,
        }
    }

    #[test]
    fn test_coordination_rate() {
        let mut record = RoundRecord::new(3);
        assert_eq!(record.coordination_rate(), 0.0);

        record.interactions.push(interaction(Choice::Left, Choice::Left));
        record.interactions.push(interaction(Choice::Left, Choice::Right));

        assert_eq!(record.pair_count(), 2);
        assert_eq!(record.coordination_rate(), 0.5);
    }

    #[test]
    fn test_anomaly_tagging() {
        let anomaly = Anomaly::Shortfall {
            connection: ConnectionId(1),
            attempt: 2,
            first_exhausted: false,
            second_exhausted: true,
            stranded: Some(AgentId(8)),
            skipped: 0,
        };
        let json = serde_json::to_string(&anomaly).unwrap();
        assert!(json.contains(r#""type":"shortfall""#));
        assert!(json.contains(r#""stranded":8"#));
    }

    #[test]
    fn test_pairing_source_serialization() {
        let json = serde_json::to_string(&PairingSource::Connection(ConnectionId(4))).unwrap();
        assert_eq!(json, r#"{"kind":"connection","id":4}"#);
    }

    #[test]
    fn test_jsonl_line() {
        let mut record = RoundRecord::new(1);
        record.interactions.push(interaction(Choice::Right, Choice::Right));
        record.unpaired.push(AgentId(5));

        let line = record.to_jsonl().unwrap();
        assert!(!line.contains('\n'));

        let parsed = RoundRecord::from_jsonl(&line).unwrap();
        assert_eq!(parsed.round, 1);
        assert_eq!(parsed.unpaired, vec![AgentId(5)]);
        assert_eq!(parsed.shortfall_count(), 0);
    }
}
