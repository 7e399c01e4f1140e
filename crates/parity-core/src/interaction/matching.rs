//! Topology-driven Matching
//!
//! Pairs agents in two phases. First every connection, in insertion order,
//! attempts up to its capacity of cross pairings, drawing one agent from each
//! endpoint per attempt. Then every community, in insertion order, pairs its
//! remaining unmarked agents among themselves until fewer than two are left.

use parity_events::{AgentId, CommunityId, ConnectionId, PairingSource};

use super::{MatchingOutcome, Shortfall};
use crate::population::Population;

/// Runs both matching phases against the population's current marks.
///
/// An attempt on a connection where one endpoint is exhausted yields no pair
/// but still marks the agent drawn from the other endpoint; that agent sits
/// out the rest of the round and is reported as stranded. Once both endpoints
/// are exhausted the connection stops and reports the skipped attempts on
/// that last shortfall.
pub fn pair_by_topology(population: &mut Population) -> MatchingOutcome {
    let mut outcome = MatchingOutcome::default();

    let edges: Vec<(ConnectionId, CommunityId, CommunityId)> = population
        .connections()
        .iter()
        .map(|c| (c.id(), c.first(), c.second()))
        .collect();

    for (connection, first, second) in edges {
        let capacity = population
            .connection(connection)
            .map(|c| population.possible_interactions(c))
            .unwrap_or(0);

        for attempt in 0..capacity {
            let row = population.mark_random_agent(first);
            let column = population.mark_random_agent(second);

            match (row, column) {
                (Some(row), Some(column)) => {
                    let source = PairingSource::Connection(connection);
                    record_pair(&mut outcome, row, column, source);
                }
                (row, column) => {
                    // Exhausted endpoints draw nothing, so later attempts could only repeat this.
                    let skipped = if row.is_none() && column.is_none() {
                        u32::try_from(capacity - attempt - 1).unwrap_or(u32::MAX)
                    } else {
                        0
                    };
                    let shortfall = Shortfall {
                        connection,
                        attempt: u32::try_from(attempt).unwrap_or(u32::MAX),
                        first_exhausted: row.is_none(),
                        second_exhausted: column.is_none(),
                        stranded: row.or(column),
                        skipped,
                    };
                    tracing::warn!(
                        %connection,
                        attempt,
                        first_exhausted = shortfall.first_exhausted,
                        second_exhausted = shortfall.second_exhausted,
                        skipped,
                        "connection ran out of available agents"
                    );
                    outcome.shortfalls.push(shortfall);
                    if row.is_none() && column.is_none() {
                        break;
                    }
                }
            }
        }
    }

    for community in population.community_ids() {
        while population.available_count(community) >= 2 {
            let row = population.mark_random_agent(community);
            let column = population.mark_random_agent(community);
            match (row, column) {
                (Some(row), Some(column)) => {
                    record_pair(&mut outcome, row, column, PairingSource::Community(community));
                }
                _ => break,
            }
        }
    }

    outcome
}

fn record_pair(
    outcome: &mut MatchingOutcome,
    row: AgentId,
    column: AgentId,
    source: PairingSource,
) {
    if !outcome.pairings.insert(row, column, source) {
        tracing::warn!(%row, %column, "pairing refused, agent already paired this round");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::BasicAgent;
    use parity_events::Capacity;

    fn populate(population: &mut Population, community: CommunityId, count: usize) {
        for _ in 0..count {
            population
                .add_agent(community, Box::new(BasicAgent::default()))
                .unwrap();
        }
    }

    fn matched(population: &mut Population) -> MatchingOutcome {
        population.reset_marking();
        pair_by_topology(population)
    }

    #[test]
    fn test_two_communities_capacity_two() {
        let mut population = Population::new(42);
        let a = population.add_community("a");
        let b = population.add_community("b");
        populate(&mut population, a, 3);
        populate(&mut population, b, 3);
        let con = population.add_connection(a, b, Capacity::fixed(2)).unwrap();

        let outcome = matched(&mut population);

        assert_eq!(outcome.pairings.len(), 2);
        assert_eq!(outcome.pairings.count_from(PairingSource::Connection(con)), 2);
        assert!(outcome.shortfalls.is_empty());
        assert_eq!(population.available_count(a), 1);
        assert_eq!(population.available_count(b), 1);

        // Rows come from the first endpoint, columns from the second
        for (row, pairing) in outcome.pairings.iter() {
            assert_eq!(population.community_of(row), Some(a));
            assert_eq!(population.community_of(pairing.column), Some(b));
        }
    }

    #[test]
    fn test_single_community_of_five() {
        let mut population = Population::new(7);
        let only = population.add_community("only");
        populate(&mut population, only, 5);

        let outcome = matched(&mut population);

        assert_eq!(outcome.pairings.len(), 2);
        assert_eq!(population.available_count(only), 1);
    }

    #[test]
    fn test_zero_capacity_pairs_nothing_across() {
        let mut population = Population::new(1);
        let a = population.add_community("a");
        let b = population.add_community("b");
        populate(&mut population, a, 1);
        populate(&mut population, b, 1);
        population.add_connection(a, b, Capacity::fixed(0)).unwrap();

        let outcome = matched(&mut population);

        assert!(outcome.pairings.is_empty());
        assert!(outcome.shortfalls.is_empty());
    }

    #[test]
    fn test_shortfall_strands_agent_from_other_side() {
        let mut population = Population::new(3);
        let a = population.add_community("a");
        let b = population.add_community("b");
        populate(&mut population, a, 4);
        populate(&mut population, b, 1);
        let con = population.add_connection(a, b, Capacity::fixed(3)).unwrap();

        let outcome = matched(&mut population);

        assert_eq!(outcome.pairings.count_from(PairingSource::Connection(con)), 1);
        assert_eq!(outcome.shortfalls.len(), 2);
        for shortfall in &outcome.shortfalls {
            assert!(!shortfall.first_exhausted);
            assert!(shortfall.second_exhausted);
            assert!(shortfall.stranded.is_some());
        }

        // 4 in a: one paired across, two stranded, one left alone
        assert_eq!(population.available_count(a), 1);
        assert_eq!(outcome.pairings.len(), 1);
    }

    #[test]
    fn test_oversized_capacity_stops_when_both_sides_exhausted() {
        let mut population = Population::new(3);
        let a = population.add_community("a");
        let b = population.add_community("b");
        populate(&mut population, a, 2);
        populate(&mut population, b, 2);
        let con = population
            .add_connection(a, b, Capacity::fixed(1_000_000))
            .unwrap();

        let outcome = matched(&mut population);

        assert_eq!(outcome.pairings.count_from(PairingSource::Connection(con)), 2);
        assert_eq!(outcome.shortfalls.len(), 1);
        let shortfall = outcome.shortfalls[0];
        assert_eq!(shortfall.attempt, 2);
        assert!(shortfall.first_exhausted && shortfall.second_exhausted);
        assert_eq!(shortfall.stranded, None);
        assert_eq!(shortfall.skipped, 1_000_000 - 3);
    }

    #[test]
    fn test_stranding_then_exhaustion() {
        let mut population = Population::new(3);
        let a = population.add_community("a");
        let b = population.add_community("b");
        populate(&mut population, a, 1);
        populate(&mut population, b, 3);
        population.add_connection(a, b, Capacity::fixed(5)).unwrap();

        let outcome = matched(&mut population);

        // Attempts 1 and 2 strand b's agents, attempt 3 finds both sides empty
        assert_eq!(outcome.shortfalls.len(), 3);
        assert!(outcome.shortfalls[..2]
            .iter()
            .all(|s| s.skipped == 0 && s.stranded.is_some()));
        assert_eq!(outcome.shortfalls[2].attempt, 3);
        assert_eq!(outcome.shortfalls[2].skipped, 1);
    }

    #[test]
    fn test_self_loop_pairs_within_community() {
        let mut population = Population::new(11);
        let solo = population.add_community("solo");
        populate(&mut population, solo, 6);
        let con = population
            .add_connection(solo, solo, Capacity::fixed(2))
            .unwrap();

        let outcome = matched(&mut population);

        assert_eq!(outcome.pairings.count_from(PairingSource::Connection(con)), 2);
        assert_eq!(outcome.pairings.count_from(PairingSource::Community(solo)), 1);
        assert_eq!(population.available_count(solo), 0);
    }

    #[test]
    fn test_leftovers_in_different_communities_stay_unpaired() {
        let mut population = Population::new(5);
        let a = population.add_community("a");
        let b = population.add_community("b");
        populate(&mut population, a, 1);
        populate(&mut population, b, 1);

        let outcome = matched(&mut population);

        assert!(outcome.pairings.is_empty());
    }

    #[test]
    fn test_proportional_capacity() {
        let mut population = Population::new(5);
        let a = population.add_community("a");
        let b = population.add_community("b");
        populate(&mut population, a, 10);
        populate(&mut population, b, 4);
        let con = population
            .add_connection(a, b, Capacity::proportional(0.5))
            .unwrap();

        let outcome = matched(&mut population);

        assert_eq!(outcome.pairings.count_from(PairingSource::Connection(con)), 2);
        // 8 left in a pair among themselves, 2 left in b pair with each other
        assert_eq!(outcome.pairings.count_from(PairingSource::Community(a)), 4);
        assert_eq!(outcome.pairings.count_from(PairingSource::Community(b)), 1);
    }
}
