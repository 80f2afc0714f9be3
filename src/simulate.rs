use std::collections::{BTreeSet, HashMap};

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand::seq::index::sample;
use tracing::info;

use crate::config::SolverConfig;
use crate::model::case::CaseData;
use crate::model::entity::{Connection, Person};
use crate::protocol::{Judge, ProtocolError};
use crate::session::{solve_case, SessionReport};

/// An in-process judge that knows who is infected and answers truthfully.
#[derive(Debug, Clone, Default)]
pub struct SimulatedJudge {
    infected: BTreeSet<Person>,
    pub requests: usize,
}

impl SimulatedJudge {
    pub fn new(infected: impl IntoIterator<Item = Person>) -> SimulatedJudge {
        SimulatedJudge { infected: infected.into_iter().collect(), requests: 0 }
    }

    /// Draws the initial patients and lets the infection travel along each
    /// contact with the case's spread chance, one wave at a time.
    pub fn spread<R: Rng + ?Sized>(case: &CaseData, rng: &mut R) -> BTreeSet<Person> {
        let people = case.people_count;
        // NaN would make `gen_bool` panic
        let chance = if case.spread_chance.is_nan() { 0.0 } else { case.spread_chance.clamp(0.0, 1.0) };
        let mut infected: BTreeSet<Person> = sample(rng, people, case.initial_infected.min(people))
            .into_iter()
            .map(|p| p as Person)
            .collect();

        let mut contacts: HashMap<Person, Vec<Person>> = HashMap::new();
        for conn in &case.connections {
            contacts.entry(conn.0).or_default().push(conn.1);
            contacts.entry(conn.1).or_default().push(conn.0);
        }

        let mut frontier: Vec<Person> = infected.iter().copied().collect();
        for _ in 0..people {
            if frontier.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for person in frontier {
                for &other in contacts.get(&person).into_iter().flatten() {
                    if !infected.contains(&other) && rng.gen_bool(chance) {
                        infected.insert(other);
                        next.push(other);
                    }
                }
            }
            frontier = next;
        }
        infected
    }
}

impl Judge for SimulatedJudge {
    fn test(&mut self, group: &[Person]) -> Result<bool, ProtocolError> {
        self.requests += 1;
        Ok(group.iter().any(|p| self.infected.contains(p)))
    }

    fn submit(&mut self, infected: &[Person]) -> Result<bool, ProtocolError> {
        let answer: BTreeSet<Person> = infected.iter().copied().collect();
        Ok(answer == self.infected)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub cases: usize,
    pub people: usize,
    pub connections: usize,
    pub initial_infected: usize,
    pub spread_chance: f64,
    /// How far the announced bounds sit from the true infected count.
    pub slack: usize,
    pub seed: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            cases: 10,
            people: 200,
            connections: 300,
            initial_infected: 2,
            spread_chance: 0.1,
            slack: 2,
            seed: 0,
        }
    }
}

/// A random contact graph plus its true infected set; the bounds bracket
/// the true count by `slack` on both sides.
pub fn random_case<R: Rng + ?Sized>(params: &SimulationParams, rng: &mut R) -> (CaseData, BTreeSet<Person>) {
    let mut connections = Vec::with_capacity(params.connections);
    if params.people >= 2 {
        while connections.len() < params.connections {
            let a = rng.gen_range(0..params.people) as Person;
            let b = rng.gen_range(0..params.people) as Person;
            if a != b {
                connections.push(Connection(a, b));
            }
        }
    }

    let mut case = CaseData {
        people_count: params.people,
        initial_infected: params.initial_infected.min(params.people),
        spread_chance: params.spread_chance,
        lower_bound: 0,
        upper_bound: 0,
        connections,
    };
    let infected = SimulatedJudge::spread(&case, rng);
    case.lower_bound = infected.len().saturating_sub(params.slack);
    case.upper_bound = (infected.len() + params.slack).min(params.people);
    (case, infected)
}

/// Runs random cases through the regular per-case solving path.
pub fn run_simulation(params: &SimulationParams, config: &SolverConfig) -> Result<SessionReport, ProtocolError> {
    let mut rng = SmallRng::seed_from_u64(params.seed);
    let mut report = SessionReport::default();
    for index in 0..params.cases {
        info!(case = index + 1, of = params.cases, "simulating");
        let (case, infected) = random_case(params, &mut rng);
        let mut judge = SimulatedJudge::new(infected);
        let outcome = solve_case(&case, config, &mut judge)?;
        report.record(outcome);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn judge_answers_truthfully() {
        let mut judge = SimulatedJudge::new([2, 9]);
        assert!(judge.test(&[1, 2, 3]).unwrap());
        assert!(!judge.test(&[4, 5]).unwrap());
        assert!(!judge.test(&[]).unwrap());
        assert_eq!(judge.requests, 3);
        assert!(judge.submit(&[9, 2, 9]).unwrap());
        assert!(!judge.submit(&[9]).unwrap());
    }

    #[test]
    fn spread_without_chance_keeps_initial_patients() {
        let case = CaseData {
            people_count: 20,
            initial_infected: 3,
            spread_chance: 0.0,
            lower_bound: 0,
            upper_bound: 0,
            connections: (0..19).map(|p| Connection(p, p + 1)).collect(),
        };
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(SimulatedJudge::spread(&case, &mut rng).len(), 3);
    }

    #[test]
    fn unusable_spread_chance_spreads_nowhere() {
        let case = CaseData {
            people_count: 10,
            initial_infected: 2,
            spread_chance: f64::NAN,
            lower_bound: 0,
            upper_bound: 0,
            connections: (0..9).map(|p| Connection(p, p + 1)).collect(),
        };
        let mut rng = SmallRng::seed_from_u64(5);
        assert_eq!(SimulatedJudge::spread(&case, &mut rng).len(), 2);
    }

    #[test]
    fn certain_spread_covers_the_component() {
        let case = CaseData {
            people_count: 6,
            initial_infected: 1,
            spread_chance: 1.0,
            lower_bound: 0,
            upper_bound: 0,
            connections: vec![Connection(0, 1), Connection(1, 2), Connection(2, 0), Connection(3, 4), Connection(4, 5), Connection(5, 3)],
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let infected = SimulatedJudge::spread(&case, &mut rng);
        assert_eq!(infected.len(), 3);
        let first = *infected.iter().next().unwrap();
        assert!(infected.iter().all(|p| (p / 3) == (first / 3)));
    }

    #[test]
    fn random_case_brackets_truth() {
        let params = SimulationParams { people: 50, connections: 60, slack: 1, ..SimulationParams::default() };
        let mut rng = SmallRng::seed_from_u64(3);
        let (case, infected) = random_case(&params, &mut rng);
        assert_eq!(case.connections.len(), 60);
        assert!(case.connections.iter().all(|c| !c.is_self_contact()));
        assert!(case.lower_bound <= infected.len() && infected.len() <= case.upper_bound);
    }

    #[test]
    fn simulation_is_accepted_and_reproducible() {
        let params = SimulationParams { cases: 4, people: 120, seed: 11, ..SimulationParams::default() };
        let config = SolverConfig::default();
        let first = run_simulation(&params, &config).unwrap();
        let second = run_simulation(&params, &config).unwrap();
        assert_eq!(first.cases, 4);
        assert!(first.success());
        assert_eq!(first.total, second.total);
    }
}
