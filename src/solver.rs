use tracing::{debug, info, trace};

use crate::action::{RunStatistics, SolveError, TestKind};
use crate::config::{SolverConfig, Strategy};
use crate::model::case::CaseData;
use crate::model::entity::Person;
use crate::model::group::InfectedSet;
use crate::partition::partition;
use crate::planner::optimal_group_size;
use crate::protocol::{Judge, ProtocolError};
use crate::score::AffinityMap;

/// Resolves `Strategy::Auto` for a case; explicit choices pass through.
pub fn choose_strategy(case: &CaseData, config: &SolverConfig) -> Strategy {
    if config.strategy != Strategy::Auto {
        return config.strategy;
    }
    // bisection can only ever find one infected person
    if case.people_count <= config.bisect_threshold && case.upper_bound <= 1 {
        return Strategy::Bisect;
    }
    match optimal_group_size(case.lower_bound, case.upper_bound, case.people_count) {
        Some(size) if size > config.adaptive_min_group_size => Strategy::Adaptive,
        _ => Strategy::Fixed,
    }
}

/// Solves one case against a judge. The infected set and statistics stay
/// readable when solving stops with an error.
pub struct CaseSolver<'a, J> {
    case: &'a CaseData,
    config: &'a SolverConfig,
    judge: J,
    pub infected: InfectedSet,
    pub stats: RunStatistics,
}

impl<'a, J: Judge> CaseSolver<'a, J> {
    pub fn new(case: &'a CaseData, config: &'a SolverConfig, judge: J) -> CaseSolver<'a, J> {
        CaseSolver {
            case,
            config,
            judge,
            infected: InfectedSet::new(),
            stats: RunStatistics::default(),
        }
    }

    pub fn into_judge(self) -> J {
        self.judge
    }

    pub fn solve(&mut self, strategy: Strategy) -> Result<(), SolveError> {
        match strategy {
            Strategy::Auto => {
                let chosen = choose_strategy(self.case, self.config);
                self.solve(chosen)
            }
            Strategy::Adaptive => self.solve_adaptive(),
            Strategy::Fixed => self.solve_fixed(self.config.fixed_group_size),
            Strategy::Bisect => self.solve_bisect(),
        }
    }

    fn test(&mut self, members: &[Person], kind: TestKind) -> Result<bool, ProtocolError> {
        if members.is_empty() {
            return Ok(false);
        }
        let positive = self.judge.test(members)?;
        self.stats.record(kind);
        trace!(size = members.len(), ?kind, positive, "tested");
        Ok(positive)
    }

    fn reached_upper_bound(&self) -> bool {
        self.infected.len() >= self.case.upper_bound
    }

    /// Affinity scores, unless the population is too large to afford them.
    fn scores(&self) -> Result<Option<AffinityMap>, SolveError> {
        if self.case.people_count > self.config.score_guard {
            debug!(people = self.case.people_count, guard = self.config.score_guard, "skipping affinity scores");
            return Ok(None);
        }
        let scores = AffinityMap::build(&self.case.connections, self.config.levels, self.case.spread_chance)?;
        debug!(levels = scores.depth(), entries = scores.top().len(), "built affinity scores");
        Ok(Some(scores))
    }

    /// Rounds of plan, partition, test and shrink. Groups larger than two are
    /// tested whole and only cleared when negative; positives wait for a later
    /// round with smaller groups. Pairs and singles are tested per person.
    pub fn solve_adaptive(&mut self) -> Result<(), SolveError> {
        let scores = self.scores()?;
        let mut pool = self.case.everyone();
        // lowered whenever a round clears nobody, so every round eventually shrinks the pool
        let mut cap = usize::MAX;

        while !pool.is_empty() {
            let Some(planned) = optimal_group_size(self.case.lower_bound, self.case.upper_bound, pool.len()) else {
                break;
            };
            let group_size = planned.min(cap);
            debug!(group_size, pool = pool.len(), "planned round");

            let groups = partition(scores.as_ref().map(AffinityMap::top), group_size, &pool)?;
            let before = pool.len();
            for group in &groups {
                if group_size > 2 {
                    if !self.test(&group.members, TestKind::Group)? {
                        for person in &group.members {
                            pool.remove(person);
                        }
                    }
                    continue;
                }
                for &person in &group.members {
                    if self.test(&[person], TestKind::Person)? {
                        self.infected.insert(person);
                    }
                    pool.remove(&person);
                    if self.reached_upper_bound() {
                        info!(found = self.infected.len(), "found all infected people, skipping remaining tests");
                        return Ok(());
                    }
                }
            }

            if pool.len() == before {
                cap = (group_size.min(before) / 2).max(1);
                debug!(cap, "no group cleared, shrinking groups");
            }
        }
        Ok(())
    }

    /// One partition of everyone into `group_size` groups; every member of a
    /// positive group is then tested individually.
    pub fn solve_fixed(&mut self, group_size: usize) -> Result<(), SolveError> {
        debug!(group_size, "fixed group size");
        let scores = self.scores()?;
        let groups = partition(scores.as_ref().map(AffinityMap::top), group_size, &self.case.everyone())?;

        for group in &groups {
            if !self.test(&group.members, TestKind::Group)? {
                continue;
            }
            for &person in &group.members {
                if self.test(&[person], TestKind::Person)? {
                    self.infected.insert(person);
                }
                if self.reached_upper_bound() {
                    info!(found = self.infected.len(), "reached upper bound, skipping remaining tests");
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Halves a positive working set until one person remains. Finds at most
    /// one infected person: the half that tests negative is dropped, so a
    /// second infected person there goes unnoticed.
    pub fn solve_bisect(&mut self) -> Result<(), SolveError> {
        let mut working: Vec<Person> = self.case.everyone().into_iter().collect();
        if !self.test(&working, TestKind::Group)? {
            return Ok(());
        }
        // `working` is known positive from here on
        while working.len() > 1 {
            let right = working.split_off(working.len() / 2);
            if !self.test(&working, TestKind::Group)? {
                working = right;
            }
        }
        if let Some(&person) = working.first() {
            self.infected.insert(person);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::Connection;
    use crate::simulate::SimulatedJudge;

    fn case(people_count: usize, bounds: (usize, usize), connections: &[(Person, Person)]) -> CaseData {
        CaseData {
            people_count,
            initial_infected: bounds.0,
            spread_chance: 0.5,
            lower_bound: bounds.0,
            upper_bound: bounds.1,
            connections: connections.iter().copied().map(Connection::from).collect(),
        }
    }

    fn solve(case: &CaseData, strategy: Strategy, infected: &[Person]) -> (Vec<Person>, RunStatistics) {
        let config = SolverConfig::default();
        let mut judge = SimulatedJudge::new(infected.iter().copied());
        let mut solver = CaseSolver::new(case, &config, &mut judge);
        solver.solve(strategy).unwrap();
        (solver.infected.as_slice().to_vec(), solver.stats)
    }

    #[test]
    fn auto_strategy_selection() {
        let config = SolverConfig::default();
        assert_eq!(choose_strategy(&case(8, (0, 1), &[]), &config), Strategy::Bisect);
        assert_eq!(choose_strategy(&case(8, (1, 2), &[]), &config), Strategy::Fixed);
        assert_eq!(choose_strategy(&case(1000, (5, 10), &[]), &config), Strategy::Adaptive);
        assert_eq!(choose_strategy(&case(100, (20, 30), &[]), &config), Strategy::Fixed);
        let forced = SolverConfig { strategy: Strategy::Adaptive, ..SolverConfig::default() };
        assert_eq!(choose_strategy(&case(8, (0, 1), &[]), &forced), Strategy::Adaptive);
    }

    #[test]
    fn adaptive_stops_at_upper_bound() {
        let case = case(4, (1, 1), &[(0, 1), (1, 2)]);
        let (found, stats) = solve(&case, Strategy::Adaptive, &[1]);
        assert_eq!(found, vec![1]);
        // {0, 1, 2} and {3} as groups, then 0 and 1 alone
        assert_eq!(stats, RunStatistics { group_tests: 2, person_tests: 2 });
    }

    #[test]
    fn adaptive_finds_everyone_in_a_larger_population() {
        let connections: Vec<(Person, Person)> = (0..99).map(|p| (p, p + 1)).collect();
        let case = case(100, (2, 4), &connections);
        let truth = [13, 14, 70];
        let (mut found, stats) = solve(&case, Strategy::Adaptive, &truth);
        found.sort();
        assert_eq!(found, truth.to_vec());
        assert!(stats.tests() < 100);
    }

    #[test]
    fn adaptive_on_empty_population_does_nothing() {
        let (found, stats) = solve(&case(0, (0, 0), &[]), Strategy::Adaptive, &[]);
        assert!(found.is_empty());
        assert_eq!(stats.tests(), 0);
    }

    #[test]
    fn fixed_tests_members_of_positive_groups() {
        let case = case(8, (1, 2), &[]);
        let (found, stats) = solve(&case, Strategy::Fixed, &[5]);
        assert_eq!(found, vec![5]);
        // two groups of four, then 4, 5 individually (upper bound 2 not reached, so 6 and 7 too)
        assert_eq!(stats, RunStatistics { group_tests: 2, person_tests: 4 });
    }

    #[test]
    fn bisect_finds_the_single_case() {
        let case = case(8, (0, 1), &[]);
        let (found, stats) = solve(&case, Strategy::Bisect, &[3]);
        assert_eq!(found, vec![3]);
        assert_eq!(stats, RunStatistics { group_tests: 4, person_tests: 0 });
    }

    #[test]
    fn bisect_negative_population_is_one_test() {
        let case = case(5, (0, 1), &[]);
        let (found, stats) = solve(&case, Strategy::Bisect, &[]);
        assert!(found.is_empty());
        assert_eq!(stats.tests(), 1);
    }

    #[test]
    fn bisect_keeps_only_one_of_two() {
        let case = case(4, (0, 1), &[]);
        let (found, _) = solve(&case, Strategy::Bisect, &[0, 3]);
        assert_eq!(found, vec![0]);
    }
}
