use tracing::{error, info, warn};
use itertools::Itertools;

use crate::action::{RunStatistics, SolveError};
use crate::config::{SolverConfig, Strategy};
use crate::model::case::CaseData;
use crate::model::entity::Person;
use crate::protocol::{CaseSource, Judge, ProtocolError};
use crate::solver::{choose_strategy, CaseSolver};

/// What happened in one case.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseReport {
    pub case: CaseData,
    pub strategy: Strategy,
    pub infected: Vec<Person>,
    pub stats: RunStatistics,
    pub accepted: bool,
}

/// A case whose answer the judge rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedAttempt {
    pub case: CaseData,
    pub strategy: Strategy,
    pub infected: Vec<Person>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    pub cases: usize,
    pub failed: Vec<FailedAttempt>,
    pub total: RunStatistics,
}

impl SessionReport {
    pub fn record(&mut self, report: CaseReport) {
        self.cases += 1;
        self.total += report.stats;
        if !report.accepted {
            self.failed.push(FailedAttempt { case: report.case, strategy: report.strategy, infected: report.infected });
        }
    }

    /// True when every submitted answer was accepted.
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn log_summary(&self) {
        if !self.success() {
            warn!(failed = self.failed.len(), "there were some failed attempts");
            for attempt in &self.failed {
                warn!(
                    case = %attempt.case,
                    strategy = %attempt.strategy,
                    infected = %attempt.infected.iter().join(" "),
                    "failed attempt"
                );
            }
        }
        info!(
            cases = self.cases,
            group_tests = self.total.group_tests,
            person_tests = self.total.person_tests,
            "total needed tests: {}",
            self.total.tests()
        );
    }
}

/// Solves and submits one case. Only protocol failures are returned; a case
/// that aborts on a bad argument still submits what it found.
pub fn solve_case<J: Judge>(case: &CaseData, config: &SolverConfig, judge: J) -> Result<CaseReport, ProtocolError> {
    info!(%case, "starting case");
    let strategy = choose_strategy(case, config);
    info!(%strategy, "solving");

    let mut solver = CaseSolver::new(case, config, judge);
    match solver.solve(strategy) {
        Ok(()) => {}
        Err(SolveError::Action(err)) => error!(%err, "case aborted"),
        Err(SolveError::Protocol(err)) => return Err(err),
    }

    let infected = solver.infected.as_slice().to_vec();
    let stats = solver.stats;
    let mut judge = solver.into_judge();
    let accepted = judge.submit(&infected)?;
    if accepted {
        info!("answer accepted");
    } else {
        warn!(infected = %infected.iter().join(" "), "answer rejected");
    }
    info!(
        tests = stats.tests(),
        percent = %format!("{:.0}%", stats.percent_of(case.people_count)),
        "tests needed this case"
    );

    Ok(CaseReport { case: case.clone(), strategy, infected, stats, accepted })
}

/// Reads the problem count and runs every case the source announces.
pub fn run_session<T: CaseSource + Judge>(io: &mut T, config: &SolverConfig) -> Result<SessionReport, ProtocolError> {
    let problem_count = io.problem_count()?;
    let mut report = SessionReport::default();
    for index in 0..problem_count {
        info!("starting run {} out of {}", index + 1, problem_count);
        let case = io.next_case()?;
        let outcome = solve_case(&case, config, &mut *io)?;
        report.record(outcome);
    }
    report.log_summary();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::protocol::LineJudge;

    #[test]
    fn runs_a_scripted_session() {
        // one case, 3 people, nobody infected, bisect strategy
        let input = "1\n3 0 0 0.5\n0 1\nfalse\nsuccess\n";
        let mut io = LineJudge::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let report = run_session(&mut io, &SolverConfig::default()).unwrap();
        assert!(report.success());
        assert_eq!(report.cases, 1);
        assert_eq!(report.total.tests(), 1);
        let out = String::from_utf8(io.into_writer()).unwrap();
        assert_eq!(out, "test 0 1 2\nanswer \n");
    }

    #[test]
    fn rejected_answers_are_recorded() {
        let input = "2\n1 0 0 0.5\n0 1\ntrue\nnope\n1 0 0 0.5\n0 1\nfalse\nsuccess\n";
        let mut io = LineJudge::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let report = run_session(&mut io, &SolverConfig::default()).unwrap();
        assert_eq!(report.cases, 2);
        assert!(!report.success());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].infected, vec![0]);
        assert_eq!(report.failed[0].strategy, Strategy::Bisect);
    }

    #[test]
    fn bad_argument_aborts_only_its_case() {
        // case 1 goes to the fixed solver, which cannot use a group size of 0;
        // case 2 is small enough for bisection and is solved normally
        let config = SolverConfig { fixed_group_size: 0, ..SolverConfig::default() };
        let input = "2\n\
                     4 0 1 0.5\n1 2\nsuccess\n\
                     3 0 0 0.5\n0 1\ntrue\nfalse\ntrue\nsuccess\n";
        let mut io = LineJudge::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let report = run_session(&mut io, &config).unwrap();
        assert_eq!(report.cases, 2);
        assert!(report.success());
        let out = String::from_utf8(io.into_writer()).unwrap();
        assert_eq!(out, "answer \ntest 0 1 2\ntest 0\ntest 1\nanswer 1\n");
    }

    #[test]
    fn truncated_input_is_a_protocol_error() {
        let input = "1\n4 1 1 0.5\n1 1\n0 1\n";
        let mut io = LineJudge::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        assert!(run_session(&mut io, &SolverConfig::default()).is_err());
    }
}
