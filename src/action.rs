use std::ops::{Add, AddAssign};
use thiserror::Error;
use itertools::Itertools;
use crate::model::entity::Person;
use crate::protocol::ProtocolError;

/// A single request sent to the judge.
#[derive(Debug, Clone, PartialEq)]
pub enum Request<'a> {
    Group(&'a [Person]),
    Person(Person),
    Answer(&'a [Person]),
}

impl<'a> Request<'a> {
    /// Renders the request line without the trailing newline.
    pub fn to_line(&self) -> String {
        match self {
            Request::Group(members) => format!("test {}", members.iter().join(" ")),
            Request::Person(person) => format!("test {}", person),
            Request::Answer(infected) => format!("answer {}", infected.iter().unique().join(" ")),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Whether a test pooled a group or checked one person on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKind {
    Group,
    Person,
}

/// Test counters for one case. Advisory only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub group_tests: usize,
    pub person_tests: usize,
}

impl RunStatistics {
    pub fn record(&mut self, kind: TestKind) {
        match kind {
            TestKind::Group => self.group_tests += 1,
            TestKind::Person => self.person_tests += 1,
        }
    }

    pub fn tests(&self) -> usize {
        self.group_tests + self.person_tests
    }

    /// Tests spent relative to the population, in percent.
    pub fn percent_of(&self, people_count: usize) -> f64 {
        if people_count == 0 {
            return 0.0;
        }
        self.tests() as f64 / people_count as f64 * 100.0
    }
}

impl Add for RunStatistics {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        RunStatistics {
            group_tests: self.group_tests + rhs.group_tests,
            person_tests: self.person_tests + rhs.person_tests,
        }
    }
}

impl AddAssign for RunStatistics {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
