//! Adaptive group testing against a line based judge.
//!
//! Contacts between people are turned into multi-level affinity scores
//! ([`score`]), which drive how candidates are pooled into test groups
//! ([`partition`]). Group sizes follow the information-optimal rule in
//! [`planner`]; the solvers in [`solver`] shrink the candidate pool round by
//! round until every infected person is known.

pub mod action;
pub mod config;
pub mod model;
pub mod partition;
pub mod planner;
pub mod protocol;
pub mod score;
pub mod session;
pub mod simulate;
pub mod solver;

pub use action::{ActionError, RunStatistics, SolveError, TestKind};
pub use config::{SolverConfig, Strategy};
pub use protocol::{Judge, LineJudge, ProtocolError};
pub use session::{run_session, solve_case, SessionReport};
