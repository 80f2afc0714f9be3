use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use thiserror::Error;
use tracing::{trace, warn};

use crate::action::Request;
use crate::model::case::CaseData;
use crate::model::entity::{Connection, Person};

pub const POSITIVE: &str = "true";
pub const ACCEPTED: &str = "success";

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("judge closed the stream while we were waiting for {0}")]
    Closed(&'static str),
    #[error("no response after {0} empty lines")]
    Silent(usize),
    #[error("could not parse {what} from {token:?}")]
    Parse { what: &'static str, token: String },
    #[error("{what} {value} is out of range")]
    OutOfRange { what: &'static str, value: usize },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// The other side of the test protocol.
pub trait Judge {
    /// Tests a pooled group; positive if anyone in it is infected.
    fn test(&mut self, group: &[Person]) -> Result<bool, ProtocolError>;
    /// Submits the final answer; true if the judge accepts it.
    fn submit(&mut self, infected: &[Person]) -> Result<bool, ProtocolError>;
}

impl<J: Judge + ?Sized> Judge for &mut J {
    fn test(&mut self, group: &[Person]) -> Result<bool, ProtocolError> {
        (**self).test(group)
    }
    fn submit(&mut self, infected: &[Person]) -> Result<bool, ProtocolError> {
        (**self).submit(infected)
    }
}

/// Source of case descriptions.
pub trait CaseSource {
    fn problem_count(&mut self) -> Result<usize, ProtocolError>;
    fn next_case(&mut self) -> Result<CaseData, ProtocolError>;
}

/// Line based judge: requests on `writer`, responses and case data on `reader`.
pub struct LineJudge<R, W> {
    reader: R,
    writer: W,
    tokens: VecDeque<String>,
    max_empty_reads: Option<usize>,
}

impl<R: BufRead, W: Write> LineJudge<R, W> {
    pub fn new(reader: R, writer: W) -> LineJudge<R, W> {
        LineJudge { reader, writer, tokens: VecDeque::new(), max_empty_reads: None }
    }

    pub fn with_max_empty_reads(mut self, limit: Option<usize>) -> Self {
        self.max_empty_reads = limit;
        self
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn read_line(&mut self, waiting_for: &'static str) -> Result<String, ProtocolError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(ProtocolError::Closed(waiting_for));
        }
        Ok(line.trim().to_string())
    }

    fn read_token<T: FromStr>(&mut self, what: &'static str) -> Result<T, ProtocolError> {
        while self.tokens.is_empty() {
            let line = self.read_line(what)?;
            self.tokens.extend(line.split_whitespace().map(str::to_string));
        }
        let token = self.tokens.pop_front().unwrap_or_default();
        token.parse().map_err(|_| ProtocolError::Parse { what, token })
    }

    /// Reads the next non-empty line. Empty lines are skipped, at most
    /// `max_empty_reads` of them in a row when a limit is set.
    fn read_response(&mut self, waiting_for: &'static str) -> Result<String, ProtocolError> {
        if let Some(leftover) = self.tokens.pop_front() {
            let mut response = leftover;
            for token in self.tokens.drain(..) {
                response.push(' ');
                response.push_str(&token);
            }
            return Ok(response);
        }

        let mut empty = 0;
        loop {
            let line = self.read_line(waiting_for)?;
            if !line.is_empty() {
                return Ok(line);
            }
            empty += 1;
            if let Some(limit) = self.max_empty_reads {
                if empty >= limit {
                    warn!(empty, "judge keeps sending empty lines");
                    return Err(ProtocolError::Silent(empty));
                }
            }
        }
    }

    fn send(&mut self, request: Request<'_>) -> Result<(), ProtocolError> {
        let line = request.to_line();
        trace!(%line, "request");
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> Judge for LineJudge<R, W> {
    fn test(&mut self, group: &[Person]) -> Result<bool, ProtocolError> {
        if group.is_empty() {
            return Ok(false);
        }
        let request = match group {
            [person] => Request::Person(*person),
            _ => Request::Group(group),
        };
        self.send(request)?;
        Ok(self.read_response("a test result")? == POSITIVE)
    }

    fn submit(&mut self, infected: &[Person]) -> Result<bool, ProtocolError> {
        self.send(Request::Answer(infected))?;
        Ok(self.read_response("the answer verdict")? == ACCEPTED)
    }
}

impl<R: BufRead, W: Write> CaseSource for LineJudge<R, W> {
    fn problem_count(&mut self) -> Result<usize, ProtocolError> {
        self.read_token("the problem count")
    }

    fn next_case(&mut self) -> Result<CaseData, ProtocolError> {
        let people_count: usize = self.read_token("people count")?;
        if Person::try_from(people_count).is_err() {
            return Err(ProtocolError::OutOfRange { what: "people count", value: people_count });
        }
        let connection_count: usize = self.read_token("connection count")?;
        let initial_infected = self.read_token("initial infected count")?;
        let spread_chance = self.read_token("spread chance")?;
        let lower_bound = self.read_token("lower bound")?;
        let upper_bound = self.read_token("upper bound")?;
        let mut connections = Vec::with_capacity(connection_count);
        for _ in 0..connection_count {
            let a = self.read_token("connection endpoint")?;
            let b = self.read_token("connection endpoint")?;
            connections.push(Connection(a, b));
        }
        Ok(CaseData { people_count, initial_infected, spread_chance, lower_bound, upper_bound, connections })
    }
}
