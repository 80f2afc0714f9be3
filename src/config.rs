use std::fmt;
use std::str::FromStr;

/// Which solver handles a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Pick per case from the population and infected bounds.
    #[default]
    Auto,
    Adaptive,
    Fixed,
    Bisect,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Strategy::Auto),
            "adaptive" => Ok(Strategy::Adaptive),
            "fixed" => Ok(Strategy::Fixed),
            "bisect" => Ok(Strategy::Bisect),
            other => Err(format!("unknown strategy {:?}", other)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Auto => "auto",
            Strategy::Adaptive => "adaptive",
            Strategy::Fixed => "fixed",
            Strategy::Bisect => "bisect",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Spread levels in the affinity map; grouping reads the last one.
    pub levels: usize,
    /// Largest population for which the affinity map is built.
    pub score_guard: usize,
    /// Largest population the binary-split solver is used for.
    pub bisect_threshold: usize,
    pub fixed_group_size: usize,
    /// Adaptive solving only pays off above this initial group size.
    pub adaptive_min_group_size: usize,
    /// Consecutive empty response lines tolerated; `None` waits forever.
    pub max_empty_reads: Option<usize>,
    pub strategy: Strategy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            levels: 3,
            score_guard: 1100,
            bisect_threshold: 10,
            fixed_group_size: 4,
            adaptive_min_group_size: 4,
            max_empty_reads: Some(10_000),
            strategy: Strategy::Auto,
        }
    }
}
