/// ln 2, rounded the way the sizing rule has always used it.
pub const LN_2: f64 = 0.693;

/// Information-optimal group size for binary group testing.
///
/// Prevalence is estimated from the midpoint of the infected bounds. Returns
/// `None` for an empty population; otherwise at least 1. A zero estimate
/// saturates to `usize::MAX`, i.e. the whole pool forms one group.
pub fn optimal_group_size(lower_bound: usize, upper_bound: usize, population: usize) -> Option<usize> {
    if population == 0 {
        return None;
    }
    let average_infected = (lower_bound as f64 + upper_bound as f64) / 2.0;
    let prevalence = average_infected / population as f64;
    let size = (LN_2 / prevalence).round() as usize;
    Some(size.max(1))
}
