use tracing::trace;

use crate::action::ActionError;
use crate::model::group::{CandidatePool, Group};
use crate::score::LevelScores;

/// Splits the candidates into disjoint groups of `group_size` using the
/// affinity scores: seed with the best pair, then grow with the most
/// connected remaining person. Once fewer than `group_size` remain they form
/// the last group as-is.
pub fn partition_scored(scores: &LevelScores, group_size: usize, candidates: &CandidatePool) -> Result<Vec<Group>, ActionError> {
    if group_size < 2 {
        return Err(ActionError::InvalidArgument("scored partitioning needs a group size of at least 2"));
    }

    let mut remaining = candidates.clone();
    let mut groups = Vec::new();
    while !remaining.is_empty() {
        if remaining.len() < group_size {
            groups.push(Group::new(remaining.into_iter().collect()));
            break;
        }

        let (a, b) = scores.pick_best_pair(&remaining)?;
        remaining.remove(&a);
        remaining.remove(&b);
        let mut members = vec![a, b];

        while members.len() < group_size {
            let next = scores.find_most_connected(&members, &remaining)?;
            remaining.remove(&next);
            members.push(next);
        }

        trace!(size = members.len(), cohesion = scores.cohesion(&members), "scored group");
        groups.push(Group::new(members));
    }
    Ok(groups)
}

/// Chunks the candidates in ascending id order. The last group may be smaller.
pub fn partition_fixed(candidates: &CandidatePool, group_size: usize) -> Result<Vec<Group>, ActionError> {
    if group_size < 1 {
        return Err(ActionError::InvalidArgument("group size must be at least 1"));
    }
    let ordered: Vec<_> = candidates.iter().copied().collect();
    Ok(ordered.chunks(group_size).map(|chunk| Group::new(chunk.to_vec())).collect())
}

/// Scored mode when scores were built and the groups hold at least a pair,
/// fixed chunking otherwise.
pub fn partition(scores: Option<&LevelScores>, group_size: usize, candidates: &CandidatePool) -> Result<Vec<Group>, ActionError> {
    match scores {
        Some(scores) if group_size >= 2 => partition_scored(scores, group_size, candidates),
        _ => partition_fixed(candidates, group_size),
    }
}
