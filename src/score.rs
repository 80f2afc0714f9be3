use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::action::ActionError;
use crate::model::entity::{Connection, Person, Score};


/// Affinity weights for one spread level. A missing entry reads as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelScores {
    rows: BTreeMap<Person, BTreeMap<Person, Score>>,
}

impl LevelScores {
    pub fn get_pair(&self, ids: [Person; 2]) -> Score {
        let [a, b] = ids;
        self.directed(a, b)
            .or_else(|| self.directed(b, a))
            .unwrap_or(0.0)
    }

    fn directed(&self, a: Person, b: Person) -> Option<Score> {
        self.rows.get(&a)?.get(&b).copied()
    }

    fn add(&mut self, a: Person, b: Person, weight: Score) {
        *self.rows.entry(a).or_default().entry(b).or_insert(0.0) += weight;
    }

    /// Sum of the pairwise weights inside a group.
    pub fn cohesion(&self, members: &[Person]) -> Score {
        members.iter().combinations(2).map(|pair| {
            self.get_pair([*pair[0], *pair[1]])
        }).sum()
    }

    /// Number of stored (directed) entries.
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest weighted pair with both ends available.
    ///
    /// Entries are scanned in ascending `(a, b)` order and only a strictly
    /// better weight replaces the current best, so ties go to the lowest pair.
    /// If no stored entry lies inside `available`, the two lowest available
    /// ids are returned.
    pub fn pick_best_pair(&self, available: &BTreeSet<Person>) -> Result<(Person, Person), ActionError> {
        let mut lowest = available.iter().copied();
        let (first, second) = match (lowest.next(), lowest.next()) {
            (Some(first), Some(second)) => (first, second),
            _ => return Err(ActionError::InvalidArgument("size of available persons must be at least 2")),
        };

        let mut best = (first, second);
        let mut best_score = -1.0;
        for (&a, row) in self.rows.iter().filter(|(a, _)| available.contains(*a)) {
            for (&b, &score) in row.iter() {
                if a != b && available.contains(&b) && score > best_score {
                    best = (a, b);
                    best_score = score;
                }
            }
        }
        Ok(best)
    }

    /// The available person with the largest summed weight towards `group`.
    /// Ties go to the lowest id.
    pub fn find_most_connected(&self, group: &[Person], available: &BTreeSet<Person>) -> Result<Person, ActionError> {
        let mut best = None;
        let mut best_score = -1.0;
        for &candidate in available {
            let score: Score = group.iter().map(|&member| self.get_pair([member, candidate])).sum();
            if score > best_score {
                best = Some(candidate);
                best_score = score;
            }
        }
        best.ok_or(ActionError::InvalidArgument("available must not be empty"))
    }
}

/// Multi-level affinity between people, built once per case from the
/// contact list and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AffinityMap {
    levels: Vec<LevelScores>,
}

impl AffinityMap {
    /// Level 0 adds `spread_rate` per direct contact. Level `L` starts as a
    /// copy of level `L - 1` and then adds `w(a, b) * w(b, c) * spread_rate^L`
    /// to `(a, c)` for every two-step path through `b`.
    pub fn build(connections: &[Connection], levels: usize, spread_rate: f64) -> Result<AffinityMap, ActionError> {
        if levels < 1 {
            return Err(ActionError::InvalidArgument("levels must be at least 1"));
        }

        let mut direct = LevelScores::default();
        for conn in connections.iter().filter(|conn| !conn.is_self_contact()) {
            direct.add(conn.0, conn.1, spread_rate);
            direct.add(conn.1, conn.0, spread_rate);
        }

        let mut built = Vec::with_capacity(levels);
        built.push(direct);
        for level in 1..levels {
            let previous = &built[level - 1];
            let factor = spread_rate.powi(level as i32);
            let mut next = previous.clone();
            for (&a, row) in previous.rows.iter() {
                for (&b, &weight) in row.iter().filter(|(_, w)| **w != 0.0) {
                    let Some(b_row) = previous.rows.get(&b) else { continue };
                    for (&c, &weight2) in b_row.iter() {
                        next.add(a, c, weight * weight2 * factor);
                    }
                }
            }
            built.push(next);
        }

        Ok(AffinityMap { levels: built })
    }

    pub fn level(&self, level: usize) -> Option<&LevelScores> {
        self.levels.get(level)
    }

    /// The most propagated level, which grouping reads from.
    pub fn top(&self) -> &LevelScores {
        // `build` guarantees at least one level
        &self.levels[self.levels.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }
}
