pub mod entity {
    pub type Person = u32;
    pub type Score = f64;

    /// An undirected contact between two people. Repeated connections add up.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Connection(pub Person, pub Person);

    impl Connection {
        pub fn is_self_contact(&self) -> bool {
            self.0 == self.1
        }
    }

    impl From<(Person, Person)> for Connection {
        fn from((a, b): (Person, Person)) -> Self {
            Connection(a, b)
        }
    }
}


pub mod group {
    use std::collections::BTreeSet;
    use super::entity::Person;

    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Group {
        pub members: Vec<Person>,
    }

    impl Group {
        pub fn new(members: Vec<Person>) -> Group {
            Group { members }
        }
        pub fn len(&self) -> usize {
            self.members.len()
        }
        pub fn is_empty(&self) -> bool {
            self.members.is_empty()
        }
    }

    /// People neither cleared nor confirmed yet. Iterates in ascending id order.
    pub type CandidatePool = BTreeSet<Person>;

    /// Confirmed positives in discovery order. Only ever grows.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct InfectedSet {
        found: Vec<Person>,
    }

    impl InfectedSet {
        pub fn new() -> InfectedSet {
            InfectedSet::default()
        }
        pub fn insert(&mut self, person: Person) {
            if !self.found.contains(&person) {
                self.found.push(person);
            }
        }
        pub fn len(&self) -> usize {
            self.found.len()
        }
        pub fn is_empty(&self) -> bool {
            self.found.is_empty()
        }
        pub fn as_slice(&self) -> &[Person] {
            &self.found
        }
    }
}

pub mod case {
    use std::fmt;
    use super::entity::{Connection, Person};
    use super::group::CandidatePool;

    /// Everything the judge tells us about one test case.
    #[derive(Debug, Clone, PartialEq)]
    pub struct CaseData {
        pub people_count: usize,
        pub initial_infected: usize,
        pub spread_chance: f64,
        pub lower_bound: usize,
        pub upper_bound: usize,
        pub connections: Vec<Connection>,
    }

    impl CaseData {
        /// Ids `0..people_count`. Callers keep `people_count` within `Person`'s
        /// range; `LineJudge::next_case` rejects larger counts.
        pub fn everyone(&self) -> CandidatePool {
            (0..self.people_count as Person).collect()
        }
    }

    impl fmt::Display for CaseData {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "people={} connections={} initial_infected={} spread_chance={} bounds={}..={}",
                self.people_count,
                self.connections.len(),
                self.initial_infected,
                self.spread_chance,
                self.lower_bound,
                self.upper_bound,
            )
        }
    }
}
