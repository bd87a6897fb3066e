//! Lineups, deduplication and ranking.

use std::collections::HashSet;

/// One roster produced by a solve.
///
/// `players` keeps the order in which the solver reported them; equality
/// between lineups is decided by [`key`](Self::key), which ignores order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lineup {
    /// Sum of projection + boost over members.
    pub score: f64,
    /// Member identifiers.
    pub players: Vec<String>,
    /// Sum of member salaries.
    pub salary: u64,
}

impl Lineup {
    pub fn new(players: Vec<String>, score: f64, salary: u64) -> Self {
        Self {
            score,
            players,
            salary,
        }
    }

    /// Canonical identity: member ids sorted lexicographically, comma-joined.
    pub fn key(&self) -> String {
        let mut ids: Vec<&str> = self.players.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids.join(",")
    }

    pub fn contains(&self, id: &str) -> bool {
        self.players.iter().any(|p| p == id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Number of members of `self` that are not in `other`.
    pub fn difference(&self, other: &Lineup) -> usize {
        self.players.iter().filter(|p| !other.contains(p)).count()
    }
}

/// Accepted lineups of a run, unique by [`Lineup::key`].
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    lineups: Vec<Lineup>,
    keys: HashSet<String>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a lineup unless an equal one is already present.
    ///
    /// Returns `false` for duplicates.
    pub fn insert(&mut self, lineup: Lineup) -> bool {
        if !self.keys.insert(lineup.key()) {
            return false;
        }
        self.lineups.push(lineup);
        true
    }

    /// Accepted lineups in acceptance order.
    pub fn lineups(&self) -> &[Lineup] {
        &self.lineups
    }

    pub fn len(&self) -> usize {
        self.lineups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lineups.is_empty()
    }

    /// Final output: deduplicated, best score first, at most `count` long.
    pub fn into_ranked(self, count: usize) -> Vec<Lineup> {
        rank(self.lineups, count)
    }
}

/// Drops every lineup whose key was already seen, keeping first occurrences.
pub fn dedup(lineups: Vec<Lineup>) -> Vec<Lineup> {
    let mut seen = HashSet::with_capacity(lineups.len());
    lineups
        .into_iter()
        .filter(|l| seen.insert(l.key()))
        .collect()
}

/// Deduplicates, sorts by score descending and truncates to `count`.
///
/// Ties keep their discovery order.
pub fn rank(lineups: Vec<Lineup>, count: usize) -> Vec<Lineup> {
    let mut out = dedup(lineups);
    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out.truncate(count);
    out
}
