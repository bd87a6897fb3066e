//! Player pool.
//!
//! An immutable, id-indexed view over the validated players of one slate.
//! Raw records are validated exactly once when the pool is built; every
//! later query works on typed [`Player`] values.

mod player;

pub use player::{Player, PlayerRecord};

use crate::error::RecordError;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Validated players for a single generation run.
#[derive(Debug, Clone, Default)]
pub struct PlayerPool {
    players: Vec<Player>,
    index: HashMap<String, usize>,
    rejected: Vec<RecordError>,
}

impl PlayerPool {
    /// Builds a pool from already-validated players.
    ///
    /// Later duplicates of an identifier are dropped.
    pub fn new(players: impl IntoIterator<Item = Player>) -> Self {
        let mut pool = Self::default();
        for player in players {
            pool.push(player);
        }
        pool
    }

    /// Validates raw records and builds a pool from the ones that pass.
    ///
    /// Rejected rows are logged and kept in [`rejected`](Self::rejected);
    /// rejection is filtering, never a failure of the whole slate.
    pub fn from_records(records: impl IntoIterator<Item = PlayerRecord>) -> Self {
        let mut pool = Self::default();
        for record in records {
            match Player::try_from(record) {
                Ok(player) => pool.push(player),
                Err(e) => {
                    warn!(error = %e, "dropping player record");
                    pool.rejected.push(e);
                }
            }
        }
        pool
    }

    fn push(&mut self, player: Player) {
        if self.index.contains_key(&player.id) {
            let e = RecordError::DuplicateId(player.id);
            warn!(error = %e, "dropping player record");
            self.rejected.push(e);
            return;
        }
        self.index.insert(player.id.clone(), self.players.len());
        self.players.push(player);
    }

    /// Looks up a player by identifier.
    pub fn get(&self, id: &str) -> Option<&Player> {
        self.index.get(id).map(|&i| &self.players[i])
    }

    /// Number of players (eligible or not).
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Iterates players in input order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Records that failed validation while building the pool.
    pub fn rejected(&self) -> &[RecordError] {
        &self.rejected
    }

    /// Identifiers carrying the eliminate flag.
    pub fn eliminated_ids(&self) -> HashSet<String> {
        self.players
            .iter()
            .filter(|p| p.eliminate)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Identifiers carrying the lock flag that are actually selectable.
    ///
    /// A locked but eliminated (or unprojected) player is not returned.
    pub fn locked_ids(&self) -> HashSet<String> {
        self.players
            .iter()
            .filter(|p| p.lock && p.is_selectable())
            .map(|p| p.id.clone())
            .collect()
    }

    /// Players eligible for the next model: selectable and not in `excluded`.
    pub fn eligible(&self, excluded: &HashSet<String>) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| p.is_selectable() && !excluded.contains(&p.id))
            .collect()
    }

    /// Sum of salaries for the given identifiers (unknown ids count as 0).
    pub fn salary_of<'a>(&self, ids: impl IntoIterator<Item = &'a String>) -> u64 {
        ids.into_iter()
            .filter_map(|id| self.get(id))
            .map(|p| p.salary as u64)
            .sum()
    }
}
