//! The in-memory player registry.
//!
//! Authoritative ordered collection of all players for the running process.
//! Owns its players by value and owns the id counter, so id assignment is
//! deterministic per registry instance.

use std::collections::BTreeMap;

use crate::calculate;
use crate::models::{MatchRecord, Player};

/// How many players the top-performers endpoint returns.
pub const TOP_PERFORMERS_COUNT: usize = 5;

/// Ordered collection of players. Insertion order is preserved everywhere:
/// iteration, role filters, and the remainder after a deletion.
#[derive(Debug, Default, Clone)]
pub struct PlayerRegistry {
    players: Vec<Player>,
    next_id: u32,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from already-persisted players.
    ///
    /// The id counter resumes after the highest loaded id so that ids are
    /// never reused across a restart.
    pub fn from_players(players: Vec<Player>) -> Self {
        let next_id = players.iter().map(|p| p.id).max().unwrap_or(0);
        Self { players, next_id }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Add a new player with a freshly assigned id. Always succeeds.
    pub fn add_player(&mut self, name: &str, role: &str) -> &Player {
        self.next_id += 1;
        let index = self.players.len();
        self.players
            .push(Player::new(self.next_id, name.to_string(), role.to_string()));
        &self.players[index]
    }

    /// Append a match to the first player whose name matches exactly.
    /// Returns false when no such player exists.
    pub fn add_match(&mut self, player_name: &str, record: MatchRecord) -> bool {
        match self.players.iter_mut().find(|p| p.name == player_name) {
            Some(player) => {
                player.record_match(record);
                true
            }
            None => false,
        }
    }

    /// First player with the given name, if any. Case-sensitive exact match.
    pub fn find_by_name(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn find_by_id(&self, id: u32) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// All players with the given role, in registry order.
    pub fn players_by_role(&self, role: &str) -> Vec<&Player> {
        self.players.iter().filter(|p| p.role == role).collect()
    }

    /// Remove the player with the given id, preserving the order of the
    /// remainder. Returns whether a player was removed.
    pub fn delete_by_id(&mut self, id: u32) -> bool {
        match self.players.iter().position(|p| p.id == id) {
            Some(index) => {
                self.players.remove(index);
                true
            }
            None => false,
        }
    }

    /// The `count` players with the highest average scores, descending.
    /// Ties keep registry order (stable sort).
    pub fn top_performers(&self, count: usize) -> Vec<&Player> {
        let mut ranked: Vec<&Player> = self.players.iter().collect();
        ranked.sort_by(|a, b| {
            let avg_a = calculate::average_score(&a.matches);
            let avg_b = calculate::average_score(&b.matches);
            avg_b.partial_cmp(&avg_a).unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(count);
        ranked
    }

    /// Players currently in form, in registry order.
    pub fn players_in_form(&self) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| calculate::is_in_form(&p.matches))
            .collect()
    }

    /// Mean of each player's own average score (an average of averages, not
    /// a weighted average over all matches). Zero when the registry is empty.
    pub fn team_average(&self) -> f64 {
        if self.players.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .players
            .iter()
            .map(|p| calculate::average_score(&p.matches))
            .sum();
        total / self.players.len() as f64
    }

    /// For each distinct role, the mean of the average scores of players
    /// with that role. Roles iterate in sorted order.
    pub fn role_averages(&self) -> BTreeMap<String, f64> {
        let mut totals: BTreeMap<String, (f64, u32)> = BTreeMap::new();

        for player in &self.players {
            let entry = totals.entry(player.role.clone()).or_insert((0.0, 0));
            entry.0 += calculate::average_score(&player.matches);
            entry.1 += 1;
        }

        totals
            .into_iter()
            .map(|(role, (total, count))| (role, total / count as f64))
            .collect()
    }
}
