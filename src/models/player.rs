//! Player and match record models.

/// Lowest score a match record may carry.
pub const MIN_SCORE: i32 = 0;

/// Highest score a match record may carry.
pub const MAX_SCORE: i32 = 1000;

/// One match outcome for a player. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// Match date, kept as an opaque string (e.g. "2026-08-01").
    pub date: String,

    /// Runs scored, clamped by callers to [MIN_SCORE, MAX_SCORE].
    pub score: i32,

    /// Opposing team name.
    pub opponent: String,

    /// Ground the match was played at.
    pub venue: String,

    /// Whether the match was played at the player's home ground.
    pub is_home: bool,
}

impl MatchRecord {
    pub fn new(date: String, score: i32, opponent: String, venue: String, is_home: bool) -> Self {
        Self {
            date,
            score,
            opponent,
            venue,
            is_home,
        }
    }
}

/// A tracked player and their full match history.
///
/// Ids are unique within a registry and never reused. The match list grows
/// only by append; insertion order is chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub role: String,
    pub matches: Vec<MatchRecord>,
}

impl Player {
    pub fn new(id: u32, name: String, role: String) -> Self {
        Self {
            id,
            name,
            role,
            matches: Vec::new(),
        }
    }

    /// Append a match to the history.
    pub fn record_match(&mut self, record: MatchRecord) {
        self.matches.push(record);
    }

    pub fn total_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn home_matches(&self) -> usize {
        self.matches.iter().filter(|m| m.is_home).count()
    }

    pub fn away_matches(&self) -> usize {
        self.total_matches() - self.home_matches()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: i32, is_home: bool) -> MatchRecord {
        MatchRecord::new(
            "2026-05-01".to_string(),
            score,
            "Kent".to_string(),
            "Lord's".to_string(),
            is_home,
        )
    }

    #[test]
    fn test_record_match_appends_in_order() {
        let mut player = Player::new(1, "Joe Root".to_string(), "Batsman".to_string());
        player.record_match(record(50, true));
        player.record_match(record(80, false));

        assert_eq!(player.total_matches(), 2);
        assert_eq!(player.matches[0].score, 50);
        assert_eq!(player.matches[1].score, 80);
    }

    #[test]
    fn test_home_away_counts() {
        let mut player = Player::new(1, "Joe Root".to_string(), "Batsman".to_string());
        player.record_match(record(50, true));
        player.record_match(record(80, false));
        player.record_match(record(20, false));

        assert_eq!(player.home_matches(), 1);
        assert_eq!(player.away_matches(), 2);
    }

    #[test]
    fn test_new_player_has_no_matches() {
        let player = Player::new(7, "Pat Cummins".to_string(), "Bowler".to_string());
        assert_eq!(player.total_matches(), 0);
        assert_eq!(player.home_matches(), 0);
        assert_eq!(player.away_matches(), 0);
    }
}
