//! Statistics calculation engine.
//!
//! Pure functions computing derived metrics from a player's match history:
//! - Best and average scores
//! - Home/away splits
//! - Recent performance trend and the in-form heuristic
//!
//! Everything here is recomputed on demand; nothing is cached.

use crate::models::MatchRecord;

/// Number of recent matches the in-form check looks at.
pub const FORM_WINDOW: usize = 3;

/// Default window for the recent-performance trend.
pub const TREND_WINDOW: usize = 5;

/// Highest score across all matches. Zero when no matches have been played.
pub fn best_score(matches: &[MatchRecord]) -> i32 {
    matches.iter().map(|m| m.score).max().unwrap_or(0)
}

/// Arithmetic mean of all scores. Zero when no matches have been played.
pub fn average_score(matches: &[MatchRecord]) -> f64 {
    if matches.is_empty() {
        return 0.0;
    }
    let total: i64 = matches.iter().map(|m| m.score as i64).sum();
    total as f64 / matches.len() as f64
}

/// Mean score over home matches only. Zero when there are none.
pub fn home_average(matches: &[MatchRecord]) -> f64 {
    subset_average(matches, true)
}

/// Mean score over away matches only. Zero when there are none.
pub fn away_average(matches: &[MatchRecord]) -> f64 {
    subset_average(matches, false)
}

fn subset_average(matches: &[MatchRecord], is_home: bool) -> f64 {
    let mut total: i64 = 0;
    let mut count: u32 = 0;
    for m in matches.iter().filter(|m| m.is_home == is_home) {
        total += m.score as i64;
        count += 1;
    }

    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// The last `count` scores in chronological order. Returns fewer when the
/// player has played fewer than `count` matches.
pub fn recent_performance(matches: &[MatchRecord], count: usize) -> Vec<i32> {
    let start = matches.len().saturating_sub(count);
    matches[start..].iter().map(|m| m.score).collect()
}

/// Whether a player is in form: the mean of the last three scores strictly
/// exceeds the overall average. Always false under three matches.
///
/// Deliberately simple momentum heuristic, kept as-is for compatibility
/// with existing consumers.
pub fn is_in_form(matches: &[MatchRecord]) -> bool {
    if matches.len() < FORM_WINDOW {
        return false;
    }

    let recent = recent_performance(matches, FORM_WINDOW);
    let recent_avg = recent.iter().map(|&s| s as i64).sum::<i64>() as f64 / recent.len() as f64;

    recent_avg > average_score(matches)
}
