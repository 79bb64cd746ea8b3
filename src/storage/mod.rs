//! Flat-file persistence for the player registry.
//!
//! The registry is written wholesale after every mutation and read once at
//! startup. The format is line-oriented and pipe-delimited:
//!
//! ```text
//! <playerCount>
//! <id>|<name>|<role>|<matchCount>
//! <date>|<score>|<opponent>|<venue>|<isHome:0-or-1>
//! ```
//!
//! Fields containing `|`, `\` or a newline are backslash-escaped; all other
//! fields are written verbatim so existing data files stay human-diffable.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::models::{MatchRecord, Player};
use crate::registry::PlayerRegistry;

/// Errors that can occur during persistence operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt persisted state at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },
}

impl StorageError {
    fn corrupt(line: usize, reason: impl Into<String>) -> Self {
        StorageError::Corrupt {
            line,
            reason: reason.into(),
        }
    }
}

/// Escape one field for the pipe-delimited format.
fn escape_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '|' => out.push_str("\\|"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Split a line into fields on unescaped pipes, undoing field escapes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('|') => current.push('|'),
                Some('\\') => current.push('\\'),
                Some('n') => current.push('\n'),
                Some(other) => {
                    // Unknown escape: keep it verbatim rather than drop data
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            '|' => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Wholesale save/load of a [`PlayerRegistry`] to one data file.
#[derive(Debug, Clone)]
pub struct PersistenceStore {
    path: PathBuf,
}

impl PersistenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the data file with the current registry contents.
    pub fn save(&self, registry: &PlayerRegistry) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "{}", registry.len())?;
        for player in registry.iter() {
            writeln!(
                writer,
                "{}|{}|{}|{}",
                player.id,
                escape_field(&player.name),
                escape_field(&player.role),
                player.matches.len()
            )?;
            for m in &player.matches {
                writeln!(
                    writer,
                    "{}|{}|{}|{}|{}",
                    escape_field(&m.date),
                    m.score,
                    escape_field(&m.opponent),
                    escape_field(&m.venue),
                    if m.is_home { 1 } else { 0 }
                )?;
            }
        }
        writer.flush()?;

        debug!(players = registry.len(), path = %self.path.display(), "registry saved");
        Ok(())
    }

    /// Read the registry back from disk.
    ///
    /// An absent file is a normal cold start and yields an empty registry.
    /// A present but malformed file is a [`StorageError::Corrupt`].
    pub fn load(&self) -> Result<PlayerRegistry, StorageError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no data file found, starting fresh");
                return Ok(PlayerRegistry::new());
            }
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut lines = reader.lines().enumerate();

        let mut next_line = |expected: &str| -> Result<(usize, String), StorageError> {
            match lines.next() {
                Some((index, Ok(line))) => Ok((index + 1, line)),
                Some((_, Err(e))) => Err(e.into()),
                None => Err(StorageError::corrupt(0, format!("unexpected end of file, expected {expected}"))),
            }
        };

        let (line_no, header) = next_line("player count")?;
        let player_count: usize = header
            .trim()
            .parse()
            .map_err(|_| StorageError::corrupt(line_no, format!("invalid player count '{header}'")))?;

        let mut players = Vec::with_capacity(player_count);
        for _ in 0..player_count {
            let (line_no, line) = next_line("player record")?;
            let fields = split_fields(&line);
            if fields.len() != 4 {
                return Err(StorageError::corrupt(
                    line_no,
                    format!("expected 4 player fields, got {}", fields.len()),
                ));
            }

            let id: u32 = fields[0]
                .parse()
                .map_err(|_| StorageError::corrupt(line_no, format!("invalid player id '{}'", fields[0])))?;
            let match_count: usize = fields[3]
                .parse()
                .map_err(|_| StorageError::corrupt(line_no, format!("invalid match count '{}'", fields[3])))?;

            let mut player = Player::new(id, fields[1].clone(), fields[2].clone());
            for _ in 0..match_count {
                let (line_no, line) = next_line("match record")?;
                player.record_match(parse_match(line_no, &line)?);
            }
            players.push(player);
        }

        info!(players = players.len(), path = %self.path.display(), "registry loaded");
        Ok(PlayerRegistry::from_players(players))
    }
}

fn parse_match(line_no: usize, line: &str) -> Result<MatchRecord, StorageError> {
    let fields = split_fields(line);
    if fields.len() != 5 {
        return Err(StorageError::corrupt(
            line_no,
            format!("expected 5 match fields, got {}", fields.len()),
        ));
    }

    let score: i32 = fields[1]
        .parse()
        .map_err(|_| StorageError::corrupt(line_no, format!("invalid score '{}'", fields[1])))?;

    let is_home = match fields[4].as_str() {
        "1" => true,
        "0" => false,
        other => {
            return Err(StorageError::corrupt(
                line_no,
                format!("invalid home flag '{other}'"),
            ))
        }
    };

    Ok(MatchRecord::new(
        fields[0].clone(),
        score,
        fields[2].clone(),
        fields[3].clone(),
        is_home,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample_registry() -> PlayerRegistry {
        let mut registry = PlayerRegistry::new();
        registry.add_player("Joe Root", "Batsman");
        registry.add_player("Pat Cummins", "Bowler");
        registry.add_match(
            "Joe Root",
            MatchRecord::new(
                "2026-06-12".to_string(),
                118,
                "Australia".to_string(),
                "Lord's".to_string(),
                true,
            ),
        );
        registry.add_match(
            "Joe Root",
            MatchRecord::new(
                "2026-06-19".to_string(),
                34,
                "Australia".to_string(),
                "Edgbaston".to_string(),
                false,
            ),
        );
        registry
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let store = PersistenceStore::new(dir.path().join("players.dat"));

        let registry = sample_registry();
        store.save(&registry).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.len(), registry.len());
        for (saved, restored) in registry.iter().zip(loaded.iter()) {
            assert_eq!(saved, restored);
        }
    }

    #[test]
    fn test_round_trip_delimiters_in_fields() {
        let dir = tempdir().unwrap();
        let store = PersistenceStore::new(dir.path().join("players.dat"));

        let mut registry = PlayerRegistry::new();
        registry.add_player("A|B\\C", "All|rounder");
        registry.add_match(
            "A|B\\C",
            MatchRecord::new(
                "2026-01-01".to_string(),
                12,
                "Rest|of|World".to_string(),
                "Neutral \\ Ground".to_string(),
                false,
            ),
        );

        store.save(&registry).unwrap();
        let loaded = store.load().unwrap();

        let player = loaded.find_by_name("A|B\\C").expect("player survives");
        assert_eq!(player.role, "All|rounder");
        assert_eq!(player.matches[0].opponent, "Rest|of|World");
        assert_eq!(player.matches[0].venue, "Neutral \\ Ground");
    }

    #[test]
    fn test_load_missing_file_is_cold_start() {
        let dir = tempdir().unwrap();
        let store = PersistenceStore::new(dir.path().join("missing.dat"));

        let registry = store.load().unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_loaded_registry_resumes_ids() {
        let dir = tempdir().unwrap();
        let store = PersistenceStore::new(dir.path().join("players.dat"));

        store.save(&sample_registry()).unwrap();
        let mut loaded = store.load().unwrap();

        // Two players were saved with ids 1 and 2
        assert_eq!(loaded.add_player("New Signing", "Batsman").id, 3);
    }

    #[test]
    fn test_load_rejects_bad_count_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("players.dat");
        std::fs::write(&path, "not-a-number\n").unwrap();

        let err = PersistenceStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { line: 1, .. }));
    }

    #[test]
    fn test_load_rejects_wrong_field_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("players.dat");
        std::fs::write(&path, "1\n1|OnlyTwoFields\n").unwrap();

        let err = PersistenceStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { line: 2, .. }));
    }

    #[test]
    fn test_load_rejects_truncated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("players.dat");
        // Header claims 2 matches but only 1 follows
        std::fs::write(&path, "1\n1|A|Batsman|2\n2026-01-01|10|B|C|1\n").unwrap();

        let err = PersistenceStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn test_load_rejects_bad_home_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("players.dat");
        std::fs::write(&path, "1\n1|A|Batsman|1\n2026-01-01|10|B|C|yes\n").unwrap();

        let err = PersistenceStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { line: 3, .. }));
    }

    #[test]
    fn test_plain_fields_written_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("players.dat");
        let store = PersistenceStore::new(&path);

        store.save(&sample_registry()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();

        assert_eq!(
            contents,
            "2\n\
             1|Joe Root|Batsman|2\n\
             2026-06-12|118|Australia|Lord's|1\n\
             2026-06-19|34|Australia|Edgbaston|0\n\
             2|Pat Cummins|Bowler|0\n"
        );
    }

    #[test]
    fn test_split_fields_escapes() {
        assert_eq!(split_fields("a\\|b|c"), vec!["a|b", "c"]);
        assert_eq!(split_fields("a\\\\|b"), vec!["a\\", "b"]);
        assert_eq!(split_fields("plain"), vec!["plain"]);
    }
}
