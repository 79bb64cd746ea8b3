//! Request dispatch.
//!
//! Parses one inbound request string into (method, path, headers, body),
//! routes it to an operation against the player registry, and renders the
//! full response text: status line, fixed CORS headers, content type, blank
//! line, payload.
//!
//! The wire format is flat `"key":"value"` text, not a general-purpose JSON
//! document model; body fields are pulled out with a minimal tokenizer that
//! honors backslash escapes.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{info, warn};

use crate::calculate;
use crate::models::MatchRecord;
use crate::payload::{ArrayBuilder, PayloadBuilder};
use crate::registry::{PlayerRegistry, TOP_PERFORMERS_COUNT};
use crate::storage::PersistenceStore;

/// API error types. Each maps to a precise status line.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    PlayerNotFound(String),

    #[error("Endpoint not found: {method} {path}")]
    EndpointNotFound { method: String, path: String },

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
}

impl ApiError {
    fn status_line(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "HTTP/1.1 400 Bad Request",
            ApiError::PlayerNotFound(_) | ApiError::EndpointNotFound { .. } => {
                "HTTP/1.1 404 Not Found"
            }
            ApiError::MethodNotAllowed(_) => "HTTP/1.1 405 Method Not Allowed",
        }
    }
}

const STATUS_OK: &str = "HTTP/1.1 200 OK";

const CORS_HEADERS: &str = "Access-Control-Allow-Origin: *\r\n\
    Access-Control-Allow-Methods: GET, POST, PUT, DELETE, OPTIONS\r\n\
    Access-Control-Allow-Headers: Content-Type\r\n";

const PLAYERS_PATH: &str = "/api/players";
const PLAYERS_ID_PREFIX: &str = "/api/players/";

/// One parsed inbound request.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub version: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Parse an opaque request string.
///
/// A malformed request line yields empty method/path, which will fail to
/// match any route. Header lines without `": "` are silently skipped.
pub fn parse_request(raw: &str) -> Request {
    let mut lines = raw.split('\n');

    let mut request = Request::default();
    if let Some(first) = lines.next() {
        let mut tokens = first.split_whitespace();
        request.method = tokens.next().unwrap_or_default().to_string();
        request.path = tokens.next().unwrap_or_default().to_string();
        request.version = tokens.next().unwrap_or_default().to_string();
    }

    // Headers run until the first blank line (a bare "\r" after splitting)
    for line in lines.by_ref() {
        if line == "\r" || line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(": ") {
            let value = value.strip_suffix('\r').unwrap_or(value);
            request.headers.insert(key.to_string(), value.to_string());
        }
    }

    for line in lines {
        let line = line.strip_suffix('\r').unwrap_or(line);
        request.body.push_str(line);
        request.body.push('\n');
    }

    request
}

/// Pull one string field out of a flat `"key":"value"` body.
///
/// A missing key yields an empty string, not an error; each operation checks
/// emptiness for the fields it requires. Backslash escapes inside the value
/// are decoded, so values containing quotes survive.
pub fn extract_field(body: &str, key: &str) -> String {
    let needle = format!("\"{}\":\"", key);
    let Some(pos) = body.find(&needle) else {
        return String::new();
    };

    let mut value = String::new();
    let mut chars = body[pos + needle.len()..].chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return value,
            '\\' => match chars.next() {
                Some('"') => value.push('"'),
                Some('\\') => value.push('\\'),
                Some('n') => value.push('\n'),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => break,
            },
            _ => value.push(c),
        }
    }

    // Unterminated value reads the same as a missing key
    String::new()
}

/// Routes requests to registry operations and renders responses.
///
/// Owns the registry and the persistence store so that every mutation and
/// its paired save happen as one unit.
pub struct Dispatcher {
    registry: PlayerRegistry,
    store: PersistenceStore,
}

impl Dispatcher {
    pub fn new(registry: PlayerRegistry, store: PersistenceStore) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// Handle one raw request, returning the full response text.
    pub fn handle(&mut self, raw: &str) -> String {
        let request = parse_request(raw);
        info!(method = %request.method, path = %request.path, "request");

        // Protocol preflight: empty success, CORS headers only
        if request.method == "OPTIONS" {
            return frame(STATUS_OK, "");
        }

        match self.route(&request) {
            Ok(payload) => frame(STATUS_OK, &payload),
            Err(e) => {
                warn!(method = %request.method, path = %request.path, error = %e, "request failed");
                let payload = PayloadBuilder::new().string("error", &e.to_string()).build();
                frame(e.status_line(), &payload)
            }
        }
    }

    fn route(&mut self, request: &Request) -> Result<String, ApiError> {
        match (request.method.as_str(), request.path.as_str()) {
            ("GET", PLAYERS_PATH) => Ok(self.list_players()),
            ("GET", "/api/players/top") => Ok(self.top_performers()),
            ("GET", "/api/players/form") => Ok(self.players_in_form()),
            ("GET", "/api/stats") => Ok(self.team_stats()),
            ("POST", PLAYERS_PATH) => self.add_player(&request.body),
            ("POST", "/api/matches") => self.add_match(&request.body),
            ("DELETE", path) if path.starts_with(PLAYERS_ID_PREFIX) => self.delete_player(path),
            ("GET" | "POST" | "DELETE", path) => Err(ApiError::EndpointNotFound {
                method: request.method.clone(),
                path: path.to_string(),
            }),
            (method, _) => Err(ApiError::MethodNotAllowed(method.to_string())),
        }
    }

    fn list_players(&self) -> String {
        let mut players = ArrayBuilder::new();
        for player in self.registry.iter() {
            players.push(
                PayloadBuilder::new()
                    .number("id", player.id as i64)
                    .string("name", &player.name)
                    .string("role", &player.role)
                    .number("matches", player.total_matches() as i64)
                    .double("average", calculate::average_score(&player.matches))
                    .number("bestScore", calculate::best_score(&player.matches) as i64)
                    .boolean("inForm", calculate::is_in_form(&player.matches))
                    .build(),
            );
        }
        players.build()
    }

    fn top_performers(&self) -> String {
        let mut players = ArrayBuilder::new();
        for player in self.registry.top_performers(TOP_PERFORMERS_COUNT) {
            players.push(summary_payload(player));
        }
        players.build()
    }

    fn players_in_form(&self) -> String {
        let mut players = ArrayBuilder::new();
        for player in self.registry.players_in_form() {
            players.push(summary_payload(player));
        }
        players.build()
    }

    fn team_stats(&self) -> String {
        let mut roles = PayloadBuilder::new();
        for (role, average) in self.registry.role_averages() {
            roles = roles.double(&role, average);
        }

        PayloadBuilder::new()
            .number("totalPlayers", self.registry.len() as i64)
            .double("teamAverage", self.registry.team_average())
            .raw("roleAverages", &roles.build())
            .build()
    }

    fn add_player(&mut self, body: &str) -> Result<String, ApiError> {
        let name = extract_field(body, "name");
        let role = extract_field(body, "role");

        if name.is_empty() || role.is_empty() {
            return Err(ApiError::Validation(
                "name and role are required".to_string(),
            ));
        }

        self.registry.add_player(&name, &role);
        self.persist();

        Ok(PayloadBuilder::new()
            .string("message", "Player added successfully")
            .build())
    }

    fn add_match(&mut self, body: &str) -> Result<String, ApiError> {
        let player_name = extract_field(body, "playerName");
        let date = extract_field(body, "date");
        let score_text = extract_field(body, "score");
        let opponent = extract_field(body, "opponent");
        let venue = extract_field(body, "venue");
        let is_home = extract_field(body, "isHome") == "true";

        if player_name.is_empty() || date.is_empty() || score_text.is_empty() {
            return Err(ApiError::Validation(
                "playerName, date and score are required".to_string(),
            ));
        }

        let score: i32 = score_text.parse().map_err(|_| {
            ApiError::Validation(format!("score must be a number, got '{score_text}'"))
        })?;

        let record = MatchRecord::new(date, score, opponent, venue, is_home);
        if !self.registry.add_match(&player_name, record) {
            return Err(ApiError::PlayerNotFound(format!(
                "Player '{player_name}' not found"
            )));
        }
        self.persist();

        Ok(PayloadBuilder::new()
            .string("message", "Match statistics added successfully")
            .build())
    }

    fn delete_player(&mut self, path: &str) -> Result<String, ApiError> {
        let suffix = &path[PLAYERS_ID_PREFIX.len()..];
        let id: u32 = suffix
            .parse()
            .map_err(|_| ApiError::Validation(format!("invalid player id '{suffix}'")))?;

        if !self.registry.delete_by_id(id) {
            return Err(ApiError::PlayerNotFound(format!(
                "Player with ID {id} not found"
            )));
        }
        self.persist();

        Ok(PayloadBuilder::new()
            .string("message", "Player deleted successfully")
            .build())
    }

    /// Write-after-mutate. A save failure is reported to the operator but
    /// never fails the request; the in-memory mutation stands.
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.registry) {
            warn!(error = %e, path = %self.store.path().display(), "failed to persist registry");
        }
    }
}

fn frame(status_line: &str, payload: &str) -> String {
    format!("{status_line}\r\n{CORS_HEADERS}Content-Type: application/json\r\n\r\n{payload}")
}

fn summary_payload(player: &crate::models::Player) -> String {
    PayloadBuilder::new()
        .string("name", &player.name)
        .string("role", &player.role)
        .double("average", calculate::average_score(&player.matches))
        .build()
}
