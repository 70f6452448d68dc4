use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a match as reported by the scoreboard feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Pre,
    In,
    Post,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Pre => "pre",
            GameStatus::In => "in",
            GameStatus::Post => "post",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side took the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Home,
    Away,
    Draw,
}

/// Final score of a finished match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub home_score: u32,
    pub away_score: u32,
    pub winner: Winner,
}

impl GameResult {
    pub fn total(&self) -> u32 {
        self.home_score + self.away_score
    }
}

/// Answer from the results gateway for a single event.
/// Scores only exist once the match is finished.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultLookup {
    Finished(GameResult),
    NotFinished(GameStatus),
    Unavailable,
}

/// Graded outcome of a stored prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetResult {
    Win,
    Loss,
    Void,
}

impl BetResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetResult::Win => "Win",
            BetResult::Loss => "Loss",
            BetResult::Void => "Void",
        }
    }
}

impl fmt::Display for BetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetResult {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "win" => Ok(BetResult::Win),
            "loss" => Ok(BetResult::Loss),
            "void" => Ok(BetResult::Void),
            other => anyhow::bail!("Unknown bet result: {}", other),
        }
    }
}

/// How a stored match id was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchIdKind {
    /// Real event id from the scoreboard feed
    Event,
    /// Synthetic "{home}-{away}-{league}" key, cannot be looked up
    Composite,
}

impl MatchIdKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchIdKind::Event => "event",
            MatchIdKind::Composite => "composite",
        }
    }

    /// Rows written before the kind was recorded carry no marker.
    /// Feed event ids are purely numeric, anything else is treated as composite.
    pub fn infer(match_id: &str) -> Self {
        if !match_id.is_empty() && match_id.chars().all(|c| c.is_ascii_digit()) {
            MatchIdKind::Event
        } else {
            MatchIdKind::Composite
        }
    }

    pub fn parse_or_infer(stored: Option<&str>, match_id: &str) -> Self {
        match stored {
            Some("event") => MatchIdKind::Event,
            Some("composite") => MatchIdKind::Composite,
            _ => Self::infer(match_id),
        }
    }
}

/// A persisted prediction for one match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: i64,
    pub match_id: String,
    pub id_kind: MatchIdKind,
    pub home_team: String,
    pub away_team: String,
    pub league: Option<String>,
    pub payload: serde_json::Value,
    pub result: Option<BetResult>,
    pub created_at: String,
}

/// A prediction about to be stored
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub match_id: String,
    pub id_kind: MatchIdKind,
    pub home_team: String,
    pub away_team: String,
    pub league: Option<String>,
    pub payload: serde_json::Value,
}

impl NewPrediction {
    /// Predictions made without a feed event id get a composite key
    pub fn new(
        event_id: Option<String>,
        home_team: &str,
        away_team: &str,
        league: Option<String>,
        payload: serde_json::Value,
    ) -> Self {
        let (match_id, id_kind) = match event_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => (id.trim().to_string(), MatchIdKind::Event),
            None => (
                format!(
                    "{}-{}-{}",
                    home_team,
                    away_team,
                    league.as_deref().unwrap_or("unknown")
                ),
                MatchIdKind::Composite,
            ),
        };

        Self {
            match_id,
            id_kind,
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            league,
            payload,
        }
    }
}

/// Aggregate counters shown on the stats page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteStats {
    pub total_visits: i64,
    pub total_predictions: i64,
    pub win_rate: i64,
    pub total_graded: i64,
}

impl SiteStats {
    pub fn from_counts(total_visits: i64, total_predictions: i64, wins: i64, graded: i64) -> Self {
        let win_rate = if graded > 0 { wins * 100 / graded } else { 0 };
        Self {
            total_visits,
            total_predictions,
            win_rate,
            total_graded: graded,
        }
    }
}

/// One side of a scoreboard listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamLine {
    pub name: String,
    pub logo: String,
    pub score: String,
    pub winner: bool,
}

/// A match as listed on the scoreboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub date: String,
    pub status: GameStatus,
    pub status_detail: String,
    pub home_team: TeamLine,
    pub away_team: TeamLine,
    pub league: String,
    pub league_name: String,
}

impl Game {
    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Post
    }

    pub fn is_live(&self) -> bool {
        self.status == GameStatus::In
    }
}
