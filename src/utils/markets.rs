//! Normalizes stored prediction payloads into a typed bet and grades it
//! against a final score.
//!
//! Two payload shapes are in the wild:
//!
//! ```json
//! {"structured_prediction": {"market_type": "over_under", "selection": "Over", "line": 2.5}}
//! {"structured_prediction": {"type": "winner", "target": "home"}}
//! ```

use crate::models::{BetResult, GameResult, Winner};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Why a payload cannot be graded. These leave the prediction pending.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("payload has no structured prediction")]
    MissingStructure,
    #[error("structured prediction has no market type")]
    MissingMarket,
    #[error("unknown market type: {0}")]
    UnknownMarket(String),
    #[error("structured prediction has no selection")]
    MissingSelection,
    #[error("over/under prediction has no numeric line")]
    MissingLine,
}

/// Both the current and the legacy field names, all optional
#[derive(Debug, Default, Deserialize)]
struct RawStructuredPrediction {
    market_type: Option<String>,
    #[serde(rename = "type")]
    legacy_type: Option<String>,
    selection: Option<Value>,
    target: Option<Value>,
    line: Option<Value>,
}

/// A bet in one normalized shape. Selections are trimmed and lowercased.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketBet {
    Moneyline { selection: String },
    OverUnder { selection: String, line: f64 },
    DoubleChance { selection: String },
}

fn value_as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn value_as_line(value: &Value) -> Option<f64> {
    let line: f64 = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    line.is_finite().then_some(line)
}

impl MarketBet {
    /// Pull the bet out of a stored payload. The structured block normally sits
    /// under `structured_prediction`; a payload that is itself the block is also
    /// accepted. Team names are used to map a moneyline pick given by name.
    pub fn from_payload(
        payload: &Value,
        home_team: &str,
        away_team: &str,
    ) -> Result<Self, PayloadError> {
        let block = match payload.get("structured_prediction") {
            Some(Value::Object(_)) => &payload["structured_prediction"],
            Some(_) => return Err(PayloadError::MissingStructure),
            None if payload.is_object() => payload,
            None => return Err(PayloadError::MissingStructure),
        };

        let raw: RawStructuredPrediction =
            serde_json::from_value(block.clone()).map_err(|_| PayloadError::MissingStructure)?;

        let market = raw
            .market_type
            .or(raw.legacy_type)
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .ok_or(PayloadError::MissingMarket)?;

        let selection = raw
            .selection
            .as_ref()
            .and_then(value_as_text)
            .or_else(|| raw.target.as_ref().and_then(value_as_text))
            .map(|s| s.to_lowercase())
            .ok_or(PayloadError::MissingSelection)?;

        match market.as_str() {
            "moneyline" | "winner" | "match_winner" | "1x2" => Ok(MarketBet::Moneyline {
                selection: moneyline_alias(&selection, home_team, away_team),
            }),
            "over_under" | "totals" | "total" => {
                let line = raw
                    .line
                    .as_ref()
                    .and_then(value_as_line)
                    .ok_or(PayloadError::MissingLine)?;
                Ok(MarketBet::OverUnder { selection, line })
            }
            "double_chance" => Ok(MarketBet::DoubleChance { selection }),
            _ => Err(PayloadError::UnknownMarket(market)),
        }
    }
}

fn moneyline_alias(selection: &str, home_team: &str, away_team: &str) -> String {
    match selection {
        "1" => "home".to_string(),
        "2" => "away".to_string(),
        "x" => "draw".to_string(),
        s if !home_team.is_empty() && s == home_team.trim().to_lowercase() => "home".to_string(),
        s if !away_team.is_empty() && s == away_team.trim().to_lowercase() => "away".to_string(),
        s => s.to_string(),
    }
}

fn parse_side(selection: &str) -> Option<Winner> {
    match selection {
        "home" => Some(Winner::Home),
        "away" => Some(Winner::Away),
        "draw" => Some(Winner::Draw),
        _ => None,
    }
}

/// The two outcomes a double chance code covers
fn double_chance_cover(code: &str) -> Option<[Winner; 2]> {
    match code {
        "1x" => Some([Winner::Home, Winner::Draw]),
        "x2" => Some([Winner::Draw, Winner::Away]),
        "12" => Some([Winner::Home, Winner::Away]),
        _ => None,
    }
}

/// Grade a bet against a finished match.
/// Void only when the market is known but the selection is not.
pub fn resolve(bet: &MarketBet, result: &GameResult) -> BetResult {
    match bet {
        MarketBet::Moneyline { selection } => match parse_side(selection) {
            Some(side) if side == result.winner => BetResult::Win,
            Some(_) => BetResult::Loss,
            None => BetResult::Void,
        },
        MarketBet::OverUnder { selection, line } => {
            let total = result.total() as f64;
            let won = match selection.as_str() {
                "over" => total > *line,
                "under" => total < *line,
                _ => return BetResult::Void,
            };
            if won {
                BetResult::Win
            } else {
                BetResult::Loss
            }
        }
        MarketBet::DoubleChance { selection } => match double_chance_cover(selection) {
            Some(cover) if cover.contains(&result.winner) => BetResult::Win,
            Some(_) => BetResult::Loss,
            None => BetResult::Void,
        },
    }
}
