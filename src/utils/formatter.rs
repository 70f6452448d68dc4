use crate::api::gemini_api::GenerationError;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_DISCLAIMER: &str =
    "This is AI-generated analysis based on historical patterns. Please use it wisely";

/// Public shape of a prediction answer, identical for success and failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(rename = "match")]
    pub fixture: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub best_pick: String,
    pub reasoning: Vec<String>,
    pub safer_alternative: String,
    pub disclaimer: String,
}

fn text_field(prediction: &Value, key: &str) -> Option<String> {
    prediction
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn format_prediction_response(
    prediction: &Result<Value, GenerationError>,
    home: &str,
    away: &str,
) -> PredictionResponse {
    let fixture = format!("{} vs {}", home, away);

    match prediction {
        Ok(prediction) => PredictionResponse {
            fixture: text_field(prediction, "match").unwrap_or(fixture),
            status: "success".to_string(),
            message: None,
            best_pick: text_field(prediction, "best_pick").unwrap_or_else(|| "N/A".to_string()),
            reasoning: prediction
                .get("reasoning")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            safer_alternative: text_field(prediction, "safer_alternative")
                .unwrap_or_else(|| "N/A".to_string()),
            disclaimer: text_field(prediction, "disclaimer")
                .unwrap_or_else(|| DEFAULT_DISCLAIMER.to_string()),
        },
        Err(e) => PredictionResponse {
            fixture,
            status: "error".to_string(),
            message: Some(e.to_string()),
            best_pick: "N/A".to_string(),
            reasoning: Vec::new(),
            safer_alternative: "N/A".to_string(),
            disclaimer: "Analysis could not be generated.".to_string(),
        },
    }
}

fn parse_utc(iso: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Some(dt.with_timezone(&Utc));
    }
    // The scoreboard feed drops seconds: 2025-12-30T19:30Z
    let naive = iso.trim_end_matches('Z');
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .map(|dt| dt.and_utc())
}

/// Kickoff time in West Africa Time (UTC+1, no daylight saving), e.g. "30 Dec, 08:30 PM".
/// Input that does not parse is returned unchanged.
pub fn to_nigerian_time(iso: &str) -> String {
    let iso = iso.trim();
    if iso.is_empty() {
        return String::new();
    }
    let (Some(utc), Some(wat)) = (parse_utc(iso), FixedOffset::east_opt(3600)) else {
        return iso.to_string();
    };
    utc.with_timezone(&wat).format("%d %b, %I:%M %p").to_string()
}
