use crate::models::Prediction;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

/// One CSV line per stored prediction
#[derive(Debug, Serialize)]
struct PredictionRecord<'a> {
    id: i64,
    created_at: &'a str,
    league: &'a str,
    match_id: &'a str,
    id_kind: &'a str,
    home_team: &'a str,
    away_team: &'a str,
    best_pick: &'a str,
    market_type: String,
    selection: String,
    result: &'a str,
}

fn structured_field(prediction: &Prediction, key: &str) -> String {
    let block = prediction
        .payload
        .get("structured_prediction")
        .unwrap_or(&prediction.payload);
    match block.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Write predictions as CSV to any writer
pub fn write_predictions_csv<W: Write>(predictions: &[Prediction], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for prediction in predictions {
        let market_type = match structured_field(prediction, "market_type") {
            m if m.is_empty() => structured_field(prediction, "type"),
            m => m,
        };
        let selection = match structured_field(prediction, "selection") {
            s if s.is_empty() => structured_field(prediction, "target"),
            s => s,
        };

        csv_writer
            .serialize(PredictionRecord {
                id: prediction.id,
                created_at: &prediction.created_at,
                league: prediction.league.as_deref().unwrap_or(""),
                match_id: &prediction.match_id,
                id_kind: prediction.id_kind.as_str(),
                home_team: &prediction.home_team,
                away_team: &prediction.away_team,
                best_pick: prediction
                    .payload
                    .get("best_pick")
                    .and_then(|v| v.as_str())
                    .unwrap_or(""),
                market_type,
                selection,
                result: prediction.result.map(|r| r.as_str()).unwrap_or("Pending"),
            })
            .context("Failed to write CSV record")?;
    }

    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Save predictions to a CSV file
pub fn save_predictions_to_csv(predictions: &[Prediction], filename: &str) -> Result<()> {
    let file = std::fs::File::create(filename)
        .with_context(|| format!("Failed to create CSV file {}", filename))?;
    write_predictions_csv(predictions, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BetResult, MatchIdKind};
    use serde_json::json;

    fn prediction(id: i64, payload: serde_json::Value, result: Option<BetResult>) -> Prediction {
        Prediction {
            id,
            match_id: "704512".to_string(),
            id_kind: MatchIdKind::Event,
            home_team: "Arsenal".to_string(),
            away_team: "Chelsea, London".to_string(),
            league: Some("epl".to_string()),
            payload,
            result,
            created_at: "2025-01-05T12:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_write_predictions_csv() {
        let predictions = vec![
            prediction(
                1,
                json!({
                    "best_pick": "Over 2.5",
                    "structured_prediction": {"market_type": "over_under", "selection": "over", "line": 2.5}
                }),
                Some(BetResult::Win),
            ),
            prediction(
                2,
                json!({"structured_prediction": {"type": "winner", "target": "home"}}),
                None,
            ),
        ];

        let mut out = Vec::new();
        write_predictions_csv(&predictions, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,created_at,league,match_id"));
        assert!(lines[1].contains("over_under,over,Win"));
        // Commas inside values are quoted
        assert!(lines[1].contains("\"Chelsea, London\""));
        assert!(lines[2].ends_with("winner,home,Pending"));
    }
}
