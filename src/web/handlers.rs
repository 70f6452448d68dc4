use super::views::{
    league_tabs, HtmlTemplate, PredictionView, SportsHistoryTemplate, SportsIndexTemplate,
    StatsTemplate,
};
use crate::api::espn_api::GameWindow;
use crate::api::leagues::ALL_LEAGUES;
use crate::errors::AppError;
use crate::models::{BetResult, NewPrediction};
use crate::utils::formatter::{format_prediction_response, PredictionResponse};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

const RECENT_PREDICTIONS: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct LeagueQuery {
    pub league: Option<String>,
}

impl LeagueQuery {
    fn league_or(&self, default: &str) -> String {
        self.league
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(default)
            .to_lowercase()
    }
}

pub async fn home(State(state): State<AppState>, Query(query): Query<LeagueQuery>) -> Response {
    let league = query.league_or("epl");
    let games = state
        .espn
        .fetch_games(&league, GameWindow::Upcoming, None)
        .await;

    HtmlTemplate(SportsIndexTemplate {
        active_page: "home".to_string(),
        leagues: league_tabs(&league),
        active_league: league,
        games,
    })
    .into_response()
}

pub async fn sports_index(
    State(state): State<AppState>,
    Query(query): Query<LeagueQuery>,
) -> Response {
    // A broken counter must not take the page down with it
    if let Err(e) = state.store.increment_visit().await {
        tracing::warn!("Failed to record visit: {e:#}");
    }

    let league = query.league_or(ALL_LEAGUES);
    let games = state
        .espn
        .fetch_games(&league, GameWindow::Upcoming, None)
        .await;

    HtmlTemplate(SportsIndexTemplate {
        active_page: "sports".to_string(),
        leagues: league_tabs(&league),
        active_league: league,
        games,
    })
    .into_response()
}

pub async fn history(State(state): State<AppState>, Query(query): Query<LeagueQuery>) -> Response {
    let league = query.league_or(ALL_LEAGUES);
    let games = state.espn.fetch_games(&league, GameWindow::Past, None).await;

    HtmlTemplate(SportsHistoryTemplate {
        active_page: "history".to_string(),
        leagues: league_tabs(&league),
        active_league: league,
        games,
    })
    .into_response()
}

pub async fn stats(State(state): State<AppState>) -> Result<Response, AppError> {
    let stats = state.store.get_stats().await?;
    let predictions = state
        .store
        .get_recent_predictions(RECENT_PREDICTIONS)
        .await?
        .iter()
        .map(PredictionView::from)
        .collect();

    Ok(HtmlTemplate(StatsTemplate {
        active_page: "stats".to_string(),
        stats,
        predictions,
    })
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub league: Option<String>,
    /// The browser sends either a string or a number
    pub event_id: Option<Value>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn event_id_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Generate a prediction and record it for later grading
pub async fn predict_and_save(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<Value>, AppError> {
    let (home, away) = match (non_empty(req.home_team), non_empty(req.away_team)) {
        (Some(home), Some(away)) => (home, away),
        _ => return Err(AppError::BadRequest("Missing team data".to_string())),
    };
    let league = non_empty(req.league);

    let prediction = state
        .generator
        .generate(&home, &away, league.as_deref().unwrap_or(""))
        .await?;

    let new_prediction = NewPrediction::new(
        event_id_text(req.event_id),
        &home,
        &away,
        league,
        prediction.clone(),
    );

    // The caller still gets the prediction when persisting it fails
    match state.store.save_prediction(&new_prediction).await {
        Ok(id) => tracing::info!(
            prediction_id = id,
            match_id = %new_prediction.match_id,
            "Saved prediction"
        ),
        Err(e) => tracing::error!("Failed to save prediction for {} vs {}: {e:#}", home, away),
    }

    Ok(Json(prediction))
}

#[derive(Debug, Deserialize)]
pub struct ApiPredictRequest {
    pub home: Option<String>,
    pub away: Option<String>,
    pub league: Option<String>,
}

/// Stateless prediction in the public response shape; nothing is stored
pub async fn api_predict(
    State(state): State<AppState>,
    Json(req): Json<ApiPredictRequest>,
) -> Result<Json<PredictionResponse>, AppError> {
    let (home, away, league) = match (
        non_empty(req.home),
        non_empty(req.away),
        non_empty(req.league),
    ) {
        (Some(home), Some(away), Some(league)) => (home, away, league),
        _ => {
            return Err(AppError::BadRequest(
                "Missing required fields: home, away, league".to_string(),
            ))
        }
    };

    let prediction = state.generator.generate(&home, &away, &league).await;
    if let Err(e) = &prediction {
        tracing::warn!("Prediction failed for {} vs {}: {}", home, away, e);
    }

    Ok(Json(format_prediction_response(&prediction, &home, &away)))
}

pub async fn test_api(State(state): State<AppState>) -> Response {
    match state.generator.ping().await {
        Ok(text) => Json(json!({ "status": "success", "response": text })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "message": e.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateResultRequest {
    pub id: Option<i64>,
    pub result: Option<String>,
}

/// Manual override of a prediction's result, graded or not
pub async fn update_result(
    State(state): State<AppState>,
    Json(req): Json<UpdateResultRequest>,
) -> Result<Json<Value>, AppError> {
    let (id, result) = match (req.id, req.result) {
        (Some(id), Some(result)) => (id, result),
        _ => return Err(AppError::BadRequest("Missing data".to_string())),
    };
    let result: BetResult = result
        .parse()
        .map_err(|e: anyhow::Error| AppError::BadRequest(e.to_string()))?;

    if !state.store.override_prediction_result(id, result).await? {
        return Err(AppError::NotFound(format!("Prediction {} not found", id)));
    }
    tracing::info!(prediction_id = id, result = %result, "Result overridden");

    Ok(Json(json!({ "success": true })))
}

pub async fn reset_stats(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.store.reset().await?;
    tracing::info!("Statistics reset");
    Ok(Json(json!({ "success": true })))
}

/// Run one grading pass now
pub async fn check_results(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let updated = state.grader.grade_all().await?;
    Ok(Json(json!({ "updated": updated })))
}
