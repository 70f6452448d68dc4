use crate::api::leagues::{ALL_LEAGUES, LEAGUES};
use crate::models::{Game, Prediction, SiteStats};
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

// Custom filters for formatting
mod filters {
    pub fn to_wat<T: std::fmt::Display>(value: T) -> ::askama::Result<String> {
        Ok(crate::utils::formatter::to_nigerian_time(&value.to_string()))
    }
}

/// Entry in the league switcher
#[derive(Debug, Clone)]
pub struct LeagueTab {
    pub code: String,
    pub name: String,
    pub active: bool,
}

pub fn league_tabs(active_league: &str) -> Vec<LeagueTab> {
    std::iter::once((ALL_LEAGUES, "All Leagues"))
        .chain(LEAGUES.iter().map(|l| (l.code, l.name)))
        .map(|(code, name)| LeagueTab {
            code: code.to_string(),
            name: name.to_string(),
            active: code.eq_ignore_ascii_case(active_league),
        })
        .collect()
}

/// Prediction row as shown on the stats page
#[derive(Debug, Clone)]
pub struct PredictionView {
    pub id: i64,
    pub created_at: String,
    pub fixture: String,
    pub league: String,
    pub best_pick: String,
    pub result: String,
    pub result_class: String,
}

impl From<&Prediction> for PredictionView {
    fn from(p: &Prediction) -> Self {
        let (result, result_class) = match p.result {
            Some(r) => (r.to_string(), r.as_str().to_lowercase()),
            None => ("Pending".to_string(), "pending".to_string()),
        };

        Self {
            id: p.id,
            created_at: p.created_at.clone(),
            fixture: format!("{} vs {}", p.home_team, p.away_team),
            league: p.league.clone().unwrap_or_default(),
            best_pick: p
                .payload
                .get("best_pick")
                .and_then(|v| v.as_str())
                .unwrap_or("N/A")
                .to_string(),
            result,
            result_class,
        }
    }
}

#[derive(Template)]
#[template(path = "sports_index.html")]
pub struct SportsIndexTemplate {
    pub active_page: String,
    pub active_league: String,
    pub leagues: Vec<LeagueTab>,
    pub games: Vec<Game>,
}

#[derive(Template)]
#[template(path = "sports_history.html")]
pub struct SportsHistoryTemplate {
    pub active_page: String,
    pub active_league: String,
    pub leagues: Vec<LeagueTab>,
    pub games: Vec<Game>,
}

#[derive(Template)]
#[template(path = "stats.html")]
pub struct StatsTemplate {
    pub active_page: String,
    pub stats: SiteStats,
    pub predictions: Vec<PredictionView>,
}

pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BetResult, MatchIdKind};

    #[test]
    fn test_league_tabs() {
        let tabs = league_tabs("epl");
        assert_eq!(tabs.len(), LEAGUES.len() + 1);
        assert_eq!(tabs[0].code, "all");
        assert!(tabs.iter().filter(|t| t.active).all(|t| t.code == "epl"));
    }

    #[test]
    fn test_prediction_view() {
        let prediction = Prediction {
            id: 7,
            match_id: "704512".into(),
            id_kind: MatchIdKind::Event,
            home_team: "Arsenal".into(),
            away_team: "Chelsea".into(),
            league: None,
            payload: serde_json::json!({"best_pick": "Arsenal to win"}),
            result: Some(BetResult::Loss),
            created_at: "2025-01-05T12:00:00Z".into(),
        };
        let view = PredictionView::from(&prediction);
        assert_eq!(view.fixture, "Arsenal vs Chelsea");
        assert_eq!(view.best_pick, "Arsenal to win");
        assert_eq!(view.result, "Loss");
        assert_eq!(view.result_class, "loss");
    }
}
