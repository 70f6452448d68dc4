use crate::api::leagues::{find_league, League, ALL_LEAGUES, LEAGUES};
use crate::api::ResultsGateway;
use crate::models::{Game, GameResult, GameStatus, ResultLookup, TeamLine, Winner};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use futures_util::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

pub const DEFAULT_BASE_URL: &str = "https://site.api.espn.com/apis/site/v2/sports";

const UPCOMING_DAYS: i64 = 14;
const PAST_DAYS: i64 = 30;

/// Which slice of the scoreboard to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameWindow {
    /// Today through the next two weeks, not yet finished
    Upcoming,
    /// The last thirty days, finished only
    Past,
}

impl GameWindow {
    /// `dates` query value in the feed's `YYYYMMDD-YYYYMMDD` range format
    pub fn date_range(&self, today: NaiveDate) -> String {
        let (start, end) = match self {
            GameWindow::Upcoming => (today, today + Duration::days(UPCOMING_DAYS)),
            GameWindow::Past => (today - Duration::days(PAST_DAYS), today),
        };
        format!("{}-{}", start.format("%Y%m%d"), end.format("%Y%m%d"))
    }

    pub fn keeps(&self, status: GameStatus) -> bool {
        match self {
            GameWindow::Upcoming => matches!(status, GameStatus::Pre | GameStatus::In),
            GameWindow::Past => status == GameStatus::Post,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScoreboardResponse {
    #[serde(default)]
    events: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct EspnEvent {
    id: String,
    date: String,
    status: EspnStatus,
    #[serde(default)]
    competitions: Vec<EspnCompetition>,
}

#[derive(Debug, Deserialize)]
struct EspnStatus {
    #[serde(rename = "type")]
    kind: EspnStatusType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnStatusType {
    state: GameStatus,
    #[serde(default)]
    short_detail: String,
}

#[derive(Debug, Deserialize)]
struct EspnCompetition {
    #[serde(default)]
    status: Option<EspnStatus>,
    #[serde(default)]
    competitors: Vec<EspnCompetitor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnCompetitor {
    home_away: String,
    team: EspnTeam,
    #[serde(default, deserialize_with = "flexible_score")]
    score: Option<String>,
    #[serde(default)]
    winner: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnTeam {
    display_name: String,
    #[serde(default)]
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    header: Option<SummaryHeader>,
}

#[derive(Debug, Deserialize)]
struct SummaryHeader {
    #[serde(default)]
    competitions: Vec<EspnCompetition>,
}

/// Scores show up as "2", 2, or {"value": 2.0, "displayValue": "2"} depending on the endpoint
fn flexible_score<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(match n.as_u64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        }),
        Value::Object(map) => map
            .get("displayValue")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }))
}

fn parse_score(score: Option<&str>) -> u32 {
    let Some(raw) = score.map(str::trim) else {
        return 0;
    };
    raw.parse::<u32>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|f| f.max(0.0) as u32))
        .unwrap_or(0)
}

fn split_sides(
    competitors: &[EspnCompetitor],
) -> Option<(&EspnCompetitor, &EspnCompetitor)> {
    let home = competitors.iter().find(|c| c.home_away == "home")?;
    let away = competitors.iter().find(|c| c.home_away == "away")?;
    Some((home, away))
}

fn team_line(competitor: &EspnCompetitor) -> TeamLine {
    TeamLine {
        name: competitor.team.display_name.clone(),
        logo: competitor.team.logo.clone().unwrap_or_default(),
        score: competitor.score.clone().unwrap_or_else(|| "0".to_string()),
        winner: competitor.winner.unwrap_or(false),
    }
}

/// Turn a scoreboard body into listing records.
/// Events that do not parse are dropped one by one.
pub fn parse_scoreboard(body: Value, league: &League) -> Vec<Game> {
    let scoreboard: ScoreboardResponse = match serde_json::from_value(body) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(league = league.code, error = %e, "Malformed scoreboard body");
            return Vec::new();
        }
    };

    scoreboard
        .events
        .into_iter()
        .filter_map(|raw| {
            let event: EspnEvent = match serde_json::from_value(raw) {
                Ok(event) => event,
                Err(e) => {
                    tracing::debug!(league = league.code, error = %e, "Skipping malformed event");
                    return None;
                }
            };
            let competition = event.competitions.first()?;
            let (home, away) = split_sides(&competition.competitors)?;

            Some(Game {
                id: event.id.clone(),
                date: event.date.clone(),
                status: event.status.kind.state,
                status_detail: event.status.kind.short_detail.clone(),
                home_team: team_line(home),
                away_team: team_line(away),
                league: league.code.to_string(),
                league_name: league.name.to_string(),
            })
        })
        .collect()
}

/// Turn a single-event summary body into a result lookup
pub fn parse_summary(body: Value) -> ResultLookup {
    let summary: SummaryResponse = match serde_json::from_value(body) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed summary body");
            return ResultLookup::Unavailable;
        }
    };

    let Some(competition) = summary.header.and_then(|h| h.competitions.into_iter().next())
    else {
        return ResultLookup::Unavailable;
    };
    let Some(status) = competition.status.as_ref() else {
        return ResultLookup::Unavailable;
    };
    if status.kind.state != GameStatus::Post {
        return ResultLookup::NotFinished(status.kind.state);
    }
    let Some((home, away)) = split_sides(&competition.competitors) else {
        return ResultLookup::Unavailable;
    };

    let home_score = parse_score(home.score.as_deref());
    let away_score = parse_score(away.score.as_deref());
    let winner = if home.winner == Some(true) {
        Winner::Home
    } else if away.winner == Some(true) {
        Winner::Away
    } else if home_score > away_score {
        Winner::Home
    } else if away_score > home_score {
        Winner::Away
    } else {
        Winner::Draw
    };

    ResultLookup::Finished(GameResult {
        home_score,
        away_score,
        winner,
    })
}

/// Client for the public ESPN site API
pub struct EspnClient {
    client: Client,
    base_url: String,
}

impl EspnClient {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build scoreboard HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn league_url(&self, league: &League, endpoint: &str) -> String {
        format!("{}/{}/{}/{}", self.base_url, league.sport, league.slug, endpoint)
    }

    async fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Scoreboard API returned error: {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse scoreboard response")
    }

    /// List games for one league, or every league when `league_code` is "all".
    /// Feed failures produce an empty list.
    pub async fn fetch_games(
        &self,
        league_code: &str,
        window: GameWindow,
        dates: Option<&str>,
    ) -> Vec<Game> {
        if league_code.eq_ignore_ascii_case(ALL_LEAGUES) {
            let per_league = join_all(
                LEAGUES
                    .iter()
                    .map(|league| self.fetch_league_games(league, window, dates)),
            )
            .await;

            let mut games: Vec<Game> = per_league.into_iter().flatten().collect();
            sort_games(&mut games, window);
            return games;
        }

        match find_league(league_code) {
            Some(league) => self.fetch_league_games(league, window, dates).await,
            None => {
                tracing::warn!(league = league_code, "Unknown league requested");
                Vec::new()
            }
        }
    }

    async fn fetch_league_games(
        &self,
        league: &League,
        window: GameWindow,
        dates: Option<&str>,
    ) -> Vec<Game> {
        let range = match dates {
            Some(d) => d.to_string(),
            None => window.date_range(Local::now().date_naive()),
        };
        let url = self.league_url(league, "scoreboard");

        let body = match self.get_json(&url, &[("dates", range.as_str())]).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(league = league.code, error = %e, "Scoreboard fetch failed");
                return Vec::new();
            }
        };

        // The feed can repeat an event across date buckets
        let mut unique: HashMap<String, Game> = HashMap::new();
        for game in parse_scoreboard(body, league) {
            unique.insert(game.id.clone(), game);
        }

        let mut games: Vec<Game> = unique
            .into_values()
            .filter(|g| window.keeps(g.status))
            .collect();
        sort_games(&mut games, window);
        games
    }

    /// Final score for one event, or why it is not available yet
    pub async fn fetch_finished_game(&self, event_id: &str, league_code: &str) -> ResultLookup {
        let Some(league) = find_league(league_code) else {
            tracing::debug!(league = league_code, "No league configuration, skipping lookup");
            return ResultLookup::Unavailable;
        };
        let url = self.league_url(league, "summary");

        match self.get_json(&url, &[("event", event_id)]).await {
            Ok(body) => parse_summary(body),
            Err(e) => {
                tracing::warn!(
                    event_id,
                    league = league.code,
                    error = %e,
                    "Summary fetch failed"
                );
                ResultLookup::Unavailable
            }
        }
    }
}

fn sort_games(games: &mut [Game], window: GameWindow) {
    games.sort_by(|a, b| a.date.cmp(&b.date));
    if window == GameWindow::Past {
        games.reverse();
    }
}

#[async_trait]
impl ResultsGateway for EspnClient {
    fn league_codes(&self) -> Vec<String> {
        crate::api::leagues::league_codes()
    }

    async fn fetch_result(&self, match_id: &str, league_code: &str) -> ResultLookup {
        self.fetch_finished_game(match_id, league_code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(state: &str, home: Value, away: Value) -> Value {
        json!({
            "header": {
                "competitions": [{
                    "status": { "type": { "state": state, "shortDetail": "FT" } },
                    "competitors": [home, away]
                }]
            }
        })
    }

    fn side(home_away: &str, name: &str, score: Value, winner: bool) -> Value {
        json!({
            "homeAway": home_away,
            "team": { "displayName": name },
            "score": score,
            "winner": winner
        })
    }

    #[test]
    fn test_parse_summary_home_win() {
        let body = summary(
            "post",
            side("home", "Arsenal", json!("3"), true),
            side("away", "Chelsea", json!("1"), false),
        );
        assert_eq!(
            parse_summary(body),
            ResultLookup::Finished(GameResult {
                home_score: 3,
                away_score: 1,
                winner: Winner::Home
            })
        );
    }

    #[test]
    fn test_parse_summary_draw_without_flags() {
        let body = summary(
            "post",
            side("home", "Arsenal", json!(2), false),
            side("away", "Chelsea", json!({"value": 2.0, "displayValue": "2"}), false),
        );
        match parse_summary(body) {
            ResultLookup::Finished(result) => {
                assert_eq!(result.winner, Winner::Draw);
                assert_eq!(result.total(), 4);
            }
            other => panic!("unexpected lookup: {:?}", other),
        }
    }

    #[test]
    fn test_parse_summary_in_progress() {
        let body = summary(
            "in",
            side("home", "Arsenal", json!("0"), false),
            side("away", "Chelsea", json!("0"), false),
        );
        assert_eq!(
            parse_summary(body),
            ResultLookup::NotFinished(GameStatus::In)
        );
    }

    #[test]
    fn test_parse_summary_malformed() {
        assert_eq!(parse_summary(json!({})), ResultLookup::Unavailable);
        assert_eq!(parse_summary(json!({"header": []})), ResultLookup::Unavailable);
        assert_eq!(
            parse_summary(json!({"header": {"competitions": []}})),
            ResultLookup::Unavailable
        );
    }

    #[test]
    fn test_parse_scoreboard_skips_bad_events() {
        let league = find_league("epl").unwrap();
        let body = json!({
            "events": [
                {
                    "id": "1001",
                    "date": "2025-12-30T19:30Z",
                    "status": { "type": { "state": "pre", "shortDetail": "Tue 7:30 PM" } },
                    "competitions": [{
                        "competitors": [
                            { "homeAway": "home", "team": { "displayName": "Arsenal", "logo": "a.png" } },
                            { "homeAway": "away", "team": { "displayName": "Chelsea" }, "score": "0" }
                        ]
                    }]
                },
                { "id": "1002", "date": "2025-12-30T19:30Z" },
                {
                    "id": "1003",
                    "date": "2025-12-31T19:30Z",
                    "status": { "type": { "state": "pre" } },
                    "competitions": [{ "competitors": [] }]
                }
            ]
        });

        let games = parse_scoreboard(body, league);
        assert_eq!(games.len(), 1);
        let game = &games[0];
        assert_eq!(game.id, "1001");
        assert_eq!(game.home_team.name, "Arsenal");
        assert_eq!(game.home_team.logo, "a.png");
        assert_eq!(game.home_team.score, "0");
        assert_eq!(game.league_name, "Premier League");
        assert!(!game.is_finished());
    }

    #[test]
    fn test_game_window() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(GameWindow::Upcoming.date_range(today), "20250110-20250124");
        assert_eq!(GameWindow::Past.date_range(today), "20241211-20250110");
        assert!(GameWindow::Upcoming.keeps(GameStatus::In));
        assert!(!GameWindow::Upcoming.keeps(GameStatus::Post));
        assert!(GameWindow::Past.keeps(GameStatus::Post));
    }

    #[tokio::test]
    async fn test_unknown_league_is_unavailable() {
        let client =
            EspnClient::new("http://127.0.0.1:9", std::time::Duration::from_millis(200)).unwrap();
        assert_eq!(
            client.fetch_finished_game("401", "mls").await,
            ResultLookup::Unavailable
        );
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_games_live() {
        let client =
            EspnClient::new(DEFAULT_BASE_URL, std::time::Duration::from_secs(10)).unwrap();
        let games = client.fetch_games("epl", GameWindow::Past, None).await;
        println!("Found {} finished EPL games", games.len());
        assert!(games.iter().all(|g| g.is_finished()));
    }
}
