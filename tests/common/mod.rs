use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use safepick::api::espn_api::EspnClient;
use safepick::api::gemini_api::{GenerationError, PredictionGenerator};
use safepick::config::AppConfig;
use safepick::db::{PredictionStore, SqlStore};
use safepick::models::{
    BetResult, GameResult, MatchIdKind, NewPrediction, Prediction, ResultLookup, SiteStats,
    Winner,
};
use safepick::{AppState, ResultsGateway};

/// In-memory store that counts every write attempt.
#[derive(Default)]
pub struct FakeStore {
    pub predictions: Mutex<Vec<Prediction>>,
    pub update_calls: AtomicUsize,
    pub visits: AtomicUsize,
    pub fail_reads: bool,
    /// Ids whose grading write errors until removed
    pub fail_writes_for: Mutex<HashSet<i64>>,
}

#[allow(dead_code)]
impl FakeStore {
    pub fn with(predictions: Vec<Prediction>) -> Self {
        Self {
            predictions: Mutex::new(predictions),
            ..Default::default()
        }
    }

    pub fn result_of(&self, id: i64) -> Option<BetResult> {
        self.predictions
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| p.result)
    }

    pub fn updates(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn fail_writes(self, ids: &[i64]) -> Self {
        self.fail_writes_for.lock().unwrap().extend(ids);
        self
    }

    pub fn heal_writes(&self) {
        self.fail_writes_for.lock().unwrap().clear();
    }
}

#[async_trait]
impl PredictionStore for FakeStore {
    async fn save_prediction(&self, prediction: &NewPrediction) -> anyhow::Result<i64> {
        let mut predictions = self.predictions.lock().unwrap();
        let id = predictions.len() as i64 + 1;
        predictions.push(Prediction {
            id,
            match_id: prediction.match_id.clone(),
            id_kind: prediction.id_kind,
            home_team: prediction.home_team.clone(),
            away_team: prediction.away_team.clone(),
            league: prediction.league.clone(),
            payload: prediction.payload.clone(),
            result: None,
            created_at: "2025-01-05T12:00:00Z".to_string(),
        });
        Ok(id)
    }

    async fn get_pending_predictions(&self) -> anyhow::Result<Vec<Prediction>> {
        if self.fail_reads {
            anyhow::bail!("database is locked");
        }
        Ok(self
            .predictions
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.result.is_none())
            .cloned()
            .collect())
    }

    async fn update_prediction_result(&self, id: i64, result: BetResult) -> anyhow::Result<bool> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes_for.lock().unwrap().contains(&id) {
            anyhow::bail!("disk I/O error writing prediction {}", id);
        }
        let mut predictions = self.predictions.lock().unwrap();
        match predictions.iter_mut().find(|p| p.id == id) {
            Some(p) if p.result.is_none() => {
                p.result = Some(result);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn override_prediction_result(
        &self,
        id: i64,
        result: BetResult,
    ) -> anyhow::Result<bool> {
        let mut predictions = self.predictions.lock().unwrap();
        match predictions.iter_mut().find(|p| p.id == id) {
            Some(p) => {
                p.result = Some(result);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_recent_predictions(&self, limit: i64) -> anyhow::Result<Vec<Prediction>> {
        let predictions = self.predictions.lock().unwrap();
        Ok(predictions
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_stats(&self) -> anyhow::Result<SiteStats> {
        let predictions = self.predictions.lock().unwrap();
        let wins = predictions
            .iter()
            .filter(|p| p.result == Some(BetResult::Win))
            .count() as i64;
        let graded = predictions
            .iter()
            .filter(|p| matches!(p.result, Some(BetResult::Win | BetResult::Loss)))
            .count() as i64;
        Ok(SiteStats::from_counts(
            self.visits.load(Ordering::SeqCst) as i64,
            predictions.len() as i64,
            wins,
            graded,
        ))
    }

    async fn increment_visit(&self) -> anyhow::Result<()> {
        self.visits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reset(&self) -> anyhow::Result<()> {
        self.predictions.lock().unwrap().clear();
        self.visits.store(0, Ordering::SeqCst);
        Ok(())
    }
}

/// Scores keyed by (league, event id). Events in `panics` blow up the task.
#[derive(Default)]
pub struct FakeGateway {
    pub leagues: Vec<String>,
    pub results: HashMap<(String, String), ResultLookup>,
    pub panics: HashSet<String>,
    pub calls: Mutex<Vec<(String, String)>>,
}

#[allow(dead_code)]
impl FakeGateway {
    pub fn new(leagues: &[&str]) -> Self {
        Self {
            leagues: leagues.iter().map(|l| l.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn finished(mut self, league: &str, event_id: &str, home: u32, away: u32) -> Self {
        self.results.insert(
            (league.to_string(), event_id.to_string()),
            ResultLookup::Finished(final_score(home, away)),
        );
        self
    }

    pub fn lookup(mut self, league: &str, event_id: &str, lookup: ResultLookup) -> Self {
        self.results
            .insert((league.to_string(), event_id.to_string()), lookup);
        self
    }

    pub fn panicking(mut self, event_id: &str) -> Self {
        self.panics.insert(event_id.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn leagues_queried(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(league, _)| league.clone())
            .collect()
    }
}

#[async_trait]
impl ResultsGateway for FakeGateway {
    fn league_codes(&self) -> Vec<String> {
        self.leagues.clone()
    }

    async fn fetch_result(&self, match_id: &str, league_code: &str) -> ResultLookup {
        self.calls
            .lock()
            .unwrap()
            .push((league_code.to_string(), match_id.to_string()));
        if self.panics.contains(match_id) {
            panic!("feed exploded for {}", match_id);
        }
        self.results
            .get(&(league_code.to_string(), match_id.to_string()))
            .cloned()
            .unwrap_or(ResultLookup::Unavailable)
    }
}

/// Scores every event 2-1 after a delay, recording how many lookups overlap.
#[allow(dead_code)]
#[derive(Default)]
pub struct SlowGateway {
    pub delay: Duration,
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

#[async_trait]
impl ResultsGateway for SlowGateway {
    fn league_codes(&self) -> Vec<String> {
        vec!["epl".to_string()]
    }

    async fn fetch_result(&self, _match_id: &str, _league_code: &str) -> ResultLookup {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        ResultLookup::Finished(final_score(2, 1))
    }
}

/// Canned generator: returns `reply` or fails as configured.
#[allow(dead_code)]
pub struct FakeGenerator {
    pub reply: Value,
    pub rate_limited: bool,
}

impl Default for FakeGenerator {
    fn default() -> Self {
        Self {
            reply: json!({
                "match": "Arsenal vs Chelsea",
                "best_pick": "Arsenal to win",
                "reasoning": ["Home form", "Chelsea injuries"],
                "safer_alternative": "Arsenal or draw",
                "structured_prediction": {"market_type": "moneyline", "selection": "home"}
            }),
            rate_limited: false,
        }
    }
}

#[async_trait]
impl PredictionGenerator for FakeGenerator {
    async fn generate(
        &self,
        _home: &str,
        _away: &str,
        _league: &str,
    ) -> Result<Value, GenerationError> {
        if self.rate_limited {
            return Err(GenerationError::RateLimited);
        }
        Ok(self.reply.clone())
    }

    async fn ping(&self) -> Result<String, GenerationError> {
        if self.rate_limited {
            return Err(GenerationError::RateLimited);
        }
        Ok("Hello, API is working!".to_string())
    }
}

#[allow(dead_code)]
pub fn final_score(home: u32, away: u32) -> GameResult {
    let winner = if home > away {
        Winner::Home
    } else if away > home {
        Winner::Away
    } else {
        Winner::Draw
    };
    GameResult {
        home_score: home,
        away_score: away,
        winner,
    }
}

#[allow(dead_code)]
pub fn pending(id: i64, match_id: &str, league: Option<&str>, payload: Value) -> Prediction {
    Prediction {
        id,
        match_id: match_id.to_string(),
        id_kind: MatchIdKind::infer(match_id),
        home_team: "Arsenal".to_string(),
        away_team: "Chelsea".to_string(),
        league: league.map(str::to_string),
        payload,
        result: None,
        created_at: "2025-01-05T12:00:00Z".to_string(),
    }
}

#[allow(dead_code)]
pub fn moneyline(selection: &str) -> Value {
    json!({"structured_prediction": {"market_type": "moneyline", "selection": selection}})
}

#[allow(dead_code)]
pub fn over_under(selection: &str, line: f64) -> Value {
    json!({
        "structured_prediction": {"market_type": "over_under", "selection": selection, "line": line}
    })
}

/// State wired to fakes. The scoreboard client points at a closed port so page
/// handlers render empty fixture lists without touching the network.
#[allow(dead_code)]
pub fn test_state(
    store: Arc<dyn PredictionStore>,
    gateway: Arc<dyn ResultsGateway>,
    generator: Arc<dyn PredictionGenerator>,
) -> AppState {
    let config = AppConfig {
        espn_base_url: "http://127.0.0.1:9".to_string(),
        http_timeout_secs: 1,
        ..AppConfig::default()
    };
    let espn = Arc::new(
        EspnClient::new(config.espn_base_url.as_str(), Duration::from_secs(1))
            .expect("Failed to build scoreboard client"),
    );
    AppState::from_parts(config, store, espn, generator, gateway)
}

#[allow(dead_code)]
pub async fn memory_store() -> SqlStore {
    SqlStore::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database")
}
