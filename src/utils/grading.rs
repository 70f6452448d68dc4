use crate::api::leagues::is_wildcard;
use crate::api::ResultsGateway;
use crate::db::PredictionStore;
use crate::models::{BetResult, GameStatus, MatchIdKind, Prediction, ResultLookup};
use crate::utils::markets::{resolve, MarketBet, PayloadError};
use anyhow::{Context, Result};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

pub const DEFAULT_CONCURRENCY: usize = 10;

/// Why a pending prediction was left untouched on this pass
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Predicted without a feed event id
    CompositeMatchId,
    MissingMatchId,
    Payload(PayloadError),
    /// No configured league knows the event, or the feed failed
    Unavailable,
    NotFinished(GameStatus),
    /// Another pass graded it first
    AlreadyGraded,
}

/// What happened to one prediction
#[derive(Debug, Clone, PartialEq)]
pub enum GradeOutcome {
    Graded(BetResult),
    Skipped(SkipReason),
}

/// Tally of one grading pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradingSummary {
    pub examined: usize,
    pub graded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Grades pending predictions against final scores
pub struct Grader {
    store: Arc<dyn PredictionStore>,
    gateway: Arc<dyn ResultsGateway>,
    concurrency: usize,
}

impl Grader {
    pub fn new(
        store: Arc<dyn PredictionStore>,
        gateway: Arc<dyn ResultsGateway>,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            gateway,
            concurrency: concurrency.max(1),
        }
    }

    /// Grade every pending prediction whose match has finished.
    /// Returns how many predictions were written.
    pub async fn grade_all(&self) -> Result<usize> {
        Ok(self.run_pass().await?.graded)
    }

    /// One full pass. Only reading the pending list can fail; problems with a
    /// single prediction are logged and leave it pending for the next pass.
    pub async fn run_pass(&self) -> Result<GradingSummary> {
        let pending = self
            .store
            .get_pending_predictions()
            .await
            .context("Failed to load pending predictions")?;

        let mut summary = GradingSummary {
            examined: pending.len(),
            ..Default::default()
        };
        if pending.is_empty() {
            tracing::debug!("No pending predictions to grade");
            return Ok(summary);
        }

        tracing::info!(
            pending = pending.len(),
            concurrency = self.concurrency,
            "Grading pending predictions"
        );

        let outcomes: Vec<(i64, Result<GradeOutcome>)> = stream::iter(pending)
            .map(|prediction| {
                let store = Arc::clone(&self.store);
                let gateway = Arc::clone(&self.gateway);
                let id = prediction.id;
                async move {
                    // Spawned so a panic stays inside this prediction's task
                    let task = tokio::spawn(async move {
                        grade_prediction(store.as_ref(), gateway.as_ref(), &prediction).await
                    });
                    let outcome = match task.await {
                        Ok(outcome) => outcome,
                        Err(e) => Err(anyhow::anyhow!("grading task failed: {}", e)),
                    };
                    (id, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for (id, outcome) in outcomes {
            match outcome {
                Ok(GradeOutcome::Graded(result)) => {
                    tracing::info!(prediction_id = id, result = %result, "Prediction graded");
                    summary.graded += 1;
                }
                Ok(GradeOutcome::Skipped(reason)) => {
                    tracing::debug!(prediction_id = id, reason = ?reason, "Prediction skipped");
                    summary.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(prediction_id = id, error = %e, "Failed to grade prediction");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            examined = summary.examined,
            graded = summary.graded,
            skipped = summary.skipped,
            failed = summary.failed,
            "Grading pass finished"
        );
        Ok(summary)
    }
}

/// Find the event, searching every configured league when none is recorded.
///
/// The search stops at the first league that knows the event, whether or not
/// the match has finished. An event id belongs to one competition, so a
/// `NotFinished` answer ends the search and the prediction is retried on a
/// later pass.
pub async fn lookup_result(
    gateway: &dyn ResultsGateway,
    match_id: &str,
    league: Option<&str>,
) -> ResultLookup {
    if !is_wildcard(league) {
        let league = league.map(str::trim).unwrap_or_default();
        return gateway.fetch_result(match_id, league).await;
    }

    for code in gateway.league_codes() {
        match gateway.fetch_result(match_id, &code).await {
            ResultLookup::Unavailable => continue,
            found => {
                tracing::debug!(match_id, league = %code, "Event found by league search");
                return found;
            }
        }
    }
    ResultLookup::Unavailable
}

/// Grade a single prediction and write the result if there is one
pub async fn grade_prediction(
    store: &dyn PredictionStore,
    gateway: &dyn ResultsGateway,
    prediction: &Prediction,
) -> Result<GradeOutcome> {
    if prediction.id_kind == MatchIdKind::Composite {
        return Ok(GradeOutcome::Skipped(SkipReason::CompositeMatchId));
    }
    let match_id = prediction.match_id.trim();
    if match_id.is_empty() {
        return Ok(GradeOutcome::Skipped(SkipReason::MissingMatchId));
    }

    let bet = match MarketBet::from_payload(
        &prediction.payload,
        &prediction.home_team,
        &prediction.away_team,
    ) {
        Ok(bet) => bet,
        Err(e) => return Ok(GradeOutcome::Skipped(SkipReason::Payload(e))),
    };

    let game = match lookup_result(gateway, match_id, prediction.league.as_deref()).await {
        ResultLookup::Finished(game) => game,
        ResultLookup::NotFinished(status) => {
            return Ok(GradeOutcome::Skipped(SkipReason::NotFinished(status)))
        }
        ResultLookup::Unavailable => return Ok(GradeOutcome::Skipped(SkipReason::Unavailable)),
    };

    let result = resolve(&bet, &game);
    if store.update_prediction_result(prediction.id, result).await? {
        Ok(GradeOutcome::Graded(result))
    } else {
        Ok(GradeOutcome::Skipped(SkipReason::AlreadyGraded))
    }
}
