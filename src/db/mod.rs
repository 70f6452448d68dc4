pub mod dialect;
pub mod prediction_repo;

use crate::models::{BetResult, NewPrediction, Prediction, SiteStats};
use async_trait::async_trait;

pub use dialect::Dialect;
pub use prediction_repo::SqlStore;

/// Persistence for predictions and site counters.
/// Every method is safe to call from concurrent tasks.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Insert a prediction and bump the prediction counter. Returns the new id.
    async fn save_prediction(&self, prediction: &NewPrediction) -> anyhow::Result<i64>;

    /// Predictions whose result is NULL or empty
    async fn get_pending_predictions(&self) -> anyhow::Result<Vec<Prediction>>;

    /// Record a graded result. Only touches rows that are still pending, so
    /// `false` means the row is missing or was already graded.
    async fn update_prediction_result(&self, id: i64, result: BetResult) -> anyhow::Result<bool>;

    /// Overwrite a result regardless of its current value
    async fn override_prediction_result(
        &self,
        id: i64,
        result: BetResult,
    ) -> anyhow::Result<bool>;

    /// Newest first
    async fn get_recent_predictions(&self, limit: i64) -> anyhow::Result<Vec<Prediction>>;

    async fn get_stats(&self) -> anyhow::Result<SiteStats>;

    async fn increment_visit(&self) -> anyhow::Result<()>;

    /// Delete every prediction and zero the counters
    async fn reset(&self) -> anyhow::Result<()>;
}
