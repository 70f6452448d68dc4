pub mod espn_api;
pub mod gemini_api;
pub mod leagues;

use crate::models::ResultLookup;
use async_trait::async_trait;

pub use leagues::{find_league, League, LEAGUES};

/// Source of final scores for stored predictions
#[async_trait]
pub trait ResultsGateway: Send + Sync {
    /// Leagues to search, in order, when a prediction has no league recorded
    fn league_codes(&self) -> Vec<String>;

    /// Look up one event. Never fails: transport and parse problems come back as
    /// `ResultLookup::Unavailable`.
    async fn fetch_result(&self, match_id: &str, league_code: &str) -> ResultLookup;
}
