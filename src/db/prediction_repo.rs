use crate::db::{Dialect, PredictionStore};
use crate::models::{BetResult, MatchIdKind, NewPrediction, Prediction, SiteStats};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::{AnyPool, FromRow};

const COLUMNS: &str =
    "id, match_id, id_kind, home_team, away_team, league, prediction_json, result, created_at";

const TOTAL_VISITS: &str = "total_visits";
const TOTAL_PREDICTIONS: &str = "total_predictions";

#[derive(Debug, FromRow)]
struct PredictionRow {
    id: i64,
    match_id: String,
    id_kind: Option<String>,
    home_team: String,
    away_team: String,
    league: Option<String>,
    prediction_json: String,
    result: Option<String>,
    created_at: String,
}

impl From<PredictionRow> for Prediction {
    fn from(row: PredictionRow) -> Self {
        let payload = serde_json::from_str(&row.prediction_json).unwrap_or_else(|e| {
            tracing::warn!(prediction_id = row.id, error = %e, "Stored prediction JSON is invalid");
            serde_json::Value::Object(Default::default())
        });
        let result = row
            .result
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .and_then(|r| r.parse::<BetResult>().ok());

        Prediction {
            id: row.id,
            id_kind: MatchIdKind::parse_or_infer(row.id_kind.as_deref(), &row.match_id),
            match_id: row.match_id,
            home_team: row.home_team,
            away_team: row.away_team,
            league: row.league,
            payload,
            result,
            created_at: row.created_at,
        }
    }
}

/// Prediction store over SQLite or PostgreSQL
pub struct SqlStore {
    pool: AnyPool,
    dialect: Dialect,
}

impl SqlStore {
    /// Connect and create the schema if it is missing
    pub async fn connect(database_url: &str) -> Result<Self> {
        install_default_drivers();
        let dialect = Dialect::from_url(database_url)?;

        // Every connection to an in-memory SQLite database sees its own empty
        // database, so keep exactly one alive for the life of the pool.
        let options = if database_url.contains(":memory:") {
            AnyPoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            AnyPoolOptions::new().max_connections(10)
        };

        let pool = options
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool, dialect };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(self.dialect.create_predictions_table())
            .execute(&self.pool)
            .await
            .context("Failed to create predictions table")?;
        sqlx::query(self.dialect.create_stats_table())
            .execute(&self.pool)
            .await
            .context("Failed to create site_stats table")?;

        for key in [TOTAL_VISITS, TOTAL_PREDICTIONS] {
            sqlx::query(self.dialect.seed_stat())
                .bind(key)
                .execute(&self.pool)
                .await
                .context("Failed to seed site_stats")?;
        }

        Ok(())
    }

    async fn count(&self, query: &str) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(query).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

#[async_trait]
impl PredictionStore for SqlStore {
    async fn save_prediction(&self, prediction: &NewPrediction) -> Result<i64> {
        let payload = serde_json::to_string(&prediction.payload)
            .context("Failed to serialize prediction payload")?;
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let insert = self.dialect.sql(
            r#"
            INSERT INTO predictions
                (match_id, id_kind, home_team, away_team, league, prediction_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        );
        let bump = self
            .dialect
            .sql("UPDATE site_stats SET param_value = param_value + 1 WHERE param_key = ?");

        let mut tx = self.pool.begin().await?;
        let (id,): (i64,) = sqlx::query_as(&insert)
            .bind(&prediction.match_id)
            .bind(prediction.id_kind.as_str())
            .bind(&prediction.home_team)
            .bind(&prediction.away_team)
            .bind(prediction.league.as_deref())
            .bind(payload)
            .bind(created_at)
            .fetch_one(&mut *tx)
            .await
            .context("Failed to insert prediction")?;
        sqlx::query(&bump)
            .bind(TOTAL_PREDICTIONS)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(prediction_id = id, match_id = %prediction.match_id, "Prediction saved");
        Ok(id)
    }

    async fn get_pending_predictions(&self) -> Result<Vec<Prediction>> {
        let query = format!(
            "SELECT {} FROM predictions WHERE result IS NULL OR result = '' ORDER BY id",
            COLUMNS
        );
        let rows = sqlx::query_as::<_, PredictionRow>(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch pending predictions")?;

        Ok(rows.into_iter().map(Prediction::from).collect())
    }

    async fn update_prediction_result(&self, id: i64, result: BetResult) -> Result<bool> {
        let query = self.dialect.sql(
            "UPDATE predictions SET result = ? WHERE id = ? AND (result IS NULL OR result = '')",
        );
        let outcome = sqlx::query(&query)
            .bind(result.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update result for prediction {}", id))?;

        Ok(outcome.rows_affected() > 0)
    }

    async fn override_prediction_result(&self, id: i64, result: BetResult) -> Result<bool> {
        let query = self
            .dialect
            .sql("UPDATE predictions SET result = ? WHERE id = ?");
        let outcome = sqlx::query(&query)
            .bind(result.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to set result for prediction {}", id))?;

        Ok(outcome.rows_affected() > 0)
    }

    async fn get_recent_predictions(&self, limit: i64) -> Result<Vec<Prediction>> {
        let query = format!(
            "SELECT {} FROM predictions ORDER BY created_at DESC, id DESC LIMIT ?",
            COLUMNS
        );
        let query = self.dialect.sql(&query);
        let rows = sqlx::query_as::<_, PredictionRow>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch recent predictions")?;

        Ok(rows.into_iter().map(Prediction::from).collect())
    }

    async fn get_stats(&self) -> Result<SiteStats> {
        let visits_query = self
            .dialect
            .sql("SELECT param_value FROM site_stats WHERE param_key = ?");
        let visits: Option<(i64,)> = sqlx::query_as(&visits_query)
            .bind(TOTAL_VISITS)
            .fetch_optional(&self.pool)
            .await?;

        let total_predictions = self.count("SELECT COUNT(*) FROM predictions").await?;
        let wins = self
            .count("SELECT COUNT(*) FROM predictions WHERE result = 'Win'")
            .await?;
        let graded = self
            .count("SELECT COUNT(*) FROM predictions WHERE result IN ('Win', 'Loss')")
            .await?;

        Ok(SiteStats::from_counts(
            visits.map(|(v,)| v).unwrap_or(0),
            total_predictions,
            wins,
            graded,
        ))
    }

    async fn increment_visit(&self) -> Result<()> {
        let query = self
            .dialect
            .sql("UPDATE site_stats SET param_value = param_value + 1 WHERE param_key = ?");
        sqlx::query(&query)
            .bind(TOTAL_VISITS)
            .execute(&self.pool)
            .await
            .context("Failed to record visit")?;
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM predictions")
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE site_stats SET param_value = 0")
            .execute(&mut *tx)
            .await?;
        tx.commit().await.context("Failed to reset database")?;

        tracing::info!("Prediction store reset");
        Ok(())
    }
}
