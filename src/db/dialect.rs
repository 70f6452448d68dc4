use std::borrow::Cow;

/// SQL flavour of the configured database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    pub fn from_url(database_url: &str) -> anyhow::Result<Self> {
        let scheme = database_url.split(':').next().unwrap_or_default();
        match scheme.to_lowercase().as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            _ => anyhow::bail!("Unsupported database URL scheme: {}", scheme),
        }
    }

    /// Queries are written with `?` placeholders; Postgres wants `$1, $2, ...`
    pub fn sql<'a>(&self, query: &'a str) -> Cow<'a, str> {
        match self {
            Dialect::Sqlite => Cow::Borrowed(query),
            Dialect::Postgres => {
                let mut out = String::with_capacity(query.len() + 8);
                let mut n = 0;
                for c in query.chars() {
                    if c == '?' {
                        n += 1;
                        out.push('$');
                        out.push_str(&n.to_string());
                    } else {
                        out.push(c);
                    }
                }
                Cow::Owned(out)
            }
        }
    }

    pub fn create_predictions_table(&self) -> &'static str {
        match self {
            Dialect::Sqlite => {
                r#"
                CREATE TABLE IF NOT EXISTS predictions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    match_id TEXT NOT NULL,
                    id_kind TEXT,
                    home_team TEXT NOT NULL,
                    away_team TEXT NOT NULL,
                    league TEXT,
                    prediction_json TEXT NOT NULL,
                    result TEXT,
                    created_at TEXT NOT NULL
                )
                "#
            }
            Dialect::Postgres => {
                r#"
                CREATE TABLE IF NOT EXISTS predictions (
                    id BIGSERIAL PRIMARY KEY,
                    match_id TEXT NOT NULL,
                    id_kind TEXT,
                    home_team TEXT NOT NULL,
                    away_team TEXT NOT NULL,
                    league TEXT,
                    prediction_json TEXT NOT NULL,
                    result TEXT,
                    created_at TEXT NOT NULL
                )
                "#
            }
        }
    }

    pub fn create_stats_table(&self) -> &'static str {
        match self {
            Dialect::Sqlite => {
                r#"
                CREATE TABLE IF NOT EXISTS site_stats (
                    param_key TEXT PRIMARY KEY,
                    param_value INTEGER NOT NULL DEFAULT 0
                )
                "#
            }
            Dialect::Postgres => {
                r#"
                CREATE TABLE IF NOT EXISTS site_stats (
                    param_key TEXT PRIMARY KEY,
                    param_value BIGINT NOT NULL DEFAULT 0
                )
                "#
            }
        }
    }

    /// Insert a zeroed counter unless it already exists
    pub fn seed_stat(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "INSERT OR IGNORE INTO site_stats (param_key, param_value) VALUES (?, 0)",
            Dialect::Postgres => {
                "INSERT INTO site_stats (param_key, param_value) VALUES ($1, 0) ON CONFLICT (param_key) DO NOTHING"
            }
        }
    }
}
