use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking request handlers indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
/// Returns an error if the operation takes longer than `QUERY_TIMEOUT`.
pub(crate) async fn with_timeout<T>(fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        )),
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Daily calorie target in kcal.
    pub calorie_goal: i64,
    /// Daily protein target in grams.
    pub protein_goal: i64,
    pub created_at: String,
}

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("nutrid.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::bootstrap(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    /// Used by the ledger and achievement storage layers.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn bootstrap(pool: &SqlitePool) -> Result<()> {
        let stmts = [
            "CREATE TABLE IF NOT EXISTS users (
                id           TEXT PRIMARY KEY,
                name         TEXT NOT NULL,
                email        TEXT NOT NULL,
                calorie_goal INTEGER NOT NULL DEFAULT 2000,
                protein_goal INTEGER NOT NULL DEFAULT 100,
                created_at   TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS meals (
                id         TEXT PRIMARY KEY,
                user_id    TEXT NOT NULL,
                name       TEXT NOT NULL,
                eaten_at   TEXT NOT NULL,
                calories   INTEGER NOT NULL,
                protein_g  REAL NOT NULL,
                carbs_g    REAL NOT NULL,
                fat_g      REAL NOT NULL,
                created_at TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_meals_user_eaten ON meals (user_id, eaten_at)",
            // Composite primary key is the uniqueness guarantee behind
            // idempotent unlock inserts — see achievements::storage.
            "CREATE TABLE IF NOT EXISTS unlocked_achievements (
                user_id        TEXT NOT NULL,
                achievement_id TEXT NOT NULL,
                unlocked_at    TEXT NOT NULL,
                PRIMARY KEY (user_id, achievement_id)
            )",
        ];
        for stmt in stmts {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .context("schema bootstrap")?;
        }
        Ok(())
    }

    // ─── Users ──────────────────────────────────────────────────────────────

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        calorie_goal: i64,
        protein_goal: i64,
    ) -> Result<UserRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (id, name, email, calorie_goal, protein_goal, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(email)
        .bind(calorie_goal)
        .bind(protein_goal)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_user(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user not found after insert"))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>> {
        with_timeout(async {
            Ok(sqlx::query_as("SELECT * FROM users ORDER BY created_at ASC")
                .fetch_all(&self.pool)
                .await?)
        })
        .await
    }

    pub async fn update_goals(
        &self,
        id: &str,
        calorie_goal: i64,
        protein_goal: i64,
    ) -> Result<Option<UserRow>> {
        let result = sqlx::query(
            "UPDATE users SET calorie_goal = ?, protein_goal = ? WHERE id = ?",
        )
        .bind(calorie_goal)
        .bind(protein_goal)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user(id).await
    }
}
