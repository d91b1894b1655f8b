//! Ledger query + write layer over the `meals` table.

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::model::{DailyTotals, UserHistory};
use crate::storage::with_timeout;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MealRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// RFC 3339 timestamp of when the meal was eaten.
    pub eaten_at: String,
    pub calories: i64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub created_at: String,
}

pub struct LedgerStorage {
    pool: SqlitePool,
}

impl LedgerStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ─── Mutations ──────────────────────────────────────────────────────────

    pub async fn create_meal(
        &self,
        user_id: &str,
        name: &str,
        eaten_at: &str,
        calories: i64,
        protein_g: f64,
        carbs_g: f64,
        fat_g: f64,
    ) -> Result<MealRow> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO meals (id, user_id, name, eaten_at, calories, protein_g, carbs_g, fat_g, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(name)
        .bind(eaten_at)
        .bind(calories)
        .bind(protein_g)
        .bind(carbs_g)
        .bind(fat_g)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get_meal(user_id, &id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("meal not found after insert"))
    }

    pub async fn get_meal(&self, user_id: &str, meal_id: &str) -> Result<Option<MealRow>> {
        Ok(
            sqlx::query_as("SELECT * FROM meals WHERE id = ? AND user_id = ?")
                .bind(meal_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Delete a meal. Returns `false` when no row matched (unknown id, or a
    /// meal that belongs to another user).
    pub async fn delete_meal(&self, user_id: &str, meal_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM meals WHERE id = ? AND user_id = ?")
            .bind(meal_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_meals(
        &self,
        user_id: &str,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<MealRow>> {
        with_timeout(async {
            let rows = match (from, to) {
                (Some(f), Some(t)) => {
                    sqlx::query_as(
                        "SELECT * FROM meals
                         WHERE user_id = ? AND date(eaten_at) >= date(?) AND date(eaten_at) <= date(?)
                         ORDER BY eaten_at DESC",
                    )
                    .bind(user_id)
                    .bind(f)
                    .bind(t)
                    .fetch_all(&self.pool)
                    .await?
                }
                (Some(f), None) => {
                    sqlx::query_as(
                        "SELECT * FROM meals
                         WHERE user_id = ? AND date(eaten_at) >= date(?)
                         ORDER BY eaten_at DESC",
                    )
                    .bind(user_id)
                    .bind(f)
                    .fetch_all(&self.pool)
                    .await?
                }
                (None, Some(t)) => {
                    sqlx::query_as(
                        "SELECT * FROM meals
                         WHERE user_id = ? AND date(eaten_at) <= date(?)
                         ORDER BY eaten_at DESC",
                    )
                    .bind(user_id)
                    .bind(t)
                    .fetch_all(&self.pool)
                    .await?
                }
                (None, None) => {
                    sqlx::query_as(
                        "SELECT * FROM meals WHERE user_id = ? ORDER BY eaten_at DESC",
                    )
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
                }
            };
            Ok(rows)
        })
        .await
    }

    // ─── Aggregate reads ────────────────────────────────────────────────────

    /// Nutrient totals for one user/date. All-zero for a date with no rows.
    pub async fn totals(&self, user_id: &str, date: &str) -> Result<DailyTotals> {
        let row: (i64, f64, f64, f64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(calories), 0),
                    COALESCE(SUM(protein_g), 0.0),
                    COALESCE(SUM(carbs_g), 0.0),
                    COALESCE(SUM(fat_g), 0.0),
                    COUNT(*)
               FROM meals
              WHERE user_id = ? AND date(eaten_at) = date(?)",
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .context("daily totals")?;

        let (calories, protein_g, carbs_g, fat_g, meal_count) = row;
        Ok(DailyTotals {
            date: date.to_string(),
            calories,
            protein_g,
            carbs_g,
            fat_g,
            meal_count: meal_count as u64,
        })
    }

    /// Lifetime aggregate snapshot for achievement evaluation.
    ///
    /// Goal-relative counts use the goals passed in, so an evaluation always
    /// sees the goals current at the time it runs.
    pub async fn history(
        &self,
        user_id: &str,
        calorie_goal: i64,
        protein_goal: i64,
    ) -> Result<UserHistory> {
        with_timeout(async {
            let (meal_count, distinct_days, max_protein, max_calories, total_calories, total_protein): (
                i64,
                i64,
                f64,
                i64,
                i64,
                f64,
            ) = sqlx::query_as(
                "SELECT COUNT(*),
                        COUNT(DISTINCT date(eaten_at)),
                        COALESCE(MAX(protein_g), 0.0),
                        COALESCE(MAX(calories), 0),
                        COALESCE(SUM(calories), 0),
                        COALESCE(SUM(protein_g), 0.0)
                   FROM meals
                  WHERE user_id = ?",
            )
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("lifetime aggregates")?;

            let days_calorie_goal_met: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM (
                    SELECT date(eaten_at) AS day, SUM(calories) AS kcal
                      FROM meals WHERE user_id = ?
                  GROUP BY day HAVING kcal <= ?
                 )",
            )
            .bind(user_id)
            .bind(calorie_goal)
            .fetch_one(&self.pool)
            .await
            .context("calorie-goal day count")?;

            let days_protein_goal_met: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM (
                    SELECT date(eaten_at) AS day, SUM(protein_g) AS grams
                      FROM meals WHERE user_id = ?
                  GROUP BY day HAVING grams >= ?
                 )",
            )
            .bind(user_id)
            .bind(protein_goal)
            .fetch_one(&self.pool)
            .await
            .context("protein-goal day count")?;

            let logged_before_8: bool = sqlx::query_scalar(
                "SELECT EXISTS(
                    SELECT 1 FROM meals
                     WHERE user_id = ? AND CAST(strftime('%H', eaten_at) AS INTEGER) < 8
                 )",
            )
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("early-meal flag")?;

            let logged_after_22: bool = sqlx::query_scalar(
                "SELECT EXISTS(
                    SELECT 1 FROM meals
                     WHERE user_id = ? AND CAST(strftime('%H', eaten_at) AS INTEGER) >= 22
                 )",
            )
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("late-meal flag")?;

            Ok(UserHistory {
                meal_count: meal_count as u64,
                distinct_days: distinct_days as u64,
                max_meal_protein_g: max_protein,
                max_meal_calories: max_calories,
                total_calories,
                total_protein_g: total_protein,
                days_calorie_goal_met: days_calorie_goal_met as u64,
                days_protein_goal_met: days_protein_goal_met as u64,
                logged_before_8,
                logged_after_22,
            })
        })
        .await
    }
}
