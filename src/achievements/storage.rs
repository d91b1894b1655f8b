// SPDX-License-Identifier: MIT
//! Achievement persistence — the `unlocked_achievements` table.
//!
//! Uniqueness of `(user_id, achievement_id)` is the table's composite
//! primary key, so duplicate unlocks are impossible by construction and a
//! racing insert degrades to a no-op (`INSERT OR IGNORE`). That is the
//! whole concurrency story: no in-process locks are involved.

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};

use super::catalog;
use super::model::Achievement;

pub struct AchievementStorage {
    pool: SqlitePool,
}

impl AchievementStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// IDs already unlocked by this user.
    pub async fn unlocked_ids(&self, user_id: &str) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT achievement_id FROM unlocked_achievements WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("load unlocked achievement ids")?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Unlock an achievement for a user. No-op if already unlocked.
    /// Returns `true` only when this call inserted the row — under a race,
    /// exactly one caller sees `true`.
    pub async fn unlock(&self, user_id: &str, achievement_id: &str) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let rows_affected = sqlx::query(
            "INSERT OR IGNORE INTO unlocked_achievements (user_id, achievement_id, unlocked_at)
             VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(achievement_id)
        .bind(&now)
        .execute(&self.pool)
        .await
        .context("unlock achievement")?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    /// Return the full catalog for a user, with unlock status from the DB.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Achievement>> {
        let unlocked: Vec<(String, String)> = sqlx::query_as(
            "SELECT achievement_id, unlocked_at FROM unlocked_achievements WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("load unlocked achievements")?;

        let mut unlock_map: HashMap<String, String> = unlocked.into_iter().collect();

        let result = catalog::all_definitions()
            .into_iter()
            .map(|def| {
                let unlocked_at = unlock_map.remove(def.id);
                Achievement {
                    id: def.id.to_string(),
                    name: def.name.to_string(),
                    description: def.description.to_string(),
                    icon: def.icon.to_string(),
                    color: def.color.to_string(),
                    unlocked: unlocked_at.is_some(),
                    unlocked_at,
                }
            })
            .collect();

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn unlock_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();
        let achievements = AchievementStorage::new(storage.pool());

        assert!(achievements.unlock("u1", catalog::FIRST_MEAL).await.unwrap());
        assert!(!achievements.unlock("u1", catalog::FIRST_MEAL).await.unwrap());
        assert!(!achievements.unlock("u1", catalog::FIRST_MEAL).await.unwrap());

        let ids = achievements.unlocked_ids("u1").await.unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn unlocks_are_scoped_per_user() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();
        let achievements = AchievementStorage::new(storage.pool());

        assert!(achievements.unlock("u1", catalog::FIRST_MEAL).await.unwrap());
        assert!(achievements.unlock("u2", catalog::FIRST_MEAL).await.unwrap());

        assert!(achievements.unlocked_ids("u1").await.unwrap().contains(catalog::FIRST_MEAL));
        assert!(achievements.unlocked_ids("u3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_joins_catalog_with_unlock_state() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();
        let achievements = AchievementStorage::new(storage.pool());

        achievements.unlock("u1", catalog::PROTEIN_PUNCH).await.unwrap();

        let list = achievements.list("u1").await.unwrap();
        assert_eq!(list.len(), catalog::all_definitions().len());

        let punch = list.iter().find(|a| a.id == catalog::PROTEIN_PUNCH).unwrap();
        assert!(punch.unlocked);
        assert!(punch.unlocked_at.is_some());

        let first = list.iter().find(|a| a.id == catalog::FIRST_MEAL).unwrap();
        assert!(!first.unlocked);
        assert!(first.unlocked_at.is_none());
    }
}
