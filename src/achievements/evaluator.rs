// SPDX-License-Identifier: MIT
//! Achievement evaluator — recomputes which badges a user has earned and
//! persists any new unlocks exactly once.
//!
//! Calling [`evaluate`] twice with no intervening ledger mutation returns an
//! empty list on the second call. Concurrent calls for the same user are
//! safe: the storage layer's insert-or-ignore decides the single winner per
//! badge, and only the winner reports it as newly unlocked.

use anyhow::Result;
use chrono::Utc;

use super::catalog::{self, AchievementDef, BADGE_COLLECTOR, BADGE_COLLECTOR_THRESHOLD};
use super::model::Achievement;
use super::storage::AchievementStorage;
use crate::ledger::LedgerStorage;
use crate::storage::UserRow;

fn to_unlocked(def: &AchievementDef, unlocked_at: String) -> Achievement {
    Achievement {
        id: def.id.to_string(),
        name: def.name.to_string(),
        description: def.description.to_string(),
        icon: def.icon.to_string(),
        color: def.color.to_string(),
        unlocked: true,
        unlocked_at: Some(unlocked_at),
    }
}

/// Evaluate every badge the user has not yet unlocked and persist the ones
/// whose predicate now holds. Returns only the badges this call actually
/// inserted, so the caller can notify without ever re-announcing old ones.
pub async fn evaluate(
    achievements: &AchievementStorage,
    ledger: &LedgerStorage,
    user: &UserRow,
) -> Result<Vec<Achievement>> {
    let already_unlocked = achievements.unlocked_ids(&user.id).await?;
    let history = ledger
        .history(&user.id, user.calorie_goal, user.protein_goal)
        .await?;

    let mut newly_unlocked = Vec::new();

    for def in catalog::all_definitions() {
        if already_unlocked.contains(def.id) {
            continue;
        }
        if !(def.predicate)(&history) {
            continue;
        }
        // A racing evaluator may have inserted first; only the actual
        // inserter treats the badge as new.
        if achievements.unlock(&user.id, def.id).await? {
            newly_unlocked.push(to_unlocked(&def, Utc::now().to_rfc3339()));
        }
    }

    // Follow-up pass: once any unlock happened, the collector badge may now
    // be due. Its threshold counts all unlocked badges, not ledger history.
    if !newly_unlocked.is_empty() && !already_unlocked.contains(BADGE_COLLECTOR) {
        let total_unlocked = achievements.unlocked_ids(&user.id).await?.len() as u64;
        if total_unlocked >= BADGE_COLLECTOR_THRESHOLD
            && achievements.unlock(&user.id, BADGE_COLLECTOR).await?
        {
            if let Some(def) = catalog::find(BADGE_COLLECTOR) {
                newly_unlocked.push(to_unlocked(&def, Utc::now().to_rfc3339()));
            }
        }
    }

    Ok(newly_unlocked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use tempfile::TempDir;

    struct Fixture {
        storage: Storage,
        ledger: LedgerStorage,
        achievements: AchievementStorage,
        user: UserRow,
    }

    async fn fixture(dir: &TempDir) -> Fixture {
        let storage = Storage::new(dir.path()).await.unwrap();
        let ledger = LedgerStorage::new(storage.pool());
        let achievements = AchievementStorage::new(storage.pool());
        let user = storage
            .create_user("Maya", "maya@example.com", 2000, 100)
            .await
            .unwrap();
        Fixture {
            storage,
            ledger,
            achievements,
            user,
        }
    }

    #[tokio::test]
    async fn empty_ledger_unlocks_nothing() {
        let dir = TempDir::new().unwrap();
        let f = fixture(&dir).await;

        let newly = evaluate(&f.achievements, &f.ledger, &f.user).await.unwrap();
        assert!(newly.is_empty());
    }

    #[tokio::test]
    async fn heavy_protein_meal_unlocks_once() {
        let dir = TempDir::new().unwrap();
        let f = fixture(&dir).await;

        f.ledger
            .create_meal(&f.user.id, "steak", "2026-08-07T19:00:00Z", 700, 55.0, 5.0, 40.0)
            .await
            .unwrap();

        let newly = evaluate(&f.achievements, &f.ledger, &f.user).await.unwrap();
        let ids: Vec<&str> = newly.iter().map(|a| a.id.as_str()).collect();
        assert!(ids.contains(&catalog::PROTEIN_PUNCH));
        assert!(ids.contains(&catalog::FIRST_MEAL));

        // Second call with no intervening mutation: nothing new.
        let again = evaluate(&f.achievements, &f.ledger, &f.user).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn deletion_never_revokes_an_unlock() {
        let dir = TempDir::new().unwrap();
        let f = fixture(&dir).await;

        let meal = f
            .ledger
            .create_meal(&f.user.id, "steak", "2026-08-07T19:00:00Z", 700, 55.0, 5.0, 40.0)
            .await
            .unwrap();
        evaluate(&f.achievements, &f.ledger, &f.user).await.unwrap();

        assert!(f.ledger.delete_meal(&f.user.id, &meal.id).await.unwrap());
        let newly = evaluate(&f.achievements, &f.ledger, &f.user).await.unwrap();
        assert!(newly.is_empty());

        // The badge survives even though its qualifying meal is gone.
        let ids = f.achievements.unlocked_ids(&f.user.id).await.unwrap();
        assert!(ids.contains(catalog::PROTEIN_PUNCH));
    }

    #[tokio::test]
    async fn concurrent_evaluations_produce_no_duplicates() {
        let dir = TempDir::new().unwrap();
        let f = fixture(&dir).await;

        f.ledger
            .create_meal(&f.user.id, "steak", "2026-08-07T19:00:00Z", 700, 55.0, 5.0, 40.0)
            .await
            .unwrap();

        // Two evaluators racing over the same fresh ledger state.
        let a = AchievementStorage::new(f.storage.pool());
        let b = AchievementStorage::new(f.storage.pool());
        let la = LedgerStorage::new(f.storage.pool());
        let lb = LedgerStorage::new(f.storage.pool());
        let (ra, rb) = tokio::join!(
            evaluate(&a, &la, &f.user),
            evaluate(&b, &lb, &f.user),
        );
        let ra = ra.unwrap();
        let rb = rb.unwrap();

        // Each badge is reported newly-unlocked by at most one evaluator.
        for id in [catalog::FIRST_MEAL, catalog::PROTEIN_PUNCH] {
            let reports = ra.iter().chain(rb.iter()).filter(|x| x.id == id).count();
            assert!(reports <= 1, "{id} reported {reports} times");
        }

        // And exactly one row exists regardless of who won.
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM unlocked_achievements WHERE user_id = ? AND achievement_id = ?",
        )
        .bind(&f.user.id)
        .bind(catalog::PROTEIN_PUNCH)
        .fetch_one(&f.storage.pool())
        .await
        .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn collector_badge_follows_the_tenth_unlock() {
        let dir = TempDir::new().unwrap();
        let f = fixture(&dir).await;

        // Nine pre-existing unlocks, then a ledger state that earns several
        // more in one evaluation — the collector pass must fire.
        for id in [
            catalog::MEALS_10,
            catalog::MEALS_100,
            catalog::MEALS_500,
            catalog::WEEK_LOGGED,
            catalog::MONTH_LOGGED,
            catalog::PROTEIN_MOUNTAIN,
            catalog::GOAL_GETTER,
            catalog::MACRO_MASTER,
            catalog::MIDNIGHT_SNACKER,
        ] {
            f.achievements.unlock(&f.user.id, id).await.unwrap();
        }

        f.ledger
            .create_meal(&f.user.id, "omelette", "2026-08-07T07:00:00Z", 400, 55.0, 2.0, 28.0)
            .await
            .unwrap();

        let newly = evaluate(&f.achievements, &f.ledger, &f.user).await.unwrap();
        let ids: Vec<&str> = newly.iter().map(|a| a.id.as_str()).collect();
        assert!(ids.contains(&catalog::BADGE_COLLECTOR), "got {ids:?}");
    }
}
