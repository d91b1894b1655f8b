// SPDX-License-Identifier: MIT
//! Recalculation trigger — runs after every ledger mutation.
//!
//! Achievement state is derived and advisory: whatever happens here, the
//! mutation that triggered it has already succeeded and stays succeeded.
//! Errors and timeouts are logged at WARN and swallowed.

use std::time::Duration;
use tracing::warn;

use super::evaluator;
use super::model::Achievement;
use super::storage::AchievementStorage;
use crate::ledger::LedgerStorage;
use crate::AppContext;

/// Re-evaluate the user's achievements after a meal was created or deleted.
///
/// Returns the newly unlocked badges so the mutation response can carry
/// them; on any failure or timeout returns an empty list instead of an
/// error. Newly unlocked badges are handed to the notification dispatcher
/// before returning.
pub async fn recalculate(ctx: &AppContext, user_id: &str) -> Vec<Achievement> {
    let timeout = Duration::from_secs(ctx.config.recalc_timeout_secs);
    match tokio::time::timeout(timeout, run(ctx, user_id)).await {
        Ok(Ok(newly_unlocked)) => newly_unlocked,
        Ok(Err(e)) => {
            warn!(user_id, err = ?e, "achievement recalculation failed — mutation unaffected");
            Vec::new()
        }
        Err(_) => {
            warn!(
                user_id,
                timeout_secs = timeout.as_secs(),
                "achievement recalculation timed out — mutation unaffected"
            );
            Vec::new()
        }
    }
}

async fn run(ctx: &AppContext, user_id: &str) -> anyhow::Result<Vec<Achievement>> {
    // The user may have been deleted between the mutation and this point;
    // nothing to evaluate then.
    let Some(user) = ctx.storage.get_user(user_id).await? else {
        return Ok(Vec::new());
    };

    let achievements = AchievementStorage::new(ctx.storage.pool());
    let ledger = LedgerStorage::new(ctx.storage.pool());
    let newly_unlocked = evaluator::evaluate(&achievements, &ledger, &user).await?;

    if !newly_unlocked.is_empty() {
        ctx.dispatcher.notify(&user, &newly_unlocked);
    }
    Ok(newly_unlocked)
}
