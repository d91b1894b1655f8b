// rest/routes/achievements.rs — badge listing.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::achievements::AchievementStorage;
use crate::error::ApiError;
use crate::AppContext;

/// Full catalog with per-user unlock state — the achievements screen renders
/// each badge (earned = full color; unearned = grayscale).
pub async fn list_achievements(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    ctx.storage
        .get_user(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id}")))?;

    let achievements = AchievementStorage::new(ctx.storage.pool());
    let list = achievements.list(&user_id).await?;
    Ok(Json(serde_json::to_value(list).map_err(anyhow::Error::from)?))
}
