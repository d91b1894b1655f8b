// rest/routes/coach.rs — nutrition coach (generative-AI) route.
//
// The coach is an optional integration: without an API key the route
// answers 503, and any vendor-side failure collapses to the same path.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::AppContext;

#[derive(Deserialize)]
pub struct CoachRequest {
    pub prompt: String,
}

pub async fn ask_coach(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<String>,
    Json(body): Json<CoachRequest>,
) -> Result<Json<Value>, ApiError> {
    let prompt = body.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::Validation("prompt must not be empty".into()));
    }
    ctx.storage
        .get_user(&user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id}")))?;

    let coach = ctx
        .coach
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("coach is not configured".into()))?;

    match coach.complete(prompt).await {
        Ok(reply) => Ok(Json(json!({ "reply": reply }))),
        Err(e) => {
            warn!(user_id, err = %e, "coach completion failed");
            Err(ApiError::Unavailable("coach service unavailable".into()))
        }
    }
}
