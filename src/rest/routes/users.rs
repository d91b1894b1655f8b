// rest/routes/users.rs — user profile + daily goal routes.
//
// Authentication happens upstream; the user id in the path is trusted input
// and only checked for existence.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::storage::UserRow;
use crate::AppContext;

const DEFAULT_CALORIE_GOAL: i64 = 2000;
const DEFAULT_PROTEIN_GOAL: i64 = 100;

pub(crate) fn user_json(user: &UserRow) -> Value {
    json!({
        "id":          user.id,
        "name":        user.name,
        "email":       user.email,
        "calorieGoal": user.calorie_goal,
        "proteinGoal": user.protein_goal,
        "createdAt":   user.created_at,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub calorie_goal: Option<i64>,
    pub protein_goal: Option<i64>,
}

pub async fn create_user(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name must not be empty".into()));
    }
    let email = body.email.trim();
    if !email.contains('@') {
        return Err(ApiError::Validation(format!("invalid email address: {email}")));
    }
    let calorie_goal = body.calorie_goal.unwrap_or(DEFAULT_CALORIE_GOAL);
    let protein_goal = body.protein_goal.unwrap_or(DEFAULT_PROTEIN_GOAL);
    if calorie_goal <= 0 || protein_goal <= 0 {
        return Err(ApiError::Validation("goals must be positive".into()));
    }

    let user = ctx
        .storage
        .create_user(name, email, calorie_goal, protein_goal)
        .await?;
    Ok(Json(user_json(&user)))
}

pub async fn get_user(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = ctx
        .storage
        .get_user(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;
    Ok(Json(user_json(&user)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalsRequest {
    pub calorie_goal: i64,
    pub protein_goal: i64,
}

pub async fn update_goals(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateGoalsRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.calorie_goal <= 0 || body.protein_goal <= 0 {
        return Err(ApiError::Validation("goals must be positive".into()));
    }
    let user = ctx
        .storage
        .update_goals(&id, body.calorie_goal, body.protein_goal)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;
    Ok(Json(user_json(&user)))
}
