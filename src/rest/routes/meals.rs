// rest/routes/meals.rs — meal ledger routes.
//
// Meal create/delete are the only mutations that can change which badges a
// user has earned, so both finish by running the recalculation trigger. The
// trigger's outcome rides along in the response but can never change the
// mutation's own status.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::achievements::trigger;
use crate::error::ApiError;
use crate::ledger::{LedgerStorage, MealRow};
use crate::AppContext;

fn meal_json(meal: &MealRow) -> Value {
    json!({
        "id":        meal.id,
        "userId":    meal.user_id,
        "name":      meal.name,
        "eatenAt":   meal.eaten_at,
        "calories":  meal.calories,
        "proteinG":  meal.protein_g,
        "carbsG":    meal.carbs_g,
        "fatG":      meal.fat_g,
        "createdAt": meal.created_at,
    })
}

async fn require_user(ctx: &AppContext, id: &str) -> Result<(), ApiError> {
    ctx.storage
        .get_user(id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound(format!("user {id}")))
}

fn validate_date(value: &str, field: &str) -> Result<(), ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ApiError::Validation(format!("{field} must be a YYYY-MM-DD date")))
}

// ─── POST /api/v1/users/{id}/meals ────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMealRequest {
    pub name: String,
    /// RFC 3339 timestamp; defaults to now.
    pub eaten_at: Option<String>,
    pub calories: i64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
}

pub async fn create_meal(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<String>,
    Json(body): Json<CreateMealRequest>,
) -> Result<Json<Value>, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("meal name must not be empty".into()));
    }
    if body.calories < 0 {
        return Err(ApiError::Validation("calories must be >= 0".into()));
    }
    for (field, value) in [
        ("proteinG", body.protein_g),
        ("carbsG", body.carbs_g),
        ("fatG", body.fat_g),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ApiError::Validation(format!("{field} must be >= 0")));
        }
    }
    let eaten_at = match body.eaten_at {
        Some(ts) => {
            chrono::DateTime::parse_from_rfc3339(&ts)
                .map_err(|_| ApiError::Validation("eatenAt must be an RFC 3339 timestamp".into()))?;
            ts
        }
        None => Utc::now().to_rfc3339(),
    };

    require_user(&ctx, &user_id).await?;

    let ledger = LedgerStorage::new(ctx.storage.pool());
    let meal = ledger
        .create_meal(
            &user_id,
            name,
            &eaten_at,
            body.calories,
            body.protein_g,
            body.carbs_g,
            body.fat_g,
        )
        .await?;

    // Advisory: a recalculation failure still returns 200 with no badges.
    let newly_unlocked = trigger::recalculate(&ctx, &user_id).await;

    Ok(Json(json!({
        "meal": meal_json(&meal),
        "newlyUnlocked": newly_unlocked,
    })))
}

// ─── DELETE /api/v1/users/{id}/meals/{meal_id} ────────────────────────────────

pub async fn delete_meal(
    State(ctx): State<Arc<AppContext>>,
    Path((user_id, meal_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    require_user(&ctx, &user_id).await?;

    let ledger = LedgerStorage::new(ctx.storage.pool());
    let deleted = ledger.delete_meal(&user_id, &meal_id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("meal {meal_id}")));
    }

    // Deletion can only ever grant (monotonic unlock) — it never revokes.
    let newly_unlocked = trigger::recalculate(&ctx, &user_id).await;

    Ok(Json(json!({
        "deleted": true,
        "newlyUnlocked": newly_unlocked,
    })))
}

// ─── GET /api/v1/users/{id}/meals ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ListMealsQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn list_meals(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<String>,
    Query(query): Query<ListMealsQuery>,
) -> Result<Json<Value>, ApiError> {
    if let Some(from) = &query.from {
        validate_date(from, "from")?;
    }
    if let Some(to) = &query.to {
        validate_date(to, "to")?;
    }
    require_user(&ctx, &user_id).await?;

    let ledger = LedgerStorage::new(ctx.storage.pool());
    let meals = ledger
        .list_meals(&user_id, query.from.as_deref(), query.to.as_deref())
        .await?;
    let list: Vec<Value> = meals.iter().map(meal_json).collect();
    Ok(Json(json!({ "meals": list })))
}

// ─── GET /api/v1/users/{id}/totals ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TotalsQuery {
    /// YYYY-MM-DD; defaults to today (UTC).
    pub date: Option<String>,
}

pub async fn daily_totals(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<String>,
    Query(query): Query<TotalsQuery>,
) -> Result<Json<Value>, ApiError> {
    let date = match query.date {
        Some(d) => {
            validate_date(&d, "date")?;
            d
        }
        None => Utc::now().date_naive().to_string(),
    };
    require_user(&ctx, &user_id).await?;

    let ledger = LedgerStorage::new(ctx.storage.pool());
    let totals = ledger.totals(&user_id, &date).await?;
    Ok(Json(serde_json::to_value(totals).map_err(anyhow::Error::from)?))
}
