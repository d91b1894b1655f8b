//! Ledger data models — derived aggregate types returned by the ledger reads.

use serde::{Deserialize, Serialize};

// ─── Daily Totals ─────────────────────────────────────────────────────────────

/// Nutrient sums for one user/date, computed on demand from meal rows.
///
/// A user/date with no meals yields the all-zero value — "no data" is not
/// an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotals {
    /// ISO 8601 calendar date, e.g. `"2026-08-07"`.
    pub date: String,

    pub calories: i64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,

    /// Number of meals logged on this date.
    pub meal_count: u64,
}

// ─── User History ─────────────────────────────────────────────────────────────

/// Lifetime aggregate snapshot of a user's ledger, fed to achievement
/// predicates. Built fresh from current rows for every evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserHistory {
    /// Total meals ever logged.
    pub meal_count: u64,

    /// Distinct calendar days with at least one meal.
    pub distinct_days: u64,

    /// Highest protein content of any single meal, in grams.
    pub max_meal_protein_g: f64,

    /// Highest calorie count of any single meal.
    pub max_meal_calories: i64,

    pub total_calories: i64,
    pub total_protein_g: f64,

    /// Days with at least one meal whose calorie sum stayed at or under the
    /// user's daily calorie goal.
    pub days_calorie_goal_met: u64,

    /// Days whose protein sum reached the user's daily protein goal.
    pub days_protein_goal_met: u64,

    /// At least one meal was logged before 08:00.
    pub logged_before_8: bool,

    /// At least one meal was logged at or after 22:00.
    pub logged_after_22: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_totals_are_all_zero() {
        let t = DailyTotals {
            date: "2026-08-07".to_string(),
            ..Default::default()
        };
        assert_eq!(t.calories, 0);
        assert_eq!(t.protein_g, 0.0);
        assert_eq!(t.meal_count, 0);
    }

    #[test]
    fn totals_roundtrip_json_camel_case() {
        let t = DailyTotals {
            date: "2026-08-07".to_string(),
            calories: 1850,
            protein_g: 92.5,
            carbs_g: 210.0,
            fat_g: 61.2,
            meal_count: 3,
        };
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"proteinG\""));
        assert!(json.contains("\"mealCount\""));
        let back: DailyTotals = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
