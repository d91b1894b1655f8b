// SPDX-License-Identifier: MIT
//! Badge catalog — fixed table of achievement definitions and their
//! predicates over a user's ledger history.
//!
//! Achievement IDs use snake_case as their string value (e.g. `"first_meal"`)
//! and are stable across versions — an id is never reused for a different
//! badge. The catalog is fixed at process start; adding or removing a badge
//! is a deployment-time change.

use crate::ledger::UserHistory;

// ─── Achievement ID constants ─────────────────────────────────────────────────

pub const FIRST_MEAL: &str = "first_meal";
pub const MEALS_10: &str = "meals_10";
pub const MEALS_100: &str = "meals_100";
pub const MEALS_500: &str = "meals_500";
pub const WEEK_LOGGED: &str = "week_logged";
pub const MONTH_LOGGED: &str = "month_logged";
pub const PROTEIN_PUNCH: &str = "protein_punch";
pub const PROTEIN_MOUNTAIN: &str = "protein_mountain";
pub const GOAL_GETTER: &str = "goal_getter";
pub const MACRO_MASTER: &str = "macro_master";
pub const EARLY_BIRD: &str = "early_bird";
pub const MIDNIGHT_SNACKER: &str = "midnight_snacker";
pub const BADGE_COLLECTOR: &str = "badge_collector";

/// Unlock count at which `badge_collector` is granted.
pub const BADGE_COLLECTOR_THRESHOLD: u64 = 10;

// ─── Definition table ─────────────────────────────────────────────────────────

/// One row of the badge catalog: stable id, display metadata, and a pure
/// predicate over the user's aggregated history.
///
/// Predicates are deterministic, side-effect free, and independent of each
/// other, so the evaluator may run them in any order, any number of times.
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub predicate: fn(&UserHistory) -> bool,
}

/// Return the full badge catalog.
///
/// This list is the canonical source of truth: the achievements endpoint
/// lists exactly these badges, and the evaluator unlocks from exactly this
/// set. `badge_collector` is the one entry not driven by ledger history —
/// its predicate is always false here and the evaluator grants it in a
/// follow-up pass once ten other badges are unlocked.
pub fn all_definitions() -> Vec<AchievementDef> {
    vec![
        AchievementDef {
            id: FIRST_MEAL,
            name: "First Bite",
            description: "Logged your first meal. The habit starts here.",
            icon: "utensils",
            color: "#22C55E",
            predicate: |h| h.meal_count >= 1,
        },
        AchievementDef {
            id: MEALS_10,
            name: "Getting Warmed Up",
            description: "Logged 10 meals.",
            icon: "flame",
            color: "#F97316",
            predicate: |h| h.meal_count >= 10,
        },
        AchievementDef {
            id: MEALS_100,
            name: "Century",
            description: "Logged 100 meals.",
            icon: "trophy",
            color: "#EAB308",
            predicate: |h| h.meal_count >= 100,
        },
        AchievementDef {
            id: MEALS_500,
            name: "Power Logger",
            description: "Logged 500 meals. Nothing escapes your ledger.",
            icon: "crown",
            color: "#A855F7",
            predicate: |h| h.meal_count >= 500,
        },
        AchievementDef {
            id: WEEK_LOGGED,
            name: "Full Week",
            description: "Logged meals on 7 different days.",
            icon: "calendar",
            color: "#3B82F6",
            predicate: |h| h.distinct_days >= 7,
        },
        AchievementDef {
            id: MONTH_LOGGED,
            name: "Habit Formed",
            description: "Logged meals on 30 different days.",
            icon: "calendar-check",
            color: "#6366F1",
            predicate: |h| h.distinct_days >= 30,
        },
        AchievementDef {
            id: PROTEIN_PUNCH,
            name: "Protein Punch",
            description: "50 g of protein in a single meal.",
            icon: "zap",
            color: "#EF4444",
            predicate: |h| h.max_meal_protein_g >= 50.0,
        },
        AchievementDef {
            id: PROTEIN_MOUNTAIN,
            name: "Protein Mountain",
            description: "1,000 g of protein logged lifetime.",
            icon: "mountain",
            color: "#DC2626",
            predicate: |h| h.total_protein_g >= 1_000.0,
        },
        AchievementDef {
            id: GOAL_GETTER,
            name: "Goal Getter",
            description: "Stayed within your calorie goal on 7 days.",
            icon: "target",
            color: "#14B8A6",
            predicate: |h| h.days_calorie_goal_met >= 7,
        },
        AchievementDef {
            id: MACRO_MASTER,
            name: "Macro Master",
            description: "Hit your protein goal on 7 days.",
            icon: "bar-chart",
            color: "#0EA5E9",
            predicate: |h| h.days_protein_goal_met >= 7,
        },
        AchievementDef {
            id: EARLY_BIRD,
            name: "Early Bird",
            description: "Logged a meal before 8 in the morning.",
            icon: "sunrise",
            color: "#FACC15",
            predicate: |h| h.logged_before_8,
        },
        AchievementDef {
            id: MIDNIGHT_SNACKER,
            name: "Midnight Snacker",
            description: "Logged a meal after 10 at night.",
            icon: "moon",
            color: "#64748B",
            predicate: |h| h.logged_after_22,
        },
        AchievementDef {
            id: BADGE_COLLECTOR,
            name: "Badge Collector",
            description: "Unlocked 10 or more achievements.",
            icon: "award",
            color: "#EC4899",
            // Granted by the evaluator's follow-up pass, not by history.
            predicate: |_| false,
        },
    ]
}

/// Look up a definition by id.
pub fn find(id: &str) -> Option<AchievementDef> {
    all_definitions().into_iter().find(|d| d.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let defs = all_definitions();
        let ids: HashSet<&str> = defs.iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), defs.len());
    }

    #[test]
    fn empty_history_satisfies_nothing() {
        let h = UserHistory::default();
        for def in all_definitions() {
            assert!(!(def.predicate)(&h), "{} fired on empty history", def.id);
        }
    }

    #[test]
    fn protein_punch_requires_a_single_heavy_meal() {
        let mut h = UserHistory {
            meal_count: 20,
            total_protein_g: 400.0,
            max_meal_protein_g: 49.9,
            ..Default::default()
        };
        let def = find(PROTEIN_PUNCH).unwrap();
        assert!(!(def.predicate)(&h));
        h.max_meal_protein_g = 50.0;
        assert!((def.predicate)(&h));
    }

    #[test]
    fn meal_count_tiers_fire_in_order() {
        let h = UserHistory {
            meal_count: 100,
            ..Default::default()
        };
        assert!((find(FIRST_MEAL).unwrap().predicate)(&h));
        assert!((find(MEALS_10).unwrap().predicate)(&h));
        assert!((find(MEALS_100).unwrap().predicate)(&h));
        assert!(!(find(MEALS_500).unwrap().predicate)(&h));
    }

    #[test]
    fn hour_flags_drive_time_badges() {
        let h = UserHistory {
            meal_count: 1,
            logged_before_8: true,
            ..Default::default()
        };
        assert!((find(EARLY_BIRD).unwrap().predicate)(&h));
        assert!(!(find(MIDNIGHT_SNACKER).unwrap().predicate)(&h));
    }

    #[test]
    fn predicates_are_deterministic() {
        let h = UserHistory {
            meal_count: 12,
            distinct_days: 8,
            max_meal_protein_g: 55.0,
            ..Default::default()
        };
        for def in all_definitions() {
            let first = (def.predicate)(&h);
            for _ in 0..10 {
                assert_eq!((def.predicate)(&h), first, "{} was not stable", def.id);
            }
        }
    }
}
