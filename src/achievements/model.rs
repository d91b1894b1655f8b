// SPDX-License-Identifier: MIT
//! Achievement data model — the serialisable badge type returned by the API.

use serde::{Deserialize, Serialize};

/// A single badge, as shown on the achievements screen
/// (earned = full color; unearned = grayscale).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    /// Machine-stable identifier, snake_case string, e.g. `"first_meal"`.
    pub id: String,

    /// Human-readable badge name, e.g. `"Protein Punch"`.
    pub name: String,

    /// Short description shown on the badge card.
    pub description: String,

    /// Icon name rendered by the UI.
    pub icon: String,

    /// Badge accent color as a hex string, e.g. `"#F59E0B"`.
    pub color: String,

    /// Whether the achievement has been unlocked.
    pub unlocked: bool,

    /// RFC 3339 timestamp of the unlock. `None` if not yet unlocked.
    pub unlocked_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_badge_has_no_timestamp() {
        let a = Achievement {
            id: "first_meal".to_string(),
            name: "First Bite".to_string(),
            description: "Logged your first meal.".to_string(),
            icon: "utensils".to_string(),
            color: "#22C55E".to_string(),
            unlocked: false,
            unlocked_at: None,
        };
        assert!(!a.unlocked);
        assert!(a.unlocked_at.is_none());
    }

    #[test]
    fn badge_roundtrip_json() {
        let a = Achievement {
            id: "protein_punch".to_string(),
            name: "Protein Punch".to_string(),
            description: "50 g of protein in a single meal.".to_string(),
            icon: "zap".to_string(),
            color: "#EF4444".to_string(),
            unlocked: true,
            unlocked_at: Some("2026-08-07T12:00:00Z".to_string()),
        };
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("\"unlockedAt\""));
        let back: Achievement = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "protein_punch");
        assert!(back.unlocked);
    }
}
