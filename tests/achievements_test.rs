//! Integration tests for the achievement engine against a real SQLite
//! database: convergence after mutation sequences, idempotence, monotonic
//! unlock, and duplicate-freedom under concurrent evaluation.

use nutrid::achievements::{catalog, evaluator, AchievementStorage};
use nutrid::ledger::LedgerStorage;
use nutrid::storage::{Storage, UserRow};
use tempfile::TempDir;

struct App {
    storage: Storage,
    ledger: LedgerStorage,
    achievements: AchievementStorage,
    user: UserRow,
}

async fn make_app(dir: &TempDir) -> App {
    let storage = Storage::new(dir.path()).await.unwrap();
    let ledger = LedgerStorage::new(storage.pool());
    let achievements = AchievementStorage::new(storage.pool());
    let user = storage
        .create_user("Maya", "maya@example.com", 2000, 100)
        .await
        .unwrap();
    App {
        storage,
        ledger,
        achievements,
        user,
    }
}

async fn evaluate(app: &App) -> Vec<String> {
    evaluator::evaluate(&app.achievements, &app.ledger, &app.user)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect()
}

#[tokio::test]
async fn second_evaluation_is_empty_after_every_mutation() {
    let dir = TempDir::new().unwrap();
    let app = make_app(&dir).await;

    let mutations: Vec<(&str, &str, i64, f64)> = vec![
        ("oats", "2026-08-01T08:00:00Z", 350, 12.0),
        ("chicken bowl", "2026-08-01T12:30:00Z", 620, 48.0),
        ("steak", "2026-08-02T19:00:00Z", 700, 62.0),
        ("salad", "2026-08-03T13:00:00Z", 200, 5.0),
    ];

    for (name, eaten_at, calories, protein) in mutations {
        app.ledger
            .create_meal(&app.user.id, name, eaten_at, calories, protein, 10.0, 10.0)
            .await
            .unwrap();

        let _first = evaluate(&app).await;
        let second = evaluate(&app).await;
        assert!(second.is_empty(), "repeat evaluation granted {second:?}");
    }
}

#[tokio::test]
async fn mutation_sequence_converges_to_the_expected_badge_set() {
    let dir = TempDir::new().unwrap();
    let app = make_app(&dir).await;

    // Seven days of logging, one qualifying protein meal on day two.
    for day in 1..=7 {
        let protein = if day == 2 { 55.0 } else { 20.0 };
        app.ledger
            .create_meal(
                &app.user.id,
                "meal",
                &format!("2026-08-0{day}T12:00:00Z"),
                600,
                protein,
                40.0,
                20.0,
            )
            .await
            .unwrap();
    }

    let newly = evaluate(&app).await;
    for expected in [
        catalog::FIRST_MEAL,
        catalog::WEEK_LOGGED,
        catalog::PROTEIN_PUNCH,
        catalog::GOAL_GETTER,
    ] {
        assert!(newly.contains(&expected.to_string()), "missing {expected} in {newly:?}");
    }
    assert!(!newly.contains(&catalog::MEALS_10.to_string()));

    // Three more meals pushes the count past ten.
    for hour in 13..16 {
        app.ledger
            .create_meal(
                &app.user.id,
                "snack",
                &format!("2026-08-08T{hour}:00:00Z"),
                150,
                8.0,
                12.0,
                6.0,
            )
            .await
            .unwrap();
    }
    let newly = evaluate(&app).await;
    assert!(newly.contains(&catalog::MEALS_10.to_string()));
}

#[tokio::test]
async fn deleting_the_qualifying_meal_never_revokes() {
    let dir = TempDir::new().unwrap();
    let app = make_app(&dir).await;

    let meal = app
        .ledger
        .create_meal(&app.user.id, "steak", "2026-08-07T19:00:00Z", 700, 62.0, 5.0, 40.0)
        .await
        .unwrap();
    let newly = evaluate(&app).await;
    assert!(newly.contains(&catalog::PROTEIN_PUNCH.to_string()));

    // History drops below the rule's threshold, but the unlock stays.
    app.ledger.delete_meal(&app.user.id, &meal.id).await.unwrap();
    assert!(evaluate(&app).await.is_empty());

    let list = app.achievements.list(&app.user.id).await.unwrap();
    let punch = list.iter().find(|a| a.id == catalog::PROTEIN_PUNCH).unwrap();
    assert!(punch.unlocked);
}

#[tokio::test]
async fn concurrent_evaluations_never_duplicate_rows() {
    let dir = TempDir::new().unwrap();
    let app = make_app(&dir).await;

    app.ledger
        .create_meal(&app.user.id, "steak", "2026-08-07T19:00:00Z", 700, 62.0, 5.0, 40.0)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let achievements = AchievementStorage::new(app.storage.pool());
        let ledger = LedgerStorage::new(app.storage.pool());
        let user = app.user.clone();
        handles.push(tokio::spawn(async move {
            evaluator::evaluate(&achievements, &ledger, &user).await.unwrap()
        }));
    }

    let mut protein_punch_reports = 0;
    for handle in handles {
        let newly = handle.await.unwrap();
        protein_punch_reports += newly
            .iter()
            .filter(|a| a.id == catalog::PROTEIN_PUNCH)
            .count();
    }
    assert!(
        protein_punch_reports <= 1,
        "badge reported new {protein_punch_reports} times"
    );

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM unlocked_achievements WHERE user_id = ? AND achievement_id = ?",
    )
    .bind(&app.user.id)
    .bind(catalog::PROTEIN_PUNCH)
    .fetch_one(&app.storage.pool())
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn zero_history_yields_zero_totals_and_no_unlocks() {
    let dir = TempDir::new().unwrap();
    let app = make_app(&dir).await;

    let totals = app.ledger.totals(&app.user.id, "2026-08-07").await.unwrap();
    assert_eq!(totals.calories, 0);
    assert_eq!(totals.protein_g, 0.0);

    assert!(evaluate(&app).await.is_empty());
    let list = app.achievements.list(&app.user.id).await.unwrap();
    assert!(list.iter().all(|a| !a.unlocked));
}
