pub mod achievements;
pub mod coach;
pub mod config;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod rest;
pub mod retry;
pub mod storage;

use std::sync::Arc;

use coach::CoachClient;
use config::AppConfig;
use notify::{EventBroadcaster, NotificationDispatcher};
use storage::Storage;

/// Shared application state passed to every route handler and background task.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub storage: Arc<Storage>,
    pub broadcaster: Arc<EventBroadcaster>,
    /// Achievement notification fan-out: UI events + email, fire-and-forget.
    pub dispatcher: NotificationDispatcher,
    /// `None` when no AI key is injected — the coach endpoint answers 503.
    pub coach: Option<CoachClient>,
    pub started_at: std::time::Instant,
}
