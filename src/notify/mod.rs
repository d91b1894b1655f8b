//! Notification dispatch — surfaces newly unlocked achievements to the UI
//! event stream and to the email worker, exactly once per unlock.
//!
//! Dedup lives upstream: the evaluator only ever hands this module badges
//! it just inserted, so nothing here re-checks unlock state.

pub mod email;
pub mod event;

pub use email::{EmailRequest, EmailSender};
pub use event::EventBroadcaster;

use serde_json::json;
use std::sync::Arc;

use crate::achievements::Achievement;
use crate::storage::UserRow;

#[derive(Clone)]
pub struct NotificationDispatcher {
    broadcaster: Arc<EventBroadcaster>,
    mailer: EmailSender,
}

impl NotificationDispatcher {
    pub fn new(broadcaster: Arc<EventBroadcaster>, mailer: EmailSender) -> Self {
        Self { broadcaster, mailer }
    }

    /// Emit one UI event and enqueue one email per newly unlocked badge.
    /// Both paths are fire-and-forget; neither can fail the caller.
    pub fn notify(&self, user: &UserRow, newly_unlocked: &[Achievement]) {
        for achievement in newly_unlocked {
            self.broadcaster.broadcast(
                "achievement.unlocked",
                json!({
                    "userId": user.id,
                    "achievement": achievement,
                }),
            );
            self.mailer.send(EmailRequest {
                to: user.email.clone(),
                recipient_name: user.name.clone(),
                achievement_name: achievement.name.clone(),
                achievement_description: achievement.description.clone(),
            });
        }
    }
}
