//! Achievement email delivery — fire-and-forget.
//!
//! Requests are queued on a bounded channel and drained by a background
//! worker that POSTs them to the configured mail API. Delivery failures are
//! logged and dropped; they can never affect unlock persistence or the
//! request that triggered them.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::retry::{retry_with_backoff, RetryConfig};

/// One achievement-unlock mail to send.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub to: String,
    pub recipient_name: String,
    pub achievement_name: String,
    pub achievement_description: String,
}

// ─── Sender handle ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct EmailSender {
    tx: mpsc::Sender<EmailRequest>,
}

impl EmailSender {
    /// Queue a mail for the background worker. Never blocks — drops silently
    /// if the queue is full.
    pub fn send(&self, request: EmailRequest) {
        if self.tx.try_send(request).is_err() {
            debug!("email queue full — dropping achievement mail");
        }
    }

    /// A sender wired to a bare receiver instead of the worker, so tests can
    /// observe exactly which mails were dispatched.
    pub fn sink() -> (Self, mpsc::Receiver<EmailRequest>) {
        let (tx, rx) = mpsc::channel(64);
        (Self { tx }, rx)
    }
}

// ─── Background worker ────────────────────────────────────────────────────────

/// Spawn the delivery worker and return its sender handle.
///
/// When email is disabled or no token is configured, requests are accepted
/// and discarded — callers never need to care.
pub fn spawn(config: Arc<AppConfig>) -> EmailSender {
    let (tx, mut rx) = mpsc::channel::<EmailRequest>(200);

    tokio::spawn(async move {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.email.timeout_secs))
            .build();
        let client = match client {
            Ok(c) => c,
            Err(e) => {
                warn!("email: failed to build HTTP client: {e:#} — delivery disabled");
                return;
            }
        };

        let retry_cfg = RetryConfig::default();

        while let Some(request) = rx.recv().await {
            if !config.email.enabled {
                debug!("email disabled — dropping achievement mail");
                continue;
            }
            let Some(token) = config.email_token.as_deref() else {
                debug!("email: no NUTRID_EMAIL_TOKEN set — dropping achievement mail");
                continue;
            };

            let payload = serde_json::json!({
                "from": config.email.from_address,
                "to": request.to,
                "subject": format!("Achievement unlocked: {}", request.achievement_name),
                "text": format!(
                    "Hi {},\n\nYou just unlocked \"{}\" — {}\n\nKeep logging!\n",
                    request.recipient_name,
                    request.achievement_name,
                    request.achievement_description,
                ),
            });

            let result = retry_with_backoff(&retry_cfg, || {
                let client = client.clone();
                let url = config.email.api_url.clone();
                let payload = payload.clone();
                async move {
                    let resp = client
                        .post(&url)
                        .bearer_auth(token)
                        .json(&payload)
                        .send()
                        .await
                        .map_err(|e| e.to_string())?;
                    if resp.status().is_success() {
                        Ok(())
                    } else {
                        Err(format!("mail API returned {}", resp.status()))
                    }
                }
            })
            .await;

            match result {
                Ok(()) => debug!(to = %request.to, badge = %request.achievement_name, "achievement mail sent"),
                Err(e) => warn!(to = %request.to, err = %e, "achievement mail failed — dropped"),
            }
        }
    });

    EmailSender { tx }
}
