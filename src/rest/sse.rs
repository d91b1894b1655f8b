// rest/sse.rs — SSE push event bridge.
//
// GET /api/v1/users/{id}/events
//
// Streams push events (achievement unlocks) as Server-Sent Events. The
// handler subscribes to the in-process broadcast channel and forwards
// events that belong to this user or are global.

use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures_util::stream;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::AppContext;

pub async fn user_events_sse(
    State(ctx): State<Arc<AppContext>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let rx = ctx.broadcaster.subscribe();

    let s = stream::unfold((rx, user_id), move |(mut rx, uid)| async move {
        loop {
            match rx.recv().await {
                Ok(event_str) => {
                    // Parse the JSON string emitted by EventBroadcaster
                    let event: serde_json::Value = match serde_json::from_str(&event_str) {
                        Ok(v) => v,
                        Err(_) => continue,
                    };

                    let event_user = event
                        .get("params")
                        .and_then(|p| p.get("userId"))
                        .and_then(|v| v.as_str())
                        .unwrap_or("");

                    if event_user == uid || event_user.is_empty() {
                        let method = event
                            .get("method")
                            .and_then(|v| v.as_str())
                            .unwrap_or("event")
                            .to_string();
                        let data = json!({
                            "method": event.get("method"),
                            "params": event.get("params"),
                        });
                        let sse_event = Event::default().data(data.to_string()).event(method);
                        return Some((Ok::<Event, std::convert::Infallible>(sse_event), (rx, uid)));
                    }
                    // Not our user — keep waiting
                }
                Err(_) => return None,
            }
        }
    });

    Sse::new(s).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
