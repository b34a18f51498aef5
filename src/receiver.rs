use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::app::AppState;
use crate::error::AppError;

pub const EVENTS_PATH: &str = "/slack/events";

const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
const SIGNATURE_HEADER: &str = "x-slack-signature";

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    kind: String,
    challenge: Option<String>,
    event: Option<Value>,
}

/// Router-compatible receiver; the composer mounts this at the root.
pub fn router() -> Router<AppState> {
    Router::new().route(EVENTS_PATH, post(receive_event))
}

/// Terminates inbound Slack webhooks: authenticates the raw payload, answers
/// URL verification challenges, and hands events to the registry.
async fn receive_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let timestamp = required_header(&headers, TIMESTAMP_HEADER)?;
    let signature = required_header(&headers, SIGNATURE_HEADER)?;

    // Authenticate against the raw bytes before any parsing.
    state.verifier.verify(timestamp, &body, signature)?;

    let envelope: EventEnvelope = serde_json::from_slice(&body)?;
    match envelope.kind.as_str() {
        "url_verification" => {
            let challenge = envelope.challenge.ok_or(AppError::MalformedEvent)?;
            Ok(Json(json!({ "challenge": challenge })))
        }
        "event_callback" => {
            let event = envelope.event.ok_or(AppError::MalformedEvent)?;
            let event_name = event
                .get("type")
                .and_then(Value::as_str)
                .ok_or(AppError::MalformedEvent)?
                .to_string();

            // Acknowledge within Slack's deadline; the callback gets its
            // own task.
            let registry = state.events.clone();
            tokio::spawn(async move {
                if !registry.dispatch(&event_name, event).await {
                    warn!("No handler registered for event '{}'", event_name);
                }
            });

            Ok(Json(json!({ "ok": true })))
        }
        other => {
            warn!("Unrecognized envelope type '{}'", other);
            Err(AppError::MalformedEvent)
        }
    }
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::MissingSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_url_verification() {
        let envelope: EventEnvelope =
            serde_json::from_str(r#"{"type":"url_verification","challenge":"c0ffee"}"#).unwrap();
        assert_eq!(envelope.kind, "url_verification");
        assert_eq!(envelope.challenge.as_deref(), Some("c0ffee"));
        assert!(envelope.event.is_none());
    }

    #[test]
    fn envelope_parses_event_callback() {
        let envelope: EventEnvelope = serde_json::from_str(
            r#"{"type":"event_callback","event":{"type":"app_mention","user":"U1"}}"#,
        )
        .unwrap();
        assert_eq!(envelope.kind, "event_callback");
        let event = envelope.event.unwrap();
        assert_eq!(event["type"], "app_mention");
    }

    #[test]
    fn missing_header_is_a_signature_error() {
        let headers = HeaderMap::new();
        let err = required_header(&headers, SIGNATURE_HEADER).unwrap_err();
        assert!(matches!(err, AppError::MissingSignature));
    }
}
