//! Push endpoint for a single subscription.
//!
//! The backend POSTs one JSON envelope per message:
//!
//! ```text
//! POST /_handlers/topics/{topic}/subscribers/{name}
//! Content-Type: application/json
//!
//! { "message": { "data": "<base64>", "messageId": "...", "attributes": {...} },
//!   "subscription": "projects/<project>/subscriptions/<name>" }
//! ```
//!
//! The response status is the only thing the backend looks at: `200`
//! acknowledges the message, anything else makes it redeliver later. Retry
//! timing and backoff stay with the backend.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{Span, debug, instrument, warn};

use crate::message::Message;
use crate::subscription::{MessageHandler, Subscription};

pub const NOT_FOUND: &str = "not found";
pub const ENVELOPE_ERROR: &str = "fatal error decoding the push envelope";
pub const PAYLOAD_ERROR: &str = "fatal error decoding message payload";
pub const EXECUTION_ERROR: &str = "message execution unsuccessful";

// Pub/Sub caps messages at 10 MB; base64 adds a third on top.
const MAX_ENVELOPE_BYTES: usize = 16 * 1024 * 1024;

/// URL path the backend pushes to for `topic`/`name`.
pub fn registration_path(topic: &str, name: &str) -> String {
    format!("/_handlers/topics/{topic}/subscribers/{name}")
}

#[derive(Debug, Deserialize)]
struct PushEnvelope {
    message: PushMessage,
    #[serde(default)]
    subscription: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushMessage {
    #[serde(default)]
    data: String,
    // Metadata is taken as raw JSON and read leniently: a malformed field is
    // dropped instead of failing a delivery whose `data` is fine.
    #[serde(default)]
    message_id: Option<Value>,
    #[serde(default)]
    publish_time: Option<Value>,
    #[serde(default)]
    attributes: Option<Value>,
}

fn lenient_message_id(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(id) if !id.is_empty() => Some(id),
        _ => None,
    }
}

fn lenient_publish_time(value: Option<Value>) -> Option<DateTime<Utc>> {
    let Value::String(raw) = value? else {
        return None;
    };
    DateTime::parse_from_rfc3339(&raw)
        .ok()
        .map(|time| time.with_timezone(&Utc))
}

fn lenient_attributes(value: Option<Value>) -> HashMap<String, String> {
    let Some(Value::Object(entries)) = value else {
        return HashMap::new();
    };
    entries
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(value) => Some((key, value)),
            _ => None,
        })
        .collect()
}

/// Why a push request could not be turned into a [`Message`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read push request body: {0}")]
    Body(#[source] axum::Error),

    #[error("invalid push envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("push envelope carries no message data")]
    EmptyData,

    #[error("message data is not valid base64: {0}")]
    Payload(#[from] base64::DecodeError),
}

impl DecodeError {
    /// Fixed body sent back to the backend.
    pub fn diagnostic(&self) -> &'static str {
        match self {
            Self::Body(_) | Self::Envelope(_) | Self::EmptyData => ENVELOPE_ERROR,
            Self::Payload(_) => PAYLOAD_ERROR,
        }
    }
}

impl IntoResponse for DecodeError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.diagnostic()).into_response()
    }
}

/// Decodes a push envelope body into a [`Message`].
pub fn decode_envelope(body: &[u8]) -> Result<Message, DecodeError> {
    let envelope: PushEnvelope = serde_json::from_slice(body)?;
    let PushMessage {
        data,
        message_id,
        publish_time,
        attributes,
    } = envelope.message;

    if data.is_empty() {
        return Err(DecodeError::EmptyData);
    }

    let mut message = Message::new(STANDARD.decode(data.as_bytes())?)
        .with_attributes(lenient_attributes(attributes));
    if let Some(id) = lenient_message_id(message_id) {
        message = message.with_message_id(id);
    }
    if let Some(time) = lenient_publish_time(publish_time) {
        message = message.with_publish_time(time);
    }
    if let Some(subscription) = envelope.subscription {
        message = message.with_subscription(subscription);
    }
    Ok(message)
}

/// Turns push requests for one subscription into handler calls.
///
/// The subscription is bound at construction and never changes, so the
/// dispatcher can be cloned into any number of concurrent request tasks.
pub struct WebhookDispatcher<H> {
    subscription: Arc<Subscription<H>>,
    path: String,
}

impl<H> Clone for WebhookDispatcher<H> {
    fn clone(&self) -> Self {
        Self {
            subscription: Arc::clone(&self.subscription),
            path: self.path.clone(),
        }
    }
}

impl<H> std::fmt::Debug for WebhookDispatcher<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("topic", &self.subscription.topic())
            .field("subscription", &self.subscription.name())
            .field("path", &self.path)
            .finish()
    }
}

impl<H: MessageHandler> WebhookDispatcher<H> {
    pub fn new(subscription: Arc<Subscription<H>>) -> Self {
        let path = registration_path(subscription.topic(), subscription.name());
        Self { subscription, path }
    }

    pub fn subscription(&self) -> &Subscription<H> {
        &self.subscription
    }

    pub fn registration_path(&self) -> &str {
        &self.path
    }

    /// Router with this dispatcher mounted at its registration path.
    ///
    /// Every method is routed to [`handle`](Self::handle) so that non-POST
    /// requests get the dispatcher's own 404.
    pub fn router(&self) -> Router {
        let dispatcher = self.clone();
        Router::new().route(
            &self.path,
            any(move |request: Request| async move { dispatcher.handle(request).await }),
        )
    }

    /// Handles one push request.
    ///
    /// - wrong path or method → `404`
    /// - undecodable envelope or base64 payload → `500` with a fixed diagnostic
    /// - handler error → `500` with [`EXECUTION_ERROR`]
    /// - handler success → `200` with an empty body
    #[instrument(
        name = "pubsub.push",
        skip_all,
        fields(
            topic = %self.subscription.topic(),
            subscription = %self.subscription.name(),
            message_id = tracing::field::Empty,
        )
    )]
    pub async fn handle(&self, request: Request) -> Response {
        if request.method() != Method::POST || request.uri().path() != self.path {
            debug!(
                method = %request.method(),
                path = %request.uri().path(),
                "Rejecting request outside the push endpoint"
            );
            return (StatusCode::NOT_FOUND, NOT_FOUND).into_response();
        }

        let message = match read_message(request).await {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Failed to decode push request");
                return e.into_response();
            }
        };

        if let Some(id) = message.message_id() {
            Span::current().record("message_id", id);
        }

        match self.subscription.handler().handle(message).await {
            Ok(()) => {
                debug!("Message acknowledged");
                StatusCode::OK.into_response()
            }
            Err(e) => {
                warn!(error = %e, "Message handler failed; backend will redeliver");
                (StatusCode::INTERNAL_SERVER_ERROR, EXECUTION_ERROR).into_response()
            }
        }
    }
}

async fn read_message(request: Request) -> Result<Message, DecodeError> {
    let body = axum::body::to_bytes(request.into_body(), MAX_ENVELOPE_BYTES)
        .await
        .map_err(DecodeError::Body)?;
    decode_envelope(&body)
}
