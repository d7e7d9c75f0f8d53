//! Classification of inbound Events API payloads.
//!
//! `normalize` is a pure function of its input: a message passes through
//! untouched, a handshake yields its challenge, a supported event callback
//! becomes a `Message`, and everything else is `Unsupported`.

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::message::{EventKind, Message, MessageEvent};

/// Input to the normalizer: a raw webhook body or an already-built message.
#[derive(Debug, Clone)]
pub enum Inbound<'a> {
    Payload(&'a Value),
    Message(Message),
}

impl<'a> From<&'a Value> for Inbound<'a> {
    fn from(payload: &'a Value) -> Self {
        Inbound::Payload(payload)
    }
}

impl From<Message> for Inbound<'_> {
    fn from(message: Message) -> Self {
        Inbound::Message(message)
    }
}

impl From<&Message> for Inbound<'_> {
    fn from(message: &Message) -> Self {
        Inbound::Message(message.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Message(Message),
    /// URL verification handshake; the token is echoed back, never dispatched.
    Challenge(String),
    Unsupported(Unsupported),
}

/// Why a payload produced no message. Not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    /// An event callback whose inner event kind is not a chat message.
    EventKind(String),
    /// Anything that is not a recognizable envelope.
    Malformed(String),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Envelope {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        event_id: String,
        event: Value,
    },
    #[serde(other)]
    Other,
}

#[must_use]
pub fn normalize<'a>(input: impl Into<Inbound<'a>>) -> Normalized {
    let payload = match input.into() {
        Inbound::Message(message) => return Normalized::Message(message),
        Inbound::Payload(payload) => payload,
    };

    let envelope = match Envelope::deserialize(payload) {
        Ok(envelope) => envelope,
        Err(e) => return unsupported(Unsupported::Malformed(e.to_string())),
    };

    match envelope {
        Envelope::UrlVerification { challenge } => Normalized::Challenge(challenge),
        Envelope::EventCallback { event_id, event } => normalize_callback(event_id, &event),
        Envelope::Other => {
            let kind = payload.get("type").and_then(Value::as_str).unwrap_or("");
            unsupported(Unsupported::Malformed(format!("payload type '{kind}'")))
        }
    }
}

fn normalize_callback(event_id: String, event: &Value) -> Normalized {
    let kind = event.get("type").and_then(Value::as_str).unwrap_or("");
    if EventKind::parse(kind).is_none() {
        return unsupported(Unsupported::EventKind(kind.to_string()));
    }

    match MessageEvent::deserialize(event) {
        Ok(event) => Normalized::Message(Message::new(event_id, event)),
        Err(e) => unsupported(Unsupported::Malformed(format!("{kind} event: {e}"))),
    }
}

fn unsupported(reason: Unsupported) -> Normalized {
    match &reason {
        Unsupported::EventKind(kind) => {
            info!(event_type = %kind, "Support for events of type {kind} not yet implemented");
        }
        Unsupported::Malformed(detail) => {
            info!(detail = %detail, "Unrecognized request shape");
        }
    }
    Normalized::Unsupported(reason)
}

/// The message carried by a request, if any. Idempotent: a `Message` comes
/// back unchanged.
#[must_use]
pub fn message_from_request<'a>(input: impl Into<Inbound<'a>>) -> Option<Message> {
    match normalize(input) {
        Normalized::Message(message) => Some(message),
        Normalized::Challenge(_) | Normalized::Unsupported(_) => None,
    }
}

/// The handshake token when `payload` is a URL verification request.
#[must_use]
pub fn challenge(payload: &Value) -> Option<String> {
    match Envelope::deserialize(payload) {
        Ok(Envelope::UrlVerification { challenge }) => Some(challenge),
        _ => None,
    }
}
