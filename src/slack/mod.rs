//! All Slack-specific functionality

pub mod channel;
pub mod client;
pub mod events;
pub mod formatting;
pub mod message;
pub mod replies;
pub mod store;
pub mod user;

// Re-export main types for convenience
pub use channel::{Channel, ChannelInfo, Content};
pub use client::{PostMessage, SlackApi, SlackClient};
pub use events::{Inbound, Normalized, Unsupported, message_from_request, normalize};
pub use message::{ChangedMessage, EventKind, Message, MessageEvent};
pub use store::EntityStore;
pub use user::{User, UserProfile};
