#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use slack_ingress::api::{JobQueue, Router, RuleRouter};
use slack_ingress::core::cache::EntityCache;
use slack_ingress::core::models::Route;
use slack_ingress::slack::{EntityStore, Message, PostMessage, SlackApi};
use slack_ingress::SlackError;

pub const BOT_ID: &str = "U1";
/// The bot id `auth.test` reports alongside `BOT_ID`.
pub const OWN_BOT_ID: &str = "B0SELF";

/// In-memory Slack workspace. Unknown users are humans named after their
/// id; unknown channels are public channels named after theirs.
pub struct FakeSlack {
    bot_id: String,
    users: Mutex<HashMap<String, Value>>,
    channels: Mutex<HashMap<String, Value>>,
    members: Mutex<HashMap<String, Vec<String>>>,
    calls: Mutex<Vec<String>>,
    pub posts: Mutex<Vec<PostMessage>>,
    pub reactions: Mutex<Vec<(String, String, String)>>,
    unavailable: AtomicBool,
}

impl FakeSlack {
    pub fn new(bot_id: &str) -> Self {
        Self {
            bot_id: bot_id.to_string(),
            users: Mutex::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
            members: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            posts: Mutex::new(Vec::new()),
            reactions: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn with_user(self, data: Value) -> Self {
        let id = data["id"].as_str().unwrap().to_string();
        self.users.lock().unwrap().insert(id, data);
        self
    }

    pub fn with_bot_user(self, id: &str, real_name: &str) -> Self {
        self.with_user(json!({
            "id": id,
            "name": real_name.to_lowercase(),
            "real_name": real_name,
            "is_bot": true
        }))
    }

    pub fn with_channel(self, data: Value) -> Self {
        let id = data["id"].as_str().unwrap().to_string();
        self.channels.lock().unwrap().insert(id, data);
        self
    }

    pub fn with_dm_channel(self, id: &str) -> Self {
        self.with_channel(json!({"id": id, "is_im": true, "is_private": false, "user": "U2"}))
    }

    pub fn with_members(self, channel: &str, ids: &[&str]) -> Self {
        self.members.lock().unwrap().insert(
            channel.to_string(),
            ids.iter().map(ToString::to_string).collect(),
        );
        self
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.as_str() == method)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, method: &str) -> Result<(), SlackError> {
        self.calls.lock().unwrap().push(method.to_string());
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SlackError::HttpError(format!("{method}: connection refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn auth_test(&self) -> Result<Value, SlackError> {
        self.record("auth.test")?;
        Ok(json!({"ok": true, "user_id": self.bot_id, "bot_id": OWN_BOT_ID}))
    }

    async fn conversations_info(&self, channel: &str) -> Result<Value, SlackError> {
        self.record("conversations.info")?;
        let channels = self.channels.lock().unwrap();
        let found = match channel.strip_prefix('#') {
            Some(name) => channels
                .values()
                .find(|c| c["name"].as_str() == Some(name))
                .cloned(),
            None => channels.get(channel).cloned(),
        };
        match found {
            Some(data) => Ok(json!({"ok": true, "channel": data})),
            None if channel.starts_with('#') => {
                Err(SlackError::ApiError("conversations.info error: channel_not_found".into()))
            }
            None => Ok(json!({
                "ok": true,
                "channel": {"id": channel, "name": channel.to_lowercase(), "is_im": false}
            })),
        }
    }

    async fn conversations_members(&self, channel: &str) -> Result<Vec<String>, SlackError> {
        self.record("conversations.members")?;
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(channel)
            .cloned()
            .unwrap_or_default())
    }

    async fn chat_post_message(&self, message: &PostMessage) -> Result<Value, SlackError> {
        self.record("chat.postMessage")?;
        message.validate()?;
        self.posts.lock().unwrap().push(message.clone());
        Ok(json!({"ok": true, "channel": message.channel, "ts": "9999.0001"}))
    }

    async fn reactions_add(
        &self,
        channel: &str,
        name: &str,
        timestamp: &str,
    ) -> Result<(), SlackError> {
        self.record("reactions.add")?;
        self.reactions.lock().unwrap().push((
            channel.to_string(),
            name.to_string(),
            timestamp.to_string(),
        ));
        Ok(())
    }

    async fn users_info(&self, user: &str) -> Result<Value, SlackError> {
        self.record("users.info")?;
        let users = self.users.lock().unwrap();
        let found = match user.strip_prefix('@') {
            Some(handle) => users
                .values()
                .find(|u| u["name"].as_str() == Some(handle))
                .cloned(),
            None => users.get(user).cloned(),
        };
        let data = found.unwrap_or_else(|| json!({"id": user, "name": user.to_lowercase(), "is_bot": false}));
        Ok(json!({"ok": true, "user": data}))
    }

    async fn users_lookup_by_email(&self, email: &str) -> Result<Value, SlackError> {
        self.record("users.lookupByEmail")?;
        let users = self.users.lock().unwrap();
        match users
            .values()
            .find(|u| u["profile"]["email"].as_str() == Some(email))
        {
            Some(data) => Ok(json!({"ok": true, "user": data})),
            None => Ok(json!({"ok": false, "error": "users_not_found"})),
        }
    }
}

pub fn store_for(fake: &Arc<FakeSlack>) -> EntityStore {
    EntityStore::new(fake.clone(), Arc::new(EntityCache::new()))
}

/// Records every enqueued job.
#[derive(Default)]
pub struct RecordingQueue {
    pub jobs: Mutex<Vec<(Route, Value)>>,
    pub fail: AtomicBool,
}

impl RecordingQueue {
    pub fn jobs(&self) -> Vec<(Route, Value)> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, route: &Route, payload: &Value) -> Result<(), SlackError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SlackError::AwsError("Failed to send message to SQS: throttled".into()));
        }
        self.jobs
            .lock()
            .unwrap()
            .push((route.clone(), payload.clone()));
        Ok(())
    }
}

/// Wraps a `RuleRouter`, counting how often routing is attempted.
pub struct CountingRouter {
    inner: RuleRouter,
    pub routed: AtomicUsize,
    pub defaulted: AtomicUsize,
}

impl CountingRouter {
    pub fn new(inner: RuleRouter) -> Self {
        Self {
            inner,
            routed: AtomicUsize::new(0),
            defaulted: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Router for CountingRouter {
    async fn route(
        &self,
        message: &Message,
        store: &EntityStore,
    ) -> Result<Option<Route>, SlackError> {
        self.routed.fetch_add(1, Ordering::SeqCst);
        self.inner.route(message, store).await
    }

    async fn default_route(
        &self,
        message: &Message,
        store: &EntityStore,
    ) -> Result<Route, SlackError> {
        self.defaulted.fetch_add(1, Ordering::SeqCst);
        self.inner.default_route(message, store).await
    }
}

/// A `message_changed` event as Slack sends it for edits: no outer `user`,
/// the author nested under `message`.
pub fn edit_payload(author: &str, channel: &str) -> Value {
    json!({
        "type": "event_callback",
        "event_id": "Ev5",
        "event": {
            "type": "message",
            "subtype": "message_changed",
            "channel": channel,
            "ts": "1234570.00",
            "hidden": true,
            "message": {
                "type": "message",
                "user": author,
                "text": "edited text",
                "ts": "1234567.89",
                "edited": {"user": author, "ts": "1234570.00"}
            },
            "previous_message": {"type": "message", "user": author, "text": "text"}
        }
    })
}

pub fn event_payload(kind: &str, text: &str, user: &str, channel: &str) -> Value {
    json!({
        "token": "verification-token",
        "team_id": "T1",
        "api_app_id": "A1",
        "type": "event_callback",
        "event_id": "ABC123",
        "event_time": 1_234_567,
        "event": {
            "type": kind,
            "text": text,
            "ts": "1234567.89",
            "channel": channel,
            "user": user
        }
    })
}
