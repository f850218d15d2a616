//! Fixtures shared by the handler tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use teloxide::types::{CallbackQuery, Message};

use chanpost_core::{
    config::Config,
    domain::{ChatId, Destination, FileRef, MessageId, MessageRef, UserId, UserProfile},
    errors::Error,
    messaging::{
        port::ChannelPort,
        types::{Notice, OutgoingPost},
    },
    ports::TextGenerator,
    watermark::Watermarker,
    Result,
};

use crate::router::AppState;

pub(crate) const SUBMITTER: i64 = 42;

fn user(id: i64) -> Value {
    json!({"id": id, "is_bot": false, "first_name": "Sam"})
}

/// A private-chat message from `SUBMITTER`; `extra` adds or replaces top-level fields.
pub(crate) fn message(extra: Value) -> Message {
    let mut raw = json!({
        "message_id": 7,
        "date": 1_700_000_000,
        "chat": {"id": SUBMITTER, "type": "private", "first_name": "Sam"},
        "from": user(SUBMITTER),
    });
    if let (Some(base), Value::Object(extra)) = (raw.as_object_mut(), extra) {
        base.extend(extra);
    }
    serde_json::from_value(raw).unwrap()
}

pub(crate) fn message_from(sender: i64, extra: Value) -> Message {
    let mut extra = extra;
    extra["from"] = user(sender);
    message(extra)
}

pub(crate) fn callback(sender: i64, data: &str, control_message_id: i32) -> CallbackQuery {
    let raw = json!({
        "id": "cb-1",
        "from": user(sender),
        "chat_instance": "ci",
        "data": data,
        "message": {
            "message_id": control_message_id,
            "date": 1_700_000_000,
            "chat": {"id": SUBMITTER, "type": "private", "first_name": "Sam"},
            "from": {"id": 1, "is_bot": true, "first_name": "chanpost"},
            "text": "✅ Your post was published to the channel.",
        },
    });
    serde_json::from_value(raw).unwrap()
}

/// Records every port call, in order, as a short line.
#[derive(Default)]
pub(crate) struct RecordingChannel {
    events: Mutex<Vec<String>>,
}

impl RecordingChannel {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ChannelPort for RecordingChannel {
    async fn user_profile(&self, user: UserId) -> Result<UserProfile> {
        Ok(UserProfile {
            id: user,
            display_name: "Sam".to_string(),
        })
    }

    async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>> {
        Err(Error::External(format!("file {} not found", file.0)))
    }

    async fn publish(&self, _dest: &Destination, post: OutgoingPost) -> Result<MessageId> {
        self.record(format!("publish {}", post.body.kind()));
        Ok(MessageId(101))
    }

    async fn delete_post(&self, _dest: &Destination, message_id: MessageId) -> Result<()> {
        self.record(format!("delete_post {}", message_id.0));
        Ok(())
    }

    async fn send_notice(&self, chat_id: ChatId, _notice: Notice) -> Result<MessageRef> {
        self.record(format!("notice {}", chat_id.0));
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(900),
        })
    }

    async fn edit_notice(&self, msg: MessageRef, _notice: Notice) -> Result<()> {
        self.record(format!("edit {}", msg.message_id.0));
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.record(format!("delete_message {}", msg.message_id.0));
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        self.record(format!("answer {callback_id}"));
        Ok(())
    }
}

struct FixedTags;

#[async_trait]
impl TextGenerator for FixedTags {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok("#deals".to_string())
    }
}

pub(crate) fn state(channel: Arc<RecordingChannel>) -> Arc<AppState> {
    let cfg = Config::from_lookup(|key| {
        let v = match key {
            "BOT_TOKEN" => "123:abc",
            "ADMIN_USER_ID" => "42",
            "CHANNEL_ID" => "@deals",
            "GEMINI_API_KEY" => "key",
            _ => return None,
        };
        Some(v.to_string())
    })
    .unwrap();

    Arc::new(AppState::new(
        Arc::new(cfg),
        channel,
        Arc::new(FixedTags),
        Arc::new(Watermarker::with_bitmap_font("@deals ©", 16.0, 20)),
    ))
}
