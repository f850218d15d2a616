//! In-memory `ChannelPort` used by the pipeline tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, Destination, FileRef, MessageId, MessageRef, UserId, UserProfile},
    errors::Error,
    messaging::{
        port::ChannelPort,
        types::{Notice, OutgoingPost},
    },
    Result,
};

#[derive(Default)]
pub(crate) struct FakeChannel {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub fail_publish: Mutex<Option<String>>,
    pub fail_profile: bool,
    pub published: Mutex<Vec<(Destination, OutgoingPost, MessageId)>>,
    pub live: Mutex<HashSet<i32>>,
    pub notices: Mutex<Vec<(ChatId, Notice)>>,
    pub edits: Mutex<Vec<(MessageRef, Notice)>>,
    pub deleted_messages: Mutex<Vec<MessageRef>>,
    pub answered: Mutex<Vec<String>>,
    next_id: Mutex<i32>,
}

impl FakeChannel {
    pub fn with_file(self, id: &str, bytes: Vec<u8>) -> Self {
        self.files.lock().unwrap().insert(id.to_string(), bytes);
        self
    }

    pub fn failing_publish(self, reason: &str) -> Self {
        *self.fail_publish.lock().unwrap() = Some(reason.to_string());
        self
    }

    pub fn failing_profile(mut self) -> Self {
        self.fail_profile = true;
        self
    }

    fn alloc(&self) -> i32 {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        100 + *next
    }

    pub fn notices(&self) -> Vec<(ChatId, Notice)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<(Destination, OutgoingPost, MessageId)> {
        self.published.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<(MessageRef, Notice)> {
        self.edits.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelPort for FakeChannel {
    async fn user_profile(&self, user: UserId) -> Result<UserProfile> {
        if self.fail_profile {
            return Err(Error::External("telegram error: chat not found".to_string()));
        }
        Ok(UserProfile {
            id: user,
            display_name: "Sam".to_string(),
        })
    }

    async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(&file.0)
            .cloned()
            .ok_or_else(|| Error::External(format!("telegram error: file {} not found", file.0)))
    }

    async fn publish(&self, dest: &Destination, post: OutgoingPost) -> Result<MessageId> {
        if let Some(reason) = self.fail_publish.lock().unwrap().clone() {
            return Err(Error::External(reason));
        }
        let id = MessageId(self.alloc());
        self.live.lock().unwrap().insert(id.0);
        self.published
            .lock()
            .unwrap()
            .push((dest.clone(), post, id));
        Ok(id)
    }

    async fn delete_post(&self, _dest: &Destination, message_id: MessageId) -> Result<()> {
        if self.live.lock().unwrap().remove(&message_id.0) {
            Ok(())
        } else {
            Err(Error::External(
                "telegram error: Bad Request: message to delete not found".to_string(),
            ))
        }
    }

    async fn send_notice(&self, chat_id: ChatId, notice: Notice) -> Result<MessageRef> {
        self.notices.lock().unwrap().push((chat_id, notice));
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(self.alloc()),
        })
    }

    async fn edit_notice(&self, msg: MessageRef, notice: Notice) -> Result<()> {
        self.edits.lock().unwrap().push((msg, notice));
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.deleted_messages.lock().unwrap().push(msg);
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        self.answered.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }
}
