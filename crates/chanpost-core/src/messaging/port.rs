use async_trait::async_trait;

use crate::{
    domain::{ChatId, Destination, FileRef, MessageId, MessageRef, UserId, UserProfile},
    messaging::types::{Notice, OutgoingPost},
    Result,
};

/// Chat-platform port.
///
/// Telegram is the only implementation; the pipeline depends on nothing but
/// this trait so it can run against an in-memory fake in tests.
#[async_trait]
pub trait ChannelPort: Send + Sync {
    async fn user_profile(&self, user: UserId) -> Result<UserProfile>;

    async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>>;

    /// Post to the broadcast channel and return the new message id.
    async fn publish(&self, dest: &Destination, post: OutgoingPost) -> Result<MessageId>;

    async fn delete_post(&self, dest: &Destination, message_id: MessageId) -> Result<()>;

    async fn send_notice(&self, chat_id: ChatId, notice: Notice) -> Result<MessageRef>;

    async fn edit_notice(&self, msg: MessageRef, notice: Notice) -> Result<()>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    async fn answer_callback_query(&self, callback_id: &str) -> Result<()>;
}
