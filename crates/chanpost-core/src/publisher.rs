//! Submission → channel pipeline.
//!
//! buttons → hashtags → submitter signature → caption → route by media kind →
//! publish → confirmation with a retraction control. Every failure ends as a
//! diagnostic to the submitter; nothing propagates to the caller.
//!
//! Confirmations and diagnostics go to the submitter's private chat, whatever
//! chat the submission arrived in.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    buttons::extract_buttons,
    caption::compose_caption,
    config::Config,
    domain::{ChatId, ContentSnapshot, Media, MessageId},
    formatting::escape_markdown_v2,
    hashtags::HashtagGenerator,
    messaging::{
        port::ChannelPort,
        types::{InlineKeyboard, Notice, OutgoingPost, PostBody},
    },
    retraction::retraction_token,
    watermark::Watermarker,
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    Published(MessageId),
    Failed(String),
    NothingToPublish,
}

pub struct Publisher {
    cfg: Arc<Config>,
    channel: Arc<dyn ChannelPort>,
    hashtags: HashtagGenerator,
    watermark: Arc<Watermarker>,
}

impl Publisher {
    pub fn new(
        cfg: Arc<Config>,
        channel: Arc<dyn ChannelPort>,
        hashtags: HashtagGenerator,
        watermark: Arc<Watermarker>,
    ) -> Self {
        Self {
            cfg,
            channel,
            hashtags,
            watermark,
        }
    }

    pub async fn publish(&self, snapshot: ContentSnapshot) -> PublishOutcome {
        let chat_id = ChatId(self.cfg.admin_user_id.0);

        if snapshot.is_empty() {
            self.notify(
                chat_id,
                Notice::plain("⚠️ Nothing to publish. Send text, a photo, a video or a document."),
            )
            .await;
            return PublishOutcome::NothingToPublish;
        }

        match self.dispatch(&snapshot).await {
            Ok(message_id) => {
                info!(
                    channel = %self.cfg.channel,
                    message_id = message_id.0,
                    source_chat = snapshot.chat_id().0,
                    "post published"
                );
                let notice = Notice::plain("✅ Your post was published to the channel.")
                    .with_keyboard(InlineKeyboard::single_callback(
                        "🗑️ Delete from channel",
                        retraction_token(message_id),
                    ));
                self.notify(chat_id, notice).await;
                PublishOutcome::Published(message_id)
            }
            Err(e) => {
                error!(channel = %self.cfg.channel, error = %e, "publishing failed");
                let text = format!(
                    "❌ Publishing to the channel failed:\n`{}`",
                    escape_markdown_v2(&e.to_string())
                );
                self.notify(chat_id, Notice::markdown(text)).await;
                PublishOutcome::Failed(e.to_string())
            }
        }
    }

    async fn dispatch(&self, snapshot: &ContentSnapshot) -> Result<MessageId> {
        let extracted = extract_buttons(snapshot.text().unwrap_or_default());
        let hashtags = self.hashtags.generate_or_default(&extracted.text).await;
        let submitter = self.channel.user_profile(self.cfg.admin_user_id).await?;
        let caption = compose_caption(&extracted.text, &hashtags, &submitter);

        let body = match snapshot.media() {
            Some(Media::Photo(file)) => {
                let bytes = self.channel.download_file(file).await?;
                PostBody::Photo(self.watermark.apply_or_original(bytes))
            }
            Some(Media::Video(file)) => PostBody::Video(file.clone()),
            Some(Media::Document(file)) => PostBody::Document(file.clone()),
            None => PostBody::Text,
        };

        info!(
            kind = body.kind(),
            buttons = extracted.buttons.len(),
            "dispatching post"
        );
        let post = OutgoingPost {
            body,
            caption,
            keyboard: InlineKeyboard::from_links(&extracted.buttons),
        };
        self.channel.publish(&self.cfg.channel, post).await
    }

    async fn notify(&self, chat_id: ChatId, notice: Notice) {
        if let Err(e) = self.channel.send_notice(chat_id, notice).await {
            warn!(chat_id = chat_id.0, error = %e, "failed to notify submitter");
        }
    }
}
