//! Telegram adapter (teloxide).
//!
//! This crate implements the `chanpost-core` ChannelPort over the Telegram Bot API.

use async_trait::async_trait;

use teloxide::{
    net::Download,
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode, Recipient},
};

use tokio::time::sleep;
use tracing::warn;

pub mod handlers;
pub mod router;

use chanpost_core::{
    domain::{ChatId, Destination, FileRef, MessageId, MessageRef, UserId, UserProfile},
    errors::Error,
    messaging::{
        port::ChannelPort,
        types::{ButtonAction, InlineKeyboard, Notice, OutgoingPost, PostBody},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        warn!(wait_secs = d.as_secs(), "telegram flood control; retrying");
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

fn recipient(dest: &Destination) -> Recipient {
    match dest {
        Destination::Id(chat) => Recipient::Id(TelegramChannel::tg_chat(*chat)),
        Destination::Username(name) => Recipient::ChannelUsername(name.clone()),
    }
}

/// One button per row. URL buttons need an absolute URL; anything else is rejected
/// here rather than by the Bot API.
fn markup(keyboard: &InlineKeyboard) -> Result<InlineKeyboardMarkup> {
    let rows = keyboard
        .buttons
        .iter()
        .map(|b| {
            let button = match &b.action {
                ButtonAction::Url(url) => {
                    let parsed = reqwest::Url::parse(url).map_err(|e| {
                        Error::External(format!("invalid button url `{url}`: {e}"))
                    })?;
                    InlineKeyboardButton::url(b.label.clone(), parsed)
                }
                ButtonAction::Callback(data) => {
                    InlineKeyboardButton::callback(b.label.clone(), data.clone())
                }
            };
            Ok(vec![button])
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(InlineKeyboardMarkup::new(rows))
}

#[async_trait]
impl ChannelPort for TelegramChannel {
    async fn user_profile(&self, user: UserId) -> Result<UserProfile> {
        let chat = self
            .with_retry(|| self.bot.get_chat(teloxide::types::ChatId(user.0)))
            .await?;

        let display_name = chat
            .first_name()
            .or_else(|| chat.username())
            .map(str::to_string)
            .unwrap_or_else(|| user.0.to_string());

        Ok(UserProfile {
            id: user,
            display_name,
        })
    }

    async fn download_file(&self, file: &FileRef) -> Result<Vec<u8>> {
        let meta = self.with_retry(|| self.bot.get_file(file.0.clone())).await?;

        let mut buf = Vec::new();
        self.bot
            .download_file(&meta.path, &mut buf)
            .await
            .map_err(|e| Error::External(format!("telegram download error: {e}")))?;
        Ok(buf)
    }

    async fn publish(&self, dest: &Destination, post: OutgoingPost) -> Result<MessageId> {
        let to = recipient(dest);
        let reply_markup = post.keyboard.as_ref().map(markup).transpose()?;
        let caption = post.caption;

        let msg = match post.body {
            PostBody::Photo(bytes) => {
                self.with_retry(|| {
                    let photo = InputFile::memory(bytes.clone()).file_name("photo.jpg");
                    let mut req = self
                        .bot
                        .send_photo(to.clone(), photo)
                        .caption(caption.clone())
                        .parse_mode(ParseMode::MarkdownV2);
                    if let Some(m) = &reply_markup {
                        req = req.reply_markup(m.clone());
                    }
                    req
                })
                .await?
            }
            PostBody::Video(file) => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_video(to.clone(), InputFile::file_id(file.0.clone()))
                        .caption(caption.clone())
                        .parse_mode(ParseMode::MarkdownV2);
                    if let Some(m) = &reply_markup {
                        req = req.reply_markup(m.clone());
                    }
                    req
                })
                .await?
            }
            PostBody::Document(file) => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_document(to.clone(), InputFile::file_id(file.0.clone()))
                        .caption(caption.clone())
                        .parse_mode(ParseMode::MarkdownV2);
                    if let Some(m) = &reply_markup {
                        req = req.reply_markup(m.clone());
                    }
                    req
                })
                .await?
            }
            PostBody::Text => {
                self.with_retry(|| {
                    let mut req = self
                        .bot
                        .send_message(to.clone(), caption.clone())
                        .parse_mode(ParseMode::MarkdownV2);
                    if let Some(m) = &reply_markup {
                        req = req.reply_markup(m.clone());
                    }
                    req
                })
                .await?
            }
        };

        Ok(MessageId(msg.id.0))
    }

    async fn delete_post(&self, dest: &Destination, message_id: MessageId) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .delete_message(recipient(dest), Self::tg_msg_id(message_id))
        })
        .await?;
        Ok(())
    }

    async fn send_notice(&self, chat_id: ChatId, notice: Notice) -> Result<MessageRef> {
        let reply_markup = notice.keyboard.as_ref().map(markup).transpose()?;
        let msg = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_message(Self::tg_chat(chat_id), notice.text.clone());
                if notice.markdown {
                    req = req.parse_mode(ParseMode::MarkdownV2);
                }
                if let Some(m) = &reply_markup {
                    req = req.reply_markup(m.clone());
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit_notice(&self, msg: MessageRef, notice: Notice) -> Result<()> {
        // Editing without a markup drops the message's existing inline keyboard.
        let reply_markup = notice.keyboard.as_ref().map(markup).transpose()?;
        self.with_retry(|| {
            let mut req = self.bot.edit_message_text(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
                notice.text.clone(),
            );
            if notice.markdown {
                req = req.parse_mode(ParseMode::MarkdownV2);
            }
            if let Some(m) = &reply_markup {
                req = req.reply_markup(m.clone());
            }
            req
        })
        .await?;
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
        })
        .await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        self.with_retry(|| self.bot.answer_callback_query(callback_id.to_string()))
            .await?;
        Ok(())
    }
}
