use std::{fmt, str::FromStr};

use crate::{errors::Error, Result};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Opaque platform file id (photo, video or document).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileRef(pub String);

/// The broadcast channel everything is published to.
///
/// Telegram accepts either a numeric chat id (`-100…`) or a public `@username`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    Id(ChatId),
    Username(String),
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(name) = s.strip_prefix('@') {
            if name.is_empty() {
                return Err(Error::Config("channel username is empty".to_string()));
            }
            return Ok(Self::Username(s.to_string()));
        }
        s.parse::<i64>()
            .map(|id| Self::Id(ChatId(id)))
            .map_err(|_| Error::Config(format!("invalid channel id: {s}")))
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id.0),
            Self::Username(name) => f.write_str(name),
        }
    }
}

/// Binary media attached to a submission. At most one per snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Media {
    Photo(FileRef),
    Video(FileRef),
    Document(FileRef),
}

/// Immutable capture of submitted content, consumed once by the publisher.
///
/// `chat_id` is the chat the submission arrived in; it is only logged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentSnapshot {
    chat_id: ChatId,
    text: Option<String>,
    media: Option<Media>,
}

impl ContentSnapshot {
    pub fn new(chat_id: ChatId, text: Option<String>, media: Option<Media>) -> Self {
        Self {
            chat_id,
            text,
            media,
        }
    }

    /// Build a snapshot from the individual references a platform message may carry.
    ///
    /// When several media references are present the first of photo, video,
    /// document wins.
    pub fn from_parts(
        chat_id: ChatId,
        text: Option<String>,
        photo: Option<FileRef>,
        video: Option<FileRef>,
        document: Option<FileRef>,
    ) -> Self {
        let media = photo
            .map(Media::Photo)
            .or_else(|| video.map(Media::Video))
            .or_else(|| document.map(Media::Document));
        Self::new(chat_id, text, media)
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn media(&self) -> Option<&Media> {
        self.media.as_ref()
    }

    /// True when there is neither media nor any text to publish.
    pub fn is_empty(&self) -> bool {
        self.media.is_none() && self.text.as_deref().map_or(true, |t| t.trim().is_empty())
    }
}

/// Display data of the submitter, used for the caption signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
}
