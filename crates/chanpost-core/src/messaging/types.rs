use crate::{buttons::ButtonSpec, domain::FileRef};

/// What gets transmitted to the channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PostBody {
    /// Uploaded bytes (already watermarked).
    Photo(Vec<u8>),
    /// Re-sent by platform file id.
    Video(FileRef),
    Document(FileRef),
    Text,
}

impl PostBody {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Photo(_) => "photo",
            Self::Video(_) => "video",
            Self::Document(_) => "document",
            Self::Text => "text",
        }
    }
}

/// A channel post. `caption` is MarkdownV2 (message text for `PostBody::Text`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingPost {
    pub body: PostBody,
    pub caption: String,
    pub keyboard: Option<InlineKeyboard>,
}

/// Inline keyboard rendered one button per row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub action: ButtonAction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    Url(String),
    Callback(String),
}

impl InlineKeyboard {
    pub fn new(buttons: Vec<InlineButton>) -> Self {
        Self { buttons }
    }

    /// Link buttons in extraction order; `None` when there are none.
    pub fn from_links(links: &[ButtonSpec]) -> Option<Self> {
        if links.is_empty() {
            return None;
        }
        Some(Self::new(
            links
                .iter()
                .map(|b| InlineButton {
                    label: b.label.clone(),
                    action: ButtonAction::Url(b.url.clone()),
                })
                .collect(),
        ))
    }

    pub fn single_callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(vec![InlineButton {
            label: label.into(),
            action: ButtonAction::Callback(data.into()),
        }])
    }
}

/// A message to the submitter (confirmation, diagnostic, control).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    /// Parse `text` as MarkdownV2; plain text otherwise.
    pub markdown: bool,
    pub keyboard: Option<InlineKeyboard>,
}

impl Notice {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: false,
            keyboard: None,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: true,
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_keyboard_keeps_order() {
        let links = vec![
            ButtonSpec {
                label: "A".into(),
                url: "https://a.example".into(),
            },
            ButtonSpec {
                label: "B".into(),
                url: "https://b.example".into(),
            },
        ];
        let kb = InlineKeyboard::from_links(&links).unwrap();
        assert_eq!(kb.buttons.len(), 2);
        assert_eq!(kb.buttons[0].label, "A");
        assert_eq!(
            kb.buttons[1].action,
            ButtonAction::Url("https://b.example".into())
        );
        assert!(InlineKeyboard::from_links(&[]).is_none());
    }
}
