//! Final MarkdownV2 caption: body, hashtags, submitter signature.

use crate::{domain::UserProfile, formatting::escape_markdown_v2};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposedCaption {
    pub body_text: String,
    pub hashtag_line: String,
    pub signature_line: String,
}

impl ComposedCaption {
    /// Escape each free-text fragment and build the signature mention.
    pub fn new(body: &str, hashtags: &str, submitter: &UserProfile) -> Self {
        Self {
            body_text: escape_markdown_v2(body),
            hashtag_line: escape_markdown_v2(hashtags),
            signature_line: signature_line(submitter),
        }
    }

    /// `body\n\nhashtags\n\nsignature`, trimmed. The separators are kept even
    /// when a fragment is empty.
    pub fn render(&self) -> String {
        format!(
            "{}\n\n{}\n\n{}",
            self.body_text, self.hashtag_line, self.signature_line
        )
        .trim()
        .to_string()
    }
}

/// Clickable mention of the submitter. Only the display name is escaped.
fn signature_line(submitter: &UserProfile) -> String {
    format!(
        "👤 Posted by: [{}](tg://user?id={})",
        escape_markdown_v2(&submitter.display_name),
        submitter.id.0
    )
}

pub fn compose_caption(body: &str, hashtags: &str, submitter: &UserProfile) -> String {
    ComposedCaption::new(body, hashtags, submitter).render()
}
