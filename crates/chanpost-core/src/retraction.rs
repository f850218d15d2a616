//! Delete-from-channel control.
//!
//! The control's callback data is `delete_<channel message id>`; nothing else
//! is stored, so controls keep working across restarts.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    config::Config,
    domain::{MessageId, MessageRef},
    formatting::escape_markdown_v2,
    messaging::{port::ChannelPort, types::Notice},
};

const TOKEN_PREFIX: &str = "delete_";

pub fn retraction_token(message_id: MessageId) -> String {
    format!("{TOKEN_PREFIX}{}", message_id.0)
}

/// `None` for callback data that isn't a retraction token.
pub fn parse_retraction_token(data: &str) -> Option<MessageId> {
    data.strip_prefix(TOKEN_PREFIX)?
        .parse::<i32>()
        .ok()
        .map(MessageId)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetractionOutcome {
    Retracted(MessageId),
    Failed(String),
    NotAToken,
}

pub struct Retractor {
    cfg: Arc<Config>,
    channel: Arc<dyn ChannelPort>,
}

impl Retractor {
    pub fn new(cfg: Arc<Config>, channel: Arc<dyn ChannelPort>) -> Self {
        Self { cfg, channel }
    }

    /// Delete the post named by `token` and rewrite `control` with the result.
    pub async fn retract(&self, token: &str, control: Option<MessageRef>) -> RetractionOutcome {
        let Some(message_id) = parse_retraction_token(token) else {
            return RetractionOutcome::NotAToken;
        };

        let (outcome, notice) = match self.channel.delete_post(&self.cfg.channel, message_id).await
        {
            Ok(()) => {
                info!(message_id = message_id.0, "post retracted");
                (
                    RetractionOutcome::Retracted(message_id),
                    Notice::plain("🗑️ The post was removed from the channel."),
                )
            }
            Err(e) => {
                warn!(message_id = message_id.0, error = %e, "retraction failed");
                (
                    RetractionOutcome::Failed(e.to_string()),
                    Notice::markdown(format!(
                        "❌ Removing the post failed:\n`{}`",
                        escape_markdown_v2(&e.to_string())
                    )),
                )
            }
        };

        if let Some(control) = control {
            if let Err(e) = self.channel.edit_notice(control, notice).await {
                warn!(error = %e, "failed to update retraction control");
            }
        }

        outcome
    }
}
