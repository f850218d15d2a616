use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, warn};

use chanpost_core::{
    domain::{ChatId, MessageId, MessageRef},
    retraction::RetractionOutcome,
};

use crate::router::AppState;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    // Answer first so the client stops its spinner while the deletion runs.
    if let Err(e) = state.channel.answer_callback_query(&q.id).await {
        warn!(error = %e, "failed to answer callback query");
    }

    let data = q.data.as_deref().unwrap_or_default();
    let control = q.message.as_ref().map(|m| MessageRef {
        chat_id: ChatId(m.chat.id.0),
        message_id: MessageId(m.id.0),
    });

    if let RetractionOutcome::NotAToken = state.retractor.retract(data, control).await {
        debug!(data, "ignoring unknown callback data");
    }
    Ok(())
}
