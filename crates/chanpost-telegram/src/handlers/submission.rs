use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use chanpost_core::{
    domain::{ChatId, ContentSnapshot, FileRef},
    messaging::types::Notice,
};

use crate::router::AppState;

/// Capture what the message carries. The largest photo size is used.
pub(crate) fn snapshot_from_message(msg: &Message) -> ContentSnapshot {
    let photo = msg
        .photo()
        .and_then(|sizes| sizes.last())
        .map(|p| FileRef(p.file.id.clone()));
    let video = msg.video().map(|v| FileRef(v.file.id.clone()));
    let document = msg.document().map(|d| FileRef(d.file.id.clone()));
    let text = msg.caption().or_else(|| msg.text()).map(str::to_string);

    ContentSnapshot::from_parts(ChatId(msg.chat.id.0), text, photo, video, document)
}

pub async fn handle_submission(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = ChatId(msg.chat.id.0);
    let snapshot = snapshot_from_message(&msg);

    let indicator = match state
        .channel
        .send_notice(chat_id, Notice::plain("⏳ Processing..."))
        .await
    {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = %e, "failed to send processing indicator");
            None
        }
    };

    state.publisher.publish(snapshot).await;

    if let Some(m) = indicator {
        if let Err(e) = state.channel.delete_message(m).await {
            warn!(error = %e, "failed to remove processing indicator");
        }
    }
    Ok(())
}
