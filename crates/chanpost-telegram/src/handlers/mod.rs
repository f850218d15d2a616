//! Telegram update handlers.
//!
//! Every entry point runs the submitter guard first; events from anyone else
//! are dropped without a reply. Past the guard:
//! - `/schedule` replies go to `commands`
//! - other commands are ignored
//! - everything else is a submission, published right away

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message, User},
};
use tracing::debug;

use chanpost_core::{domain::UserId, security::SubmitterGuard};

use crate::router::AppState;
mod callback;
mod commands;
mod submission;

#[cfg(test)]
pub(crate) mod test_support;

fn sender_id(user: Option<&User>) -> Option<UserId> {
    user.map(|u| UserId(u.id.0 as i64))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Inbound {
    Ignored,
    Command,
    Submission,
}

fn classify(msg: &Message, guard: &SubmitterGuard) -> Inbound {
    if !guard.permits(sender_id(msg.from())) {
        return Inbound::Ignored;
    }
    match msg.text() {
        Some(text) if text.starts_with('/') => Inbound::Command,
        _ => Inbound::Submission,
    }
}

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    if !state.guard.permits(sender_id(Some(&q.from))) {
        debug!(user = q.from.id.0, "ignoring callback from non-submitter");
        return Ok(());
    }
    callback::handle_callback(q, state).await
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    match classify(&msg, &state.guard) {
        Inbound::Ignored => {
            debug!(chat_id = msg.chat.id.0, "ignoring message from non-submitter");
            Ok(())
        }
        Inbound::Command => commands::handle_command(msg, state).await,
        Inbound::Submission => submission::handle_submission(msg, state).await,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use super::test_support::{
        callback, message, message_from, state, RecordingChannel, SUBMITTER,
    };

    fn guard() -> SubmitterGuard {
        SubmitterGuard::new(UserId(SUBMITTER))
    }

    #[test]
    fn routes_commands_and_submissions() {
        let cmd = message(json!({"text": "/schedule 2h"}));
        assert_eq!(classify(&cmd, &guard()), Inbound::Command);

        let text = message(json!({"text": "Great deal [Buy](https://x.example)"}));
        assert_eq!(classify(&text, &guard()), Inbound::Submission);

        let photo = message(json!({
            "photo": [{"file_id": "p", "file_unique_id": "up", "file_size": 10, "width": 90, "height": 90}],
            "caption": "/not a command in a caption",
        }));
        assert_eq!(classify(&photo, &guard()), Inbound::Submission);
    }

    #[test]
    fn other_senders_are_ignored() {
        let msg = message_from(7, json!({"text": "/schedule 2h"}));
        assert_eq!(classify(&msg, &guard()), Inbound::Ignored);
    }

    #[tokio::test]
    async fn non_submitter_message_produces_no_calls() {
        let channel = Arc::new(RecordingChannel::default());
        let msg = message_from(7, json!({"text": "publish me"}));
        handle_message(msg, state(channel.clone())).await.unwrap();
        assert!(channel.events().is_empty());
    }

    #[tokio::test]
    async fn non_submitter_callback_is_not_answered() {
        let channel = Arc::new(RecordingChannel::default());
        handle_callback(callback(7, "delete_101", 55), state(channel.clone()))
            .await
            .unwrap();
        assert!(channel.events().is_empty());
    }
}
