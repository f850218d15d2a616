use std::{future::Future, sync::Arc, time::Duration};

use teloxide::prelude::*;
use tracing::{debug, error, info, warn};

use chanpost_core::{
    domain::{ChatId, ContentSnapshot},
    errors::Error,
    formatting::format_duration,
    messaging::types::Notice,
    scheduler::{parse_delay, JobScheduler, JobTicket},
};

use crate::router::AppState;

use super::submission::snapshot_from_message;

const SCHEDULE_USAGE: &str = "Reply to the message you want to publish later with \
/schedule <delay>, for example /schedule 1d12h30m, /schedule 2h or /schedule 90m.";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

#[derive(Debug)]
enum ScheduleRejection {
    NotAReply,
    Usage,
    Invalid(Error),
    NothingToPublish,
    Unavailable(Error),
}

impl ScheduleRejection {
    fn reply_text(&self) -> String {
        match self {
            Self::NotAReply => format!("⚠️ {SCHEDULE_USAGE}"),
            Self::Usage => format!("⚠️ Exactly one delay is expected. {SCHEDULE_USAGE}"),
            Self::Invalid(e) => format!("❌ {e}. {SCHEDULE_USAGE}"),
            Self::NothingToPublish => format!(
                "⚠️ The replied-to message has no text, photo, video or document. {SCHEDULE_USAGE}"
            ),
            Self::Unavailable(e) => format!("❌ Could not schedule the post: {e}"),
        }
    }
}

/// Validate a `/schedule` invocation. Nothing is registered unless this succeeds.
fn schedule_delay(args: &str, is_reply: bool) -> Result<Duration, ScheduleRejection> {
    if !is_reply {
        return Err(ScheduleRejection::NotAReply);
    }
    let mut args = args.split_whitespace();
    let (Some(spec), None) = (args.next(), args.next()) else {
        return Err(ScheduleRejection::Usage);
    };
    parse_delay(spec).map_err(|e| ScheduleRejection::Invalid(e.into()))
}

/// Validate, then register `on_fire` for the captured snapshot. A rejected
/// request registers nothing.
async fn register_schedule<F, Fut>(
    args: &str,
    target: Option<ContentSnapshot>,
    scheduler: &JobScheduler,
    on_fire: F,
) -> Result<(Duration, JobTicket), ScheduleRejection>
where
    F: FnOnce(ContentSnapshot) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let delay = schedule_delay(args, target.is_some())?;
    let snapshot = target.ok_or(ScheduleRejection::NotAReply)?;
    if snapshot.is_empty() {
        return Err(ScheduleRejection::NothingToPublish);
    }

    let ticket = scheduler
        .schedule(delay, snapshot, move |job| on_fire(job.payload))
        .await
        .map_err(ScheduleRejection::Unavailable)?;
    Ok((delay, ticket))
}

async fn reply(state: &AppState, chat_id: ChatId, text: String) {
    if let Err(e) = state.channel.send_notice(chat_id, Notice::plain(text)).await {
        warn!(chat_id = chat_id.0, error = %e, "failed to reply to command");
    }
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let (cmd, args) = parse_command(msg.text().unwrap_or_default());
    match cmd.as_str() {
        "schedule" => handle_schedule(&msg, &args, &state).await,
        _ => debug!(command = %cmd, "ignoring unknown command"),
    }
    Ok(())
}

async fn handle_schedule(msg: &Message, args: &str, state: &AppState) {
    let chat_id = ChatId(msg.chat.id.0);
    let target = msg.reply_to_message();
    let publisher = state.publisher.clone();

    let registered = register_schedule(
        args,
        target.map(snapshot_from_message),
        &state.scheduler,
        move |snapshot| async move {
            publisher.publish(snapshot).await;
        },
    )
    .await;

    match registered {
        Ok((delay, ticket)) => {
            info!(
                job = ticket.id.0,
                source_message = target.map(|m| m.id.0).unwrap_or_default(),
                "schedule request accepted"
            );
            let text = format!(
                "✅ Scheduled. It will be published in {} (around {}).",
                format_duration(delay),
                ticket.fire_at.format("%Y-%m-%d %H:%M")
            );
            reply(state, chat_id, text).await;
        }
        Err(rejection) => {
            match &rejection {
                ScheduleRejection::Unavailable(e) => error!(error = %e, "failed to schedule post"),
                other => debug!(rejection = ?other, "schedule request rejected"),
            }
            reply(state, chat_id, rejection.reply_text()).await;
        }
    }
}
