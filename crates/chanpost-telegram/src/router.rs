use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use chanpost_core::{
    config::Config,
    hashtags::HashtagGenerator,
    messaging::port::ChannelPort,
    ports::TextGenerator,
    publisher::Publisher,
    retraction::Retractor,
    scheduler::JobScheduler,
    security::SubmitterGuard,
    watermark::Watermarker,
};

use crate::handlers;
use crate::TelegramChannel;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub guard: SubmitterGuard,
    pub channel: Arc<dyn ChannelPort>,
    pub publisher: Arc<Publisher>,
    pub retractor: Arc<Retractor>,
    pub scheduler: JobScheduler,
}

impl AppState {
    pub fn new(
        cfg: Arc<Config>,
        channel: Arc<dyn ChannelPort>,
        text_generator: Arc<dyn TextGenerator>,
        watermark: Arc<Watermarker>,
    ) -> Self {
        let publisher = Publisher::new(
            cfg.clone(),
            channel.clone(),
            HashtagGenerator::new(text_generator),
            watermark,
        );
        Self {
            guard: SubmitterGuard::new(cfg.admin_user_id),
            retractor: Arc::new(Retractor::new(cfg.clone(), channel.clone())),
            publisher: Arc::new(publisher),
            scheduler: JobScheduler::new(),
            channel,
            cfg,
        }
    }
}

pub async fn run_polling(
    cfg: Arc<Config>,
    text_generator: Arc<dyn TextGenerator>,
    watermark: Arc<Watermarker>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!(bot = %me.username(), "chanpost started"),
        Err(e) => warn!(error = %e, "get_me failed; continuing"),
    }
    info!(
        channel = %cfg.channel,
        submitter = cfg.admin_user_id.0,
        fallback_font = watermark.uses_fallback_font(),
        "relay configured"
    );

    let channel: Arc<dyn ChannelPort> = Arc::new(TelegramChannel::new(bot.clone()));
    let state = Arc::new(AppState::new(cfg, channel, text_generator, watermark));
    let scheduler = state.scheduler.clone();

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    let dropped = scheduler.shutdown().await;
    info!(dropped, "chanpost stopped");
    Ok(())
}
