use std::sync::Arc;

use chanpost_gemini::GeminiClient;

use chanpost_core::{config::Config, ports::TextGenerator, watermark::Watermarker};

#[tokio::main]
async fn main() -> Result<(), chanpost_core::Error> {
    chanpost_core::logging::init("chanpost")?;

    let cfg = Arc::new(Config::load()?);

    let text_generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(
        cfg.gemini_api_key.clone(),
        cfg.gemini_model.clone(),
    ));
    let watermark = Arc::new(Watermarker::load(&cfg.watermark));

    chanpost_telegram::router::run_polling(cfg, text_generator, watermark)
        .await
        .map_err(|e| chanpost_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
