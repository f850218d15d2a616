use std::{env, fs, path::Path, path::PathBuf};

use crate::{
    domain::{Destination, UserId},
    errors::Error,
    watermark::MAX_FONT_SIZE,
    Result,
};

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_FONT_FILE: &str = "Vazirmatn-Regular.ttf";
const DEFAULT_FONT_SIZE: f32 = 30.0;
const DEFAULT_WATERMARK_MARGIN: u32 = 20;

/// Typed, immutable configuration. Loaded once at startup and shared as `Arc<Config>`.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub admin_user_id: UserId,
    pub channel: Destination,

    // Text generation
    pub gemini_api_key: String,
    pub gemini_model: String,

    pub watermark: WatermarkConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WatermarkConfig {
    pub text: String,
    pub font_path: PathBuf,
    pub font_size: f32,
    pub margin: u32,
}

impl Config {
    /// Load from the process environment (after an optional `.env` file).
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Validate and build a config from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                Error::Config(format!("{key} environment variable is required"))
            })
        };

        let telegram_bot_token = required("BOT_TOKEN")?;

        let admin_raw = required("ADMIN_USER_ID")?;
        let admin_user_id = admin_raw
            .trim()
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| Error::Config(format!("ADMIN_USER_ID is not numeric: {admin_raw}")))?;

        let channel_raw = required("CHANNEL_ID")?;
        let channel: Destination = channel_raw.parse()?;

        let gemini_api_key = required("GEMINI_API_KEY")?;
        let gemini_model = get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let watermark = WatermarkConfig {
            text: get("WATERMARK_TEXT").unwrap_or_else(|| format!("{} ©", channel_raw.trim())),
            font_path: PathBuf::from(
                get("FONT_FILE").unwrap_or_else(|| DEFAULT_FONT_FILE.to_string()),
            ),
            font_size: parse_or(get("FONT_SIZE"), "FONT_SIZE", DEFAULT_FONT_SIZE)?,
            margin: parse_or(
                get("WATERMARK_MARGIN"),
                "WATERMARK_MARGIN",
                DEFAULT_WATERMARK_MARGIN,
            )?,
        };
        if !(watermark.font_size > 0.0 && watermark.font_size <= MAX_FONT_SIZE) {
            return Err(Error::Config(format!(
                "FONT_SIZE must be between 0 and {MAX_FONT_SIZE}"
            )));
        }

        Ok(Self {
            telegram_bot_token,
            admin_user_id,
            channel,
            gemini_api_key,
            gemini_model,
            watermark,
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| Error::Config(format!("{key} has an invalid value: {v}"))),
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, strip_quotes(v.trim()));
    }
}

fn strip_quotes(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        telegram_bot_token: "123:abc".into(),
        admin_user_id: UserId(42),
        channel: Destination::Username("@deals".into()),
        gemini_api_key: "key".into(),
        gemini_model: "gemini-test".into(),
        watermark: WatermarkConfig {
            text: "@deals ©".into(),
            font_path: PathBuf::from("/nonexistent/font.ttf"),
            font_size: 16.0,
            margin: DEFAULT_WATERMARK_MARGIN,
        },
    }
}
