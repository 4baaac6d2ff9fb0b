//! Bot configuration.
//!
//! Precedence: environment variables over the optional `config.toml` over
//! defaults. Environment keys use the `EMBLEM` prefix with
//! double-underscore separators (`EMBLEM__TOKEN`, `EMBLEM__BOT__CHANNEL`).

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Platform bot token. Has no usable default; startup refuses an
    /// empty one.
    pub token: String,
    pub platform: PlatformSettings,
    pub bot: BotSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformSettings {
    pub rest_url: String,
    pub gateway_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotSettings {
    /// Name of the designated channel commands are served in.
    pub channel: String,
    /// Directory the key-value cache lives under.
    pub cache_dir: String,
    /// Path of the rank definition file.
    pub ranks_path: String,
    /// Path of the response template document.
    pub texts_path: String,
}

pub fn load() -> Result<AppConfig, config::ConfigError> {
    // Load .env if present (development).
    let _ = dotenvy::dotenv();

    config::Config::builder()
        .set_default("token", "")?
        .set_default("platform.rest_url", "http://localhost:3000/api/v1")?
        .set_default("platform.gateway_url", "ws://localhost:3001")?
        .set_default("bot.channel", "ranks")?
        .set_default("bot.cache_dir", "./cache")?
        .set_default("bot.ranks_path", "./ranks.txt")?
        .set_default("bot.texts_path", "./texts.toml")?
        .add_source(config::File::with_name("config").required(false))
        .add_source(
            config::Environment::with_prefix("EMBLEM")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
