//! # emblem
//!
//! Self-assign rank bot. Members type `+name` / `-name` in the designated
//! channel and the bot mirrors those tags onto platform roles, remembering
//! across restarts which roles it already created.

mod config;
mod dispatcher;
mod lifecycle;
mod platform;
mod texts;

use anyhow::Context;
use emblem_client::{GatewayClient, Message, Ready, RestClient};
use emblem_store::Store;
use tokio::sync::broadcast::error::RecvError;

use crate::lifecycle::{Bot, ResumeError};
use crate::texts::Texts;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emblem=debug".into()),
        )
        .with_target(true)
        .init();

    if config.token.is_empty() {
        anyhow::bail!("token is not filled in; set EMBLEM__TOKEN or the token key in config.toml");
    }

    tracing::info!("starting emblem v{}", env!("CARGO_PKG_VERSION"));

    let templates = std::fs::read_to_string(&config.bot.texts_path)
        .with_context(|| format!("reading response templates from {}", config.bot.texts_path))?;
    let texts = Texts::parse(&templates)?;
    let store = Store::open(&config.bot.cache_dir)?;
    let rest = RestClient::new(&config.token, Some(&config.platform.rest_url))?;
    let gateway = GatewayClient::new(&config.token, Some(&config.platform.gateway_url));

    let mut bot = Bot::new(rest, store, texts, config.bot.clone());

    let mut events = gateway.subscribe();
    gateway.connect().await?;

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event stream lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        match event.event.as_deref() {
            Some("READY") => {
                match serde_json::from_value::<Ready>(event.data.clone()) {
                    Ok(ready) => bot.set_me(ready.user),
                    Err(error) => tracing::warn!(%error, "malformed READY payload"),
                }
                if let Err(error) = bot.resume().await {
                    report_resume_failure(&error);
                }
            }
            Some("SERVER_CREATE") => {
                let Some(server_id) = event.data.get("id").and_then(|v| v.as_str()) else {
                    tracing::warn!("SERVER_CREATE payload without a server id");
                    continue;
                };
                tracing::info!(server = server_id, "joined a server");
                if let Err(error) = bot.on_server_join(server_id).await {
                    report_resume_failure(&error);
                }
            }
            Some("SERVER_DELETE") => {
                if let Err(error) = bot.on_server_remove() {
                    tracing::error!(%error, "dropping server state failed");
                }
            }
            Some("MESSAGE_CREATE") => match serde_json::from_value::<Message>(event.data.clone()) {
                Ok(message) => {
                    if let Err(error) = bot.on_message(&message).await {
                        tracing::error!(%error, "handling a message failed");
                    }
                }
                Err(error) => tracing::warn!(%error, "malformed MESSAGE_CREATE payload"),
            },
            _ => {}
        }
    }

    Ok(())
}

fn report_resume_failure(error: &ResumeError) {
    match error {
        // Nothing to serve until an invite arrives.
        ResumeError::NotJoined => {}
        ResumeError::MissingPermission(permission) => {
            tracing::error!("missing the permission to {permission}; please fix the bot's role");
        }
        ResumeError::ChannelNotFound(channel) => {
            tracing::error!(
                "the designated channel {channel:?} does not exist; \
                 the bot will not do anything until it is created"
            );
        }
        other => tracing::error!(error = %other, "initialization failed"),
    }
}
