mod chatbot;
mod config;
mod http;
mod operator_log;

use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatKind;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use chatbot::triggers::{is_addressed, is_bot_mentioned, strip_mention};
use chatbot::{ChatbotEngine, InboundMessage, TelegramClient, YelpClient};
use config::Config;

struct BotState {
    engine: ChatbotEngine,
    bot_user_id: UserId,
    bot_username: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    let config_path = std::env::args().nth(1);
    let config = match Config::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::never(&log_dir, "foodbot.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        );

    if let Some(log_chat_id) = config.log_chat_id {
        let batching = operator_log::Batching {
            flush_every: Duration::from_secs(config.log_flush_secs),
            max_lines: config.log_batch_lines,
        };
        let operator_layer = operator_log::OperatorLogLayer::new(bot.clone(), log_chat_id, batching);
        registry
            .with(operator_layer.with_filter(tracing_subscriber::filter::LevelFilter::INFO))
            .init();
    } else {
        registry.init();
    }

    info!("🚀 Starting foodbot...");
    match config_path {
        Some(ref path) => info!("Loaded config from {path} and environment"),
        None => info!("Loaded config from environment"),
    }
    for warning in config.warnings() {
        warn!("{warning}");
    }

    // No retry: a bot that cannot reach Telegram at startup is misconfigured.
    let me = match bot.get_me().await {
        Ok(me) => me,
        Err(e) => {
            error!("Failed to connect to Telegram: {e}");
            std::process::exit(1);
        }
    };
    info!("Bot user ID: {}, username: @{}", me.id, me.username());

    let yelp = match YelpClient::new(
        config.yelp_api_key.clone(),
        Duration::from_secs(config.search_timeout_secs),
    ) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build Yelp client: {e}");
            std::process::exit(1);
        }
    };

    let engine = ChatbotEngine::new(Arc::new(TelegramClient::new(bot.clone())), Arc::new(yelp));
    let state = Arc::new(BotState {
        engine,
        bot_user_id: me.id,
        bot_username: me.username().to_string(),
    });

    let shared = config.webhook_shares_port();
    spawn_server("front door", config.http_port, http::front_door(shared));
    if !shared {
        spawn_server("webhook server", config.webhook_port, http::webhook());
    }

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_new_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("👋 foodbot stopped");
}

fn spawn_server(name: &'static str, port: u16, router: axum::Router) {
    tokio::spawn(async move {
        if let Err(e) = http::serve(name, port, router).await {
            error!("{name} on port {port} failed: {e}");
        }
    });
}

async fn handle_new_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    if let Some(inbound) = to_inbound(&msg, &state) {
        state.engine.handle_message(inbound).await;
    }
    Ok(())
}

/// Reduce a Telegram message to what the engine needs. Bots and non-text
/// messages are dropped.
fn to_inbound(msg: &Message, state: &BotState) -> Option<InboundMessage> {
    let user = msg.from.as_ref()?;
    if user.is_bot {
        return None;
    }
    let text = msg.text()?;

    let is_private = matches!(msg.chat.kind, ChatKind::Private(_));
    let reply_from = msg
        .reply_to_message()
        .and_then(|reply| reply.from.as_ref())
        .map(|from| from.id);
    let addressed = is_addressed(is_private, text, &state.bot_username, reply_from, state.bot_user_id);

    let text = if is_bot_mentioned(text, &state.bot_username) {
        strip_mention(text, &state.bot_username)
    } else {
        text.trim().to_string()
    };

    Some(InboundMessage {
        chat_id: msg.chat.id.0,
        user_id: user.id.0 as i64,
        username: user.username.clone().unwrap_or_else(|| user.first_name.clone()),
        text,
        addressed,
    })
}
