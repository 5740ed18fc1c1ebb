//! Telegram channel — long-polls the Bot API for commands and replies to the
//! sender. Also provides the [`ChatTransport`] impl used for broadcasts.

use std::sync::Arc;

use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::commands::{self, Command};
use super::{ChatTransport, MAX_MESSAGE_LENGTH, TransportError, split_message};
use crate::error::AppError;
use crate::store::ChatIdentity;
use crate::subsystems::lexicon::LexiconService;
use crate::subsystems::runtime::{Component, ComponentFuture};

impl ChatTransport for Bot {
    async fn send_text(&self, chat_id: ChatIdentity, text: &str) -> Result<(), TransportError> {
        for chunk in split_message(text, MAX_MESSAGE_LENGTH) {
            self.send_message(ChatId(chat_id), chunk)
                .await
                .map_err(|e| TransportError { chat_id, reason: e.to_string() })?;
        }
        Ok(())
    }
}

// ── TelegramChannel ──────────────────────────────────────────────────────────

pub struct TelegramChannel {
    bot: Bot,
    service: Arc<LexiconService>,
}

impl TelegramChannel {
    pub fn new(bot: Bot, service: Arc<LexiconService>) -> Self {
        Self { bot, service }
    }
}

impl Component for TelegramChannel {
    fn id(&self) -> &str {
        "telegram"
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_telegram(self.bot, self.service, shutdown))
    }
}

async fn run_telegram(bot: Bot, service: Arc<LexiconService>, shutdown: CancellationToken) -> Result<(), AppError> {
    info!("telegram channel starting");

    let handler = Update::filter_message()
        .filter_command::<Command>()
        .endpoint(answer);

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![service])
        .default_handler(|update| async move {
            debug!(update_id = ?update.id, "ignoring non-command update");
        })
        .build();

    tokio::select! {
        biased;

        _ = shutdown.cancelled() => {
            info!("shutdown signal received — closing telegram channel");
        }
        _ = dispatcher.dispatch() => {
            warn!("telegram dispatcher exited unexpectedly");
            return Err(AppError::Comms("telegram dispatcher exited".into()));
        }
    }

    Ok(())
}

async fn answer(bot: Bot, msg: Message, cmd: Command, service: Arc<LexiconService>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    debug!(chat_id, command = ?cmd, "telegram command");

    let reply = commands::execute(&service, chat_id, cmd).await;
    if let Err(e) = bot.send_text(chat_id, &reply).await {
        warn!(error = %e, "failed to send telegram reply");
    }
    Ok(())
}
