use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Me, User, UserId};
use teloxide::update_listeners::webhooks;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info};

use crate::bot::FarewellBot;
use crate::config::UpdateMode;
use crate::platform::{
    BotEvent, Command, Departure, Group, Member, Messenger, UNTITLED_GROUP,
};

/// Sends messages through the Telegram Bot API.
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_to_chat(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }

    async fn send_private(&self, user_id: u64, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId::from(UserId(user_id)), text)
            .await?;
        Ok(())
    }
}

/// Turn a Telegram message into the event the handlers work with.
pub fn decode(msg: &Message, bot_username: &str) -> BotEvent {
    if let Some(user) = msg.left_chat_member() {
        return BotEvent::MemberLeft(Departure {
            member: member(user),
            group: Group {
                id: msg.chat.id.0,
                title: msg.chat.title().unwrap_or(UNTITLED_GROUP).to_string(),
            },
        });
    }

    match msg.text().map(|text| Command::parse(text, bot_username)) {
        Some(Ok(command)) => BotEvent::Command {
            chat_id: msg.chat.id.0,
            command,
        },
        _ => BotEvent::Other,
    }
}

fn member(user: &User) -> Member {
    Member {
        id: user.id.0,
        first_name: user.first_name.clone(),
        full_name: user.full_name(),
    }
}

/// Run the dispatcher until it is stopped (Ctrl-C).
pub async fn run(bot: Bot, me: Me, mode: UpdateMode) -> Result<()> {
    let service = Arc::new(FarewellBot::new(
        me.id.0,
        Arc::new(TelegramMessenger::new(bot.clone())),
    ));

    let handler = Update::filter_message()
        .map(|msg: Message, me: Me| decode(&msg, me.username()))
        .endpoint(handle_event);

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![service.clone(), me])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build();

    match mode {
        UpdateMode::Polling => {
            info!("Bot started with polling");
            dispatcher.dispatch().await;
        }
        UpdateMode::Webhook { listen, url } => {
            let listener = webhooks::axum(bot, webhooks::Options::new(listen, url))
                .await
                .context("Failed to set up webhook listener")?;
            info!("Bot started with webhook on port {}", listen.port());
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
    }

    info!(
        "Dispatcher stopped ({} farewell messages could not be delivered)",
        service.failed_sends()
    );
    Ok(())
}

async fn handle_event(event: BotEvent, service: Arc<FarewellBot>) -> Result<()> {
    service.handle_event(&event).await
}
