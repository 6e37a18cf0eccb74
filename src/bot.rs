use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tracing::{debug, error, info};

use crate::platform::{BotEvent, Command, Departure, Group, Member, Messenger};

pub const START_TEXT: &str = "Hi! I'm a bot that tracks when users leave groups. \
     Add me to a group and I'll message users who leave.";

pub const HELP_TEXT: &str = "Commands:\n\
     /start - Start the bot\n\
     /help - Show this help message\n\n\
     Add me to a group and I'll automatically message users who leave.";

/// Direct message sent to someone who left a group.
pub fn farewell_text(member: &Member, group: &Group) -> String {
    format!(
        "Hi {}, we noticed you left {}. \
         We hope you enjoyed your time in the group! \
         If you have any feedback, please let us know.",
        member.first_name, group.title
    )
}

/// What the departure handler did with one member-left event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartureOutcome {
    /// The bot itself was removed; nothing was sent.
    BotRemoved,
    Farewelled,
    /// The farewell could not be delivered (blocked bot, no private chat, ...).
    SendFailed,
}

/// Handlers for every decoded event, independent of the transport.
pub struct FarewellBot {
    bot_id: u64,
    messenger: Arc<dyn Messenger>,
    failed_sends: AtomicU64,
}

impl FarewellBot {
    pub fn new(bot_id: u64, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            bot_id,
            messenger,
            failed_sends: AtomicU64::new(0),
        }
    }

    /// Farewell messages that could not be delivered since startup.
    pub fn failed_sends(&self) -> u64 {
        self.failed_sends.load(Ordering::Relaxed)
    }

    pub async fn handle_event(&self, event: &BotEvent) -> Result<()> {
        match event {
            BotEvent::Command { chat_id, command } => self.handle_command(*chat_id, *command).await,
            BotEvent::MemberLeft(departure) => {
                self.handle_departure(departure).await;
                Ok(())
            }
            BotEvent::Other => Ok(()),
        }
    }

    /// Reply to `/start` or `/help`. Send errors go back to the dispatcher.
    pub async fn handle_command(&self, chat_id: i64, command: Command) -> Result<()> {
        debug!("Command {:?} in chat {}", command, chat_id);

        let text = match command {
            Command::Start => START_TEXT,
            Command::Help => HELP_TEXT,
        };
        self.messenger.send_to_chat(chat_id, text).await
    }

    /// Say goodbye to a member who left. Never fails: an undeliverable
    /// farewell is logged and counted.
    pub async fn handle_departure(&self, departure: &Departure) -> DepartureOutcome {
        let Departure { member, group } = departure;

        if member.id == self.bot_id {
            info!("Bot was removed from {} ({})", group.title, group.id);
            return DepartureOutcome::BotRemoved;
        }

        info!(
            "User {} (ID: {}) left group {} (ID: {}) at {}",
            member.full_name,
            member.id,
            group.title,
            group.id,
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        let text = farewell_text(member, group);
        match self.messenger.send_private(member.id, &text).await {
            Ok(()) => {
                info!(
                    "Sent farewell message to {} ({})",
                    member.full_name, member.id
                );
                DepartureOutcome::Farewelled
            }
            Err(e) => {
                let failed = self.failed_sends.fetch_add(1, Ordering::Relaxed) + 1;
                error!(
                    "Could not send message to {}: {:#} (failed farewells: {})",
                    member.full_name, e, failed
                );
                DepartureOutcome::SendFailed
            }
        }
    }
}
