pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::utils::command::BotCommands;

/// Used when a chat reports no title.
pub const UNTITLED_GROUP: &str = "the group";

/// Commands the bot answers.
#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show this help message")]
    Help,
}

/// A user who left a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: u64,
    pub first_name: String,
    pub full_name: String,
}

/// The group a member left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub member: Member,
    pub group: Group,
}

/// An inbound message, decoded once at the platform boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    Command { chat_id: i64, command: Command },
    MemberLeft(Departure),
    Other,
}

/// Outbound side of the platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text message to a chat.
    async fn send_to_chat(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Send a text message to a user's private chat.
    async fn send_private(&self, user_id: u64, text: &str) -> Result<()>;
}
