//! Chat collaborator and the events it delivers.

mod discord;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;

use crate::error::Result;

pub use discord::DiscordRest;

/// One reaction kind on a message and who currently holds it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageReaction {
    pub emoji: String,
    pub user_ids: Vec<String>,
}

impl MessageReaction {
    pub fn holds(&self, user_id: &str) -> bool {
        self.user_ids.iter().any(|id| id == user_id)
    }
}

/// Events consumed from the chat gateway, one JSON object per line:
///
/// ```json
/// {"type":"reaction_add","user_id":"1","guild_id":"9","channel_id":"2","message_id":"3","emoji":"✅"}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    ReactionAdd {
        user_id: String,
        #[serde(default)]
        guild_id: Option<String>,
        channel_id: String,
        message_id: String,
        emoji: String,
        /// Display name if the gateway already resolved it.
        #[serde(default)]
        member_name: Option<String>,
    },
    ReactionRemove {
        user_id: String,
        #[serde(default)]
        guild_id: Option<String>,
        channel_id: String,
        message_id: String,
        emoji: String,
    },
    ReactionRemoveAll {
        user_id: String,
        #[serde(default)]
        guild_id: Option<String>,
    },
    Command(CommandInvocation),
}

/// An operator command such as `/addrange range:C2:D17`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInvocation {
    pub name: String,
    pub user_id: String,
    pub channel_id: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl CommandInvocation {
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

pub trait ChatSession: Send + Sync {
    /// Id of the bot's own account, so its reactions can be ignored.
    fn current_user_id(&self) -> impl Future<Output = Result<String>> + Send;

    /// Every reaction on a message, in the order they appear, with the users
    /// holding each one.
    fn message_reactions(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> impl Future<Output = Result<Vec<MessageReaction>>> + Send;

    /// Name shown for `user_id`: guild nickname when `guild_id` is given and a
    /// nickname is set, else the account's global or user name.
    fn display_name(
        &self,
        guild_id: Option<&str>,
        user_id: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Post a message and return its id.
    fn send_message(
        &self,
        channel_id: &str,
        content: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}
