//! Turns reaction events into pending sheet updates.

use std::sync::Arc;

use rollcall_engine::engine::{FALLBACK_COLOUR, resolve_effective_colour};

use crate::chat::{ChatEvent, ChatSession};
use crate::error::Result;
use crate::queue::{PendingUpdate, UpdateSender};
use crate::settings::SettingsStore;

pub struct ReactionHandler<C> {
    chat: Arc<C>,
    settings: SettingsStore,
    updates: UpdateSender,
    own_user_id: String,
}

impl<C> Clone for ReactionHandler<C> {
    fn clone(&self) -> Self {
        ReactionHandler {
            chat: Arc::clone(&self.chat),
            settings: self.settings.clone(),
            updates: self.updates.clone(),
            own_user_id: self.own_user_id.clone(),
        }
    }
}

impl<C: ChatSession> ReactionHandler<C> {
    pub fn new(
        chat: Arc<C>,
        settings: SettingsStore,
        updates: UpdateSender,
        own_user_id: impl Into<String>,
    ) -> Self {
        ReactionHandler {
            chat,
            settings,
            updates,
            own_user_id: own_user_id.into(),
        }
    }

    /// Handle one reaction event. Commands are not reaction events and are
    /// ignored here.
    pub async fn handle(&self, event: &ChatEvent) -> Result<()> {
        match event {
            ChatEvent::ReactionAdd {
                user_id,
                guild_id,
                emoji,
                member_name,
                ..
            } => {
                self.on_add(user_id, guild_id.as_deref(), emoji, member_name.as_deref())
                    .await
            }
            ChatEvent::ReactionRemove {
                user_id,
                guild_id,
                channel_id,
                message_id,
                ..
            } => {
                self.on_remove(user_id, guild_id.as_deref(), channel_id, message_id)
                    .await
            }
            ChatEvent::ReactionRemoveAll { user_id, guild_id } => {
                self.on_remove_all(user_id, guild_id.as_deref()).await
            }
            ChatEvent::Command(_) => Ok(()),
        }
    }

    async fn on_add(
        &self,
        user_id: &str,
        guild_id: Option<&str>,
        emoji: &str,
        member_name: Option<&str>,
    ) -> Result<()> {
        if user_id == self.own_user_id {
            return Ok(());
        }

        let colour = {
            let config = self.settings.snapshot();
            match config.discord.reaction_colours.lookup(emoji) {
                Ok(entry) => entry.colour.clone(),
                Err(err) => {
                    tracing::warn!(user_id, "{err}, nothing queued");
                    return Ok(());
                }
            }
        };

        let name = match member_name.filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => self.chat.display_name(guild_id, user_id).await?,
        };
        tracing::debug!(%name, %colour, emoji, "reaction added");
        self.updates.push(PendingUpdate::new(name, colour)).await
    }

    /// Recompute the user's colour from whatever they still hold on the
    /// message, so removing the winning reaction falls back to the next one.
    async fn on_remove(
        &self,
        user_id: &str,
        guild_id: Option<&str>,
        channel_id: &str,
        message_id: &str,
    ) -> Result<()> {
        let name = self.chat.display_name(guild_id, user_id).await?;
        let reactions = self.chat.message_reactions(channel_id, message_id).await?;
        let held = reactions
            .iter()
            .filter(|r| r.holds(user_id))
            .map(|r| r.emoji.as_str());

        let colour = {
            let config = self.settings.snapshot();
            resolve_effective_colour(held, &config.discord.reaction_colours)
                .colour
                .to_string()
        };
        tracing::debug!(%name, %colour, "reaction removed");
        self.updates.push(PendingUpdate::new(name, colour)).await
    }

    async fn on_remove_all(&self, user_id: &str, guild_id: Option<&str>) -> Result<()> {
        let name = self.chat.display_name(guild_id, user_id).await?;
        tracing::debug!(%name, "all reactions removed");
        self.updates
            .push(PendingUpdate::new(name, FALLBACK_COLOUR))
            .await
    }
}
