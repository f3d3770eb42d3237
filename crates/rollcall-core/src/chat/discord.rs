//! Discord v10 REST client.
//!
//! Gateway events arrive elsewhere; this client only covers the lookups and
//! writes the bot makes in response to them.

use serde::Deserialize;
use serde_json::json;

use super::{ChatSession, MessageReaction};
use crate::error::Result;
use crate::http::{endpoint, ensure_success};

const SERVICE: &str = "Discord";
const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";
/// Maximum page size for the reaction users endpoint.
const REACTION_PAGE: usize = 100;

#[derive(Clone)]
pub struct DiscordRest {
    http: reqwest::Client,
    base_url: String,
    authorization: String,
}

impl std::fmt::Debug for DiscordRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordRest")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl DiscordRest {
    pub fn new(bot_token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(
                "DiscordBot (https://github.com/ali-raheem/rollcall, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()?;
        Ok(DiscordRest {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            authorization: format!("Bot {}", bot_token.trim()),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        what: &str,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = endpoint(SERVICE, &self.base_url, segments)?;
        let response = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .query(query)
            .send()
            .await?;
        Ok(ensure_success(SERVICE, what, response).await?.json().await?)
    }

    /// All users holding `emoji` on a message, following pagination.
    async fn reaction_users(&self, channel_id: &str, message_id: &str, emoji: &str) -> Result<Vec<String>> {
        let limit = REACTION_PAGE.to_string();
        let mut users = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let page: Vec<UserPayload> = {
                let mut query = vec![("limit", limit.as_str())];
                if let Some(after) = after.as_deref() {
                    query.push(("after", after));
                }
                self.get(
                    "reaction users",
                    &["channels", channel_id, "messages", message_id, "reactions", emoji],
                    &query,
                )
                .await?
            };
            let full_page = page.len() == REACTION_PAGE;
            after = page.last().map(|u| u.id.clone());
            users.extend(page.into_iter().map(|u| u.id));
            if !full_page {
                return Ok(users);
            }
        }
    }
}

impl ChatSession for DiscordRest {
    async fn current_user_id(&self) -> Result<String> {
        let me: UserPayload = self.get("current user", &["users", "@me"], &[]).await?;
        Ok(me.id)
    }

    async fn message_reactions(&self, channel_id: &str, message_id: &str) -> Result<Vec<MessageReaction>> {
        let message: MessagePayload = self
            .get("message", &["channels", channel_id, "messages", message_id], &[])
            .await?;

        let mut reactions = Vec::with_capacity(message.reactions.len());
        for reaction in message.reactions {
            let emoji = reaction.emoji.key();
            let user_ids = self.reaction_users(channel_id, message_id, &emoji).await?;
            reactions.push(MessageReaction { emoji, user_ids });
        }
        Ok(reactions)
    }

    async fn display_name(&self, guild_id: Option<&str>, user_id: &str) -> Result<String> {
        if let Some(guild_id) = guild_id {
            let member: MemberPayload = self
                .get("guild member", &["guilds", guild_id, "members", user_id], &[])
                .await?;
            return Ok(member.display_name());
        }
        let user: UserPayload = self.get("user", &["users", user_id], &[]).await?;
        Ok(user.display_name().to_string())
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<String> {
        let url = endpoint(SERVICE, &self.base_url, &["channels", channel_id, "messages"])?;
        let response = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .json(&json!({ "content": content }))
            .send()
            .await?;
        let message: CreatedMessage = ensure_success(SERVICE, "create message", response)
            .await?
            .json()
            .await?;
        Ok(message.id)
    }

    async fn add_reaction(&self, channel_id: &str, message_id: &str, emoji: &str) -> Result<()> {
        let url = endpoint(
            SERVICE,
            &self.base_url,
            &["channels", channel_id, "messages", message_id, "reactions", emoji, "@me"],
        )?;
        let response = self
            .http
            .put(url)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .header(reqwest::header::CONTENT_LENGTH, "0")
            .send()
            .await?;
        ensure_success(SERVICE, "add reaction", response).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    reactions: Vec<ReactionPayload>,
}

#[derive(Debug, Deserialize)]
struct ReactionPayload {
    emoji: EmojiPayload,
}

#[derive(Debug, Deserialize)]
struct EmojiPayload {
    id: Option<String>,
    name: Option<String>,
}

impl EmojiPayload {
    /// Unicode emoji are keyed by the character itself, custom emoji by
    /// `name:id` (the form the reaction endpoints expect).
    fn key(&self) -> String {
        let name = self.name.as_deref().unwrap_or_default();
        match &self.id {
            Some(id) => format!("{name}:{id}"),
            None => name.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    global_name: Option<String>,
}

impl UserPayload {
    fn display_name(&self) -> &str {
        self.global_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Debug, Deserialize)]
struct MemberPayload {
    #[serde(default)]
    nick: Option<String>,
    user: UserPayload,
}

impl MemberPayload {
    fn display_name(&self) -> String {
        self.nick
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.user.display_name())
            .to_string()
    }
}

#[derive(Debug, Deserialize)]
struct CreatedMessage {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RollcallError;
    use crate::http::stub::StubServer;

    #[test]
    fn test_member_display_name_preference() {
        let member: MemberPayload = serde_json::from_value(json!({
            "nick": "Ali (EU)",
            "user": { "id": "1", "username": "ali", "global_name": "Ali R" }
        }))
        .unwrap();
        assert_eq!(member.display_name(), "Ali (EU)");

        let no_nick: MemberPayload = serde_json::from_value(json!({
            "nick": null,
            "user": { "id": "1", "username": "ali", "global_name": "Ali R" }
        }))
        .unwrap();
        assert_eq!(no_nick.display_name(), "Ali R");

        let bare: MemberPayload = serde_json::from_value(json!({
            "user": { "id": "1", "username": "ali" }
        }))
        .unwrap();
        assert_eq!(bare.display_name(), "ali");
    }

    #[test]
    fn test_emoji_keys() {
        let unicode: EmojiPayload = serde_json::from_value(json!({ "id": null, "name": "✅" })).unwrap();
        assert_eq!(unicode.key(), "✅");

        let custom: EmojiPayload = serde_json::from_value(json!({ "id": "123", "name": "late" })).unwrap();
        assert_eq!(custom.key(), "late:123");
    }

    #[test]
    fn test_message_without_reactions() {
        let message: MessagePayload = serde_json::from_value(json!({ "id": "1", "content": "Roll call!" })).unwrap();
        assert!(message.reactions.is_empty());
    }

    #[test]
    fn test_debug_hides_token() {
        let client = DiscordRest::new("secret-token").unwrap();
        assert!(!format!("{client:?}").contains("secret-token"));
    }

    fn users(ids: std::ops::RangeInclusive<u32>) -> String {
        let page: Vec<_> = ids
            .map(|id| json!({ "id": id.to_string(), "username": format!("user{id}") }))
            .collect();
        serde_json::to_string(&page).unwrap()
    }

    #[tokio::test]
    async fn test_reaction_users_follow_pagination() {
        let message = json!({
            "id": "m",
            "reactions": [{ "count": 101, "emoji": { "id": null, "name": "✅" } }]
        });
        let server = StubServer::start(vec![
            (200, message.to_string()),
            (200, users(1..=100)),
            (200, users(101..=101)),
        ])
        .await;
        let client = DiscordRest::new("tok").unwrap().with_base_url(&server.base_url);

        let reactions = client.message_reactions("c", "m").await.unwrap();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].emoji, "✅");
        assert_eq!(reactions[0].user_ids.len(), 101);
        assert_eq!(reactions[0].user_ids.last().map(String::as_str), Some("101"));

        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].request_line.starts_with("GET /channels/c/messages/m HTTP/1.1"));
        assert!(requests[0].headers.contains("authorization: bot tok"));

        let first_page = &requests[1].request_line;
        assert!(first_page.contains("/reactions/%E2%9C%85?"), "{first_page}");
        assert!(first_page.contains("limit=100"), "{first_page}");
        assert!(!first_page.contains("after="), "{first_page}");

        let second_page = &requests[2].request_line;
        assert!(second_page.contains("after=100"), "{second_page}");
    }

    #[tokio::test]
    async fn test_short_page_stops_pagination() {
        let message = json!({ "reactions": [{ "emoji": { "id": "9", "name": "late" } }] });
        let server = StubServer::start(vec![(200, message.to_string()), (200, users(1..=3))]).await;
        let client = DiscordRest::new("tok").unwrap().with_base_url(&server.base_url);

        let reactions = client.message_reactions("c", "m").await.unwrap();
        assert_eq!(reactions[0].emoji, "late:9");
        assert_eq!(reactions[0].user_ids, vec!["1", "2", "3"]);
        assert_eq!(server.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_server_error_is_external_service() {
        let server = StubServer::start(vec![(500, r#"{"message":"boom"}"#.to_string())]).await;
        let client = DiscordRest::new("tok").unwrap().with_base_url(&server.base_url);

        let err = client.current_user_id().await.unwrap_err();
        match err {
            RollcallError::ExternalService { service, message } => {
                assert_eq!(service, "Discord");
                assert!(message.contains("500"), "{message}");
                assert!(message.contains("boom"), "{message}");
            }
            other => panic!("expected ExternalService, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_guild_member_name_and_reply() {
        let member = json!({ "nick": null, "user": { "id": "7", "username": "ali", "global_name": "Ali R" } });
        let server = StubServer::start(vec![
            (200, member.to_string()),
            (200, json!({ "id": "m2" }).to_string()),
        ])
        .await;
        let client = DiscordRest::new("tok").unwrap().with_base_url(&server.base_url);

        assert_eq!(client.display_name(Some("g"), "7").await.unwrap(), "Ali R");
        assert_eq!(client.send_message("c", "Roll call!").await.unwrap(), "m2");

        let requests = server.requests();
        assert!(requests[0].request_line.starts_with("GET /guilds/g/members/7 HTTP/1.1"));
        assert!(requests[1].request_line.starts_with("POST /channels/c/messages HTTP/1.1"));
        let body: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
        assert_eq!(body, json!({ "content": "Roll call!" }));
    }
}
