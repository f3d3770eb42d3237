//! Operator commands (`/create`, `/addrange`, ...).
//!
//! Commands read and replace the live [`SettingsStore`] snapshot and answer
//! with the reply text to post back. They never touch the sheet directly.

use rollcall_engine::engine::{find_ranges, parse_range};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::chat::{ChatSession, CommandInvocation};
use crate::settings::SettingsStore;

const DEFAULT_ROLL_CALL: &str = "Roll call!";
const A1_HELP_URL: &str = "https://developers.google.com/sheets/api/guides/concepts#expandable-1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("I don't know the `/{0}` command. Try `/help`.")]
    Unknown(String),

    #[error("`/{command}` needs a `{option}` value.")]
    MissingOption {
        command: &'static str,
        option: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperatorCommand {
    Help,
    Create {
        channel: Option<String>,
        message: Option<String>,
    },
    Sheet,
    SetSheet(String),
    Ranges,
    AddRange(String),
    SetRanges(String),
    Channel,
    SetChannel(Option<String>),
}

impl OperatorCommand {
    pub fn parse(invocation: &CommandInvocation) -> Result<Self, CommandError> {
        let required = |command: &'static str, option: &'static str| {
            invocation
                .option(option)
                .map(str::to_string)
                .ok_or(CommandError::MissingOption { command, option })
        };

        let command = match invocation.name.trim().trim_start_matches('/') {
            "help" => OperatorCommand::Help,
            "create" => OperatorCommand::Create {
                channel: invocation.option("channel").map(channel_id),
                message: invocation.option("message").map(str::to_string),
            },
            "sheet" => OperatorCommand::Sheet,
            "setsheet" => OperatorCommand::SetSheet(required("setsheet", "sheet-id")?),
            "ranges" => OperatorCommand::Ranges,
            "addrange" => OperatorCommand::AddRange(required("addrange", "range")?),
            "setranges" => OperatorCommand::SetRanges(required("setranges", "ranges")?),
            "channel" => OperatorCommand::Channel,
            "setchannel" => OperatorCommand::SetChannel(invocation.option("channel").map(channel_id)),
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }

    /// Whether the command changes settings and so needs an owner.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            OperatorCommand::SetSheet(_)
                | OperatorCommand::AddRange(_)
                | OperatorCommand::SetRanges(_)
                | OperatorCommand::SetChannel(_)
        )
    }
}

pub fn pluralise<'a>(singular: &'a str, plural: &'a str, n: usize) -> &'a str {
    if n == 1 { singular } else { plural }
}

/// Accept either a bare id or a `<#id>` channel mention.
fn channel_id(value: &str) -> String {
    value
        .strip_prefix("<#")
        .and_then(|v| v.strip_suffix('>'))
        .unwrap_or(value)
        .to_string()
}

fn code_list<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let items: Vec<&str> = items.into_iter().map(String::as_str).collect();
    format!("`{}`", items.join("`, `"))
}

/// Run one command and return the reply.
pub async fn run_command<C: ChatSession>(
    chat: &C,
    settings: &SettingsStore,
    invocation: &CommandInvocation,
) -> String {
    let command = match OperatorCommand::parse(invocation) {
        Ok(command) => command,
        Err(err) => return err.to_string(),
    };
    if command.is_mutating() && !settings.snapshot().is_owner(&invocation.user_id) {
        tracing::warn!(user_id = %invocation.user_id, command = %invocation.name, "command refused");
        return "Sorry, only bot owners can change my settings.".to_string();
    }
    tracing::info!(user_id = %invocation.user_id, command = %invocation.name, "running command");

    match command {
        OperatorCommand::Help => "Hey, I'm Rollcall! I create roll call messages in a channel you choose, \
             and update the colours of users that react to them in a Google Sheets spreadsheet.\n\
             You can try sending a roll call with `/create`, or use one of the other commands to configure how I work."
            .to_string(),
        OperatorCommand::Create { channel, message } => {
            create_roll_call(chat, settings, invocation, channel, message).await
        }
        OperatorCommand::Sheet => {
            let config = settings.snapshot();
            if config.google.sheet_id.is_empty() {
                "I don't have a sheet ID set, so I won't be able to do any name updates. \
                 You can give me one with `/setsheet`."
                    .to_string()
            } else {
                format!(
                    "This is the sheet I'll use when updating name colours: https://docs.google.com/spreadsheets/d/{}/",
                    config.google.sheet_id
                )
            }
        }
        OperatorCommand::SetSheet(sheet_id) => {
            let applied = settings.update(|config| {
                config.google.sheet_id = sheet_id.clone();
                Ok(())
            });
            match applied {
                Ok(()) => format!("Set the sheet ID to `{sheet_id}`"),
                Err(err) => format!("I couldn't update the sheet ID: {err}"),
            }
        }
        OperatorCommand::Ranges => {
            let config = settings.snapshot();
            let ranges = &config.google.sheet_ranges;
            if ranges.is_empty() {
                "I don't have any ranges to look for matches in. \
                 You can add some with `/addrange` or `/setranges`."
                    .to_string()
            } else {
                format!(
                    "Here {} the current {} I'll look for matches in: {}",
                    pluralise("is", "are", ranges.len()),
                    pluralise("range", "ranges", ranges.len()),
                    code_list(ranges)
                )
            }
        }
        OperatorCommand::AddRange(range) => add_range(settings, range),
        OperatorCommand::SetRanges(text) => set_ranges(settings, &text),
        OperatorCommand::Channel => {
            let config = settings.snapshot();
            let target = match &config.discord.roll_call_channel_id {
                Some(id) => format!("<#{id}>"),
                None => "whichever channel a roll call is created in".to_string(),
            };
            format!(
                "Currently roll calls will be sent in {target}.\n\
                 Use `/setchannel` and mention a channel to set it, or just use `/setchannel` \
                 without any parameters to use whichever channel a roll call is created in."
            )
        }
        OperatorCommand::SetChannel(channel) => {
            let applied = settings.update(|config| {
                config.discord.roll_call_channel_id = channel.clone();
                Ok(())
            });
            match (applied, channel) {
                (Err(err), _) => format!("I couldn't set the roll call channel: {err}"),
                (Ok(()), Some(id)) => format!("Set the roll call channel to <#{id}>."),
                (Ok(()), None) => {
                    "Set the roll call channel to be whichever channel a roll call is created in.".to_string()
                }
            }
        }
    }
}

async fn create_roll_call<C: ChatSession>(
    chat: &C,
    settings: &SettingsStore,
    invocation: &CommandInvocation,
    channel: Option<String>,
    message: Option<String>,
) -> String {
    let config = settings.snapshot();
    let message = message.unwrap_or_else(|| DEFAULT_ROLL_CALL.to_string());
    let channel = channel
        .or_else(|| config.discord.roll_call_channel_id.clone())
        .unwrap_or_else(|| invocation.channel_id.clone());

    let message_id = match chat.send_message(&channel, &message).await {
        Ok(id) => id,
        Err(err) => {
            tracing::error!(%channel, "failed to send roll call: {err}");
            return format!("I couldn't make the roll call message. This is the message you gave me: `{message}`");
        }
    };

    let mut failed = 0_usize;
    for (emoji, _) in config.discord.reaction_colours.by_priority() {
        if let Err(err) = chat.add_reaction(&channel, &message_id, emoji).await {
            tracing::warn!(%channel, emoji, "failed to add reaction to roll call: {err}");
            failed += 1;
        }
    }

    let mut reply = format!("Created a new roll call in <#{channel}> with the following message: `{message}`");
    if failed > 0 {
        reply.push_str(&format!(
            "\nI couldn't add {failed} emoji to the roll call message though."
        ));
    }
    reply
}

fn add_range(settings: &SettingsStore, range: String) -> String {
    if let Err(err) = parse_range(&range) {
        tracing::warn!(%range, "rejected range: {err}");
        return format!(
            "`{range}` doesn't look like a valid range in A1 notation. \
             Check these examples from Google to see what I mean: {A1_HELP_URL}"
        );
    }
    let applied = settings.update(|config| {
        config.google.sheet_ranges.insert(range.clone());
        Ok(config.google.sheet_ranges.clone())
    });
    match applied {
        Ok(ranges) => format!(
            "Added `{range}` to the range list. {} that I'll look for matches in now: {}",
            pluralise("This is the one", "These are the ones", ranges.len()),
            code_list(&ranges)
        ),
        Err(err) => format!("I couldn't add the range: {err}"),
    }
}

fn set_ranges(settings: &SettingsStore, text: &str) -> String {
    let found = find_ranges(text);
    let mut ranges = BTreeSet::new();
    for (index, range) in found.iter().enumerate() {
        if parse_range(range).is_err() {
            return format!(
                "I got {index} {} in but `{range}` doesn't look like a valid range in A1 notation",
                pluralise("range", "ranges", index)
            );
        }
        ranges.insert(range.to_string());
    }
    if ranges.is_empty() {
        return format!("I couldn't find any valid A1 notation ranges in the list you gave me: `{text}`");
    }

    let applied = settings.update(|config| {
        config.google.sheet_ranges = ranges.clone();
        Ok(())
    });
    match applied {
        Err(err) => format!("I couldn't set the ranges: {err}"),
        Ok(()) if ranges.len() == 1 => format!("Replaced the range list with {}.", code_list(&ranges)),
        Ok(()) => format!("Replaced the range list with the following: {}", code_list(&ranges)),
    }
}
