//! rollcall-core - runtime around the engine: config, queue, sync driver and
//! the Sheets/Discord clients.

pub mod chat;
pub mod commands;
pub mod config;
pub mod error;
pub mod handler;
mod http;
pub mod queue;
pub mod settings;
pub mod sheets;
pub mod sync;

pub use chat::{ChatEvent, ChatSession, CommandInvocation, DiscordRest, MessageReaction};
pub use commands::{OperatorCommand, run_command};
pub use config::{Config, default_config_path};
pub use error::{Result, RollcallError};
pub use handler::ReactionHandler;
pub use queue::{DrainTiming, PendingUpdate, UpdateReceiver, UpdateSender, update_queue};
pub use settings::SettingsStore;
pub use sheets::{AccessToken, CellFormat, GoogleSheets, SheetsApi};
pub use sync::{SyncDriver, TickOutcome};

pub use rollcall_engine::engine::{CellRef, RangeRef, parse_range};
