//! Error types for Rollcall core.

use std::path::PathBuf;

use rollcall_engine::engine::RangeError;
use thiserror::Error;

/// Errors that can occur while syncing reactions to the sheet
#[derive(Error, Debug)]
pub enum RollcallError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("No config found, wrote a template to {}; fill it in and run again", .0.display())]
    ConfigTemplateWritten(PathBuf),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error("{service} request failed: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Update queue closed")]
    QueueClosed,
}

impl RollcallError {
    pub(crate) fn external(service: &'static str, message: impl Into<String>) -> Self {
        RollcallError::ExternalService {
            service,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RollcallError>;
