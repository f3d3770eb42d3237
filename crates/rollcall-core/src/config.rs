//! Bot configuration (TOML).
//!
//! The file is read once at start-up and written back on shutdown so that
//! operator commands (`/addrange`, `/setsheet`, ...) persist. While running,
//! the live copy is owned by [`crate::settings::SettingsStore`].

use directories::ProjectDirs;
use rollcall_engine::engine::{PriorityTable, Rgb, parse_range};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, RollcallError};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub google: GoogleConfig,
    pub discord: DiscordConfig,
    pub sync: SyncConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub credentials_path: PathBuf,
    /// JSON file holding an OAuth `access_token` for the Sheets API.
    pub token_path: PathBuf,
    pub redirect_url: String,
    pub sheet_id: String,
    /// Ranges searched for display names, in A1 notation.
    pub sheet_ranges: BTreeSet<String>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        GoogleConfig {
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            redirect_url: String::new(),
            sheet_id: String::new(),
            sheet_ranges: BTreeSet::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub application_id: String,
    pub bot_token: String,
    /// User ids allowed to change settings. Empty means anyone.
    pub bot_owners: Vec<String>,
    pub bot_server: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_call_channel_id: Option<String>,
    pub reaction_colours: PriorityTable,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub period_ms: u64,
    pub idle_flush_ms: u64,
    pub max_drain_ms: u64,
    pub queue_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            period_ms: 3_000,
            idle_flush_ms: 10,
            max_drain_ms: 1_000,
            queue_capacity: 10,
        }
    }
}

impl SyncConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn idle_flush(&self) -> Duration {
        Duration::from_millis(self.idle_flush_ms)
    }

    pub fn max_drain(&self) -> Duration {
        Duration::from_millis(self.max_drain_ms)
    }
}

impl Config {
    /// Load and validate the config at `path`.
    ///
    /// A missing file is replaced by a default template and reported as
    /// [`RollcallError::ConfigTemplateWritten`].
    pub fn load(path: &Path) -> Result<Config> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Config::default().save(path)?;
                return Err(RollcallError::ConfigTemplateWritten(path.to_path_buf()));
            }
            Err(err) => return Err(err.into()),
        };
        Config::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let missing = |what: &str| Err(RollcallError::InvalidConfig(format!("missing {what}")));
        if self.google.redirect_url.trim().is_empty() {
            return missing("Google redirect URL");
        }
        if self.discord.bot_token.trim().is_empty() {
            return missing("Discord bot token");
        }
        if self.discord.bot_server.trim().is_empty() {
            return missing("Discord server ID");
        }

        for range in &self.google.sheet_ranges {
            parse_range(range)?;
        }
        for (kind, entry) in self.discord.reaction_colours.iter() {
            Rgb::from_hex(&entry.colour).map_err(|err| {
                RollcallError::InvalidConfig(format!("reaction colour for {kind}: {err}"))
            })?;
        }

        let sync = &self.sync;
        if sync.period_ms == 0 || sync.idle_flush_ms == 0 || sync.max_drain_ms == 0 {
            return Err(RollcallError::InvalidConfig(
                "sync durations must be greater than zero".to_string(),
            ));
        }
        if sync.queue_capacity == 0 {
            return Err(RollcallError::InvalidConfig(
                "sync.queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `user_id` may change settings.
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.discord.bot_owners.is_empty() || self.discord.bot_owners.iter().any(|o| o == user_id)
    }
}

/// Per-user config location, e.g. `~/.config/rollcall/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "rollcall")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_engine::engine::ReactionColour;

    const MINIMAL: &str = r#"
[google]
redirect_url = "urn:ietf:wg:oauth:2.0:oob"
sheet_id = "abc123"
sheet_ranges = ["C2:D17", "'Other Sheet'!AE2:AF357"]

[discord]
bot_token = "token"
bot_server = "42"
"#;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.google.token_path, PathBuf::from("token.json"));
        assert_eq!(config.google.sheet_ranges.len(), 2);
        assert_eq!(config.discord.reaction_colours, PriorityTable::default());
        assert_eq!(config.sync, SyncConfig::default());
        assert_eq!(config.sync.period(), Duration::from_secs(3));
        assert_eq!(config.discord.roll_call_channel_id, None);
    }

    #[test]
    fn test_custom_reaction_colours() {
        let content = format!(
            "{MINIMAL}\n[discord.reaction_colours]\n\"👍\" = {{ colour = \"0000ff\", priority = 4 }}\n"
        );
        let config = Config::from_toml_str(&content).unwrap();
        assert_eq!(config.discord.reaction_colours.len(), 1);
        assert_eq!(
            config.discord.reaction_colours.get("👍"),
            Some(&ReactionColour::new("0000ff", 4))
        );
    }

    #[test]
    fn test_missing_required_values() {
        let err = Config::from_toml_str("").unwrap_err();
        assert!(err.to_string().contains("redirect URL"), "{err}");

        let no_token = MINIMAL.replace("bot_token = \"token\"", "");
        let err = Config::from_toml_str(&no_token).unwrap_err();
        assert!(err.to_string().contains("bot token"), "{err}");
    }

    #[test]
    fn test_invalid_range_is_rejected() {
        let content = MINIMAL.replace("C2:D17", "c2:d17");
        let err = Config::from_toml_str(&content).unwrap_err();
        assert!(matches!(err, RollcallError::Range(_)), "{err}");
    }

    #[test]
    fn test_invalid_colour_is_rejected() {
        let content = format!(
            "{MINIMAL}\n[discord.reaction_colours]\n\"👍\" = {{ colour = \"blue\", priority = 1 }}\n"
        );
        let err = Config::from_toml_str(&content).unwrap_err();
        assert!(matches!(err, RollcallError::InvalidConfig(_)), "{err}");
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let content = format!("{MINIMAL}\n[sync]\nqueue_capacity = 0\n");
        assert!(Config::from_toml_str(&content).is_err());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::from_toml_str(MINIMAL).unwrap();
        config.discord.roll_call_channel_id = Some("555".to_string());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, RollcallError::ConfigTemplateWritten(_)));
        assert!(path.exists());

        // The template itself is incomplete until an operator fills it in.
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, RollcallError::InvalidConfig(_)));
    }

    #[test]
    fn test_owner_check() {
        let mut config = Config::default();
        assert!(config.is_owner("anyone"));
        config.discord.bot_owners = vec!["1".to_string()];
        assert!(config.is_owner("1"));
        assert!(!config.is_owner("2"));
    }

    #[test]
    fn test_default_config_path_names_the_app() {
        if let Some(path) = default_config_path() {
            assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("config.toml"));
            assert!(path.components().any(|c| c.as_os_str() == "rollcall"), "{}", path.display());
        }
    }
}
