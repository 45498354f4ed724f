use std::path::{Path, PathBuf};

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ExitError;
use crate::template::ReplyBook;

/// Config file name constants.
pub const CONFIG_TOML: &str = "tabtoss.toml";
pub const CONFIG_JSON: &str = "tabtoss.json";

pub const CONFIG_VERSION: &str = "1";

/// Token variable name used by earlier deployments.
pub const LEGACY_TOKEN_ENV: &str = "Bot_Token";

/// Find the config file path, preferring tabtoss.toml over tabtoss.json.
/// Returns None if neither exists.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let toml_path = dir.join(CONFIG_TOML);
    if toml_path.exists() {
        return Some(toml_path);
    }
    let json_path = dir.join(CONFIG_JSON);
    if json_path.exists() {
        return Some(json_path);
    }
    None
}

/// Top-level tabtoss.toml config. Every section is optional.
///
/// Structs use snake_case with camelCase aliases so JSON configs written by
/// hand in either style load.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub replies: RepliesConfig,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TelegramConfig {
    /// Environment variable holding the bot token.
    #[serde(default = "default_token_env", alias = "tokenEnv")]
    pub token_env: String,
    /// Bot username, used to tell `/cmd@ThisBot` apart from other bots.
    #[serde(default)]
    pub username: Option<String>,
    /// Seconds to wait between polls.
    #[serde(default = "default_poll_interval", alias = "pollInterval")]
    pub poll_interval: u64,
    /// Long-poll timeout in seconds.
    #[serde(default = "default_poll_timeout", alias = "pollTimeout")]
    pub poll_timeout: u64,
    /// Publish the command menu on startup.
    #[serde(default = "default_true", alias = "registerCommands")]
    pub register_commands: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            username: None,
            poll_interval: default_poll_interval(),
            poll_timeout: default_poll_timeout(),
            register_commands: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StorageConfig {
    /// Directory holding one JSON record per conversation.
    #[serde(default, alias = "stateDir")]
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RepliesConfig {
    /// JSON array of reply templates. Built-in replies are used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Default value functions for serde
fn default_version() -> String { CONFIG_VERSION.into() }
fn default_token_env() -> String { "BOT_TOKEN".into() }
fn default_poll_interval() -> u64 { 3 }
fn default_poll_timeout() -> u64 { 10 }
fn default_true() -> bool { true }

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            telegram: TelegramConfig::default(),
            storage: StorageConfig::default(),
            replies: RepliesConfig::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load config from a file (TOML or JSON, auto-detected by extension).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let mut config = match ext {
            "toml" => Self::parse_toml(&contents)?,
            "json" => Self::parse_json(&contents)?,
            _ => Self::parse_toml(&contents).or_else(|_| Self::parse_json(&contents))?,
        };
        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(config)
    }

    /// Load the explicit path if given, else look in `dir`, else use defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match find_config(dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            None => {
                tracing::debug!(dir = %dir.display(), "no config file, using defaults");
                Ok(Self {
                    base_dir: dir.to_path_buf(),
                    ..Self::default()
                })
            }
        }
    }

    /// Parse config from a TOML string.
    pub fn parse_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).map_err(|e| {
            ExitError::Config(format!("invalid {CONFIG_TOML}: {e}")).into()
        })
    }

    /// Parse config from a JSON string.
    pub fn parse_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            ExitError::Config(format!("invalid {CONFIG_JSON}: {e}")).into()
        })
    }

    /// Serialize config to a TOML string with helpful comments.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        let raw = toml::to_string_pretty(self)
            .context("serializing config to TOML")?;

        let mut doc: toml_edit::DocumentMut = raw.parse()
            .context("parsing generated TOML for comment injection")?;

        doc.decor_mut().set_prefix("# tabtoss bot configuration\n\n");

        fn set_table_comment(doc: &mut toml_edit::DocumentMut, key: &str, comment: &str) {
            if let Some(tbl) = doc.get_mut(key).and_then(toml_edit::Item::as_table_mut) {
                tbl.decor_mut().set_prefix(comment);
            }
        }

        set_table_comment(
            &mut doc,
            "telegram",
            "\n# Telegram Bot API polling. The token is read from the env var named by token_env\n",
        );
        set_table_comment(
            &mut doc,
            "storage",
            "\n# Conversation state (one JSON file per chat). Defaults to the platform data dir\n",
        );
        set_table_comment(
            &mut doc,
            "replies",
            "\n# Reply templates: a JSON array of strings with one {{ name }} each. \
             Defaults to built-in replies\n",
        );

        Ok(doc.to_string())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Directory where conversation records live.
    pub fn state_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.storage.state_dir {
            return Ok(self.resolve(dir));
        }
        dirs::data_dir()
            .map(|d| d.join("tabtoss"))
            .ok_or_else(|| {
                ExitError::Config("no platform data dir; set storage.state_dir".into()).into()
            })
    }

    /// Load the configured reply templates, or the built-in ones.
    pub fn replies(&self) -> anyhow::Result<ReplyBook> {
        match &self.replies.path {
            Some(path) => ReplyBook::load(&self.resolve(path)),
            None => ReplyBook::builtin(),
        }
    }

    /// Bot username without a leading `@`.
    pub fn username(&self) -> Option<&str> {
        self.telegram
            .username
            .as_deref()
            .map(|u| u.trim().trim_start_matches('@'))
            .filter(|u| !u.is_empty())
    }

    /// Read the bot token from the configured environment variable.
    ///
    /// With the default `BOT_TOKEN`, the legacy `Bot_Token` name is accepted
    /// too, so an existing `.env` keeps working.
    pub fn bot_token(&self) -> Result<String, ExitError> {
        self.token_from(|var| std::env::var(var).ok())
    }

    fn token_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<String, ExitError> {
        let var = &self.telegram.token_env;
        let legacy = (*var == default_token_env()).then_some(LEGACY_TOKEN_ENV);
        std::iter::once(var.as_str())
            .chain(legacy)
            .filter_map(&lookup)
            .map(|token| token.trim().to_string())
            .find(|token| !token.is_empty())
            .ok_or_else(|| ExitError::MissingCredential { var: var.clone() })
    }
}
