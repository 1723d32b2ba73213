//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::ConfigError;
use crate::application::messaging::BotIdentity;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub owner: OwnerConfig,
    pub commands: CommandsConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
    pub author: String,
    pub mode: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OwnerConfig {
    /// Number used for pairing; also the owner-notify target when
    /// `owner-number` is unset.
    pub phone_number: String,
    pub owner_number: String,
    /// Whether commands issued from the bot's own account are dispatched.
    pub allow_self: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CommandsConfig {
    pub directory: PathBuf,
    pub auto_reload: bool,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AuthConfig {
    pub directory: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "waru-bot".to_string(),
            prefix: ".".to_string(),
            author: "waru".to_string(),
            mode: "Public".to_string(),
        }
    }
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            phone_number: String::new(),
            owner_number: String::new(),
            allow_self: true,
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./commands"),
            auto_reload: false,
            timeout_ms: 15_000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./auth_state"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            owner: OwnerConfig::default(),
            commands: CommandsConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Defaults overridden by environment variables, matching the env
    /// surface the bot has always recognized.
    pub fn load_env() -> Self {
        let mut config = Config::default();

        if let Ok(name) = std::env::var("BOT_NAME") {
            config.bot.name = name.trim().to_string();
        }
        if let Ok(prefix) = std::env::var("PREFIX") {
            config.bot.prefix = prefix.trim().to_string();
        }
        if let Ok(author) = std::env::var("AUTHOR") {
            config.bot.author = author.trim().to_string();
        }
        if let Ok(mode) = std::env::var("BOT_MODE") {
            config.bot.mode = mode.trim().to_string();
        }
        if let Ok(phone) = std::env::var("PHONE_NUMBER") {
            config.owner.phone_number = phone.trim().to_string();
        }
        if let Ok(owner) = std::env::var("OWNER_NUMBER") {
            config.owner.owner_number = owner.trim().to_string();
        }
        if let Ok(allow) = std::env::var("ALLOW_SELF") {
            config.owner.allow_self = allow.trim() != "0";
        }
        if let Ok(auto) = std::env::var("AUTO_RELOAD_COMMANDS") {
            config.commands.auto_reload = auto.trim() == "1";
        }
        if let Ok(timeout) = std::env::var("COMMAND_TIMEOUT_MS") {
            if let Ok(ms) = timeout.trim().parse() {
                config.commands.timeout_ms = ms;
            }
        }

        config
    }

    /// Owner number, defaulting to the pairing phone number.
    pub fn owner_number(&self) -> &str {
        if self.owner.owner_number.trim().is_empty() {
            &self.owner.phone_number
        } else {
            &self.owner.owner_number
        }
    }

    pub fn identity(&self) -> BotIdentity {
        BotIdentity {
            name: self.bot.name.clone(),
            prefix: self.bot.prefix.clone(),
            author: self.bot.author.clone(),
            mode: self.bot.mode.clone(),
        }
    }

    pub fn command_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.commands.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.bot.prefix, ".");
        assert_eq!(config.commands.timeout_ms, 15_000);
        assert!(config.owner.allow_self);
        assert!(!config.commands.auto_reload);
    }

    #[test]
    fn owner_number_falls_back_to_phone_number() {
        let mut config = Config::default();
        config.owner.phone_number = "123".to_string();
        assert_eq!(config.owner_number(), "123");

        config.owner.owner_number = "456".to_string();
        assert_eq!(config.owner_number(), "456");
    }

    #[test]
    fn parses_partial_yaml_over_defaults() {
        let yaml = r#"
bot:
  name: test-bot
  prefix: "!"
commands:
  timeout-ms: 500
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.bot.name, "test-bot");
        assert_eq!(config.bot.prefix, "!");
        assert_eq!(config.commands.timeout_ms, 500);
        assert_eq!(config.bot.author, "waru");
    }
}
