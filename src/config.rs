use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

/// Config file picked up from the working directory when no path is given.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Public base URL Telegram pushes updates to. Absent means long polling.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            webhook_url: None,
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl std::fmt::Display for LogRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogRotation::Daily => write!(f, "daily"),
            LogRotation::Hourly => write!(f, "hourly"),
            LogRotation::Never => write!(f, "never"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub directory: PathBuf,
    #[serde(default = "default_log_file")]
    pub file_name: String,
    #[serde(default)]
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
            file_name: default_log_file(),
            rotation: LogRotation::default(),
        }
    }
}

/// How updates reach the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateMode {
    Polling,
    /// Listen on `listen` and have Telegram push to `url`, whose path carries
    /// the bot token.
    Webhook { listen: SocketAddr, url: Url },
}

fn default_port() -> u16 {
    8443
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_file() -> String {
    "bot.log".to_string()
}

impl Config {
    /// Load the TOML file (if any) and apply environment overrides.
    ///
    /// An explicitly named file must exist; the default `config.toml` is
    /// optional so the bot can run from environment variables alone.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.with_env(|key| std::env::var(key).ok())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply `TELEGRAM_TOKEN`, `PORT`, `WEBHOOK_URL` and `LOG_DIR` on top of
    /// the file values, then check that a token is present.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.telegram.bot_token = token.trim().to_string();
        }

        if let Some(port) = lookup("PORT") {
            self.telegram.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }

        if let Some(url) = lookup("WEBHOOK_URL") {
            self.telegram.webhook_url = Some(url);
        }

        if let Some(dir) = lookup("LOG_DIR").filter(|d| !d.is_empty()) {
            self.logging.directory = PathBuf::from(dir);
        }

        if self.telegram.bot_token.trim().is_empty() {
            bail!("No TELEGRAM_TOKEN found in environment variables or config file");
        }

        Ok(self)
    }

    /// Webhook base URL, treating an empty value as unset.
    pub fn webhook_base(&self) -> Option<&str> {
        self.telegram
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Pick polling or webhook delivery from the presence of a webhook URL.
    pub fn update_mode(&self) -> Result<UpdateMode> {
        let Some(base) = self.webhook_base() else {
            return Ok(UpdateMode::Polling);
        };

        let raw = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.telegram.bot_token
        );
        let url = Url::parse(&raw)
            .with_context(|| format!("Invalid WEBHOOK_URL: {}", base))?;

        Ok(UpdateMode::Webhook {
            listen: SocketAddr::from(([0, 0, 0, 0], self.telegram.port)),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let err = Config::default().with_env(env(&[])).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_TOKEN"));
    }

    #[test]
    fn test_blank_token_is_fatal() {
        let result = Config::default().with_env(env(&[("TELEGRAM_TOKEN", "   ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_defaults() {
        let config = Config::default()
            .with_env(env(&[("TELEGRAM_TOKEN", "123:abc")]))
            .unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.port, 8443);
        assert!(config.telegram.webhook_url.is_none());
        assert_eq!(config.logging.directory, PathBuf::from("logs"));
        assert_eq!(config.logging.file_name, "bot.log");
        assert_eq!(config.logging.rotation, LogRotation::Daily);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = Config::default()
            .with_env(env(&[("TELEGRAM_TOKEN", "t"), ("PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_env_overrides_file() {
        let file: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "from-file"
            port = 9000

            [logging]
            directory = "/var/log/farewell"
            rotation = "hourly"
            "#,
        )
        .unwrap();

        let config = file
            .with_env(env(&[
                ("TELEGRAM_TOKEN", "from-env"),
                ("PORT", "8080"),
                ("WEBHOOK_URL", "https://bot.example.com"),
            ]))
            .unwrap();

        assert_eq!(config.telegram.bot_token, "from-env");
        assert_eq!(config.telegram.port, 8080);
        assert_eq!(config.webhook_base(), Some("https://bot.example.com"));
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/farewell"));
        assert_eq!(config.logging.rotation, LogRotation::Hourly);
    }

    #[test]
    fn test_file_token_used_without_env() {
        let file: Config = toml::from_str("[telegram]\nbot_token = \"only-file\"\n").unwrap();
        let config = file.with_env(env(&[])).unwrap();
        assert_eq!(config.telegram.bot_token, "only-file");
        assert_eq!(config.update_mode().unwrap(), UpdateMode::Polling);
    }

    #[test]
    fn test_unknown_rotation_fails_to_parse() {
        let parsed: Result<Config, _> = toml::from_str("[logging]\nrotation = \"weekly\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_polling_without_webhook_url() {
        let config = Config::default()
            .with_env(env(&[("TELEGRAM_TOKEN", "t")]))
            .unwrap();
        assert_eq!(config.update_mode().unwrap(), UpdateMode::Polling);
    }

    #[test]
    fn test_empty_webhook_url_means_polling() {
        let config = Config::default()
            .with_env(env(&[("TELEGRAM_TOKEN", "t"), ("WEBHOOK_URL", "")]))
            .unwrap();
        assert_eq!(config.update_mode().unwrap(), UpdateMode::Polling);
    }

    #[test]
    fn test_webhook_mode_uses_port_and_token_path() {
        let config = Config::default()
            .with_env(env(&[
                ("TELEGRAM_TOKEN", "123:abc"),
                ("WEBHOOK_URL", "https://bot.example.com/"),
                ("PORT", "8088"),
            ]))
            .unwrap();

        match config.update_mode().unwrap() {
            UpdateMode::Webhook { listen, url } => {
                assert_eq!(listen, SocketAddr::from(([0, 0, 0, 0], 8088)));
                assert_eq!(url.as_str(), "https://bot.example.com/123:abc");
                assert_eq!(url.path(), "/123:abc");
            }
            UpdateMode::Polling => panic!("expected webhook mode"),
        }
    }

    #[test]
    fn test_webhook_mode_default_port() {
        let config = Config::default()
            .with_env(env(&[
                ("TELEGRAM_TOKEN", "t"),
                ("WEBHOOK_URL", "https://bot.example.com"),
            ]))
            .unwrap();

        match config.update_mode().unwrap() {
            UpdateMode::Webhook { listen, .. } => assert_eq!(listen.port(), 8443),
            UpdateMode::Polling => panic!("expected webhook mode"),
        }
    }

    #[test]
    fn test_invalid_webhook_url() {
        let config = Config::default()
            .with_env(env(&[("TELEGRAM_TOKEN", "t"), ("WEBHOOK_URL", "not a url")]))
            .unwrap();
        assert!(config.update_mode().is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(result.is_err());
    }
}
