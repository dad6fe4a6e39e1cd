//! Configuration file handling for expenses.
//!
//! The configuration file is stored at `$EXPENSES_HOME/config.json` and contains settings for the
//! notification channel, the export file and how often the store is polled for changes made by
//! other processes.

use crate::db::Db;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const APP_NAME: &str = "expenses";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const CONFIG_JSON: &str = "config.json";
const EXPENSES_SQLITE: &str = "expenses.sqlite";
const NOTIFY_TOKEN: &str = "notify_token";
const EXPORT_FILE: &str = "expenses.csv";
const POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_ENDPOINT: &str = "https://api.telegram.org";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// The environment variable that, when set, takes precedence over the token file.
pub const NOTIFY_TOKEN_ENV: &str = "EXPENSES_NOTIFY_TOKEN";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$EXPENSES_HOME` and from there it loads `$EXPENSES_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the expenses home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the data directory, its subdirectories and:
    /// - Creates an initial `config.json` file with default settings, using `endpoint` and
    ///   `chat_id` for notifications when they are given
    /// - Creates and migrates the SQLite database
    ///
    /// # Errors
    /// - Returns an error if any file operations fail or if a database already exists.
    pub async fn create(
        dir: impl Into<PathBuf>,
        endpoint: Option<&str>,
        chat_id: Option<&str>,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the expenses home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;

        let mut config_file = ConfigFile::default();
        if let Some(endpoint) = endpoint {
            config_file.notify.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        config_file.notify.chat_id = chat_id.map(str::to_string);

        let config_path = root.join(CONFIG_JSON);
        config_file.save(&config_path).await?;

        let db_path = root.join(EXPENSES_SQLITE);
        let db = Db::init(&db_path, config_file.poll_interval())
            .await
            .context("Unable to create SQLite DB")?;

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            db,
            sqlite_path: db_path,
        })
    }

    /// This will
    /// - validate that the `expenses_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - open the database, migrating it if needed
    pub async fn load(expenses_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = expenses_home.into();
        if !maybe_relative.is_dir() {
            bail!(
                "Expenses home is missing '{}'. Did you run 'expenses init'?",
                maybe_relative.display()
            );
        }
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let secrets = root.join(SECRETS);
        if !secrets.is_dir() {
            bail!("The secrets directory is missing '{}'", secrets.display())
        }

        let db_path = root.join(EXPENSES_SQLITE);
        let db = Db::load(&db_path, config_file.poll_interval())
            .await
            .context("Unable to load SQLite DB")?;

        debug!("Loaded configuration from {}", config_path.display());
        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            db,
            sqlite_path: db_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn notify(&self) -> &NotifySettings {
        &self.config_file.notify
    }

    pub fn poll_interval(&self) -> Duration {
        self.config_file.poll_interval()
    }

    /// The default export destination. A relative `export_file` is resolved against the home
    /// directory.
    pub fn export_path(&self) -> PathBuf {
        let p = &self.config_file.export_file;
        if p.is_absolute() {
            return p.clone();
        }
        self.root.join(p)
    }

    /// The path of the file that may hold the notification bot token.
    pub fn notify_token_path(&self) -> PathBuf {
        self.secrets.join(NOTIFY_TOKEN)
    }

    /// The bot token from `EXPENSES_NOTIFY_TOKEN`, falling back to the token file.
    pub async fn notify_token(&self) -> Result<Option<String>> {
        let from_env = std::env::var(NOTIFY_TOKEN_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty());
        if let Some(token) = from_env {
            return Ok(Some(token.trim().to_string()));
        }
        utils::read_secret(&self.notify_token_path()).await
    }
}

/// Where and how notifications are delivered.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct NotifySettings {
    /// The base URL of the bot API, e.g. `https://api.telegram.org`
    endpoint: String,

    /// The chat that receives messages. Notifications are only logged when this is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chat_id: Option<String>,

    /// How long to wait for the notification channel before giving up.
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            chat_id: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl NotifySettings {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_export_file() -> PathBuf {
    PathBuf::from(EXPORT_FILE)
}

fn default_poll_interval_ms() -> u64 {
    POLL_INTERVAL_MS
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "expenses",
///   "config_version": 1,
///   "notify": {
///     "endpoint": "https://api.telegram.org",
///     "chat_id": "-1001234567",
///     "timeout_secs": 10
///   },
///   "export_file": "expenses.csv",
///   "poll_interval_ms": 1000
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "expenses"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Notification channel settings
    #[serde(default)]
    notify: NotifySettings,

    /// Default export file (relative to the home directory or absolute)
    #[serde(default = "default_export_file")]
    export_file: PathBuf,

    /// How often to check the store for changes made by other processes
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            notify: NotifySettings::default(),
            export_file: default_export_file(),
            poll_interval_ms: POLL_INTERVAL_MS,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.poll_interval_ms > 0,
            "Invalid poll_interval_ms in config file: must be greater than zero"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("expenses_home");

        let config = Config::create(&home_dir, Some("https://bots.example.com/"), Some("-42"))
            .await
            .unwrap();

        assert!(config.secrets().is_dir());
        assert!(config.sqlite_path().is_file());
        assert!(config.config_path().is_file());
        assert_eq!(config.notify().endpoint(), "https://bots.example.com");
        assert_eq!(config.notify().chat_id(), Some("-42"));
        assert_eq!(config.notify().timeout(), Duration::from_secs(10));
        assert_eq!(config.export_path(), config.root().join("expenses.csv"));
        assert_eq!(config.poll_interval(), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("expenses_home");
        let _config = Config::create(&home_dir, None, None).await.unwrap();
        assert!(Config::create(&home_dir, None, None).await.is_err());
    }

    #[tokio::test]
    async fn test_config_load() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("expenses_home");
        let created = Config::create(&home_dir, None, Some("7")).await.unwrap();
        let loaded = Config::load(&home_dir).await.unwrap();
        assert_eq!(created.root(), loaded.root());
        assert_eq!(loaded.notify().chat_id(), Some("7"));
        assert_eq!(loaded.notify().endpoint(), DEFAULT_ENDPOINT);
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_notify_token_from_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path().join("h"), None, None)
            .await
            .unwrap();
        utils::write(config.notify_token_path(), "abc:123\n")
            .await
            .unwrap();
        // The environment variable is not set by the test harness.
        if std::env::var(NOTIFY_TOKEN_ENV).is_err() {
            assert_eq!(config.notify_token().await.unwrap().as_deref(), Some("abc:123"));
        }
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let mut original = ConfigFile::default();
        original.notify.chat_id = Some("-100".to_string());
        original.export_file = PathBuf::from("/tmp/out.csv");
        original.poll_interval_ms = 250;

        original.save(&config_path).await.unwrap();
        let loaded = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "expenses",
            "config_version": 1
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.notify, NotifySettings::default());
        assert_eq!(config.export_file, PathBuf::from(EXPORT_FILE));
        assert_eq!(config.poll_interval_ms, POLL_INTERVAL_MS);
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_load_zero_poll_interval() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "expenses",
            "config_version": 1,
            "poll_interval_ms": 0
        }"#;
        utils::write(&config_path, json).await.unwrap();
        assert!(ConfigFile::load(&config_path).await.is_err());
    }

    #[test]
    fn test_config_file_serialization_omits_missing_chat_id() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("chat_id"));
        assert!(json.contains("\"app_name\":\"expenses\""));
    }
}
