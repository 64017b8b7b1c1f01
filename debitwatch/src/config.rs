use anyhow::{bail, Result};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_QUERY: &str =
    "from:service@ac.rakuten-bank.co.jp -label:取得済み \"◆デビットカードご利用通知メール◆\"";

const DEFAULT_CONFIG: &str = r#"
[gmail]
# Search run against the mailbox. Keep the -label: clause in sync with
# processed_label_id so labelled messages are not picked up twice.
query = 'from:service@ac.rakuten-bank.co.jp -label:取得済み "◆デビットカードご利用通知メール◆"'
# Run `debitwatch labels` to find the id of your label
# processed_label_id = "Label_0000000000000000000"
client_secret_path = "client_secret.json"
token_path = "gmail-token.json"

[notification]
# recipient = "you@example.com"
sender = "me"
summary_subject = "本日の取引概要"

[database]
# path = "/var/lib/debitwatch/transactions.sqlite"

[pipeline]
# "abort" stops the run at the first unreadable notification, "skip" leaves it unlabelled
on_invalid_record = "abort"
# amount_pattern = '口座引落分：([0-9]+)円'
"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub gmail: GmailConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GmailConfig {
    pub query: String,
    pub processed_label_id: String,
    pub client_secret_path: PathBuf,
    pub token_path: PathBuf,
    pub user_id: String,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            processed_label_id: String::new(),
            client_secret_path: PathBuf::from("client_secret.json"),
            token_path: PathBuf::from("gmail-token.json"),
            user_id: "me".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NotificationConfig {
    pub recipient: Option<String>,
    pub sender: String,
    pub summary_subject: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            recipient: None,
            sender: "me".to_string(),
            summary_subject: "本日の取引概要".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub on_invalid_record: InvalidRecordPolicy,
    pub amount_pattern: Option<String>,
}

/// What a run does with a notification it cannot turn into a transaction
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRecordPolicy {
    #[default]
    Abort,
    Skip,
}

impl AppConfig {
    /// Loads `path`, or the default location when `None`. Only the default
    /// location is created with a commented template when missing.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let config_path = get_config_path();
                write_default_config(&config_path)?;
                config_path
            }
        };

        if !config_path.exists() {
            return Err(ConfigError::Message(format!(
                "Config file not found at {:?}",
                config_path
            )));
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .add_source(
                Environment::with_prefix("DEBITWATCH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut config: AppConfig = builder.try_deserialize()?;
        if let Some(base) = config_path.parent() {
            config.resolve_paths(base);
        }

        Ok((config, config_path))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Makes relative file paths relative to the directory of the config file
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        resolve(&mut self.gmail.client_secret_path);
        resolve(&mut self.gmail.token_path);
        if let Some(path) = self.database.path.as_mut() {
            resolve(path);
        }
    }

    pub fn recipient(&self) -> Result<&str> {
        match self.notification.recipient.as_deref() {
            Some(recipient) if !recipient.trim().is_empty() => Ok(recipient),
            _ => bail!("notification.recipient is not configured"),
        }
    }

    pub fn processed_label_id(&self) -> Result<&str> {
        let label_id = self.gmail.processed_label_id.trim();
        if label_id.is_empty() {
            bail!("gmail.processed_label_id is not configured; run `debitwatch labels` to find it");
        }
        Ok(label_id)
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;
        Ok(data_dir.join("debitwatch").join("transactions.sqlite"))
    }
}

fn write_default_config(config_path: &Path) -> Result<(), ConfigError> {
    if config_path.exists() {
        return Ok(());
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::Message(format!("Failed to create config directory: {e}"))
        })?;
    }

    std::fs::write(config_path, DEFAULT_CONFIG)
        .map_err(|e| ConfigError::Message(format!("Failed to write default config: {e}")))
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("debitwatch").join("config.toml")
    } else {
        PathBuf::from("config.toml")
    }
}
