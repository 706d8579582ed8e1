use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StockError};
use crate::evaluate::{DEFAULT_ITEM_NAME_COLUMN_INDEX, DEFAULT_MINIMUM_RATIO, LabelColumn};
use crate::io::mail::SmtpConfig;

/// Cron expression (with seconds) for Friday 23:55.
pub const DEFAULT_SCHEDULE: &str = "0 55 23 * * Fri";

/// Contents of `settings.json`.
///
/// Required keys are kept optional here so a missing key is reported as
/// [`StockError::MissingSetting`] rather than a JSON error; use the
/// accessor methods to read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub recipient_email: Option<String>,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub sender_password: Option<String>,
    #[serde(default = "default_item_name_column_index")]
    pub item_name_column_index: usize,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default = "default_minimum_ratio")]
    pub minimum_ratio: f64,
    #[serde(default)]
    pub columns: ColumnRoles,
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Header names for each semantic column role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    /// Header of the item label column. When unset the positional
    /// `item_name_column_index` is used.
    #[serde(default)]
    pub item_label: Option<String>,
    #[serde(default = "default_minimum_column")]
    pub minimum: String,
    #[serde(default = "default_required_column")]
    pub required: String,
    #[serde(default = "default_shortage_column")]
    pub shortage: String,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            item_label: None,
            minimum: default_minimum_column(),
            required: default_required_column(),
            shortage: default_shortage_column(),
        }
    }
}

/// Cron expressions for the two recurring jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSettings {
    #[serde(default = "default_schedule")]
    pub minimum_stock: String,
    #[serde(default = "default_schedule")]
    pub shortage: String,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            minimum_stock: default_schedule(),
            shortage: default_schedule(),
        }
    }
}

fn default_item_name_column_index() -> usize {
    DEFAULT_ITEM_NAME_COLUMN_INDEX
}

fn default_sheet_name() -> String {
    "Minimum Inventory".to_string()
}

fn default_minimum_ratio() -> f64 {
    DEFAULT_MINIMUM_RATIO
}

fn default_token_file() -> PathBuf {
    PathBuf::from("token.json")
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_minimum_column() -> String {
    "Minimum".to_string()
}

fn default_required_column() -> String {
    "Required".to_string()
}

fn default_shortage_column() -> String {
    "Shortage".to_string()
}

fn default_schedule() -> String {
    DEFAULT_SCHEDULE.to_string()
}

impl Settings {
    /// Reads and parses the settings file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StockError::MissingSettings(path.to_path_buf()));
        }
        let data = fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn spreadsheet_id(&self) -> Result<&str> {
        required(&self.spreadsheet_id, "spreadsheet_id")
    }

    pub fn recipient_email(&self) -> Result<&str> {
        required(&self.recipient_email, "recipient_email")
    }

    pub fn sender_email(&self) -> Result<&str> {
        required(&self.sender_email, "sender_email")
    }

    pub fn sender_password(&self) -> Result<&str> {
        required(&self.sender_password, "sender_password")
    }

    /// Checks every required key, reporting the first one missing.
    pub fn validate(&self) -> Result<()> {
        self.spreadsheet_id()?;
        self.recipient_email()?;
        self.sender_email()?;
        self.sender_password()?;
        Ok(())
    }

    /// Label column derived from the role mapping or the positional index.
    pub fn label_column(&self) -> LabelColumn {
        match &self.columns.item_label {
            Some(name) => LabelColumn::Named(name.clone()),
            None => LabelColumn::Index(self.item_name_column_index),
        }
    }

    pub fn smtp(&self) -> Result<SmtpConfig> {
        Ok(SmtpConfig {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            sender: self.sender_email()?.to_string(),
            password: self.sender_password()?.to_string(),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn required<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str> {
    match value.as_deref() {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(StockError::MissingSetting(key)),
    }
}
