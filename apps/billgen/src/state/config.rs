//! # Application Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BILLGEN_DB_PATH=/data/billgen.db                                   │
//! │     BILLGEN_CURRENCY_SYMBOL=Rs.                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/billgen/billgen.toml (Linux)                             │
//! │     ~/Library/Application Support/com.billgen.billgen/billgen.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ₹, HTML receipts in the current directory                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [storage]
//! database_path = "/home/me/billgen.db"
//!
//! [export]
//! directory = "./receipts"
//! format = "html"        # html | text
//!
//! [display]
//! currency_symbol = "₹"
//!
//! [shop]
//! name = "Shop A"
//! location = "City"
//! ```

use billgen_core::ShopDetails;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::receipt::ExportFormat;

const CONFIG_FILE: &str = "billgen.toml";
const DATABASE_FILE: &str = "billgen.db";

// =============================================================================
// Errors
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Where the bill history lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite file. Default: `billgen.db` in the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// Where and how receipts are exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_export_directory")]
    pub directory: PathBuf,

    #[serde(default)]
    pub format: ExportFormat,
}

fn default_export_directory() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            directory: default_export_directory(),
            format: ExportFormat::default(),
        }
    }
}

/// Presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            currency_symbol: default_currency_symbol(),
        }
    }
}

/// Shop details pre-filled into every new draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopDefaults {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

// =============================================================================
// App Config
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub export: ExportSettings,

    #[serde(default)]
    pub display: DisplaySettings,

    #[serde(default)]
    pub shop: ShopDefaults,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`billgen.toml`)
    /// 3. Environment variables
    ///
    /// An explicit path that doesn't exist is an error; a missing default
    /// file is not.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let explicit = config_path.is_some();
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else if explicit {
                return Err(ConfigError::Invalid(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.display.currency_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "display.currency_symbol must not be empty".into(),
            ));
        }

        if self.export.directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("export.directory must not be empty".into()));
        }

        if let Some(ref path) = self.storage.database_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "storage.database_path must not be empty".into(),
                ));
            }
        }

        Ok(())
    }

    /// Applies `BILLGEN_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("BILLGEN_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(dir) = var("BILLGEN_EXPORT_DIR") {
            self.export.directory = PathBuf::from(dir);
        }

        if let Some(format) = var("BILLGEN_EXPORT_FORMAT") {
            match format.parse() {
                Ok(parsed) => self.export.format = parsed,
                Err(_) => warn!(format = %format, "Unknown export format in environment"),
            }
        }

        if let Some(symbol) = var("BILLGEN_CURRENCY_SYMBOL") {
            self.display.currency_symbol = symbol;
        }

        if let Some(name) = var("BILLGEN_SHOP_NAME") {
            self.shop.name = Some(name);
        }

        if let Some(location) = var("BILLGEN_SHOP_LOCATION") {
            self.shop.location = Some(location);
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "billgen", "billgen")
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Resolves the history database path.
    ///
    /// Without an explicit path, uses the platform data directory and
    /// creates it if needed.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(ref path) = self.storage.database_path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs().ok_or_else(|| {
            ConfigError::Invalid("could not determine app data directory".into())
        })?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join(DATABASE_FILE))
    }

    /// Shop details a new draft starts with.
    pub fn default_shop(&self) -> ShopDetails {
        let mut shop = ShopDetails::new(
            self.shop.name.clone().unwrap_or_default(),
            self.shop.location.clone().unwrap_or_default(),
        );
        if let Some(ref phone) = self.shop.phone {
            shop = shop.with_phone(phone.clone());
        }
        if let Some(ref email) = self.shop.email {
            shop = shop.with_email(email.clone());
        }
        shop
    }

    /// Pretty TOML of the effective configuration.
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
