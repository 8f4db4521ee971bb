//! Configuration management for the ferry launcher.
//!
//! The configuration tells the launcher where the release catalog lives, what
//! the managed application looks like on disk, and how the interactive flow
//! behaves. It is stored as pretty-printed JSON in the user-scoped data
//! directory resolved by [`DataStorage`].
//!
//! ## Configuration Structure
//!
//! - **Catalog Config**: release catalog endpoint, repository and channel marker
//! - **App Config**: installer asset filter, silent flags, executable and launch contract
//! - **Launcher Config**: self-update switch and flow timing
//!
//! Every section is optional; a missing section (or a missing file) means
//! defaults, so a fresh install works without running `ferry init`.
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use ferry::libs::config::Config;
//!
//! let config = Config::read()?;
//! let catalog = config.catalog();
//! println!("Releases from {}/{}", catalog.owner, catalog.repo);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use super::metadata::{user_agent, APP_METADATA_OWNER, APP_METADATA_REPO};
use crate::libs::messages::Message;
use crate::msg_error_anyhow;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

/// Configuration file name used for storing launcher settings.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Release catalog connection settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the catalog API, without trailing slash.
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    /// Tags containing this marker belong to the launcher's own release channel.
    pub self_channel_marker: String,
    pub user_agent: String,
    pub check_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

/// What the managed application looks like: how it is published, installed and started.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory name the installer creates under a program root.
    pub name: String,
    pub executable_name: String,
    /// Installer assets must contain this marker...
    pub asset_marker: String,
    /// ...and end with this extension.
    pub asset_extension: String,
    /// Silent-mode flags passed to the installer.
    pub installer_args: Vec<String>,
    /// Flag telling the application it was started by the launcher.
    pub launch_flag: String,
    pub launch_env_key: String,
    pub launch_env_value: String,
    /// How long a spawn may take before it is reported as failed.
    pub spawn_grace_ms: u64,
}

/// Interactive flow behaviour.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LauncherConfig {
    pub self_update: bool,
    /// Delay before the first check so the presentation can settle.
    pub settle_delay_ms: u64,
    /// Launch without asking once the application is up to date.
    pub auto_launch: bool,
}

/// Root configuration object.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<AppConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub launcher: Option<LauncherConfig>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            api_url: "https://api.github.com".to_string(),
            owner: APP_METADATA_OWNER.to_string(),
            repo: APP_METADATA_REPO.to_string(),
            self_channel_marker: "launcher".to_string(),
            user_agent: user_agent(),
            check_timeout_secs: 30,
            download_timeout_secs: 300,
        }
    }
}

impl CatalogConfig {
    pub fn releases_url(&self) -> String {
        format!("{}/repos/{}/{}/releases", self.api_url.trim_end_matches('/'), self.owner, self.repo)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let executable_name = if cfg!(windows) { "Attrition.exe" } else { "Attrition" };
        AppConfig {
            name: "Attrition".to_string(),
            executable_name: executable_name.to_string(),
            asset_marker: "Setup".to_string(),
            asset_extension: ".exe".to_string(),
            installer_args: vec!["/S".to_string(), "/currentuser".to_string()],
            launch_flag: "--launched-by-launcher".to_string(),
            launch_env_key: "ATTRITION_LAUNCHED_BY_LAUNCHER".to_string(),
            launch_env_value: "true".to_string(),
            spawn_grace_ms: 10_000,
        }
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        LauncherConfig {
            self_update: true,
            settle_delay_ms: 1_000,
            auto_launch: false,
        }
    }
}

impl Config {
    /// Reads the configuration from the default data directory.
    ///
    /// A missing file yields the default configuration. A file that exists but
    /// cannot be parsed is an error, so a typo never silently resets settings.
    pub fn read() -> Result<Config> {
        Self::read_from(&DataStorage::new())
    }

    pub fn read_from(storage: &DataStorage) -> Result<Config> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str).map_err(|e| msg_error_anyhow!(Message::ConfigParseError(e.to_string())))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&DataStorage::new())
    }

    pub fn save_to(&self, storage: &DataStorage) -> Result<()> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        let config_str = serde_json::to_string_pretty(&self)?;
        fs::write(config_file_path, config_str)?;
        Ok(())
    }

    pub fn catalog(&self) -> CatalogConfig {
        self.catalog.clone().unwrap_or_default()
    }

    pub fn app(&self) -> AppConfig {
        self.app.clone().unwrap_or_default()
    }

    pub fn launcher(&self) -> LauncherConfig {
        self.launcher.clone().unwrap_or_default()
    }

    /// Interactive configuration wizard, pre-filled with the current values.
    pub fn init() -> Result<Self> {
        let mut config = Config::read()?;
        let theme = ColorfulTheme::default();

        let mut catalog = config.catalog();
        catalog.owner = Input::with_theme(&theme)
            .with_prompt(Message::PromptCatalogOwner.to_string())
            .default(catalog.owner)
            .interact_text()?;
        catalog.repo = Input::with_theme(&theme)
            .with_prompt(Message::PromptCatalogRepo.to_string())
            .default(catalog.repo)
            .interact_text()?;

        let mut app = config.app();
        app.name = Input::with_theme(&theme)
            .with_prompt(Message::PromptAppName.to_string())
            .default(app.name)
            .interact_text()?;
        app.executable_name = Input::with_theme(&theme)
            .with_prompt(Message::PromptExecutableName.to_string())
            .default(app.executable_name)
            .interact_text()?;

        let mut launcher = config.launcher();
        launcher.auto_launch = Confirm::with_theme(&theme)
            .with_prompt(Message::PromptAutoLaunch.to_string())
            .default(launcher.auto_launch)
            .interact()?;

        config.catalog = Some(catalog);
        config.app = Some(app);
        config.launcher = Some(launcher);
        Ok(config)
    }
}
