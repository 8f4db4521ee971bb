use crate::libs::error::LauncherError;
use std::env::consts::OS;
use std::env::var;
use std::fs;
use std::path::{Path, PathBuf};

pub const VENDOR_NAME: &str = "ferry";
pub const APP_NAME: &str = "ferry";

/// Environment variable that relocates every file the launcher persists.
pub const HOME_OVERRIDE_VAR: &str = "FERRY_HOME";

/// User-scoped directory holding the launcher's configuration and install record.
#[derive(Debug, Clone)]
pub struct DataStorage {
    base_path: PathBuf,
}

impl DataStorage {
    pub fn new() -> Self {
        if let Ok(home) = var(HOME_OVERRIDE_VAR) {
            return Self::with_base(home);
        }
        let base_path = match OS {
            "windows" => var("LOCALAPPDATA").unwrap_or_else(|_| ".".into()),
            "macos" => var("HOME").unwrap_or_else(|_| ".".into()) + "/Library/Application Support",
            _ => var("HOME").unwrap_or_else(|_| ".".into()) + "/.local/share",
        };
        let base_path = Path::new(&base_path).join(VENDOR_NAME).join(APP_NAME);

        Self { base_path }
    }

    pub fn with_base(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn get_path(&self, file_name: &str) -> Result<PathBuf, LauncherError> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path).map_err(|e| LauncherError::ConfigWrite {
                path: self.base_path.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(self.base_path.join(file_name))
    }
}

impl Default for DataStorage {
    fn default() -> Self {
        Self::new()
    }
}
