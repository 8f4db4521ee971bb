//! Persisted install record and install-location discovery.
//!
//! The managed application is installed by its own installer, so the launcher
//! never decides where it lives. [`PathRegistry`] remembers the location once it
//! is known (chosen by the user or found by auto-discovery) together with the
//! installed version, and is the only writer of the record file.
//!
//! Persistence is advisory: read failures fall back to defaults and write
//! failures are logged, never returned. Writes go to a temporary file that is
//! renamed over the record, so a crash mid-write leaves the previous record.

use crate::libs::config::AppConfig;
use crate::libs::data_storage::DataStorage;
use crate::libs::discovery::PlatformDirs;
use crate::libs::error::LauncherError;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_info, msg_warning};
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const RECORD_FILE_NAME: &str = "install.json";
pub const VERSION_FILE_NAME: &str = "version.txt";
pub const DEFAULT_VERSION: &str = "0.0.0";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InstallRecord {
    #[serde(rename = "installPath")]
    pub install_path: Option<PathBuf>,
    #[serde(rename = "gameVersion")]
    pub installed_version: String,
    #[serde(rename = "lastUpdateCheck")]
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl Default for InstallRecord {
    fn default() -> Self {
        Self {
            install_path: None,
            installed_version: DEFAULT_VERSION.to_string(),
            last_checked_at: None,
        }
    }
}

/// Read-only snapshot of the install state.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstallStatus {
    pub install_path: Option<PathBuf>,
    pub executable_path: Option<PathBuf>,
    pub installed: bool,
    pub version: Version,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub default_path: PathBuf,
}

#[derive(Debug)]
pub struct PathRegistry {
    record_path: PathBuf,
    record: InstallRecord,
    executable_name: String,
    candidates: Vec<PathBuf>,
    default_path: PathBuf,
}

impl PathRegistry {
    /// Opens the registry stored in `storage`, probing the running system's install roots.
    pub fn open(storage: &DataStorage, app: &AppConfig) -> Self {
        let record_path = storage.get_path(RECORD_FILE_NAME).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "data directory unavailable");
            storage.base_path().join(RECORD_FILE_NAME)
        });
        let dirs = PlatformDirs::detect();
        Self::with_candidates(record_path, &app.executable_name, dirs.candidates(&app.name), dirs.default_install_path())
    }

    /// Opens a registry with an explicit candidate list.
    pub fn with_candidates(record_path: impl Into<PathBuf>, executable_name: &str, candidates: Vec<PathBuf>, default_path: PathBuf) -> Self {
        let record_path = record_path.into();
        let record = Self::load(&record_path);
        Self {
            record_path,
            record,
            executable_name: executable_name.to_string(),
            candidates,
            default_path,
        }
    }

    fn load(record_path: &Path) -> InstallRecord {
        if !record_path.exists() {
            return InstallRecord::default();
        }

        let parsed = fs::read_to_string(record_path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str::<InstallRecord>(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(record) => {
                tracing::info!(path = %record_path.display(), ?record, "loaded launcher record");
                record
            }
            Err(message) => {
                let err = LauncherError::ConfigRead {
                    path: record_path.to_path_buf(),
                    message,
                };
                tracing::error!(error = %err, "launcher record unreadable");
                msg_warning!(err.user_message());
                InstallRecord::default()
            }
        }
    }

    fn save(&self) {
        if let Err(err) = self.write_record() {
            tracing::error!(error = %err, "launcher record not saved");
            msg_warning!(err.user_message());
        }
    }

    fn write_record(&self) -> Result<(), LauncherError> {
        let write_err = |message: String| LauncherError::ConfigWrite {
            path: self.record_path.clone(),
            message,
        };

        let content = serde_json::to_string_pretty(&self.record).map_err(|e| write_err(e.to_string()))?;
        if let Some(parent) = self.record_path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        let staging = self.record_path.with_extension("json.tmp");
        fs::write(&staging, content).map_err(|e| write_err(e.to_string()))?;
        fs::rename(&staging, &self.record_path).map_err(|e| write_err(e.to_string()))?;
        tracing::debug!(path = %self.record_path.display(), "saved launcher record");
        Ok(())
    }

    pub fn record(&self) -> &InstallRecord {
        &self.record
    }

    pub fn install_path(&self) -> Option<&Path> {
        self.record.install_path.as_deref()
    }

    pub fn set_install_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        tracing::info!(path = %path.display(), "updated game install path");
        self.record.install_path = Some(path);
        self.save();
    }

    pub fn executable_path(&self) -> Option<PathBuf> {
        self.install_path().map(|dir| dir.join(&self.executable_name))
    }

    pub fn is_installed(&self) -> bool {
        let installed = self.executable_path().is_some_and(|exe| exe.is_file());
        tracing::debug!(installed, "game installed check");
        installed
    }

    /// Installed version: the marker next to the executable, then the cached record value, then `0.0.0`.
    pub fn version(&self) -> Version {
        if let Some(marker) = self.install_path().map(|dir| dir.join(VERSION_FILE_NAME)) {
            match fs::read_to_string(&marker) {
                Ok(content) => match Version::parse(content.trim()) {
                    Ok(version) => return version,
                    Err(e) => tracing::warn!(path = %marker.display(), error = %e, "invalid version marker"),
                },
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    tracing::warn!(path = %marker.display(), error = %e, "version marker unreadable")
                }
                Err(_) => {}
            }
        }

        Version::parse(&self.record.installed_version).unwrap_or_else(|_| Version::new(0, 0, 0))
    }

    /// Records `version` next to the executable and in the record.
    ///
    /// Does nothing but log when no install path is known.
    pub fn set_version(&mut self, version: &Version) {
        let Some(dir) = self.install_path().map(Path::to_path_buf) else {
            tracing::error!(%version, "cannot set game version without an install path");
            msg_warning!(Message::VersionNotRecordedNoPath);
            return;
        };

        let marker = dir.join(VERSION_FILE_NAME);
        if let Err(e) = fs::write(&marker, version.to_string()) {
            tracing::error!(path = %marker.display(), error = %e, "failed to write version marker");
        }

        self.record.installed_version = version.to_string();
        self.save();
        tracing::info!(%version, path = %marker.display(), "updated game version");
        msg_debug!(Message::VersionRecorded(version.to_string()));
    }

    pub fn touch_last_check(&mut self) {
        self.record.last_checked_at = Some(Utc::now());
        self.save();
    }

    /// Probes the candidate roots in order and persists the first one holding the executable.
    ///
    /// Leaves the record untouched when nothing is found.
    pub fn auto_detect(&mut self) -> Option<PathBuf> {
        tracing::info!("attempting to auto-detect game installation location");

        let found = self
            .candidates
            .iter()
            .find(|dir| {
                let exe = dir.join(&self.executable_name);
                tracing::debug!(path = %exe.display(), "checking for game");
                exe.is_file()
            })
            .cloned();

        match &found {
            Some(dir) => {
                msg_info!(Message::AutoDetectFound(dir.display().to_string()));
                self.set_install_path(dir.clone());
            }
            None => {
                tracing::warn!("could not auto-detect game installation location");
                msg_warning!(Message::AutoDetectFailed);
            }
        }
        found
    }

    pub fn default_path(&self) -> &Path {
        &self.default_path
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Forgets the install path and resets the version.
    pub fn clear(&mut self) {
        self.record.install_path = None;
        self.record.installed_version = DEFAULT_VERSION.to_string();
        self.save();
        tracing::info!("cleared game configuration");
    }

    pub fn status(&self) -> InstallStatus {
        InstallStatus {
            install_path: self.record.install_path.clone(),
            executable_path: self.executable_path(),
            installed: self.is_installed(),
            version: self.version(),
            last_checked_at: self.record.last_checked_at,
            default_path: self.default_path.clone(),
        }
    }
}
