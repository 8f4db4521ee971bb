//! Error taxonomy for the update and launch flow.
//!
//! Every fallible operation of the launcher core returns a [`LauncherError`].
//! Errors fall into four families:
//!
//! - **Resolution**: catalog unreachable, malformed, empty, or missing an installer asset
//! - **Download**: transport failures and local write failures
//! - **Install / Launch**: process invocation failures, classified by OS error
//! - **Persistence**: record and configuration I/O, always absorbed by the caller
//!
//! [`LauncherError::user_message`] turns an error into the actionable text shown
//! to the user, so raw OS error strings never reach the status line.

use crate::libs::messages::Message;
use crate::libs::orchestrator::OrchestratorState;
use std::path::PathBuf;
use thiserror::Error;

pub type LauncherResult<T> = std::result::Result<T, LauncherError>;

#[derive(Debug, Error)]
pub enum LauncherError {
    // Resolution
    #[error("Release catalog unreachable: {message}")]
    Network { message: String },

    #[error("Unexpected release catalog response: {message}")]
    CatalogFormat { message: String },

    #[error("No application release found in the catalog")]
    NoReleaseFound,

    #[error("Release v{version} has no asset matching '*{marker}*{extension}'")]
    AssetNotFound { version: String, marker: String, extension: String },

    // Download
    #[error("Download failed: {message}")]
    Transport { message: String },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Install
    #[error("Downloaded installer not found at {}", .0.display())]
    InstallerNotFound(PathBuf),

    #[error("Failed to start installer {}: {source}", .path.display())]
    InstallerLaunch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Installation failed with exit code: {}", exit_code_label(.code))]
    InstallerExit { code: Option<i32> },

    // Launch
    #[error("Game executable not found{}", .path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    ExecutableNotFound { path: Option<PathBuf> },

    #[error("Permission denied starting {}", .path.display())]
    Permission { path: PathBuf },

    #[error("Operation not permitted starting {}", .path.display())]
    OperationNotPermitted { path: PathBuf },

    #[error("Failed to start {} (os error {}): {message}", .path.display(), exit_code_label(.code))]
    Spawn {
        path: PathBuf,
        code: Option<i32>,
        message: String,
    },

    #[error("{} did not start within {timeout_ms} ms", .path.display())]
    SpawnTimeout { path: PathBuf, timeout_ms: u64 },

    // Persistence
    #[error("Failed to read {}: {message}", .path.display())]
    ConfigRead { path: PathBuf, message: String },

    #[error("Failed to write {}: {message}", .path.display())]
    ConfigWrite { path: PathBuf, message: String },

    // Flow
    #[error("Launcher self-update failed: {message}")]
    SelfUpdate { message: String },

    #[error("Cannot launch while {state}")]
    NotReady { state: OrchestratorState },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

impl LauncherError {
    /// Message shown to the user when this error ends the flow.
    pub fn user_message(&self) -> Message {
        match self {
            LauncherError::Network { .. }
            | LauncherError::CatalogFormat { .. }
            | LauncherError::NoReleaseFound
            | LauncherError::AssetNotFound { .. } => Message::UpdateCheckFailed(self.to_string()),
            LauncherError::Transport { .. }
            | LauncherError::Write { .. }
            | LauncherError::InstallerNotFound(_)
            | LauncherError::InstallerLaunch { .. }
            | LauncherError::InstallerExit { .. } => Message::UpdateFailed(self.to_string()),
            LauncherError::ExecutableNotFound { .. } => Message::ReinstallGuidance,
            LauncherError::Permission { .. } => Message::ElevationGuidance,
            LauncherError::OperationNotPermitted { .. } => Message::SecuritySoftwareGuidance,
            LauncherError::Spawn { message, .. } => Message::SpawnFailed(message.clone()),
            LauncherError::SpawnTimeout { timeout_ms, .. } => Message::SpawnTimedOut(*timeout_ms),
            LauncherError::ConfigRead { .. } => Message::RecordReadFailed(self.to_string()),
            LauncherError::ConfigWrite { .. } => Message::RecordWriteFailed(self.to_string()),
            LauncherError::SelfUpdate { message } => Message::SelfUpdateFailed(message.clone()),
            LauncherError::NotReady { state } => Message::LauncherNotReady(state.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_errors_map_to_guidance() {
        let not_found = LauncherError::ExecutableNotFound { path: None };
        assert_eq!(not_found.user_message().to_string(), Message::ReinstallGuidance.to_string());

        let denied = LauncherError::Permission { path: PathBuf::from("game") };
        assert!(denied.user_message().to_string().contains("administrator"));

        let eperm = LauncherError::OperationNotPermitted { path: PathBuf::from("game") };
        assert!(eperm.user_message().to_string().contains("antivirus"));
    }

    #[test]
    fn installer_exit_without_code_is_labelled() {
        let err = LauncherError::InstallerExit { code: None };
        assert_eq!(err.to_string(), "Installation failed with exit code: none");
        let err = LauncherError::InstallerExit { code: Some(2) };
        assert_eq!(err.to_string(), "Installation failed with exit code: 2");
    }
}
