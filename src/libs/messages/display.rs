//! Display implementation for ferry application messages.
//!
//! Every piece of user-facing text is defined here, in one `match`, so that
//! status lines, prompts and error guidance stay consistent between the
//! interactive flow and the individual commands.
//!
//! ## Message Categories
//!
//! - **Self-update Messages**: launcher binary check, download and restart
//! - **Application Update Messages**: catalog resolution, download, install
//! - **Launch Messages**: handoff to the managed application and spawn guidance
//! - **Install Path Messages**: persisted record, auto-discovery, manual selection
//! - **Configuration Messages**: wizard prompts and persistence
//!
//! Launch failures never surface raw OS text; they map to one of the three
//! guidance messages (reinstall, elevation, security software).

use super::types::Message;
use std::fmt;

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            // === SELF-UPDATE MESSAGES ===
            Message::CheckingSelfUpdate => "Checking for launcher updates...".to_string(),
            Message::SelfUpdateAvailable(version) => format!("Launcher update available: v{}", version),
            Message::DownloadingSelfUpdate(Some(percent)) => format!("Downloading launcher update... {}%", percent),
            Message::DownloadingSelfUpdate(None) => "Downloading launcher update...".to_string(),
            Message::SelfUpdateApplied(version) => format!("Launcher updated to v{}. Restarting...", version),
            Message::SelfUpdateFailed(e) => format!("Launcher self-update failed, continuing without it: {}", e),
            Message::SelfUpdateDisabled => "Launcher self-update is disabled".to_string(),
            Message::RestartingLauncher => "Restarting launcher...".to_string(),
            Message::RestartFailed(e) => format!("Failed to restart the updated launcher: {}", e),

            // === APPLICATION UPDATE MESSAGES ===
            Message::CheckingAppUpdate => "Checking for updates...".to_string(),
            Message::UpdateAvailable { current, latest } => {
                format!("Update available: {} (installed: {})", latest, current)
            }
            Message::DownloadingUpdate(Some(percent)) => format!("Downloading update... {}%", percent),
            Message::DownloadingUpdate(None) => "Downloading update...".to_string(),
            Message::DownloadedUpdate { file_name, size } => format!("Downloaded {} ({})", file_name, size),
            Message::InstallingUpdate => "Installing update...".to_string(),
            Message::UpdateInstalled(version) => format!("Update {} installed successfully!", version),
            Message::AppUpToDate(version) => format!("Game is up to date ({})", version),
            Message::UpdateCheckFailed(e) => format!("Update check failed: {}", e),
            Message::UpdateFailed(e) => format!("Update failed: {}", e),
            Message::InstallerCleanupFailed(e) => format!("Failed to clean up downloaded installer: {}", e),
            Message::ReleaseNotesHeader(version) => format!("What's new in {}:", version),

            // === LAUNCH MESSAGES ===
            Message::LaunchingApp => "Launching game...".to_string(),
            Message::AppLaunched(pid) => format!("Game started successfully! (PID: {})", pid),
            Message::LauncherNotReady(state) => format!("Cannot launch while {}. Check for updates first.", state),
            Message::ReinstallGuidance => "Game executable not found. Please try reinstalling.".to_string(),
            Message::ElevationGuidance => "Permission denied. Try running the launcher as administrator.".to_string(),
            Message::SecuritySoftwareGuidance => "Permission error. Check antivirus settings and try again.".to_string(),
            Message::SpawnFailed(e) => format!("Failed to start game: {}", e),
            Message::SpawnTimedOut(ms) if ms % 1000 == 0 => format!("Game did not start within {} seconds", ms / 1000),
            Message::SpawnTimedOut(ms) => format!("Game did not start within {} ms", ms),
            Message::ConfirmLaunch => "Launch now?".to_string(),
            Message::ConfirmRetry => "Retry?".to_string(),
            Message::FlowInterrupted => "Interrupted, stopping launcher".to_string(),

            // === INSTALL PATH MESSAGES ===
            Message::InstallPathSet(path) => format!("Game install path set to {}", path),
            Message::InstallPathWithoutExecutable(path) => format!("No game executable found in {}", path),
            Message::AutoDetectFound(path) => format!("Game found at: {}", path),
            Message::AutoDetectFailed => "Could not auto-detect game installation location".to_string(),
            Message::RecordCleared => "Cleared game configuration".to_string(),
            Message::RecordReadFailed(e) => format!("Failed to load launcher record, using defaults: {}", e),
            Message::RecordWriteFailed(e) => format!("Failed to save launcher record: {}", e),
            Message::VersionNotRecordedNoPath => "Cannot set game version - no game path configured".to_string(),
            Message::VersionRecorded(version) => format!("Recorded game version {}", version),
            Message::PromptInstallPath => "Game install directory".to_string(),
            Message::StatusTitle => "Game installation".to_string(),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigParseError(e) => format!("Failed to parse configuration: {}", e),
            Message::PromptCatalogOwner => "Release catalog owner".to_string(),
            Message::PromptCatalogRepo => "Release catalog repository".to_string(),
            Message::PromptAppName => "Game install directory name".to_string(),
            Message::PromptExecutableName => "Game executable name".to_string(),
            Message::PromptAutoLaunch => "Launch the game automatically when it is up to date?".to_string(),

            // === LAUNCHER SELF-UPDATE COMMAND MESSAGES ===
            Message::NoUpdateRequired => "No update required. You are using the latest version!".to_string(),
            Message::UpdateCompleted { app_name, version } => {
                format!("The {} application has been successfully updated to version {}!", app_name, version)
            }
            Message::UpdateBinaryNotFoundInArchive => "Binary not found in the release archive.".to_string(),

            // === SYSTEM MESSAGES ===
            Message::FailedToGetCurrentExecutable => "Failed to get current executable path".to_string(),
            Message::ReceivedCtrlC => "Received Ctrl+C".to_string(),
            Message::CtrlCListenFailed(e) => format!("Failed to listen for Ctrl+C: {}", e),
        };
        write!(f, "{}", s)
    }
}
