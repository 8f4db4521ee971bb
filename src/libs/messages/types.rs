#[derive(Debug, Clone)]
pub enum Message {
    // === SELF-UPDATE MESSAGES ===
    CheckingSelfUpdate,
    SelfUpdateAvailable(String), // version
    DownloadingSelfUpdate(Option<u8>),
    SelfUpdateApplied(String), // version
    SelfUpdateFailed(String),  // error
    SelfUpdateDisabled,
    RestartingLauncher,
    RestartFailed(String), // error

    // === APPLICATION UPDATE MESSAGES ===
    CheckingAppUpdate,
    UpdateAvailable {
        current: String,
        latest: String,
    },
    DownloadingUpdate(Option<u8>),
    DownloadedUpdate {
        file_name: String,
        size: String,
    },
    InstallingUpdate,
    UpdateInstalled(String), // version
    AppUpToDate(String),     // version
    UpdateCheckFailed(String),
    UpdateFailed(String),
    InstallerCleanupFailed(String),
    ReleaseNotesHeader(String), // version

    // === LAUNCH MESSAGES ===
    LaunchingApp,
    AppLaunched(u32), // PID
    LauncherNotReady(String),
    ReinstallGuidance,
    ElevationGuidance,
    SecuritySoftwareGuidance,
    SpawnFailed(String),
    SpawnTimedOut(u64), // milliseconds
    ConfirmLaunch,
    ConfirmRetry,
    FlowInterrupted,

    // === INSTALL PATH MESSAGES ===
    InstallPathSet(String),
    InstallPathWithoutExecutable(String),
    AutoDetectFound(String),
    AutoDetectFailed,
    RecordCleared,
    RecordReadFailed(String),
    RecordWriteFailed(String),
    VersionNotRecordedNoPath,
    VersionRecorded(String),
    PromptInstallPath,
    StatusTitle,

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigParseError(String),
    PromptCatalogOwner,
    PromptCatalogRepo,
    PromptAppName,
    PromptExecutableName,
    PromptAutoLaunch,

    // === LAUNCHER SELF-UPDATE COMMAND MESSAGES ===
    NoUpdateRequired,
    UpdateCompleted {
        app_name: String,
        version: String,
    },
    UpdateBinaryNotFoundInArchive,

    // === SYSTEM MESSAGES ===
    FailedToGetCurrentExecutable,
    ReceivedCtrlC,
    CtrlCListenFailed(String),
}
