//! Update-and-launch flow.
//!
//! A [`Session`] owns everything one launcher run needs: the current
//! [`OrchestratorState`], the install registry and the components that check,
//! download, install and launch. It drives the flow
//!
//! ```text
//! Idle ─▶ CheckingSelfUpdate ─▶ [DownloadingSelfUpdate ─▶ restart]
//!              │                         │ (failure degrades)
//!              ▼                         ▼
//!        CheckingAppUpdate ─▶ DownloadingAppUpdate ─▶ InstallingAppUpdate
//!              │                                              │
//!              └──────────────────▶ UpToDate ◀────────────────┘
//!                                      │ launch()
//!                                      ▼
//!                                 LaunchingApp ─▶ GameLaunched
//! ```
//!
//! and reports every transition on an event channel. Any failure outside the
//! self-update branch ends in `Error`, which only a new `check_for_updates`
//! call leaves.

use crate::libs::config::Config;
use crate::libs::data_storage::DataStorage;
use crate::libs::download::{format_bytes, DownloadManager, DownloadProgress};
use crate::libs::error::{LauncherError, LauncherResult};
use crate::libs::installer::InstallInvoker;
use crate::libs::launcher::{LaunchedProcess, ProcessLauncher};
use crate::libs::messages::Message;
use crate::libs::registry::{InstallStatus, PathRegistry};
use crate::libs::release::{AssetFilter, Catalog, ReleaseInfo, ReleaseResolver};
use crate::libs::self_update::{DisabledSelfUpdater, GithubSelfUpdater, SelfUpdater};
use chrono::{DateTime, Utc};
use semver::Version;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OrchestratorState {
    Idle,
    CheckingSelfUpdate,
    DownloadingSelfUpdate,
    CheckingAppUpdate,
    DownloadingAppUpdate,
    InstallingAppUpdate,
    UpToDate,
    LaunchingApp,
    GameLaunched,
    Error,
}

impl OrchestratorState {
    /// Transition table. `Error` is reachable from everywhere.
    pub fn can_transition_to(self, next: OrchestratorState) -> bool {
        use OrchestratorState::*;
        matches!(
            (self, next),
            (_, Error)
                | (Idle, CheckingSelfUpdate)
                | (Idle, CheckingAppUpdate)
                | (CheckingSelfUpdate, DownloadingSelfUpdate)
                | (CheckingSelfUpdate, CheckingAppUpdate)
                | (DownloadingSelfUpdate, CheckingAppUpdate)
                | (CheckingAppUpdate, DownloadingAppUpdate)
                | (CheckingAppUpdate, UpToDate)
                | (DownloadingAppUpdate, InstallingAppUpdate)
                | (InstallingAppUpdate, UpToDate)
                | (UpToDate, LaunchingApp)
                | (UpToDate, CheckingAppUpdate)
                | (LaunchingApp, GameLaunched)
                | (Error, CheckingAppUpdate)
        )
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrchestratorState::Idle => "idle",
            OrchestratorState::CheckingSelfUpdate => "checking for launcher updates",
            OrchestratorState::DownloadingSelfUpdate => "downloading a launcher update",
            OrchestratorState::CheckingAppUpdate => "checking for updates",
            OrchestratorState::DownloadingAppUpdate => "downloading an update",
            OrchestratorState::InstallingAppUpdate => "installing an update",
            OrchestratorState::UpToDate => "up to date",
            OrchestratorState::LaunchingApp => "launching",
            OrchestratorState::GameLaunched => "the game is already running",
            OrchestratorState::Error => "in an error state",
        };
        write!(f, "{}", label)
    }
}

/// Release details attached to the event announcing an update.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContext {
    pub current_version: Version,
    pub latest_version: Version,
    pub release_notes: String,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&ReleaseInfo> for UpdateContext {
    fn from(info: &ReleaseInfo) -> Self {
        Self {
            current_version: info.current_version.clone(),
            latest_version: info.latest_version.clone(),
            release_notes: info.release_notes.clone(),
            file_name: info.file_name.clone(),
            file_size: info.file_size,
            published_at: info.published_at,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub status: OrchestratorState,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(flatten)]
    pub context: Option<UpdateContext>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LauncherEvent {
    Status(StatusEvent),
    /// Sent once the flow reaches `UpToDate`.
    Ready(bool),
}

pub type EventReceiver = mpsc::UnboundedReceiver<LauncherEvent>;

/// How `start` ended when it did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    /// The game is installed at this version and can be launched.
    UpToDate(Version),
    /// The launcher binary was replaced; start it and exit.
    Restart(PathBuf),
}

/// Read-only snapshot for the status view.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub state: OrchestratorState,
    #[serde(flatten)]
    pub install: InstallStatus,
}

/// Sends one status event; a closed receiver is not an error.
fn emit(events: &mpsc::UnboundedSender<LauncherEvent>, status: OrchestratorState, message: Message, progress: Option<u8>, context: Option<UpdateContext>) {
    let event = StatusEvent {
        status,
        message: message.to_string(),
        progress,
        context,
    };
    match event.progress {
        Some(progress) => tracing::debug!(status = ?event.status, progress, "progress"),
        None => tracing::info!(status = ?event.status, message = %event.message, "status"),
    }
    let _ = events.send(LauncherEvent::Status(event));
}

pub struct Session {
    state: OrchestratorState,
    registry: PathRegistry,
    resolver: ReleaseResolver,
    downloader: DownloadManager,
    installer: InstallInvoker,
    launcher: ProcessLauncher,
    self_updater: Box<dyn SelfUpdater>,
    settle_delay: Duration,
    events: mpsc::UnboundedSender<LauncherEvent>,
    pending: Option<ReleaseInfo>,
}

impl Session {
    pub fn new(
        config: &Config,
        registry: PathRegistry,
        downloader: DownloadManager,
        self_updater: Box<dyn SelfUpdater>,
    ) -> LauncherResult<(Self, EventReceiver)> {
        let app = config.app();
        let resolver = ReleaseResolver::new(Catalog::new(config.catalog())?, AssetFilter::from_app(&app));
        let (events, receiver) = mpsc::unbounded_channel();

        let session = Self {
            state: OrchestratorState::Idle,
            registry,
            resolver,
            downloader,
            installer: InstallInvoker::new(app.installer_args.clone()),
            launcher: ProcessLauncher::from_app(&app),
            self_updater,
            settle_delay: Duration::from_millis(config.launcher().settle_delay_ms),
            events,
            pending: None,
        };
        Ok((session, receiver))
    }

    /// Session for this machine: registry in `storage`, downloads in the system temp dir.
    pub fn open(config: &Config, storage: &DataStorage) -> LauncherResult<(Self, EventReceiver)> {
        let registry = PathRegistry::open(storage, &config.app());
        let downloader = DownloadManager::new(&config.catalog(), DownloadManager::default_temp_dir())?;

        let self_updater: Box<dyn SelfUpdater> = if config.launcher().self_update {
            match GithubSelfUpdater::new(&config.catalog(), downloader.clone()) {
                Ok(updater) => Box::new(updater),
                Err(e) => {
                    tracing::warn!(error = %e, "launcher self-update unavailable");
                    Box::new(DisabledSelfUpdater)
                }
            }
        } else {
            Box::new(DisabledSelfUpdater)
        };

        Self::new(config, registry, downloader, self_updater)
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn registry(&self) -> &PathRegistry {
        &self.registry
    }

    /// Swaps the process launcher, e.g. for one with a different spawner.
    pub fn set_launcher(&mut self, launcher: ProcessLauncher) {
        self.launcher = launcher;
    }

    /// Release currently being downloaded or installed.
    pub fn pending_release(&self) -> Option<&ReleaseInfo> {
        self.pending.as_ref()
    }

    fn transition(&mut self, next: OrchestratorState, message: Message, progress: Option<u8>, context: Option<UpdateContext>) -> LauncherResult<()> {
        if !self.state.can_transition_to(next) {
            tracing::warn!(from = ?self.state, to = ?next, "rejected state transition");
            return Err(LauncherError::NotReady { state: self.state });
        }
        tracing::debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
        emit(&self.events, next, message, progress, context);
        Ok(())
    }

    /// Moves to `Error` and reports `err` with its user-facing message.
    fn fail(&mut self, err: LauncherError) -> LauncherError {
        tracing::error!(from = ?self.state, error = %err, "flow failed");
        self.state = OrchestratorState::Error;
        emit(&self.events, OrchestratorState::Error, err.user_message(), None, None);
        err
    }

    /// Full startup flow: settle, self-update, then the application update check.
    pub async fn start(&mut self) -> LauncherResult<FlowOutcome> {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        if let Some(executable) = self.self_update().await? {
            return Ok(FlowOutcome::Restart(executable));
        }

        self.check_for_updates().await.map(FlowOutcome::UpToDate)
    }

    /// Checks for and applies a launcher update. Failures are reported and swallowed.
    async fn self_update(&mut self) -> LauncherResult<Option<PathBuf>> {
        self.transition(OrchestratorState::CheckingSelfUpdate, Message::CheckingSelfUpdate, None, None)?;

        let release = match self.self_updater.check().await {
            Ok(Some(release)) => release,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!(error = %e, "launcher update check failed");
                emit(&self.events, self.state, Message::SelfUpdateFailed(e.to_string()), None, None);
                return Ok(None);
            }
        };

        self.transition(
            OrchestratorState::DownloadingSelfUpdate,
            Message::SelfUpdateAvailable(release.version.to_string()),
            Some(0),
            None,
        )?;

        let events = self.events.clone();
        let mut on_progress = |progress: DownloadProgress| {
            emit(
                &events,
                OrchestratorState::DownloadingSelfUpdate,
                Message::DownloadingSelfUpdate(progress.percent()),
                progress.percent(),
                None,
            )
        };

        match self.self_updater.apply(&release, &mut on_progress).await {
            Ok(executable) => {
                emit(&self.events, self.state, Message::SelfUpdateApplied(release.version.to_string()), None, None);
                Ok(Some(executable))
            }
            Err(e) => {
                tracing::warn!(error = %e, "launcher update failed");
                emit(&self.events, self.state, Message::SelfUpdateFailed(e.to_string()), None, None);
                Ok(None)
            }
        }
    }

    /// Resolves, downloads and installs an application update if there is one.
    ///
    /// Ends in `UpToDate` with the installed version, or in `Error`.
    pub async fn check_for_updates(&mut self) -> LauncherResult<Version> {
        self.transition(OrchestratorState::CheckingAppUpdate, Message::CheckingAppUpdate, None, None)?;

        match self.update_app().await {
            Ok(version) => {
                self.pending = None;
                self.transition(OrchestratorState::UpToDate, Message::AppUpToDate(version.to_string()), None, None)?;
                let _ = self.events.send(LauncherEvent::Ready(true));
                Ok(version)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn update_app(&mut self) -> LauncherResult<Version> {
        let current = self.registry.version();
        let info = self.resolver.resolve_latest(&current).await?;
        self.registry.touch_last_check();

        if !info.has_update {
            return Ok(current);
        }

        self.transition(
            OrchestratorState::DownloadingAppUpdate,
            Message::UpdateAvailable {
                current: info.current_version.to_string(),
                latest: info.latest_version.to_string(),
            },
            Some(0),
            Some(UpdateContext::from(&info)),
        )?;
        self.pending = Some(info.clone());

        let events = self.events.clone();
        let installer = self
            .downloader
            .download(&info, |progress| {
                emit(
                    &events,
                    OrchestratorState::DownloadingAppUpdate,
                    Message::DownloadingUpdate(progress.percent()),
                    progress.percent(),
                    None,
                )
            })
            .await?;

        let size = std::fs::metadata(&installer).map(|m| m.len()).unwrap_or_default();
        emit(
            &self.events,
            self.state,
            Message::DownloadedUpdate {
                file_name: info.file_name.clone().unwrap_or_default(),
                size: format_bytes(size),
            },
            None,
            None,
        );

        self.transition(OrchestratorState::InstallingAppUpdate, Message::InstallingUpdate, None, None)?;
        self.installer.install(&installer, &info.latest_version, &mut self.registry).await?;
        emit(&self.events, self.state, Message::UpdateInstalled(info.latest_version.to_string()), None, None);

        Ok(info.latest_version)
    }

    /// Starts the game. Only valid in `UpToDate`; other states are refused without a transition.
    pub async fn launch(&mut self) -> LauncherResult<LaunchedProcess> {
        if self.state != OrchestratorState::UpToDate {
            return Err(LauncherError::NotReady { state: self.state });
        }
        self.transition(OrchestratorState::LaunchingApp, Message::LaunchingApp, None, None)?;

        match self.launcher.launch(&mut self.registry).await {
            Ok(process) => {
                self.transition(OrchestratorState::GameLaunched, Message::AppLaunched(process.pid), None, None)?;
                Ok(process)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Manual install location; returns whether the executable is there.
    pub fn choose_install_path(&mut self, path: &Path) -> bool {
        self.registry.set_install_path(path);
        self.registry.is_installed()
    }

    /// Re-runs install discovery; the record only changes when something is found.
    pub fn detect_install_path(&mut self) -> Option<PathBuf> {
        self.registry.auto_detect()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            install: self.registry.status(),
        }
    }
}
