//! Launcher self-update.
//!
//! Launcher builds are published to the same release catalog as the game,
//! under tags carrying the self-channel marker (`launcher-v1.2.0`). Each
//! release ships one `.tar.gz` per platform, named
//! `{name}-v{version}-{arch}-{os}.tar.gz`, containing the launcher binary.
//!
//! Applying an update replaces the running executable in place and keeps the
//! previous one next to it as `.bak`. The caller is responsible for starting
//! the new binary and exiting.

use crate::libs::config::CatalogConfig;
use crate::libs::download::{DownloadManager, DownloadProgress};
use crate::libs::error::{LauncherError, LauncherResult};
use crate::libs::launcher::{spawn_detached, LaunchSpec};
use crate::libs::messages::Message;
use crate::libs::metadata::{APP_METADATA_NAME, APP_METADATA_VERSION};
use crate::libs::release::{latest_in_channel, parse_tag_version, Catalog, Channel};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use semver::Version;
use std::env;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::Archive;

/// A newer launcher build found in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct LauncherRelease {
    pub version: Version,
    pub download_url: String,
    pub file_name: String,
    pub size: Option<u64>,
}

#[async_trait]
pub trait SelfUpdater: Send + Sync {
    /// Returns the newer launcher release, if any.
    async fn check(&self) -> LauncherResult<Option<LauncherRelease>>;

    /// Downloads `release` and swaps it in; returns the path of the new executable.
    async fn apply(&self, release: &LauncherRelease, on_progress: &mut (dyn FnMut(DownloadProgress) + Send)) -> LauncherResult<PathBuf>;
}

/// Self-update switched off in the configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSelfUpdater;

#[async_trait]
impl SelfUpdater for DisabledSelfUpdater {
    async fn check(&self) -> LauncherResult<Option<LauncherRelease>> {
        tracing::debug!("launcher self-update disabled");
        Ok(None)
    }

    async fn apply(&self, _release: &LauncherRelease, _on_progress: &mut (dyn FnMut(DownloadProgress) + Send)) -> LauncherResult<PathBuf> {
        Err(LauncherError::SelfUpdate {
            message: Message::SelfUpdateDisabled.to_string(),
        })
    }
}

/// Self-updater backed by the release catalog.
#[derive(Debug, Clone)]
pub struct GithubSelfUpdater {
    catalog: Catalog,
    downloader: DownloadManager,
    name: String,
    current: Version,
    target: PathBuf,
}

impl GithubSelfUpdater {
    /// Updater for the running launcher binary.
    pub fn new(catalog: &CatalogConfig, downloader: DownloadManager) -> LauncherResult<Self> {
        let target = env::current_exe().map_err(|e| LauncherError::SelfUpdate {
            message: format!("{}: {}", Message::FailedToGetCurrentExecutable, e),
        })?;
        let current = Version::parse(APP_METADATA_VERSION).map_err(|e| LauncherError::SelfUpdate { message: e.to_string() })?;
        Self::with_target(catalog, downloader, APP_METADATA_NAME, current, target)
    }

    pub fn with_target(
        catalog: &CatalogConfig,
        downloader: DownloadManager,
        name: &str,
        current: Version,
        target: impl Into<PathBuf>,
    ) -> LauncherResult<Self> {
        Ok(Self {
            catalog: Catalog::new(catalog.clone())?,
            downloader,
            name: name.to_string(),
            current,
            target: target.into(),
        })
    }

    pub fn current_version(&self) -> &Version {
        &self.current
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl SelfUpdater for GithubSelfUpdater {
    async fn check(&self) -> LauncherResult<Option<LauncherRelease>> {
        let releases = self.catalog.releases().await?;
        let marker = &self.catalog.config().self_channel_marker;

        let Some(latest) = latest_in_channel(&releases, Channel::Launcher, marker) else {
            tracing::info!("no launcher releases in the catalog");
            return Ok(None);
        };
        let version = parse_tag_version(&latest.tag_name).ok_or_else(|| LauncherError::CatalogFormat {
            message: format!("tag '{}' is not a semantic version", latest.tag_name),
        })?;

        tracing::info!(current = %self.current, latest = %version, "launcher update check result");
        if version <= self.current {
            return Ok(None);
        }

        let expected = platform_asset_name(&self.name, &version);
        let asset = latest.assets.iter().find(|asset| asset.name == expected).ok_or_else(|| LauncherError::AssetNotFound {
            version: version.to_string(),
            marker: platform_name(&self.name, &version),
            extension: ".tar.gz".to_string(),
        })?;

        Ok(Some(LauncherRelease {
            version,
            download_url: asset.browser_download_url.clone(),
            file_name: asset.name.clone(),
            size: asset.size,
        }))
    }

    async fn apply(&self, release: &LauncherRelease, on_progress: &mut (dyn FnMut(DownloadProgress) + Send)) -> LauncherResult<PathBuf> {
        let archive = self
            .downloader
            .fetch(&release.download_url, &release.file_name, release.size, |progress| on_progress(progress))
            .await?;

        let target = self.target.clone();
        let binary_name = self.name.clone();
        let unpacked = archive.clone();
        tokio::task::spawn_blocking(move || extract_and_replace_binary(&unpacked, &target, &binary_name))
            .await
            .map_err(|e| LauncherError::SelfUpdate { message: e.to_string() })??;

        if let Err(e) = fs::remove_file(&archive) {
            tracing::warn!(path = %archive.display(), error = %e, "failed to remove launcher archive");
        }

        tracing::info!(version = %release.version, path = %self.target.display(), "launcher binary replaced");
        Ok(self.target.clone())
    }
}

/// `{name}-v{version}-{arch}-{os}` for the running platform.
pub fn platform_name(name: &str, version: &Version) -> String {
    let arch = env::consts::ARCH;
    let os = match env::consts::OS {
        "windows" => "pc-windows-msvc",
        "macos" => "apple-darwin",
        _ => "unknown-linux-musl",
    };
    format!("{}-v{}-{}-{}", name, version, arch, os)
}

pub fn platform_asset_name(name: &str, version: &Version) -> String {
    format!("{}.tar.gz", platform_name(name, version))
}

/// Unpacks `archive` over `target`.
///
/// The archive entry whose file name is `target`'s (or `binary_name`, with the
/// platform executable suffix) replaces `target`; the old binary is renamed to
/// `.bak`. Every other entry lands next to `target`.
pub fn extract_and_replace_binary(archive: &Path, target: &Path, binary_name: &str) -> LauncherResult<()> {
    let io_err = |e: std::io::Error| LauncherError::SelfUpdate { message: e.to_string() };

    let target_dir = target.parent().map(Path::to_path_buf).ok_or_else(|| LauncherError::SelfUpdate {
        message: Message::FailedToGetCurrentExecutable.to_string(),
    })?;
    let binary_file = format!("{}{}", binary_name, env::consts::EXE_SUFFIX);
    let target_file = target.file_name().map(|n| n.to_os_string());
    let backup = target.with_extension("bak");

    let mut archive = Archive::new(GzDecoder::new(File::open(archive).map_err(io_err)?));
    let mut replaced = false;

    for entry in archive.entries().map_err(io_err)? {
        let mut entry = entry.map_err(io_err)?;
        let entry_name = entry.path().map_err(io_err)?.file_name().map(|n| n.to_os_string());

        let is_binary = entry_name.is_some() && (entry_name == target_file || entry_name.as_deref() == Some(OsStr::new(&binary_file)));
        if is_binary && !replaced {
            if backup.exists() {
                fs::remove_file(&backup).map_err(io_err)?;
            }
            if target.exists() {
                fs::rename(target, &backup).map_err(io_err)?;
            }
            entry.unpack(target).map_err(io_err)?;
            replaced = true;
        } else {
            entry.unpack_in(&target_dir).map_err(io_err)?;
        }
    }

    if !replaced {
        return Err(LauncherError::SelfUpdate {
            message: Message::UpdateBinaryNotFoundInArchive.to_string(),
        });
    }
    Ok(())
}

/// Starts `executable` detached with the current command-line arguments.
pub fn restart(executable: &Path) -> LauncherResult<u32> {
    let mut spec = LaunchSpec::new(executable);
    spec.args = env::args().skip(1).collect();
    spawn_detached(&spec).map_err(|e| LauncherError::SelfUpdate {
        message: Message::RestartFailed(e.to_string()).to_string(),
    })
}
