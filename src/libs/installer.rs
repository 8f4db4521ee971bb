//! Silent installation of a downloaded installer.
//!
//! Unlike the application launch, the installer is an awaited child: the
//! next steps (discovery, version bookkeeping) depend on its exit code. The
//! child is killed if the awaiting future is dropped, so tearing down the
//! launcher never leaves an orphaned installer behind.

use crate::libs::error::{LauncherError, LauncherResult};
use crate::libs::messages::Message;
use crate::libs::registry::PathRegistry;
use crate::msg_warning;
use semver::Version;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct InstallInvoker {
    args: Vec<String>,
}

impl InstallInvoker {
    pub fn new(args: Vec<String>) -> Self {
        Self { args }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Runs the installer silently and waits for it to exit.
    ///
    /// On exit code 0 the installer file is deleted (best effort), the install
    /// location is re-discovered and `version` is recorded. On any other
    /// outcome the record and the installer file are left as they were.
    pub async fn install(&self, installer: &Path, version: &Version, registry: &mut PathRegistry) -> LauncherResult<()> {
        if !installer.is_file() {
            return Err(LauncherError::InstallerNotFound(installer.to_path_buf()));
        }

        #[cfg(unix)]
        make_executable(installer)?;

        tracing::info!(path = %installer.display(), args = ?self.args, "running installer");

        let status = Command::new(installer)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => LauncherError::InstallerNotFound(installer.to_path_buf()),
                _ => LauncherError::InstallerLaunch {
                    path: installer.to_path_buf(),
                    source,
                },
            })?;

        if !status.success() {
            tracing::error!(code = ?status.code(), "installation failed");
            return Err(LauncherError::InstallerExit { code: status.code() });
        }

        tracing::info!("installation completed successfully");

        if let Err(e) = tokio::fs::remove_file(installer).await {
            tracing::warn!(path = %installer.display(), error = %e, "failed to clean up downloaded file");
            msg_warning!(Message::InstallerCleanupFailed(e.to_string()));
        }

        registry.auto_detect();
        registry.set_version(version);
        Ok(())
    }
}

/// Downloaded files carry no execute bit on Unix.
#[cfg(unix)]
fn make_executable(path: &Path) -> LauncherResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let launch_err = |source| LauncherError::InstallerLaunch {
        path: path.to_path_buf(),
        source,
    };
    let mut permissions = std::fs::metadata(path).map_err(launch_err)?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    std::fs::set_permissions(path, permissions).map_err(launch_err)
}
