//! Detached hand-off to the managed application.
//!
//! The application is started in its own session (Unix) or process group
//! without a console (Windows), with null stdio. It outlives the launcher: the
//! launcher's job ends once the spawn succeeds, it never supervises or kills
//! the child.

use crate::libs::config::AppConfig;
use crate::libs::error::{LauncherError, LauncherResult};
use crate::libs::registry::PathRegistry;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Everything needed to start a detached process.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub working_dir: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: None,
        }
    }
}

/// Fire-and-forget start of `spec`; returns the child's PID.
///
/// The child handle is dropped without waiting, which neither kills nor
/// detaches it further; detachment comes from the session / creation flags.
pub fn spawn_detached(spec: &LaunchSpec) -> io::Result<u32> {
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some(dir) = &spec.working_dir {
        command.current_dir(dir);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // SAFETY: setsid is async-signal-safe and touches no parent state.
        unsafe {
            command.pre_exec(|| {
                // Leave the launcher's session so closing its terminal does not hang up the child.
                nix::unistd::setsid()?;
                Ok(())
            });
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x00000008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
        command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    let child = command.spawn()?;
    Ok(child.id())
}

/// Maps a spawn failure to the error class that carries the right user guidance.
pub fn classify_spawn_error(path: &Path, err: io::Error) -> LauncherError {
    #[cfg(unix)]
    {
        if err.raw_os_error() == Some(nix::errno::Errno::EPERM as i32) {
            return LauncherError::OperationNotPermitted { path: path.to_path_buf() };
        }
    }

    #[cfg(windows)]
    {
        // ERROR_VIRUS_INFECTED, ERROR_VIRUS_DELETED
        if matches!(err.raw_os_error(), Some(225) | Some(226)) {
            return LauncherError::OperationNotPermitted { path: path.to_path_buf() };
        }
        // ERROR_ELEVATION_REQUIRED
        if err.raw_os_error() == Some(740) {
            return LauncherError::Permission { path: path.to_path_buf() };
        }
    }

    match err.kind() {
        io::ErrorKind::NotFound => LauncherError::ExecutableNotFound {
            path: Some(path.to_path_buf()),
        },
        io::ErrorKind::PermissionDenied => LauncherError::Permission { path: path.to_path_buf() },
        _ => LauncherError::Spawn {
            path: path.to_path_buf(),
            code: err.raw_os_error(),
            message: err.to_string(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedProcess {
    pub pid: u32,
    pub executable: PathBuf,
}

/// Starts the process described by a [`LaunchSpec`] and returns its PID.
pub type Spawner = fn(&LaunchSpec) -> io::Result<u32>;

type PendingSpawn = (PathBuf, JoinHandle<io::Result<u32>>);

pub struct ProcessLauncher {
    flag: String,
    env: (String, String),
    grace: Duration,
    spawner: Spawner,
    /// Spawn still running on the blocking pool after its grace window expired.
    late: Option<PendingSpawn>,
}

impl fmt::Debug for ProcessLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessLauncher")
            .field("flag", &self.flag)
            .field("env", &self.env)
            .field("grace", &self.grace)
            .field("late", &self.late.as_ref().map(|(executable, _)| executable))
            .finish()
    }
}

impl ProcessLauncher {
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            flag: app.launch_flag.clone(),
            env: (app.launch_env_key.clone(), app.launch_env_value.clone()),
            grace: Duration::from_millis(app.spawn_grace_ms),
            spawner: spawn_detached,
            late: None,
        }
    }

    /// Replaces [`spawn_detached`] as the way processes are started.
    pub fn with_spawner(mut self, spawner: Spawner) -> Self {
        self.spawner = spawner;
        self
    }

    /// Whether a timed-out spawn may still start the game.
    pub fn has_late_spawn(&self) -> bool {
        self.late.is_some()
    }

    /// Recorded executable, or the result of one auto-discovery pass.
    pub fn resolve_executable(&self, registry: &mut PathRegistry) -> LauncherResult<PathBuf> {
        if let Some(exe) = registry.executable_path().filter(|exe| exe.is_file()) {
            return Ok(exe);
        }

        tracing::info!(recorded = ?registry.executable_path(), "game executable missing, retrying discovery");
        registry.auto_detect();

        registry
            .executable_path()
            .filter(|exe| exe.is_file())
            .ok_or_else(|| LauncherError::ExecutableNotFound {
                path: registry.executable_path(),
            })
    }

    /// Starts the application detached and returns as soon as the spawn succeeded.
    ///
    /// A spawn that outlived the previous call's grace window is awaited first;
    /// if it produced a process, that process is returned instead of starting
    /// a second one.
    pub async fn launch(&mut self, registry: &mut PathRegistry) -> LauncherResult<LaunchedProcess> {
        if let Some(process) = self.collect_late_spawn().await? {
            return Ok(process);
        }

        let executable = self.resolve_executable(registry)?;

        let mut spec = LaunchSpec::new(&executable);
        spec.args.push(self.flag.clone());
        spec.env.push(self.env.clone());
        spec.working_dir = executable.parent().map(Path::to_path_buf);

        tracing::info!(executable = %executable.display(), args = ?spec.args, "starting game process");

        let spawner = self.spawner;
        let handle = tokio::task::spawn_blocking(move || spawner(&spec));
        self.await_spawn(executable, handle).await
    }

    async fn collect_late_spawn(&mut self) -> LauncherResult<Option<LaunchedProcess>> {
        let Some((executable, handle)) = self.late.take() else {
            return Ok(None);
        };

        tracing::info!(executable = %executable.display(), "waiting for the spawn left over from the previous launch");
        match self.await_spawn(executable, handle).await {
            Ok(process) => {
                tracing::info!(pid = process.pid, "game process started late, not spawning again");
                Ok(Some(process))
            }
            Err(err @ LauncherError::SpawnTimeout { .. }) => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "previous spawn failed, starting a new one");
                Ok(None)
            }
        }
    }

    async fn await_spawn(&mut self, executable: PathBuf, mut handle: JoinHandle<io::Result<u32>>) -> LauncherResult<LaunchedProcess> {
        let pid = match tokio::time::timeout(self.grace, &mut handle).await {
            Err(_) => {
                tracing::warn!(executable = %executable.display(), grace_ms = self.grace.as_millis() as u64, "game process spawn still pending");
                let err = LauncherError::SpawnTimeout {
                    path: executable.clone(),
                    timeout_ms: self.grace.as_millis() as u64,
                };
                self.late = Some((executable, handle));
                return Err(err);
            }
            Ok(Err(join_error)) => {
                return Err(LauncherError::Spawn {
                    path: executable,
                    code: None,
                    message: join_error.to_string(),
                })
            }
            Ok(Ok(Err(io_error))) => {
                tracing::error!(error = %io_error, code = ?io_error.raw_os_error(), "game process error");
                return Err(classify_spawn_error(&executable, io_error));
            }
            Ok(Ok(Ok(pid))) => pid,
        };

        tracing::info!(pid, "game process spawned successfully");
        Ok(LaunchedProcess { pid, executable })
    }
}
