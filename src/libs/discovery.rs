//! Well-known install locations probed by auto-discovery.
//!
//! The application's installer decides where it lands (machine-wide, per-user,
//! or wherever the user pointed it), so the launcher probes an ordered list of
//! candidate roots. Order is priority: machine-wide program directories first,
//! then per-user locations, then the default folder next to the launcher.
//!
//! Path conventions differ per OS and live in [`PlatformDirs`]; each
//! [`CandidateRoot`] only knows which directory of that table it uses.

use std::env;
use std::path::{Path, PathBuf};

/// Name of the default install folder next to the launcher binary.
pub const DEFAULT_INSTALL_DIR: &str = "Game";

/// One candidate install root, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRoot {
    ProgramFiles,
    ProgramFilesX86,
    UserPrograms,
    HomeGames,
    Desktop,
    LauncherDefault,
}

impl CandidateRoot {
    pub const PRIORITY: [CandidateRoot; 6] = [
        CandidateRoot::ProgramFiles,
        CandidateRoot::ProgramFilesX86,
        CandidateRoot::UserPrograms,
        CandidateRoot::HomeGames,
        CandidateRoot::Desktop,
        CandidateRoot::LauncherDefault,
    ];

    /// Install directory this candidate points at, if the platform has one.
    pub fn resolve(&self, dirs: &PlatformDirs, app_name: &str) -> Option<PathBuf> {
        match self {
            CandidateRoot::ProgramFiles => dirs.program_files.as_ref().map(|p| p.join(app_name)),
            CandidateRoot::ProgramFilesX86 => dirs.program_files_x86.as_ref().map(|p| p.join(app_name)),
            CandidateRoot::UserPrograms => dirs.user_programs.as_ref().map(|p| p.join(app_name)),
            CandidateRoot::HomeGames => dirs.home.as_ref().map(|p| p.join("Games").join(app_name)),
            CandidateRoot::Desktop => dirs.home.as_ref().map(|p| p.join("Desktop").join(app_name)),
            CandidateRoot::LauncherDefault => dirs.launcher_dir.as_ref().map(|p| default_install_path(p)),
        }
    }
}

/// Default install directory for a launcher living in `launcher_dir`.
pub fn default_install_path(launcher_dir: &Path) -> PathBuf {
    launcher_dir.join(DEFAULT_INSTALL_DIR)
}

/// Per-platform directory conventions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformDirs {
    pub program_files: Option<PathBuf>,
    pub program_files_x86: Option<PathBuf>,
    pub user_programs: Option<PathBuf>,
    pub home: Option<PathBuf>,
    pub launcher_dir: Option<PathBuf>,
}

impl PlatformDirs {
    /// Directories of the running system.
    pub fn detect() -> Self {
        let home = env::var_os(if cfg!(windows) { "USERPROFILE" } else { "HOME" }).map(PathBuf::from);
        let launcher_dir = env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self::for_os(env::consts::OS, home, launcher_dir, |key| env::var_os(key).map(PathBuf::from))
    }

    /// Lookup table of program directories per OS.
    pub fn for_os(os: &str, home: Option<PathBuf>, launcher_dir: Option<PathBuf>, var: impl Fn(&str) -> Option<PathBuf>) -> Self {
        let (program_files, program_files_x86, user_programs) = match os {
            "windows" => (
                Some(var("ProgramFiles").unwrap_or_else(|| PathBuf::from(r"C:\Program Files"))),
                Some(var("ProgramFiles(x86)").unwrap_or_else(|| PathBuf::from(r"C:\Program Files (x86)"))),
                var("LOCALAPPDATA")
                    .or_else(|| home.as_ref().map(|h| h.join("AppData").join("Local")))
                    .map(|p| p.join("Programs")),
            ),
            "macos" => (
                Some(PathBuf::from("/Applications")),
                None,
                home.as_ref().map(|h| h.join("Applications")),
            ),
            _ => (
                Some(PathBuf::from("/opt")),
                Some(PathBuf::from("/usr/local/games")),
                home.as_ref().map(|h| h.join(".local").join("share")),
            ),
        };

        Self {
            program_files,
            program_files_x86,
            user_programs,
            home,
            launcher_dir,
        }
    }

    /// All candidate install directories in priority order.
    pub fn candidates(&self, app_name: &str) -> Vec<PathBuf> {
        CandidateRoot::PRIORITY
            .iter()
            .filter_map(|root| root.resolve(self, app_name))
            .collect()
    }

    pub fn default_install_path(&self) -> PathBuf {
        match &self.launcher_dir {
            Some(dir) => default_install_path(dir),
            None => PathBuf::from(DEFAULT_INSTALL_DIR),
        }
    }
}
