//! Streaming download of release artifacts with progress reporting.

use crate::libs::config::CatalogConfig;
use crate::libs::error::{LauncherError, LauncherResult};
use crate::libs::release::ReleaseInfo;
use futures::StreamExt;
use reqwest::Client;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Snapshot of a running download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub transferred: u64,
    /// Declared size; `None` when the server sent no length and the catalog had none.
    pub total: Option<u64>,
}

impl DownloadProgress {
    /// Whole percent in `0..=100`, or `None` while the total size is unknown.
    pub fn percent(&self) -> Option<u8> {
        match self.total {
            Some(total) if total > 0 => Some((self.transferred.saturating_mul(100) / total).min(100) as u8),
            _ => None,
        }
    }
}

/// One download attempt: where from, where to, how far along.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub source_url: String,
    pub destination_path: PathBuf,
    pub expected_bytes: Option<u64>,
    pub transferred_bytes: u64,
}

impl DownloadTask {
    pub fn progress(&self) -> DownloadProgress {
        DownloadProgress {
            transferred: self.transferred_bytes,
            total: self.expected_bytes,
        }
    }
}

/// Format bytes as human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[derive(Debug, Clone)]
pub struct DownloadManager {
    client: Client,
    temp_dir: PathBuf,
    /// Bound on waiting for the response headers and on each gap between chunks.
    stall_timeout: Duration,
}

impl DownloadManager {
    pub fn new(catalog: &CatalogConfig, temp_dir: impl Into<PathBuf>) -> LauncherResult<Self> {
        let client = Client::builder()
            .user_agent(&catalog.user_agent)
            .connect_timeout(catalog.check_timeout())
            .build()
            .map_err(|e| LauncherError::Transport { message: e.to_string() })?;
        Ok(Self {
            client,
            temp_dir: temp_dir.into(),
            stall_timeout: catalog.download_timeout(),
        })
    }

    /// `<system temp>/ferry-launcher`
    pub fn default_temp_dir() -> PathBuf {
        env::temp_dir().join("ferry-launcher")
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Local path an asset named `file_name` is downloaded to.
    pub fn destination(&self, file_name: &str) -> PathBuf {
        let name = Path::new(file_name).file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "download.bin".into());
        self.temp_dir.join(name)
    }

    /// Downloads the installer of an update resolved by the release resolver.
    pub async fn download<F>(&self, release: &ReleaseInfo, on_progress: F) -> LauncherResult<PathBuf>
    where
        F: FnMut(DownloadProgress),
    {
        let (Some(url), Some(file_name)) = (release.download_url.as_deref(), release.file_name.as_deref()) else {
            return Err(LauncherError::Transport {
                message: format!("release v{} has no downloadable installer", release.latest_version),
            });
        };
        self.fetch(url, file_name, release.file_size, on_progress).await
    }

    /// Streams `url` into the temp directory as `file_name`.
    ///
    /// Any file already at the destination is removed first; there is no resume.
    /// Returns once the file is flushed to disk and closed. The transfer as a
    /// whole is unbounded; only waiting for the response and for each next
    /// chunk is limited by the download timeout.
    pub async fn fetch<F>(&self, url: &str, file_name: &str, expected_bytes: Option<u64>, mut on_progress: F) -> LauncherResult<PathBuf>
    where
        F: FnMut(DownloadProgress),
    {
        let destination = self.destination(file_name);
        let write_err = |source: std::io::Error| LauncherError::Write {
            path: destination.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.temp_dir).await.map_err(write_err)?;
        if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
            tokio::fs::remove_file(&destination).await.map_err(write_err)?;
        }

        tracing::info!(url, path = %destination.display(), expected_bytes, "starting download");

        let response = tokio::time::timeout(self.stall_timeout, self.client.get(url).send())
            .await
            .map_err(|_| self.stalled())?
            .map_err(|e| LauncherError::Transport { message: e.to_string() })?;

        if !response.status().is_success() {
            return Err(LauncherError::Transport {
                message: format!("HTTP {}", response.status()),
            });
        }

        let mut task = DownloadTask {
            source_url: url.to_string(),
            destination_path: destination.clone(),
            expected_bytes: response.content_length().or(expected_bytes),
            transferred_bytes: 0,
        };

        let mut file = tokio::fs::File::create(&destination).await.map_err(write_err)?;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = tokio::time::timeout(self.stall_timeout, stream.next()).await.map_err(|_| {
            tracing::warn!(transferred = task.transferred_bytes, "download stalled");
            self.stalled()
        })? {
            let chunk = chunk_result.map_err(|e| LauncherError::Transport { message: e.to_string() })?;
            file.write_all(&chunk).await.map_err(write_err)?;
            task.transferred_bytes += chunk.len() as u64;
            on_progress(task.progress());
        }

        file.flush().await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        tracing::info!(
            path = %task.destination_path.display(),
            size = task.transferred_bytes,
            source = %task.source_url,
            "download completed"
        );
        Ok(task.destination_path)
    }

    fn stalled(&self) -> LauncherError {
        LauncherError::Transport {
            message: format!("no data received for {} seconds", self.stall_timeout.as_secs()),
        }
    }
}
