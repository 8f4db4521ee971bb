//! Release catalog access and version resolution.
//!
//! The catalog lists every published release of the repository newest-first.
//! Two logical channels share it: the managed application and the launcher
//! itself, whose tags carry a marker (e.g. `launcher-v1.2.0`). The "latest"
//! catalog entry is therefore not necessarily the latest application release,
//! so the resolver always fetches the full list and filters by channel before
//! picking the newest entry.

use crate::libs::config::{AppConfig, CatalogConfig};
use crate::libs::error::{LauncherError, LauncherResult};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use semver::Version;
use serde::{Deserialize, Serialize};

const CATALOG_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const NO_RELEASE_NOTES: &str = "No release notes available";

#[derive(Deserialize, Debug, Clone)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Logical release stream inside the shared catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Application,
    Launcher,
}

impl Channel {
    pub fn contains(&self, tag: &str, self_marker: &str) -> bool {
        let tagged_as_launcher = tag.to_lowercase().contains(&self_marker.to_lowercase());
        match self {
            Channel::Application => !tagged_as_launcher,
            Channel::Launcher => tagged_as_launcher,
        }
    }
}

/// Parses the semantic version out of a tag such as `v1.3.0` or `launcher-v1.2.0`.
pub fn parse_tag_version(tag: &str) -> Option<Version> {
    let start = tag.find(|c: char| c.is_ascii_digit())?;
    Version::parse(&tag[start..]).ok()
}

/// Newest published (non-draft, non-prerelease) entry of a channel.
pub fn latest_in_channel<'a>(releases: &'a [Release], channel: Channel, self_marker: &str) -> Option<&'a Release> {
    releases
        .iter()
        .filter(|release| !release.draft && !release.prerelease)
        .find(|release| channel.contains(&release.tag_name, self_marker))
}

/// Name filter selecting the distributable installer among a release's assets.
#[derive(Debug, Clone)]
pub struct AssetFilter {
    pub marker: String,
    pub extension: String,
}

impl AssetFilter {
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            marker: app.asset_marker.clone(),
            extension: app.asset_extension.clone(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        name.contains(&self.marker) && name.ends_with(&self.extension)
    }

    pub fn select<'a>(&self, assets: &'a [Asset]) -> Option<&'a Asset> {
        assets.iter().find(|asset| self.matches(&asset.name))
    }
}

/// Resolved metadata for a candidate update.
///
/// When `has_update` is true, `download_url` and `file_name` are always present.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseInfo {
    pub has_update: bool,
    pub current_version: Version,
    pub latest_version: Version,
    pub release_notes: String,
    pub download_url: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub published_at: Option<DateTime<Utc>>,
}

impl ReleaseInfo {
    /// Decides whether `releases` hold an application update over `current`.
    pub fn evaluate(releases: &[Release], current: &Version, filter: &AssetFilter, self_marker: &str) -> LauncherResult<Self> {
        let latest = latest_in_channel(releases, Channel::Application, self_marker).ok_or(LauncherError::NoReleaseFound)?;
        let latest_version = parse_tag_version(&latest.tag_name).ok_or_else(|| LauncherError::CatalogFormat {
            message: format!("tag '{}' is not a semantic version", latest.tag_name),
        })?;

        let has_update = latest_version > *current;
        let asset = filter.select(&latest.assets);
        if has_update && asset.is_none() {
            return Err(LauncherError::AssetNotFound {
                version: latest_version.to_string(),
                marker: filter.marker.clone(),
                extension: filter.extension.clone(),
            });
        }

        Ok(Self {
            has_update,
            current_version: current.clone(),
            latest_version,
            release_notes: latest
                .body
                .clone()
                .filter(|body| !body.trim().is_empty())
                .unwrap_or_else(|| NO_RELEASE_NOTES.to_string()),
            download_url: asset.map(|a| a.browser_download_url.clone()),
            file_name: asset.map(|a| a.name.clone()),
            file_size: asset.and_then(|a| a.size),
            published_at: latest.published_at,
        })
    }
}

/// HTTP client for the release list endpoint.
#[derive(Debug, Clone)]
pub struct Catalog {
    client: Client,
    config: CatalogConfig,
}

impl Catalog {
    pub fn new(config: CatalogConfig) -> LauncherResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(CATALOG_MEDIA_TYPE));
        let client = Client::builder()
            .default_headers(headers)
            .user_agent(&config.user_agent)
            .timeout(config.check_timeout())
            .build()
            .map_err(|e| LauncherError::Network { message: e.to_string() })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Fetches the full release list, newest first.
    pub async fn releases(&self) -> LauncherResult<Vec<Release>> {
        let url = self.config.releases_url();
        tracing::debug!(url = %url, "fetching release catalog");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LauncherError::Network { message: e.to_string() })?;

        if !response.status().is_success() {
            return Err(LauncherError::Network {
                message: format!("{} returned HTTP {}", url, response.status()),
            });
        }

        let body = response.text().await.map_err(|e| LauncherError::Network { message: e.to_string() })?;
        let releases: Vec<Release> = serde_json::from_str(&body).map_err(|e| LauncherError::CatalogFormat { message: e.to_string() })?;
        tracing::info!(count = releases.len(), "release catalog fetched");
        Ok(releases)
    }
}

/// Resolves the latest application release against the installed version.
#[derive(Debug, Clone)]
pub struct ReleaseResolver {
    catalog: Catalog,
    filter: AssetFilter,
}

impl ReleaseResolver {
    pub fn new(catalog: Catalog, filter: AssetFilter) -> Self {
        Self { catalog, filter }
    }

    pub async fn resolve_latest(&self, current: &Version) -> LauncherResult<ReleaseInfo> {
        let releases = self.catalog.releases().await?;
        let info = ReleaseInfo::evaluate(&releases, current, &self.filter, &self.catalog.config().self_channel_marker)?;
        tracing::info!(
            current = %info.current_version,
            latest = %info.latest_version,
            has_update = info.has_update,
            file = info.file_name.as_deref().unwrap_or("-"),
            "update check result"
        );
        Ok(info)
    }
}
