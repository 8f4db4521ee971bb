use crate::{
    libs::{
        config::Config,
        download::{DownloadManager, DownloadProgress},
        messages::Message,
        self_update::{GithubSelfUpdater, SelfUpdater},
    },
    msg_info, msg_success,
};
use anyhow::Result;

/// Replaces the launcher binary with the newest launcher release.
///
/// Runs regardless of the `self_update` setting, which only governs the
/// automatic check in `ferry run`.
pub async fn cmd() -> Result<()> {
    let catalog = Config::read()?.catalog();
    let downloader = DownloadManager::new(&catalog, DownloadManager::default_temp_dir())?;
    let updater = GithubSelfUpdater::new(&catalog, downloader)?;

    msg_info!(Message::CheckingSelfUpdate);
    let Some(release) = updater.check().await? else {
        msg_info!(Message::NoUpdateRequired);
        return Ok(());
    };

    msg_info!(Message::SelfUpdateAvailable(release.version.to_string()));
    let mut shown = None;
    updater
        .apply(&release, &mut |progress: DownloadProgress| {
            let step = progress.percent().map(|p| p / 25);
            if step != shown {
                shown = step;
                msg_info!(Message::DownloadingSelfUpdate(progress.percent()));
            }
        })
        .await?;

    msg_success!(Message::UpdateCompleted {
        app_name: updater.name().to_string(),
        version: release.version.to_string(),
    });
    Ok(())
}
