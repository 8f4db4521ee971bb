use crate::libs::{config::Config, data_storage::DataStorage, orchestrator::Session, view::EventPrinter};
use anyhow::Result;

/// Checks for a game update and installs it, without touching the launcher itself.
pub async fn cmd() -> Result<()> {
    let config = Config::read()?;
    let (mut session, mut events) = Session::open(&config, &DataStorage::new())?;
    let mut printer = EventPrinter::new();

    if let Some(Err(e)) = super::run::follow(session.check_for_updates(), &mut events, &mut printer).await {
        tracing::debug!(error = %e, "update check ended in error");
    }
    Ok(())
}
