use crate::libs::{config::Config, data_storage::DataStorage, orchestrator::Session, view::EventPrinter};
use anyhow::Result;

/// Brings the game up to date and launches it without prompting.
pub async fn cmd() -> Result<()> {
    let config = Config::read()?;
    let (mut session, mut events) = Session::open(&config, &DataStorage::new())?;
    let mut printer = EventPrinter::new();

    match super::run::follow(session.check_for_updates(), &mut events, &mut printer).await {
        Some(Ok(_)) => {}
        _ => return Ok(()),
    }
    super::run::follow(session.launch(), &mut events, &mut printer).await;
    Ok(())
}
